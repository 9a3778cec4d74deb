//! Explicit per-request entry point: cache → resolve → join → aggregate → overlay.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::aggregate::{Selection, aggregate, available_units, selected_provinces};
use crate::analysis::join::join;
use crate::analysis::overlay::{PolicyJoin, overlay};
use crate::boundary::BoundaryResolver;
use crate::cache::SessionCache;
use crate::country::{Country, Level};
use crate::error::{Dataset, PipelineError};
use crate::model::{DisasterEvent, Metric, PolicyRecord, SeriesPoint};
use crate::sources::DatasetFetcher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub country: Country,
    pub metric: Metric,
    pub selection: Selection,
    #[serde(default)]
    pub policy_join: PolicyJoin,
}

/// Everything the presentation layer needs for one selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub series: Vec<SeriesPoint>,
    pub events: Vec<DisasterEvent>,
    /// Overlay layers that could not be loaded for this run.
    pub degraded: Vec<Dataset>,
    /// Mobility rows dropped for lack of a boundary match.
    pub dropped_rows: usize,
}

pub struct Pipeline<F> {
    cache: SessionCache<F>,
    boundaries: BoundaryResolver,
}

impl<F: DatasetFetcher> Pipeline<F> {
    pub fn new(fetcher: F, boundaries: BoundaryResolver) -> Self {
        Self {
            cache: SessionCache::new(fetcher),
            boundaries,
        }
    }

    pub fn cache(&self) -> &SessionCache<F> {
        &self.cache
    }

    /// Runs the full pipeline for one request.
    ///
    /// Policy and typhoon failures only remove their layer from the view;
    /// mobility or boundary failures fail the run.
    #[tracing::instrument(skip(self), fields(country = request.country.code()))]
    pub async fn run(&self, request: &Request) -> Result<View, PipelineError> {
        let mobility = self.cache.mobility().await?;
        let boundaries = self.boundaries.resolve_country(request.country)?;

        let joined = join(&mobility, request.country, &boundaries);
        let series = aggregate(
            &joined.records,
            &request.selection,
            request.metric,
            request.country,
        );

        let mut degraded = Vec::new();
        let policy = match self.cache.policy().await {
            Ok(policy) => Some(policy),
            Err(e) => {
                warn!(error = %e, "Policy overlay unavailable");
                degraded.push(Dataset::Policy);
                None
            }
        };
        let events = match self.cache.typhoons().await {
            Ok(events) => Some(events),
            Err(e) => {
                warn!(error = %e, "Event overlay unavailable");
                degraded.push(Dataset::Typhoons);
                None
            }
        };

        let provinces = selected_provinces(&joined.records, &request.selection);
        let policy_rows: &[PolicyRecord] = policy.as_ref().map(|p| p.as_slice()).unwrap_or_default();
        let event_rows: &[DisasterEvent] = events.as_ref().map(|e| e.as_slice()).unwrap_or_default();
        // Without a policy feed every point would be unmatched; keep them all.
        let policy_join = if policy.is_some() {
            request.policy_join
        } else {
            PolicyJoin::Left
        };

        let overlaid = overlay(
            series,
            policy_rows,
            event_rows,
            request.country,
            &provinces,
            policy_join,
        );

        info!(
            points = overlaid.series.len(),
            events = overlaid.events.len(),
            degraded = degraded.len(),
            "Pipeline run complete"
        );

        Ok(View {
            series: overlaid.series,
            events: overlaid.events,
            degraded,
            dropped_rows: joined.dropped,
        })
    }

    /// Unit names selectable for `country` at `level`.
    pub async fn units(&self, country: Country, level: Level) -> Result<Vec<String>, PipelineError> {
        let mobility = self.cache.mobility().await?;
        let boundaries = self.boundaries.resolve_country(country)?;
        let joined = join(&mobility, country, &boundaries);
        Ok(available_units(&joined.records, level, country))
    }
}
