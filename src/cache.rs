//! Per-session memoization of fetched datasets.
//!
//! Each dataset is downloaded at most once per process. Failed fetches are
//! not remembered, so a later run retries them. Nothing is ever invalidated.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{Dataset, FetchError};
use crate::model::{DisasterEvent, MobilityRecord, PolicyRecord};
use crate::sources::DatasetFetcher;

pub struct SessionCache<F> {
    fetcher: F,
    mobility: OnceCell<Arc<Vec<MobilityRecord>>>,
    policy: OnceCell<Arc<Vec<PolicyRecord>>>,
    typhoons: OnceCell<Arc<Vec<DisasterEvent>>>,
}

impl<F: DatasetFetcher> SessionCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            mobility: OnceCell::new(),
            policy: OnceCell::new(),
            typhoons: OnceCell::new(),
        }
    }

    pub async fn mobility(&self) -> Result<Arc<Vec<MobilityRecord>>, FetchError> {
        self.mobility
            .get_or_try_init(|| async {
                info!(dataset = %Dataset::Mobility, "Cache miss, fetching");
                self.fetcher.fetch_mobility().await.map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }

    pub async fn policy(&self) -> Result<Arc<Vec<PolicyRecord>>, FetchError> {
        self.policy
            .get_or_try_init(|| async {
                info!(dataset = %Dataset::Policy, "Cache miss, fetching");
                self.fetcher.fetch_policy().await.map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }

    pub async fn typhoons(&self) -> Result<Arc<Vec<DisasterEvent>>, FetchError> {
        self.typhoons
            .get_or_try_init(|| async {
                info!(dataset = %Dataset::Typhoons, "Cache miss, fetching");
                self.fetcher.fetch_typhoons().await.map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }

    pub fn is_cached(&self, dataset: Dataset) -> bool {
        match dataset {
            Dataset::Mobility => self.mobility.initialized(),
            Dataset::Policy => self.policy.initialized(),
            Dataset::Typhoons => self.typhoons.initialized(),
        }
    }
}
