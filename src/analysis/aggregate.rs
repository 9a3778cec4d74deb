//! Filtering, grouping and averaging of enriched rows into chart series.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::resample::{Cadence, resample};
use crate::analysis::utility::{mean, round2};
use crate::country::{Country, DefaultGroup, Level};
use crate::model::{EnrichedRecord, Metric, SeriesPoint};

pub const GROUP_1_LABEL: &str = "Group 1";
pub const GROUP_2_LABEL: &str = "Group 2";

/// Provinces and cities making up one comparison group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupSelection {
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
}

impl GroupSelection {
    /// A row matches if its province OR its city is selected.
    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        self.provinces.contains(&record.province_name) || self.cities.contains(&record.city_name)
    }
}

impl From<DefaultGroup> for GroupSelection {
    fn from(group: DefaultGroup) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            provinces: owned(group.provinces),
            cities: owned(group.cities),
        }
    }
}

/// How the second comparison group is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonMode {
    /// Both groups are inclusive selections, resampled daily.
    #[default]
    Symmetric,
    /// Group 2 is every row NOT matching its selection, resampled weekly,
    /// while Group 1 stays an inclusive daily series.
    Legacy,
}

impl ComparisonMode {
    fn cadences(&self) -> (Cadence, Cadence) {
        match self {
            ComparisonMode::Symmetric => (Cadence::Daily, Cadence::Daily),
            ComparisonMode::Legacy => (Cadence::Daily, Cadence::Weekly),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomSelection {
    pub group1: GroupSelection,
    pub group2: GroupSelection,
    #[serde(default)]
    pub mode: ComparisonMode,
}

impl CustomSelection {
    /// The country's preselected comparison groups.
    pub fn defaults(country: Country, mode: ComparisonMode) -> Self {
        let [group1, group2] = country.default_groups();
        Self {
            group1: group1.into(),
            group2: group2.into(),
            mode,
        }
    }

    fn in_group1(&self, record: &EnrichedRecord) -> bool {
        self.group1.matches(record)
    }

    fn in_group2(&self, record: &EnrichedRecord) -> bool {
        match self.mode {
            ComparisonMode::Symmetric => self.group2.matches(record),
            ComparisonMode::Legacy => !self.group2.matches(record),
        }
    }
}

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    National,
    Provincial(Vec<String>),
    City(Vec<String>),
    Custom(CustomSelection),
}

impl Selection {
    pub fn level(&self) -> Level {
        match self {
            Selection::National => Level::National,
            Selection::Provincial(_) => Level::Provincial,
            Selection::City(_) => Level::City,
            Selection::Custom(_) => Level::Custom,
        }
    }

    /// Whether `record` contributes to any series of this selection.
    pub fn includes(&self, record: &EnrichedRecord) -> bool {
        match self {
            Selection::National => true,
            Selection::Provincial(units) => units.contains(&record.province_name),
            Selection::City(units) => units.contains(&record.city_name),
            Selection::Custom(custom) => custom.in_group1(record) || custom.in_group2(record),
        }
    }
}

/// The unit a row belongs to at `level`; `None` for custom groups.
pub fn unit_name<'a>(record: &'a EnrichedRecord, level: Level, country: Country) -> Option<&'a str> {
    match level {
        Level::National => Some(country.display_name()),
        Level::Provincial => Some(record.province_name.as_str()),
        Level::City => Some(record.city_name.as_str()),
        Level::Custom => None,
    }
}

/// Builds the chart series for `selection`.
///
/// National, provincial and city selections are grouped by (unit, date) and
/// averaged, ordered by unit then date. Custom selections produce one pooled,
/// resampled series per comparison group. A selection matching no rows
/// yields an empty series.
#[tracing::instrument(skip(enriched), fields(rows = enriched.len(), level = ?selection.level()))]
pub fn aggregate(
    enriched: &[EnrichedRecord],
    selection: &Selection,
    metric: Metric,
    country: Country,
) -> Vec<SeriesPoint> {
    let series = match selection {
        Selection::Custom(custom) => aggregate_custom(enriched, custom, metric),
        _ => aggregate_units(enriched, selection, metric, country),
    };

    if series.is_empty() {
        info!("Selection matched no rows");
    } else {
        debug!(points = series.len(), "Aggregated series");
    }
    series
}

fn aggregate_units(
    enriched: &[EnrichedRecord],
    selection: &Selection,
    metric: Metric,
    country: Country,
) -> Vec<SeriesPoint> {
    let level = selection.level();
    let mut groups: BTreeMap<(&str, NaiveDate), Vec<f64>> = BTreeMap::new();

    for record in enriched.iter().filter(|r| selection.includes(r)) {
        if let Some(unit) = unit_name(record, level, country) {
            groups
                .entry((unit, record.date))
                .or_default()
                .push(metric.value(record));
        }
    }

    groups
        .into_iter()
        .map(|((unit, date), values)| SeriesPoint::new(unit, date, round2(mean(&values))))
        .collect()
}

fn aggregate_custom(
    enriched: &[EnrichedRecord],
    custom: &CustomSelection,
    metric: Metric,
) -> Vec<SeriesPoint> {
    let (cadence1, cadence2) = custom.mode.cadences();

    let group1 = enriched
        .iter()
        .filter(|r| custom.in_group1(r))
        .map(|r| (r.date, metric.value(r)));
    let group2 = enriched
        .iter()
        .filter(|r| custom.in_group2(r))
        .map(|r| (r.date, metric.value(r)));

    let mut series = resample(GROUP_1_LABEL, group1, cadence1);
    series.extend(resample(GROUP_2_LABEL, group2, cadence2));
    series
}

/// Sorted, de-duplicated unit names selectable at `level`.
pub fn available_units(enriched: &[EnrichedRecord], level: Level, country: Country) -> Vec<String> {
    let units: BTreeSet<&str> = enriched
        .iter()
        .filter_map(|r| unit_name(r, level, country))
        .collect();
    units.into_iter().map(str::to_string).collect()
}

/// Provinces of every row the selection includes, plus the provinces it names.
///
/// Named provinces count even without mobility rows so their events still show.
pub fn selected_provinces(enriched: &[EnrichedRecord], selection: &Selection) -> BTreeSet<String> {
    let mut provinces: BTreeSet<String> = enriched
        .iter()
        .filter(|r| selection.includes(r))
        .map(|r| r.province_name.clone())
        .collect();

    match selection {
        Selection::Provincial(units) => provinces.extend(units.iter().cloned()),
        Selection::Custom(custom) => {
            provinces.extend(custom.group1.provinces.iter().cloned());
            if custom.mode == ComparisonMode::Symmetric {
                provinces.extend(custom.group2.provinces.iter().cloned());
            }
        }
        Selection::National | Selection::City(_) => {}
    }
    provinces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn row(province: &str, city: &str, d: u32, mobility: f64) -> EnrichedRecord {
        EnrichedRecord {
            polygon_id: format!("{province}/{city}"),
            date: day(d),
            province_name: province.to_string(),
            city_name: city.to_string(),
            mobility_change_pct: mobility,
            staying_put_pct: mobility / 2.0,
        }
    }

    fn names(units: &[&str]) -> Vec<String> {
        units.iter().map(|u| u.to_string()).collect()
    }

    /// Three provinces, one city each, two days.
    fn three_provinces() -> Vec<EnrichedRecord> {
        let mut rows = Vec::new();
        for d in 1..=2 {
            rows.push(row("ProvinceA", "CityA", d, 10.0));
            rows.push(row("ProvinceB", "CityB", d, 20.0));
            rows.push(row("ProvinceC", "CityC", d, 60.0));
        }
        rows
    }

    #[test]
    fn test_provincial_groups_by_unit_and_date() {
        let rows = vec![
            row("Ha Noi", "Ba Dinh", 1, -10.0),
            row("Ha Noi", "Hoan Kiem", 1, -20.0),
            row("Ha Noi", "Ba Dinh", 2, -30.0),
            row("Da Nang", "Hai Chau", 1, 5.0),
        ];
        let series = aggregate(
            &rows,
            &Selection::Provincial(names(&["Ha Noi"])),
            Metric::MobilityChange,
            Country::Vietnam,
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].unit_label, "Ha Noi");
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[0].metric_value, Some(-15.0));
        assert_eq!(series[1].date, day(2));
    }

    #[test]
    fn test_city_level_uses_city_names() {
        let rows = vec![row("Ha Noi", "Ba Dinh", 1, -10.0), row("Ha Noi", "Hoan Kiem", 1, -20.0)];
        let series = aggregate(
            &rows,
            &Selection::City(names(&["Hoan Kiem"])),
            Metric::StayingPut,
            Country::Vietnam,
        );

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].unit_label, "Hoan Kiem");
        assert_eq!(series[0].metric_value, Some(-10.0));
    }

    #[test]
    fn test_national_averages_whole_country() {
        let series = aggregate(
            &three_provinces(),
            &Selection::National,
            Metric::MobilityChange,
            Country::Philippines,
        );

        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p.unit_label == "the Philippines"));
        assert_eq!(series[0].metric_value, Some(30.0));
    }

    #[test]
    fn test_no_duplicate_unit_date_keys() {
        let mut rows = three_provinces();
        rows.extend(three_provinces());
        let series = aggregate(
            &rows,
            &Selection::Provincial(names(&["ProvinceA", "ProvinceB", "ProvinceC"])),
            Metric::MobilityChange,
            Country::Vietnam,
        );

        let keys: BTreeSet<_> = series.iter().map(|p| (p.unit_label.clone(), p.date)).collect();
        assert_eq!(keys.len(), series.len());
        assert_eq!(series.len(), 6);
    }

    #[test]
    fn test_empty_selection_is_empty_series() {
        let series = aggregate(
            &three_provinces(),
            &Selection::Provincial(names(&["Atlantis"])),
            Metric::MobilityChange,
            Country::Vietnam,
        );
        assert!(series.is_empty());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let rows = three_provinces();
        let selection = Selection::Custom(CustomSelection {
            group1: GroupSelection {
                provinces: names(&["ProvinceA"]),
                cities: names(&["CityC"]),
            },
            group2: GroupSelection {
                provinces: names(&["ProvinceB"]),
                cities: vec![],
            },
            mode: ComparisonMode::Legacy,
        });

        let first = aggregate(&rows, &selection, Metric::MobilityChange, Country::Vietnam);
        let second = aggregate(&rows, &selection, Metric::MobilityChange, Country::Vietnam);
        assert_eq!(first, second);
    }

    #[test]
    fn test_legacy_group2_is_complement_of_its_own_selection() {
        let rows = three_provinces();
        let custom = CustomSelection {
            group1: GroupSelection {
                provinces: names(&["ProvinceA"]),
                cities: vec![],
            },
            group2: GroupSelection {
                provinces: names(&["ProvinceB"]),
                cities: vec![],
            },
            mode: ComparisonMode::Legacy,
        };

        let group2_rows: BTreeSet<&str> = rows
            .iter()
            .filter(|r| custom.in_group2(r))
            .map(|r| r.province_name.as_str())
            .collect();
        // every province except B, including A which group 1 also selected
        assert_eq!(group2_rows, BTreeSet::from(["ProvinceA", "ProvinceC"]));

        let series = aggregate(
            &rows,
            &Selection::Custom(custom),
            Metric::MobilityChange,
            Country::Vietnam,
        );
        let group1: Vec<_> = series.iter().filter(|p| p.unit_label == GROUP_1_LABEL).collect();
        let group2: Vec<_> = series.iter().filter(|p| p.unit_label == GROUP_2_LABEL).collect();

        assert_eq!(group1.len(), 2);
        assert!(group1.iter().all(|p| p.metric_value == Some(10.0)));
        // weekly bin covering both days, mean of A (10) and C (60)
        assert_eq!(group2.len(), 1);
        assert_eq!(group2[0].date, day(1));
        assert_eq!(group2[0].metric_value, Some(35.0));
    }

    #[test]
    fn test_symmetric_groups_are_inclusive_and_daily() {
        let rows = three_provinces();
        let selection = Selection::Custom(CustomSelection {
            group1: GroupSelection {
                provinces: names(&["ProvinceA"]),
                cities: vec![],
            },
            group2: GroupSelection {
                provinces: vec![],
                cities: names(&["CityB"]),
            },
            mode: ComparisonMode::Symmetric,
        });

        let series = aggregate(&rows, &selection, Metric::MobilityChange, Country::Vietnam);
        let group2: Vec<_> = series.iter().filter(|p| p.unit_label == GROUP_2_LABEL).collect();

        assert_eq!(series.len(), 4);
        assert_eq!(group2.len(), 2);
        assert!(group2.iter().all(|p| p.metric_value == Some(20.0)));
    }

    #[test]
    fn test_group1_is_union_of_provinces_and_cities() {
        let rows = three_provinces();
        let selection = Selection::Custom(CustomSelection {
            group1: GroupSelection {
                provinces: names(&["ProvinceA"]),
                cities: names(&["CityC"]),
            },
            ..Default::default()
        });

        let series = aggregate(&rows, &selection, Metric::MobilityChange, Country::Vietnam);
        let group1: Vec<_> = series.iter().filter(|p| p.unit_label == GROUP_1_LABEL).collect();

        assert_eq!(group1.len(), 2);
        assert!(group1.iter().all(|p| p.metric_value == Some(35.0)));
    }

    #[test]
    fn test_available_units_sorted_unique() {
        let rows = three_provinces();
        assert_eq!(
            available_units(&rows, Level::City, Country::Vietnam),
            vec!["CityA", "CityB", "CityC"]
        );
        assert!(available_units(&rows, Level::Custom, Country::Vietnam).is_empty());
    }

    #[test]
    fn test_selected_provinces_follow_rows() {
        let rows = three_provinces();
        let provinces = selected_provinces(&rows, &Selection::City(names(&["CityB"])));
        assert_eq!(provinces, BTreeSet::from(["ProvinceB".to_string()]));
    }

    #[test]
    fn test_selected_provinces_keep_named_units_without_rows() {
        let rows = three_provinces();
        let provinces = selected_provinces(
            &rows,
            &Selection::Provincial(names(&["ProvinceA", "Catanduanes"])),
        );
        assert_eq!(
            provinces,
            BTreeSet::from(["Catanduanes".to_string(), "ProvinceA".to_string()])
        );
    }

    #[test]
    fn test_default_comparison_groups() {
        let custom = CustomSelection::defaults(Country::Vietnam, ComparisonMode::Legacy);
        assert_eq!(custom.group1.provinces, names(&["Da Nang"]));
        assert_eq!(custom.group2.provinces, names(&["Ha Noi", "Ho Chi Minh"]));
        assert_eq!(custom.group2.cities, names(&["Quang Binh"]));
        assert_eq!(custom.mode, ComparisonMode::Legacy);
    }
}
