//! Supported countries and their per-country column profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownCountryError;

/// Administrative granularity of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    National,
    Provincial,
    City,
    Custom,
}

/// Province and city names of a preselected comparison group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultGroup {
    pub provinces: &'static [&'static str],
    pub cities: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    Vietnam,
    Philippines,
    TimorLeste,
}

/// Column names used to label units for one country.
///
/// `province_column` and `city_column` name columns of the boundary tables,
/// except for Timor-Leste where the mobility feed's `polygon_name` is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryProfile {
    pub code: &'static str,
    pub province_column: &'static str,
    pub city_column: &'static str,
    pub national_column: &'static str,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Vietnam, Country::Philippines, Country::TimorLeste];

    pub fn code(&self) -> &'static str {
        match self {
            Country::Vietnam => "VNM",
            Country::Philippines => "PHL",
            Country::TimorLeste => "TLS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Country::Vietnam => "Vietnam",
            Country::Philippines => "the Philippines",
            Country::TimorLeste => "Timor Leste",
        }
    }

    pub fn profile(&self) -> CountryProfile {
        match self {
            Country::Vietnam => CountryProfile {
                code: "VNM",
                province_column: "VARNAME_1",
                city_column: "VARNAME_2",
                national_column: "country",
            },
            Country::Philippines => CountryProfile {
                code: "PHL",
                province_column: "NAME_1",
                city_column: "NAME_2",
                national_column: "country",
            },
            Country::TimorLeste => CountryProfile {
                code: "TLS",
                province_column: "polygon_name",
                city_column: "polygon_name",
                national_column: "country",
            },
        }
    }

    /// Whether the mobility feed already names this country's polygons.
    pub fn uses_polygon_names(&self) -> bool {
        matches!(self, Country::TimorLeste)
    }

    /// Units preselected when the caller does not name any.
    pub fn default_units(&self, level: Level) -> &'static [&'static str] {
        match (self, level) {
            (Country::Vietnam, Level::Provincial) => &["Ha Noi", "Ho Chi Minh", "Da Nang"],
            (Country::Vietnam, Level::City) => &["Ha Giang", "Quang Binh"],
            (Country::Philippines, Level::Provincial) => &["Metropolitan Manila"],
            (Country::Philippines, Level::City) => &["Quezon City", "Tuguegarao City"],
            (Country::TimorLeste, Level::Provincial | Level::City) => &["Dili Barat", "Dili Timur"],
            (_, Level::National | Level::Custom) => &[],
        }
    }

    /// Preselected comparison groups, as `[group 1, group 2]`.
    pub fn default_groups(&self) -> [DefaultGroup; 2] {
        match self {
            Country::Vietnam => [
                DefaultGroup {
                    provinces: &["Da Nang"],
                    cities: &["Ha Giang"],
                },
                DefaultGroup {
                    provinces: &["Ha Noi", "Ho Chi Minh"],
                    cities: &["Quang Binh"],
                },
            ],
            Country::Philippines => [
                DefaultGroup {
                    provinces: &["Metropolitan Manila"],
                    cities: &["Quezon City", "Tuguegarao City"],
                },
                DefaultGroup {
                    provinces: &["Catanduanes"],
                    cities: &["Quezon City", "Tuguegarao City"],
                },
            ],
            Country::TimorLeste => [
                DefaultGroup {
                    provinces: &["Dili Barat"],
                    cities: &[],
                },
                DefaultGroup {
                    provinces: &["Dili Timur"],
                    cities: &[],
                },
            ],
        }
    }

    /// Matches a free-form country label against code and display name.
    pub fn matches(&self, label: &str) -> bool {
        let label = label.trim();
        label.eq_ignore_ascii_case(self.code())
            || label.eq_ignore_ascii_case(self.display_name())
            || Country::from_str(label).is_ok_and(|c| c == *self)
    }
}

impl FromStr for Country {
    type Err = UnknownCountryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "vnm" | "vietnam" | "viet nam" => Ok(Country::Vietnam),
            "phl" | "philippines" | "the philippines" => Ok(Country::Philippines),
            "tls" | "timor leste" | "timor-leste" | "east timor" => Ok(Country::TimorLeste),
            _ => Err(UnknownCountryError(s.to_string())),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "national" => Ok(Level::National),
            "provincial" | "province" => Ok(Level::Provincial),
            "city" | "municipality" => Ok(Level::City),
            "custom" => Ok(Level::Custom),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}
