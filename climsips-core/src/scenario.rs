//! Season and region scenarios
//!
//! The spread of the ensemble is evaluated for one seasonal mean over one region,
//! keyed as `<SEASON>_<REGION>` (e.g. `JJA_CEU`, summer over Central Europe).
//! A [`ResponseSource`] turns a scenario into the name of the dataset holding
//! the member response for that scenario.

use crate::catalog::EnsembleCatalog;
use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::response::ResponseVariable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    /// December, January, February
    Djf,
    /// March, April, May
    Mam,
    /// June, July, August
    Jja,
    /// September, October, November
    Son,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Djf, Season::Mam, Season::Jja, Season::Son];

    pub fn code(&self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }
}

/// IPCC SREX regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Central Europe
    Ceu,
    /// Northern Europe
    Neu,
    /// Mediterranean
    Med,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Ceu, Region::Neu, Region::Med];

    pub fn code(&self) -> &'static str {
        match self {
            Region::Ceu => "CEU",
            Region::Neu => "NEU",
            Region::Med => "MED",
        }
    }
}

/// A season over a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scenario {
    pub season: Season,
    pub region: Region,
}

impl Scenario {
    /// Scenarios for which curated response datasets exist
    pub const REFERENCE: [Scenario; 3] = [
        Scenario::new(Season::Jja, Region::Ceu),
        Scenario::new(Season::Djf, Region::Neu),
        Scenario::new(Season::Djf, Region::Ceu),
    ];

    pub const fn new(season: Season, region: Region) -> Self {
        Self { season, region }
    }

    /// Key in `<SEASON>_<REGION>` form
    pub fn key(&self) -> String {
        format!("{}_{}", self.season.code(), self.region.code())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.season.code(), self.region.code())
    }
}

impl FromStr for Scenario {
    type Err = ClimsipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ClimsipsError::UnknownScenario(s.to_string());
        let (season, region) = s.trim().split_once('_').ok_or_else(unknown)?;
        let season = Season::ALL
            .into_iter()
            .find(|x| x.code().eq_ignore_ascii_case(season))
            .ok_or_else(unknown)?;
        let region = Region::ALL
            .into_iter()
            .find(|x| x.code().eq_ignore_ascii_case(region))
            .ok_or_else(unknown)?;
        Ok(Self::new(season, region))
    }
}

impl TryFrom<String> for Scenario {
    type Error = ClimsipsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scenario> for String {
    fn from(value: Scenario) -> Self {
        value.key()
    }
}

fn default_future_period() -> String {
    "2041-2060".to_string()
}

fn default_reference_period() -> String {
    "1995-2014".to_string()
}

/// Naming of the response datasets of an ensemble
///
/// Datasets hold the difference between the future and reference period means,
/// named `{var}_{project}_{experiment}_{REGION}_{season}_{future}_{reference}_diff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSource {
    pub project: String,
    pub experiment: String,
    #[serde(default = "default_future_period")]
    pub future_period: String,
    #[serde(default = "default_reference_period")]
    pub reference_period: String,
}

impl ResponseSource {
    pub fn new(project: impl Into<String>, experiment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            experiment: experiment.into(),
            future_period: default_future_period(),
            reference_period: default_reference_period(),
        }
    }

    /// Source for the project and experiment of a catalog
    pub fn for_catalog(catalog: &EnsembleCatalog) -> Self {
        Self::new(catalog.project.clone(), catalog.experiment.clone())
    }

    pub fn with_periods(
        mut self,
        future_period: impl Into<String>,
        reference_period: impl Into<String>,
    ) -> Self {
        self.future_period = future_period.into();
        self.reference_period = reference_period.into();
        self
    }

    /// Dataset name for one variable in one scenario
    ///
    /// ```rust
    /// use climsips_core::response::ResponseVariable;
    /// use climsips_core::scenario::{ResponseSource, Scenario};
    ///
    /// let source = ResponseSource::new("CMIP6", "SSP585");
    /// let scenario: Scenario = "JJA_CEU".parse().unwrap();
    /// assert_eq!(
    ///     source.dataset_name(&scenario, ResponseVariable::Temperature),
    ///     "tas_CMIP6_SSP585_CEU_jja_2041-2060_1995-2014_diff"
    /// );
    /// ```
    pub fn dataset_name(&self, scenario: &Scenario, variable: ResponseVariable) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}_diff",
            variable.short_name(),
            self.project,
            self.experiment,
            scenario.region.code(),
            scenario.season.code().to_lowercase(),
            self.future_period,
            self.reference_period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{catalog, Ensemble};

    #[test]
    fn parse_reference_scenarios() {
        for key in ["JJA_CEU", "DJF_NEU", "DJF_CEU"] {
            let scenario: Scenario = key.parse().unwrap();
            assert_eq!(scenario.key(), key);
            assert!(Scenario::REFERENCE.contains(&scenario));
        }
    }

    #[test]
    fn parse_other_scenarios() {
        let scenario: Scenario = "son_med".parse().unwrap();
        assert_eq!(scenario, Scenario::new(Season::Son, Region::Med));
        assert_eq!(scenario.to_string(), "SON_MED");
    }

    #[test]
    fn unknown_scenarios() {
        for key in ["JJA", "JJA_XYZ", "ABC_CEU", "", "JJA-CEU"] {
            assert_eq!(
                key.parse::<Scenario>(),
                Err(ClimsipsError::UnknownScenario(key.to_string()))
            );
        }
    }

    #[test]
    fn scenario_serialization() {
        let scenario = Scenario::new(Season::Djf, Region::Neu);
        let json = serde_json::to_string(&scenario).unwrap();
        assert_eq!(json, "\"DJF_NEU\"");
        let parsed: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scenario);
    }

    #[test]
    fn dataset_names() {
        let cmip5 = ResponseSource::for_catalog(catalog(Ensemble::Cmip5).unwrap());
        let scenario: Scenario = "DJF_NEU".parse().unwrap();
        assert_eq!(
            cmip5.dataset_name(&scenario, ResponseVariable::Precipitation),
            "pr_CMIP5_rcp85_NEU_djf_2041-2060_1995-2014_diff"
        );

        let custom = ResponseSource::new("CMIP6", "SSP245").with_periods("2081-2100", "1850-1900");
        assert_eq!(
            custom.dataset_name(&scenario, ResponseVariable::Temperature),
            "tas_CMIP6_SSP245_NEU_djf_2081-2100_1850-1900_diff"
        );
    }

    #[test]
    fn source_defaults() {
        let source: ResponseSource =
            serde_json::from_str(r#"{"project": "CMIP6", "experiment": "SSP585"}"#).unwrap();
        assert_eq!(source, ResponseSource::new("CMIP6", "SSP585"));
    }
}
