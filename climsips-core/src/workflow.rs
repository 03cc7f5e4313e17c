//! End-to-end selection for an ensemble and scenario
//!
//! Ties together the candidate pool of an ensemble, the response data of a
//! scenario and the selection plan:
//!
//! 1. resolve the candidate pool from the predictor fields
//! 2. load the temperature and precipitation responses and restrict them to the pool
//! 3. standardise both over the pool to obtain the projection
//! 4. restrict the curated plan (or one derived from the pool) to the pool
//! 5. run the spread-maximising selection

use crate::catalog::{catalog, Ensemble, Field};
use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::loader::{ResponseLoader, TomlFileLoader};
use crate::member::Member;
use crate::plan::{plan, SelectionPlan};
use crate::projection::Projection;
use crate::response::ResponseVariable;
use crate::scenario::{ResponseSource, Scenario};
use crate::selector::{select_spread_maximizing_members, Selection};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

fn default_predictors() -> Vec<Field> {
    Field::DEFAULT_PREDICTORS.to_vec()
}

/// Settings of one selection run
///
/// ```toml
/// ensemble = "CMIP6"
/// scenario = "JJA_CEU"
/// predictors = ["tos", "pr", "tas"]
/// data_dir = "data/responses"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub ensemble: Ensemble,
    pub scenario: Scenario,
    #[serde(default = "default_predictors")]
    pub predictors: Vec<Field>,
    /// Directory holding the response files
    pub data_dir: PathBuf,
    /// Overrides the default future period of the response files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_period: Option<String>,
    /// Overrides the default reference period of the response files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_period: Option<String>,
}

impl SelectionConfig {
    pub fn new(ensemble: Ensemble, scenario: Scenario, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            ensemble,
            scenario,
            predictors: default_predictors(),
            data_dir: data_dir.into(),
            future_period: None,
            reference_period: None,
        }
    }

    pub fn from_toml_str(content: &str) -> ClimsipsResult<Self> {
        toml::from_str(content).map_err(|e| ClimsipsError::DataTable {
            table: "selection config".to_string(),
            details: e.to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> ClimsipsResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ClimsipsError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Naming of the response files of the configured ensemble
    pub fn response_source(&self) -> ClimsipsResult<ResponseSource> {
        let mut source = ResponseSource::for_catalog(catalog(self.ensemble)?);
        if let Some(period) = &self.future_period {
            source.future_period = period.clone();
        }
        if let Some(period) = &self.reference_period {
            source.reference_period = period.clone();
        }
        Ok(source)
    }
}

/// Plan used for an ensemble, restricted to `pool`
///
/// A curated plan must cover the pool: its fixed members and at least one run
/// of each group have to be candidates.
fn plan_for_pool(
    ensemble: Ensemble,
    pool: &BTreeSet<Member>,
) -> ClimsipsResult<SelectionPlan> {
    Ok(match plan(ensemble)? {
        Some(curated) => {
            curated.check_covered_by(pool)?;
            curated.restricted_to(pool)
        }
        None => {
            info!("No curated plan for {}, deriving one from the pool", ensemble);
            SelectionPlan::from_pool(pool)
        }
    })
}

/// Select the spread-maximising members of an ensemble for one scenario
pub fn spread_maximizing_members<L>(
    ensemble: Ensemble,
    scenario: &Scenario,
    predictors: &[Field],
    loader: &L,
) -> ClimsipsResult<Selection>
where
    L: ResponseLoader + ?Sized,
{
    info!("Selecting {} members for {}", ensemble, scenario);
    let pool = catalog(ensemble)?.candidate_pool(predictors)?;

    let temperature = loader
        .load_response_series(scenario, ResponseVariable::Temperature)?
        .select(&pool)?;
    let precipitation = loader
        .load_response_series(scenario, ResponseVariable::Precipitation)?
        .select(&pool)?;
    let projection = Projection::from_series(&temperature, &precipitation)?;

    let plan = plan_for_pool(ensemble, &pool)?;
    select_spread_maximizing_members(&plan, &projection)
}

/// Run a configured selection, reading responses from `config.data_dir`
pub fn run(config: &SelectionConfig) -> ClimsipsResult<Selection> {
    let loader = TomlFileLoader::new(&config.data_dir, config.response_source()?);
    run_with_loader(config, &loader)
}

/// Run a configured selection with responses from `loader`
pub fn run_with_loader<L>(config: &SelectionConfig, loader: &L) -> ClimsipsResult<Selection>
where
    L: ResponseLoader + ?Sized,
{
    spread_maximizing_members(
        config.ensemble,
        &config.scenario,
        &config.predictors,
        loader,
    )
}
