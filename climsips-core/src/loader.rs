//! Loading of member response series
//!
//! The selection only needs, for a scenario, one member-indexed series per
//! response variable. Where those values come from is hidden behind
//! [`ResponseLoader`].

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use crate::response::{FloatValue, ResponseSeries, ResponseVariable};
use crate::scenario::{ResponseSource, Scenario};
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of raw (not yet normalised) response values
pub trait ResponseLoader {
    /// Values of `variable` for every member available in `scenario`
    fn load_response_series(
        &self,
        scenario: &Scenario,
        variable: ResponseVariable,
    ) -> ClimsipsResult<ResponseSeries>;
}

/// Loader backed by series held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    series: HashMap<(Scenario, ResponseVariable), ResponseSeries>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scenario: Scenario, variable: ResponseVariable, series: ResponseSeries) {
        self.series.insert((scenario, variable), series);
    }

    pub fn with_series(
        mut self,
        scenario: Scenario,
        variable: ResponseVariable,
        series: ResponseSeries,
    ) -> Self {
        self.insert(scenario, variable, series);
        self
    }
}

impl ResponseLoader for InMemoryLoader {
    fn load_response_series(
        &self,
        scenario: &Scenario,
        variable: ResponseVariable,
    ) -> ClimsipsResult<ResponseSeries> {
        self.series
            .get(&(*scenario, variable))
            .cloned()
            .ok_or_else(|| {
                ClimsipsError::InvalidInput(format!(
                    "no {} series loaded for scenario {}",
                    variable, scenario
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
struct ResponseFile {
    values: BTreeMap<String, FloatValue>,
}

/// Loader reading one TOML file per dataset
///
/// Files live at `<root>/<dataset name>.toml` and hold a `[values]` table of
/// member identifier to value. Identifiers must follow the archive naming
/// `<model>-r<N>i<N>p<N>[f<N>]`:
///
/// ```toml
/// [values]
/// "ACCESS-CM2-r1i1p1f1" = 2.71
/// "ACCESS-CM2-r2i1p1f1" = 2.43
/// ```
#[derive(Debug, Clone)]
pub struct TomlFileLoader {
    root: PathBuf,
    source: ResponseSource,
}

impl TomlFileLoader {
    pub fn new(root: impl Into<PathBuf>, source: ResponseSource) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> &ResponseSource {
        &self.source
    }

    /// Path of the dataset for a scenario and variable
    pub fn path(&self, scenario: &Scenario, variable: ResponseVariable) -> PathBuf {
        self.root
            .join(format!("{}.toml", self.source.dataset_name(scenario, variable)))
    }
}

impl ResponseLoader for TomlFileLoader {
    fn load_response_series(
        &self,
        scenario: &Scenario,
        variable: ResponseVariable,
    ) -> ClimsipsResult<ResponseSeries> {
        let path = self.path(scenario, variable);
        debug!("Loading {} for {} from {}", variable, scenario, path.display());

        let content = fs::read_to_string(&path).map_err(|e| ClimsipsError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        let file: ResponseFile = toml::from_str(&content).map_err(|e| ClimsipsError::DataTable {
            table: path.display().to_string(),
            details: e.to_string(),
        })?;

        let pairs = file
            .values
            .into_iter()
            .map(|(member, value)| Ok((Member::parse(&member)?, value)))
            .collect::<ClimsipsResult<Vec<_>>>()?;
        ResponseSeries::from_pairs(variable.short_name(), pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Region, Season};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("climsips-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn in_memory() {
        let scenario = Scenario::new(Season::Jja, Region::Ceu);
        let series =
            ResponseSeries::from_pairs("tas", [(Member::new("A"), 1.0), (Member::new("B"), 2.0)])
                .unwrap();
        let loader =
            InMemoryLoader::new().with_series(scenario, ResponseVariable::Temperature, series.clone());

        assert_eq!(
            loader
                .load_response_series(&scenario, ResponseVariable::Temperature)
                .unwrap(),
            series
        );
        assert!(matches!(
            loader.load_response_series(&scenario, ResponseVariable::Precipitation),
            Err(ClimsipsError::InvalidInput(_))
        ));
    }

    #[test]
    fn toml_file() {
        let dir = scratch_dir("toml-file");
        let loader = TomlFileLoader::new(&dir, ResponseSource::new("CMIP6", "SSP585"));
        let scenario = Scenario::new(Season::Djf, Region::Ceu);
        let path = loader.path(&scenario, ResponseVariable::Precipitation);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "pr_CMIP6_SSP585_CEU_djf_2041-2060_1995-2014_diff.toml"
        );
        fs::write(
            &path,
            r#"
[values]
"MIROC6-r2i1p1f1" = -0.25
"MIROC6-r1i1p1f1" = 0.5
"#,
        )
        .unwrap();

        let series = loader
            .load_response_series(&scenario, ResponseVariable::Precipitation)
            .unwrap();
        assert_eq!(series.name(), "pr");
        assert_eq!(series.len(), 2);
        assert_eq!(series.get("MIROC6-r1i1p1f1"), Some(0.5));
        assert_eq!(series.get("MIROC6-r2i1p1f1"), Some(-0.25));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file() {
        let dir = scratch_dir("missing-file");
        let loader = TomlFileLoader::new(&dir, ResponseSource::new("CMIP5", "rcp85"));
        let scenario = Scenario::new(Season::Jja, Region::Ceu);
        assert!(matches!(
            loader.load_response_series(&scenario, ResponseVariable::Temperature),
            Err(ClimsipsError::Io { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_member() {
        let dir = scratch_dir("malformed-member");
        let loader = TomlFileLoader::new(&dir, ResponseSource::new("CMIP5", "rcp85"));
        let scenario = Scenario::new(Season::Djf, Region::Neu);
        fs::write(
            loader.path(&scenario, ResponseVariable::Precipitation),
            "[values]\n\"CanESM2-r1i1p1\" = 0.5\n\"CanESM2\" = 0.25\n",
        )
        .unwrap();
        assert_eq!(
            loader.load_response_series(&scenario, ResponseVariable::Precipitation),
            Err(ClimsipsError::InvalidMember("CanESM2".to_string()))
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_file() {
        let dir = scratch_dir("malformed-file");
        let loader = TomlFileLoader::new(&dir, ResponseSource::new("CMIP5", "rcp85"));
        let scenario = Scenario::new(Season::Jja, Region::Ceu);
        fs::write(
            loader.path(&scenario, ResponseVariable::Temperature),
            "[values]\n\"A-r1i1p1\" = \"warm\"\n",
        )
        .unwrap();
        assert!(matches!(
            loader.load_response_series(&scenario, ResponseVariable::Temperature),
            Err(ClimsipsError::DataTable { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
