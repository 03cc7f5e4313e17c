//! Field catalogs
//!
//! For each ensemble, which members have data for each predictor field. The
//! catalogs are static lookup tables embedded in the crate; they are read once
//! and never modified.
//!
//! Ensembles driving the regional climate model runs are described by a fixed
//! candidate pool instead of per-field catalogs.
//!
//! # Examples
//!
//! ```rust
//! use climsips_core::catalog::{catalog, Ensemble, Field};
//!
//! let cmip6 = catalog(Ensemble::Cmip6).unwrap();
//! let pool = cmip6.candidate_pool(&Field::DEFAULT_PREDICTORS).unwrap();
//! assert!(pool.iter().any(|m| m.as_str() == "MIROC6-r1i1p1f1"));
//! ```

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use crate::pool::common_members;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Predictor fields for which member availability is catalogued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Field {
    /// Sea surface temperature
    Tos,
    /// Shortwave cloud radiative effect
    Swcre,
    /// Precipitation
    Pr,
    /// Near-surface air temperature
    Tas,
    /// Sea level pressure
    Psl,
    /// Equilibrium climate sensitivity
    Ecs,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Tos,
        Field::Swcre,
        Field::Pr,
        Field::Tas,
        Field::Psl,
        Field::Ecs,
    ];

    /// Predictors selected unless configured otherwise
    pub const DEFAULT_PREDICTORS: [Field; 5] =
        [Field::Tos, Field::Swcre, Field::Pr, Field::Tas, Field::Ecs];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Tos => "tos",
            Field::Swcre => "swcre",
            Field::Pr => "pr",
            Field::Tas => "tas",
            Field::Psl => "psl",
            Field::Ecs => "ECS",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ClimsipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClimsipsError::UnknownField(s.to_string()))
    }
}

impl TryFrom<String> for Field {
    type Error = ClimsipsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Field> for String {
    fn from(value: Field) -> Self {
        value.name().to_string()
    }
}

/// Ensembles with embedded catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ensemble {
    Cmip6,
    Cmip5,
    /// CMIP5 models driving the CH2018 regional climate model runs
    Cmip5Rcm,
    /// CMIP6 models recommended for driving EURO-CORDEX regional runs
    Cmip6Rcm,
}

impl Ensemble {
    pub const ALL: [Ensemble; 4] = [
        Ensemble::Cmip6,
        Ensemble::Cmip5,
        Ensemble::Cmip5Rcm,
        Ensemble::Cmip6Rcm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Ensemble::Cmip6 => "CMIP6",
            Ensemble::Cmip5 => "CMIP5",
            Ensemble::Cmip5Rcm => "CMIP5_RCM",
            Ensemble::Cmip6Rcm => "CMIP6_RCM",
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ensemble {
    type Err = ClimsipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Ensemble::ALL
            .into_iter()
            .find(|ensemble| ensemble.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ClimsipsError::UnknownEnsemble(s.to_string()))
    }
}

impl TryFrom<String> for Ensemble {
    type Error = ClimsipsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ensemble> for String {
    fn from(value: Ensemble) -> Self {
        value.name().to_string()
    }
}

/// Member availability for one ensemble
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnsembleCatalog {
    /// Archive the members belong to, e.g. `CMIP6`
    pub project: String,
    /// Scenario experiment used for the response fields, e.g. `SSP585`
    pub experiment: String,
    #[serde(default)]
    fields: BTreeMap<Field, BTreeSet<Member>>,
    /// Fixed candidate pool, for ensembles chosen by hand
    #[serde(default)]
    members: Option<BTreeSet<Member>>,
}

impl EnsembleCatalog {
    /// Catalog with per-field member sets
    pub fn with_fields(
        project: impl Into<String>,
        experiment: impl Into<String>,
        fields: BTreeMap<Field, BTreeSet<Member>>,
    ) -> Self {
        Self {
            project: project.into(),
            experiment: experiment.into(),
            fields,
            members: None,
        }
    }

    /// Catalog with a fixed candidate pool
    pub fn with_members(
        project: impl Into<String>,
        experiment: impl Into<String>,
        members: BTreeSet<Member>,
    ) -> Self {
        Self {
            project: project.into(),
            experiment: experiment.into(),
            fields: BTreeMap::new(),
            members: Some(members),
        }
    }

    /// Parse a catalog from a TOML document
    pub fn from_toml_str(table: &str, content: &str) -> ClimsipsResult<Self> {
        toml::from_str(content).map_err(|e| ClimsipsError::DataTable {
            table: table.to_string(),
            details: e.to_string(),
        })
    }

    /// Members with data for `field`
    ///
    /// # Errors
    ///
    /// Returns [`ClimsipsError::InvalidInput`] if the field is not catalogued for this ensemble.
    pub fn field(&self, field: Field) -> ClimsipsResult<&BTreeSet<Member>> {
        self.fields.get(&field).ok_or_else(|| {
            ClimsipsError::InvalidInput(format!(
                "no member catalog for field '{}' in {}",
                field, self.project
            ))
        })
    }

    /// Catalogued fields, in a stable order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    /// Whether the candidate pool is fixed rather than resolved from field catalogs
    pub fn has_fixed_pool(&self) -> bool {
        self.members.is_some()
    }

    /// Members with data for every field in `predictors`
    ///
    /// For a fixed pool the predictors are not consulted.
    pub fn candidate_pool(&self, predictors: &[Field]) -> ClimsipsResult<BTreeSet<Member>> {
        let pool = match &self.members {
            Some(members) => members.clone(),
            None => {
                let catalogs = predictors
                    .iter()
                    .map(|field| self.field(*field))
                    .collect::<ClimsipsResult<Vec<_>>>()?;
                common_members(catalogs)?
            }
        };
        info!(
            "{} candidate pool has {} members",
            self.project,
            pool.len()
        );
        Ok(pool)
    }
}

static CATALOGS: LazyLock<ClimsipsResult<HashMap<Ensemble, EnsembleCatalog>>> =
    LazyLock::new(|| {
        [
            (
                Ensemble::Cmip6,
                "cmip6_catalog.toml",
                include_str!("../data/cmip6_catalog.toml"),
            ),
            (
                Ensemble::Cmip5,
                "cmip5_catalog.toml",
                include_str!("../data/cmip5_catalog.toml"),
            ),
            (
                Ensemble::Cmip5Rcm,
                "cmip5_rcm_catalog.toml",
                include_str!("../data/cmip5_rcm_catalog.toml"),
            ),
            (
                Ensemble::Cmip6Rcm,
                "cmip6_rcm_catalog.toml",
                include_str!("../data/cmip6_rcm_catalog.toml"),
            ),
        ]
        .into_iter()
        .map(
            |(ensemble, table, content)| -> ClimsipsResult<(Ensemble, EnsembleCatalog)> {
                Ok((ensemble, EnsembleCatalog::from_toml_str(table, content)?))
            },
        )
        .collect()
    });

/// Embedded catalog for an ensemble
pub fn catalog(ensemble: Ensemble) -> ClimsipsResult<&'static EnsembleCatalog> {
    match &*CATALOGS {
        Ok(catalogs) => catalogs.get(&ensemble).ok_or_else(|| {
            ClimsipsError::UnknownEnsemble(ensemble.name().to_string())
        }),
        Err(e) => Err(e.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert_eq!("ecs".parse::<Field>().unwrap(), Field::Ecs);
        assert_eq!(" TAS ".parse::<Field>().unwrap(), Field::Tas);
        assert_eq!(
            "rsds".parse::<Field>(),
            Err(ClimsipsError::UnknownField("rsds".to_string()))
        );
    }

    #[test]
    fn ensemble_names() {
        assert_eq!("CMIP6".parse::<Ensemble>().unwrap(), Ensemble::Cmip6);
        assert_eq!("cmip5-rcm".parse::<Ensemble>().unwrap(), Ensemble::Cmip5Rcm);
        assert_eq!(Ensemble::Cmip6Rcm.to_string(), "CMIP6_RCM");
        assert!(matches!(
            "CMIP7".parse::<Ensemble>(),
            Err(ClimsipsError::UnknownEnsemble(_))
        ));
    }

    #[test]
    fn field_serialization() {
        let json = serde_json::to_string(&Field::Ecs).unwrap();
        assert_eq!(json, "\"ECS\"");
        let field: Field = serde_json::from_str("\"swcre\"").unwrap();
        assert_eq!(field, Field::Swcre);
    }

    #[test]
    fn embedded_catalogs_parse() {
        for ensemble in Ensemble::ALL {
            catalog(ensemble).unwrap();
        }
        let cmip6 = catalog(Ensemble::Cmip6).unwrap();
        assert_eq!(cmip6.project, "CMIP6");
        assert_eq!(cmip6.experiment, "SSP585");
        assert_eq!(cmip6.fields().collect::<Vec<_>>(), Field::ALL.to_vec());
        assert!(!cmip6.has_fixed_pool());
        assert_eq!(cmip6.field(Field::Tos).unwrap().len(), 219);

        let rcm = catalog(Ensemble::Cmip5Rcm).unwrap();
        assert!(rcm.has_fixed_pool());
        assert_eq!(rcm.experiment, "rcp85");
    }

    #[test]
    fn embedded_members_are_archive_identifiers() {
        for ensemble in Ensemble::ALL {
            let catalog = catalog(ensemble).unwrap();
            let fixed = catalog.candidate_pool(&[]);
            let mut members: Vec<&Member> = catalog
                .fields()
                .flat_map(|field| catalog.field(field).unwrap().iter())
                .collect();
            if catalog.has_fixed_pool() {
                members.extend(fixed.as_ref().unwrap().iter());
            }
            assert!(!members.is_empty());
            for member in members {
                assert_eq!(Member::parse(member.as_str()).as_ref(), Ok(member));
            }
        }
    }

    #[test]
    fn default_pools() {
        let cmip6 = catalog(Ensemble::Cmip6)
            .unwrap()
            .candidate_pool(&Field::DEFAULT_PREDICTORS)
            .unwrap();
        assert_eq!(cmip6.len(), 197);

        let cmip5 = catalog(Ensemble::Cmip5)
            .unwrap()
            .candidate_pool(&Field::DEFAULT_PREDICTORS)
            .unwrap();
        assert_eq!(cmip5.len(), 68);
    }

    #[test]
    fn fixed_pool_ignores_predictors() {
        let rcm = catalog(Ensemble::Cmip5Rcm).unwrap();
        assert_eq!(rcm.candidate_pool(&[]).unwrap().len(), 11);
        assert_eq!(rcm.candidate_pool(&[Field::Psl]).unwrap().len(), 11);
    }

    #[test]
    fn resolved_pool_requires_predictors() {
        let cmip6 = catalog(Ensemble::Cmip6).unwrap();
        assert!(matches!(
            cmip6.candidate_pool(&[]),
            Err(ClimsipsError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_field_catalog() {
        let catalog = EnsembleCatalog::with_fields("TEST", "ssp", BTreeMap::new());
        assert!(matches!(
            catalog.field(Field::Tas),
            Err(ClimsipsError::InvalidInput(_))
        ));
    }

    #[test]
    fn adding_predictors_never_grows_pool() {
        let cmip6 = catalog(Ensemble::Cmip6).unwrap();
        let mut predictors = Vec::new();
        let mut previous = usize::MAX;
        for field in Field::ALL {
            predictors.push(field);
            let size = cmip6.candidate_pool(&predictors).unwrap().len();
            assert!(size <= previous);
            previous = size;
        }
    }
}
