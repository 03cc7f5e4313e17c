//! Member-indexed response series
//!
//! A [`ResponseSeries`] holds one scalar per member for a single climate response
//! variable, e.g. the change in seasonal mean temperature over a region between
//! a future and a reference period.

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub type FloatValue = f64;

/// Climate response variables spanning the spread plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseVariable {
    /// Near-surface air temperature change (`tas`)
    Temperature,
    /// Precipitation change (`pr`)
    Precipitation,
}

impl ResponseVariable {
    /// Short variable name used in dataset names
    pub fn short_name(&self) -> &'static str {
        match self {
            ResponseVariable::Temperature => "tas",
            ResponseVariable::Precipitation => "pr",
        }
    }
}

impl fmt::Display for ResponseVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ResponseVariable {
    type Err = ClimsipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tas" => Ok(ResponseVariable::Temperature),
            "pr" => Ok(ResponseVariable::Precipitation),
            _ => Err(ClimsipsError::InvalidInput(format!(
                "unknown response variable '{}', expected 'tas' or 'pr'",
                s
            ))),
        }
    }
}

/// One value per member for a named variable
///
/// Members are unique and keep the order in which they were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSeries {
    name: String,
    members: Vec<Member>,
    values: Array1<FloatValue>,
}

impl ResponseSeries {
    /// Create a series from parallel member and value arrays
    ///
    /// # Errors
    ///
    /// Returns [`ClimsipsError::InvalidInput`] if the lengths differ or a member
    /// appears more than once.
    pub fn new(
        name: impl Into<String>,
        members: Vec<Member>,
        values: Array1<FloatValue>,
    ) -> ClimsipsResult<Self> {
        let name = name.into();
        if members.len() != values.len() {
            return Err(ClimsipsError::InvalidInput(format!(
                "series '{}' has {} members but {} values",
                name,
                members.len(),
                values.len()
            )));
        }

        let mut seen = HashSet::with_capacity(members.len());
        if let Some(duplicate) = members.iter().find(|m| !seen.insert(*m)) {
            return Err(ClimsipsError::InvalidInput(format!(
                "member '{}' appears more than once in series '{}'",
                duplicate, name
            )));
        }

        Ok(Self {
            name,
            members,
            values,
        })
    }

    /// Create a series from `(member, value)` pairs
    pub fn from_pairs<I>(name: impl Into<String>, pairs: I) -> ClimsipsResult<Self>
    where
        I: IntoIterator<Item = (Member, FloatValue)>,
    {
        let (members, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self::new(name, members, Array1::from(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn values(&self) -> ArrayView1<'_, FloatValue> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Value for a member, if present
    ///
    /// Scans the members; use [`ResponseSeries::index`] for repeated lookups.
    pub fn get(&self, member: &str) -> Option<FloatValue> {
        self.members
            .iter()
            .position(|m| m.as_str() == member)
            .map(|i| self.values[i])
    }

    /// Member to value lookup table
    pub fn index(&self) -> HashMap<&str, FloatValue> {
        self.iter().map(|(m, v)| (m.as_str(), v)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Member, FloatValue)> {
        self.members.iter().zip(self.values.iter().copied())
    }

    /// Restrict the series to `members`, in the order given
    ///
    /// # Errors
    ///
    /// Returns [`ClimsipsError::MissingProjection`] naming the first requested
    /// member without a value.
    pub fn select<'a, I>(&self, members: I) -> ClimsipsResult<Self>
    where
        I: IntoIterator<Item = &'a Member>,
    {
        let index = self.index();
        let pairs = members
            .into_iter()
            .map(|member| {
                index
                    .get(member.as_str())
                    .map(|value| (member.clone(), *value))
                    .ok_or_else(|| ClimsipsError::MissingProjection {
                        member: member.to_string(),
                    })
            })
            .collect::<ClimsipsResult<Vec<_>>>()?;

        Self::from_pairs(self.name.clone(), pairs)
    }

    /// Same members, new values
    pub(crate) fn with_values(&self, values: Array1<FloatValue>) -> Self {
        debug_assert_eq!(values.len(), self.members.len());
        Self {
            name: self.name.clone(),
            members: self.members.clone(),
            values,
        }
    }
}
