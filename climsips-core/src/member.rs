//! Ensemble member identifiers
//!
//! A member is a single model run, keyed the way the CMIP archives name them:
//! the source model followed by the run indices, e.g. `ACCESS-ESM1-5-r10i1p1f1`
//! (CMIP6) or `CCSM4-r1i1p1` (CMIP5, no forcing index).
//!
//! ```rust
//! use climsips_core::member::Member;
//!
//! let member = Member::parse("CESM2-WACCM-r2i1p1f1").unwrap();
//! assert_eq!(member.source_model(), "CESM2-WACCM");
//!
//! let run = member.run_key().unwrap();
//! assert_eq!(run.realization, 2);
//! assert_eq!(run.forcing, Some(1));
//! ```

use crate::errors::{ClimsipsError, ClimsipsResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Run indices of a member: realization, initialization, physics and forcing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub realization: u32,
    pub initialization: u32,
    pub physics: u32,
    /// Absent for CMIP5 style identifiers
    pub forcing: Option<u32>,
}

impl RunKey {
    /// Parse a run key such as `r1i1p1f2` or `r3i1p1`
    pub fn parse(value: &str) -> Option<Self> {
        let (realization, rest) = take_index(value, 'r')?;
        let (initialization, rest) = take_index(rest, 'i')?;
        let (physics, rest) = take_index(rest, 'p')?;
        let forcing = if rest.is_empty() {
            None
        } else {
            let (forcing, rest) = take_index(rest, 'f')?;
            if !rest.is_empty() {
                return None;
            }
            Some(forcing)
        };

        Some(Self {
            realization,
            initialization,
            physics,
            forcing,
        })
    }
}

fn take_index(value: &str, tag: char) -> Option<(u32, &str)> {
    let rest = value.strip_prefix(tag)?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let index = rest[..end].parse().ok()?;
    Some((index, &rest[end..]))
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r{}i{}p{}",
            self.realization, self.initialization, self.physics
        )?;
        if let Some(forcing) = self.forcing {
            write!(f, "f{}", forcing)?;
        }
        Ok(())
    }
}

/// Identifier of a single ensemble member
///
/// Members are compared and ordered by their identifier string, so sorted
/// collections of members follow the same order as the archive listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    /// Wrap an identifier without validating it
    ///
    /// Useful for synthetic members that do not follow the archive naming.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse and validate a `<model>-r<N>i<N>p<N>[f<N>]` identifier
    pub fn parse(id: &str) -> ClimsipsResult<Self> {
        match id.rsplit_once('-') {
            Some((model, run)) if !model.is_empty() && RunKey::parse(run).is_some() => {
                Ok(Self(id.to_string()))
            }
            _ => Err(ClimsipsError::InvalidMember(id.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the model that produced this run
    ///
    /// For identifiers without a run key the whole identifier is returned.
    pub fn source_model(&self) -> &str {
        match self.0.rsplit_once('-') {
            Some((model, run)) if !model.is_empty() && RunKey::parse(run).is_some() => model,
            _ => &self.0,
        }
    }

    pub fn run_key(&self) -> Option<RunKey> {
        self.0
            .rsplit_once('-')
            .and_then(|(_, run)| RunKey::parse(run))
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Member {
    type Err = ClimsipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Member::parse(s)
    }
}

impl From<&str> for Member {
    fn from(value: &str) -> Self {
        Member::new(value)
    }
}

impl From<String> for Member {
    fn from(value: String) -> Self {
        Member::new(value)
    }
}

impl Borrow<str> for Member {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Member {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
