//! Members projected onto the normalised (temperature, precipitation) plane

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use crate::normalize::normalize_spread_component;
use crate::response::{FloatValue, ResponseSeries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of a member in the spread plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Normalised temperature change
    pub x: FloatValue,
    /// Normalised precipitation change
    pub y: FloatValue,
}

impl Point {
    pub const fn new(x: FloatValue, y: FloatValue) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> FloatValue {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(FloatValue, FloatValue)> for Point {
    fn from((x, y): (FloatValue, FloatValue)) -> Self {
        Self::new(x, y)
    }
}

/// Mapping from member to its point in the spread plane
///
/// A projection is computed once for a scenario and candidate pool and is not
/// modified by the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    points: HashMap<Member, Point>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a projection by normalising raw temperature and precipitation changes
    ///
    /// Both series are standardised over their own members, which must be the
    /// same set.
    pub fn from_series(
        temperature: &ResponseSeries,
        precipitation: &ResponseSeries,
    ) -> ClimsipsResult<Self> {
        let temperature = normalize_spread_component(temperature)?;
        let precipitation = normalize_spread_component(precipitation)?;
        Self::from_normalized(&temperature, &precipitation)
    }

    /// Pair already normalised series into points
    ///
    /// # Errors
    ///
    /// Returns [`ClimsipsError::MissingProjection`] for the first member present in
    /// only one of the series.
    pub fn from_normalized(
        temperature: &ResponseSeries,
        precipitation: &ResponseSeries,
    ) -> ClimsipsResult<Self> {
        let x_index = temperature.index();
        if let Some(member) = precipitation
            .members()
            .iter()
            .find(|m| !x_index.contains_key(m.as_str()))
        {
            return Err(ClimsipsError::MissingProjection {
                member: member.to_string(),
            });
        }

        let y_index = precipitation.index();
        temperature
            .iter()
            .map(|(member, x)| -> ClimsipsResult<(Member, Point)> {
                let y = y_index.get(member.as_str()).copied().ok_or_else(|| {
                    ClimsipsError::MissingProjection {
                        member: member.to_string(),
                    }
                })?;
                Ok((member.clone(), Point::new(x, y)))
            })
            .collect()
    }

    pub fn insert(&mut self, member: Member, point: Point) -> Option<Point> {
        self.points.insert(member, point)
    }

    pub fn get(&self, member: &str) -> Option<Point> {
        self.points.get(member).copied()
    }

    /// Point for a member
    ///
    /// # Errors
    ///
    /// * [`ClimsipsError::MissingProjection`] if the member has no point
    /// * [`ClimsipsError::InvalidInput`] if a coordinate is NaN or infinite
    pub fn point(&self, member: &Member) -> ClimsipsResult<Point> {
        let point = self
            .get(member.as_str())
            .ok_or_else(|| ClimsipsError::MissingProjection {
                member: member.to_string(),
            })?;
        if !point.is_finite() {
            return Err(ClimsipsError::InvalidInput(format!(
                "member '{}' has a non-finite point ({}, {})",
                member, point.x, point.y
            )));
        }
        Ok(point)
    }

    pub fn contains(&self, member: &str) -> bool {
        self.points.contains_key(member)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Member, &Point)> {
        self.points.iter()
    }
}

impl FromIterator<(Member, Point)> for Projection {
    fn from_iter<T: IntoIterator<Item = (Member, Point)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
