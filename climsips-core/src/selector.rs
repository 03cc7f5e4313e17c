//! Spread-maximising member selection
//!
//! Starting from a seed set of fixed members, one member is added from each
//! sibling group in turn: the member whose nearest already-selected neighbour in
//! the (temperature, precipitation) plane is farthest away.
//!
//! For a group $g$ and the current selection $S$:
//!
//! $$m^* = \operatorname{argmax}_{m \in g} \min_{s \in S} \lVert p_m - p_s \rVert$$
//!
//! Ties go to the member scanned first: a later candidate replaces the current
//! best only if its distance is strictly greater. Group order matters, since later
//! groups compete against a larger selection.
//!
//! # Examples
//!
//! ```rust
//! use climsips_core::member::Member;
//! use climsips_core::plan::{ModelGroup, SelectionPlan};
//! use climsips_core::projection::{Point, Projection};
//! use climsips_core::selector::select_spread_maximizing_members;
//!
//! let projection: Projection = [
//!     ("A", (0.0, 0.0)),
//!     ("B", (10.0, 10.0)),
//!     ("C", (1.0, 1.0)),
//! ]
//! .into_iter()
//! .map(|(m, p)| (Member::new(m), Point::from(p)))
//! .collect();
//!
//! let plan = SelectionPlan::new(
//!     vec![Member::new("A")],
//!     vec![ModelGroup::new("X", vec![Member::new("C"), Member::new("B")])],
//! );
//!
//! let selection = select_spread_maximizing_members(&plan, &projection).unwrap();
//! assert_eq!(selection.members(), vec![Member::new("A"), Member::new("B")]);
//! ```

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use crate::plan::{ModelGroup, SelectionPlan};
use crate::projection::{Point, Projection};
use crate::response::FloatValue;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Why a member is part of the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Origin {
    /// Seeded as a fixed member
    Fixed,
    /// Chosen from a sibling group
    Group {
        model: String,
        /// Distance to the nearest member selected before it
        nearest_distance: FloatValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedMember {
    pub member: Member,
    pub point: Point,
    pub origin: Origin,
}

/// Members selected so far, in insertion order
///
/// A selection only grows. It is passed by value through each selection step and
/// returned extended by one member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    entries: Vec<SelectedMember>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SelectedMember] {
        &self.entries
    }

    /// Selected member identifiers in insertion order
    pub fn members(&self) -> Vec<Member> {
        self.entries.iter().map(|e| e.member.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.entries.iter().any(|e| e.member.as_str() == member)
    }

    /// Distance from `point` to the closest selected member
    ///
    /// `None` if nothing has been selected yet.
    pub fn nearest_distance(&self, point: &Point) -> Option<FloatValue> {
        self.entries
            .iter()
            .map(|e| point.distance(&e.point))
            .fold(None, |nearest, d| match nearest {
                Some(current) if current <= d => Some(current),
                _ => Some(d),
            })
    }

    fn push(mut self, entry: SelectedMember) -> Self {
        self.entries.push(entry);
        self
    }
}

impl IntoIterator for Selection {
    type Item = SelectedMember;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Seed a selection with the fixed members
///
/// # Errors
///
/// * [`ClimsipsError::InvalidInput`] if a member is listed twice
/// * [`ClimsipsError::MissingProjection`] if a member has no point
pub fn seed_selection(fixed: &[Member], projection: &Projection) -> ClimsipsResult<Selection> {
    fixed.iter().try_fold(Selection::new(), |selection, member| {
        if selection.contains(member.as_str()) {
            return Err(ClimsipsError::InvalidInput(format!(
                "fixed member '{}' is listed more than once",
                member
            )));
        }
        let point = projection.point(member)?;
        Ok(selection.push(SelectedMember {
            member: member.clone(),
            point,
            origin: Origin::Fixed,
        }))
    })
}

/// Add the spread-maximising member of `group` to `selection`
///
/// Every candidate is scored by the distance to its nearest selected member and
/// the highest score wins, the first candidate scanned winning ties. With an
/// empty selection every score is infinite, so the first candidate is chosen.
///
/// # Errors
///
/// * [`ClimsipsError::EmptyGroup`] if the group has no members
/// * [`ClimsipsError::MissingProjection`] if a candidate has no point
/// * [`ClimsipsError::InvalidInput`] if a candidate is already selected
pub fn select_spread_maximizing_member(
    group: &ModelGroup,
    projection: &Projection,
    selection: Selection,
) -> ClimsipsResult<Selection> {
    if group.is_empty() {
        return Err(ClimsipsError::EmptyGroup {
            group: group.model.clone(),
        });
    }

    let mut best: Option<(&Member, Point, FloatValue)> = None;
    for member in &group.members {
        if selection.contains(member.as_str()) {
            return Err(ClimsipsError::InvalidInput(format!(
                "member '{}' of group '{}' is already selected",
                member, group.model
            )));
        }
        let point = projection.point(member)?;
        let distance = selection
            .nearest_distance(&point)
            .unwrap_or(FloatValue::INFINITY);

        let replace = match best {
            Some((_, _, best_distance)) => distance > best_distance,
            None => true,
        };
        if replace {
            best = Some((member, point, distance));
        }
    }

    let (member, point, distance) = best.ok_or_else(|| ClimsipsError::EmptyGroup {
        group: group.model.clone(),
    })?;
    debug!(
        "Selected {} from {} ({} candidates), nearest selected member at {:.4}",
        member,
        group.model,
        group.len(),
        distance
    );

    Ok(selection.push(SelectedMember {
        member: member.clone(),
        point,
        origin: Origin::Group {
            model: group.model.clone(),
            nearest_distance: distance,
        },
    }))
}

/// Run the full selection for a plan
///
/// The plan and the projection coverage are checked before any member is
/// selected, so the call either returns the complete selection of
/// `plan.selection_size()` members or an error.
///
/// # Errors
///
/// * [`ClimsipsError::InvalidInput`] for an empty plan, repeated members or a
///   non-finite point
/// * [`ClimsipsError::EmptyGroup`] for a group without members
/// * [`ClimsipsError::MissingProjection`] for a member without a point
pub fn select_spread_maximizing_members(
    plan: &SelectionPlan,
    projection: &Projection,
) -> ClimsipsResult<Selection> {
    plan.validate()?;
    for member in plan.members() {
        projection.point(member)?;
    }

    let selection = seed_selection(&plan.fixed, projection)?;
    let selection = plan
        .groups
        .iter()
        .try_fold(selection, |selection, group| {
            select_spread_maximizing_member(group, projection, selection)
        })?;

    info!(
        "Selected {} members ({} fixed, {} from groups)",
        selection.len(),
        plan.fixed.len(),
        plan.groups.len()
    );
    debug_assert_eq!(selection.len(), plan.selection_size());
    Ok(selection)
}
