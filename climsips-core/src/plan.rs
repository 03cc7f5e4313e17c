//! Selection plans
//!
//! A plan fixes the inputs of the spread-maximising selection that are design
//! choices rather than data: the members that are always included, and the
//! order in which the sibling groups of multi-run models are processed.
//!
//! Curated plans for the reference ensembles are embedded as TOML tables:
//!
//! ```toml
//! fixed = ["CNRM-CM5-r1i1p1", "CanESM2-r1i1p1"]
//!
//! [[groups]]
//! model = "EC-EARTH"
//! members = ["EC-EARTH-r12i1p1", "EC-EARTH-r1i1p1"]
//! ```

use crate::catalog::Ensemble;
use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

/// Runs of one source model, in scan order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGroup {
    /// Label used in logs and errors, normally the source model name
    pub model: String,
    pub members: Vec<Member>,
    /// Free-form remark on how the group was curated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ModelGroup {
    pub fn new(model: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            model: model.into(),
            members,
            note: None,
        }
    }

    /// Group labelled after the source model of its first member
    pub fn from_members(members: Vec<Member>) -> Self {
        let model = members
            .first()
            .map(|m| m.source_model().to_string())
            .unwrap_or_default();
        Self::new(model, members)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Fixed members plus the ordered sibling groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionPlan {
    #[serde(default)]
    pub fixed: Vec<Member>,
    #[serde(default)]
    pub groups: Vec<ModelGroup>,
}

impl SelectionPlan {
    pub fn new(fixed: Vec<Member>, groups: Vec<ModelGroup>) -> Self {
        Self { fixed, groups }
    }

    /// Derive a plan from a candidate pool
    ///
    /// Members are partitioned by source model, keeping the order in which the
    /// models first appear in the pool. Models with a single run are fixed; the
    /// others become groups.
    pub fn from_pool<'a, I>(pool: I) -> Self
    where
        I: IntoIterator<Item = &'a Member>,
    {
        let mut order: Vec<&str> = Vec::new();
        let mut by_model: HashMap<&str, Vec<Member>> = HashMap::new();
        for member in pool {
            let model = member.source_model();
            by_model
                .entry(model)
                .or_insert_with(|| {
                    order.push(model);
                    Vec::new()
                })
                .push(member.clone());
        }

        let mut plan = SelectionPlan::default();
        for model in order {
            let mut members = by_model.remove(model).unwrap_or_default();
            if members.len() == 1 {
                plan.fixed.append(&mut members);
            } else {
                plan.groups.push(ModelGroup::new(model, members));
            }
        }
        plan
    }

    /// Drop every member that is not in `pool`
    ///
    /// Groups left without members are dropped too, so the restricted plan can
    /// select fewer members; see [`SelectionPlan::check_covered_by`]. Each removal
    /// is logged.
    pub fn restricted_to(&self, pool: &BTreeSet<Member>) -> Self {
        let fixed: Vec<Member> = self
            .fixed
            .iter()
            .filter(|m| {
                let keep = pool.contains(*m);
                if !keep {
                    warn!("Fixed member {} is not in the candidate pool", m);
                }
                keep
            })
            .cloned()
            .collect();

        let groups = self
            .groups
            .iter()
            .filter_map(|group| {
                let members: Vec<Member> = group
                    .members
                    .iter()
                    .filter(|m| pool.contains(*m))
                    .cloned()
                    .collect();
                if members.len() < group.members.len() {
                    warn!(
                        "Dropped {} of {} members of group {} outside the candidate pool",
                        group.members.len() - members.len(),
                        group.members.len(),
                        group.model
                    );
                }
                if members.is_empty() {
                    warn!("Group {} has no members in the candidate pool", group.model);
                    return None;
                }
                Some(ModelGroup {
                    model: group.model.clone(),
                    members,
                    note: group.note.clone(),
                })
            })
            .collect();

        Self { fixed, groups }
    }

    /// Check that a curated plan can run on `pool`
    ///
    /// Every fixed member must be in the pool and every group must keep at least
    /// one member, so that [`SelectionPlan::restricted_to`] preserves the
    /// selection size.
    ///
    /// # Errors
    ///
    /// * [`ClimsipsError::MissingProjection`] for the first fixed member outside the pool
    /// * [`ClimsipsError::EmptyGroup`] for the first group with no member in the pool
    pub fn check_covered_by(&self, pool: &BTreeSet<Member>) -> ClimsipsResult<()> {
        if let Some(member) = self.fixed.iter().find(|m| !pool.contains(*m)) {
            return Err(ClimsipsError::MissingProjection {
                member: member.to_string(),
            });
        }
        if let Some(group) = self
            .groups
            .iter()
            .find(|g| !g.members.iter().any(|m| pool.contains(m)))
        {
            return Err(ClimsipsError::EmptyGroup {
                group: group.model.clone(),
            });
        }
        Ok(())
    }

    /// All members referenced by the plan, fixed members first
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.fixed
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.members.iter()))
    }

    /// Number of members a selection with this plan produces
    pub fn selection_size(&self) -> usize {
        self.fixed.len() + self.groups.len()
    }

    /// Check the structure of the plan
    ///
    /// # Errors
    ///
    /// * [`ClimsipsError::InvalidInput`] if the plan is empty or a member is referenced twice
    /// * [`ClimsipsError::EmptyGroup`] if a group has no members
    pub fn validate(&self) -> ClimsipsResult<()> {
        if self.fixed.is_empty() && self.groups.is_empty() {
            return Err(ClimsipsError::InvalidInput(
                "selection plan has neither fixed members nor groups".to_string(),
            ));
        }
        if let Some(group) = self.groups.iter().find(|g| g.is_empty()) {
            return Err(ClimsipsError::EmptyGroup {
                group: group.model.clone(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.members().find(|m| !seen.insert(*m)) {
            return Err(ClimsipsError::InvalidInput(format!(
                "member '{}' is referenced more than once in the selection plan",
                duplicate
            )));
        }
        Ok(())
    }

    /// Parse a plan from a TOML document
    pub fn from_toml_str(table: &str, content: &str) -> ClimsipsResult<Self> {
        toml::from_str(content).map_err(|e| ClimsipsError::DataTable {
            table: table.to_string(),
            details: e.to_string(),
        })
    }
}

static PLANS: LazyLock<ClimsipsResult<HashMap<Ensemble, SelectionPlan>>> = LazyLock::new(|| {
    [
        (
            Ensemble::Cmip6,
            "cmip6_plan.toml",
            include_str!("../data/cmip6_plan.toml"),
        ),
        (
            Ensemble::Cmip5,
            "cmip5_plan.toml",
            include_str!("../data/cmip5_plan.toml"),
        ),
        (
            Ensemble::Cmip5Rcm,
            "cmip5_rcm_plan.toml",
            include_str!("../data/cmip5_rcm_plan.toml"),
        ),
    ]
    .into_iter()
    .map(
        |(ensemble, table, content)| -> ClimsipsResult<(Ensemble, SelectionPlan)> {
            Ok((ensemble, SelectionPlan::from_toml_str(table, content)?))
        },
    )
    .collect()
});

/// Curated plan for an ensemble
///
/// Returns `Ok(None)` for ensembles without a curated plan; use
/// [`SelectionPlan::from_pool`] for those.
pub fn plan(ensemble: Ensemble) -> ClimsipsResult<Option<&'static SelectionPlan>> {
    match &*PLANS {
        Ok(plans) => Ok(plans.get(&ensemble)),
        Err(e) => Err(e.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[&str]) -> Vec<Member> {
        ids.iter().map(|id| Member::new(*id)).collect()
    }

    #[test]
    fn parse_plan() {
        let plan = SelectionPlan::from_toml_str(
            "test",
            r#"
fixed = ["X-r1i1p1"]

[[groups]]
model = "Y"
members = ["Y-r1i1p1", "Y-r2i1p1"]
note = "curated"
"#,
        )
        .unwrap();
        assert_eq!(plan.fixed, members(&["X-r1i1p1"]));
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].model, "Y");
        assert_eq!(plan.groups[0].note.as_deref(), Some("curated"));
        assert_eq!(plan.selection_size(), 2);
    }

    #[test]
    fn malformed_plan() {
        let result = SelectionPlan::from_toml_str("broken", "fixed = 3");
        assert!(matches!(
            result,
            Err(ClimsipsError::DataTable { table, .. }) if table == "broken"
        ));
    }

    #[test]
    fn from_pool_partitions_by_model() {
        let pool = members(&[
            "A-r1i1p1f1",
            "B-r1i1p1f1",
            "B-r2i1p1f1",
            "C-r1i1p1f1",
            "B-r3i1p1f1",
        ]);
        let plan = SelectionPlan::from_pool(&pool);
        assert_eq!(plan.fixed, members(&["A-r1i1p1f1", "C-r1i1p1f1"]));
        assert_eq!(
            plan.groups,
            vec![ModelGroup::new(
                "B",
                members(&["B-r1i1p1f1", "B-r2i1p1f1", "B-r3i1p1f1"])
            )]
        );
    }

    #[test]
    fn restricted_to_pool() {
        let plan = SelectionPlan::new(
            members(&["A", "Z"]),
            vec![
                ModelGroup::new("B", members(&["B1", "B2"])),
                ModelGroup::new("Y", members(&["Y1"])),
            ],
        );
        let pool: BTreeSet<Member> = members(&["A", "B2"]).into_iter().collect();
        let restricted = plan.restricted_to(&pool);
        assert_eq!(restricted.fixed, members(&["A"]));
        assert_eq!(restricted.groups, vec![ModelGroup::new("B", members(&["B2"]))]);
    }

    #[test]
    fn covered_by_pool() {
        let plan = SelectionPlan::new(
            members(&["A"]),
            vec![
                ModelGroup::new("B", members(&["B1", "B2"])),
                ModelGroup::new("C", members(&["C1"])),
            ],
        );
        let pool = |ids: &[&str]| -> BTreeSet<Member> { members(ids).into_iter().collect() };

        plan.check_covered_by(&pool(&["A", "B2", "C1"])).unwrap();
        assert_eq!(
            plan.check_covered_by(&pool(&["B1", "C1"])),
            Err(ClimsipsError::MissingProjection {
                member: "A".to_string()
            })
        );
        assert_eq!(
            plan.check_covered_by(&pool(&["A", "B1"])),
            Err(ClimsipsError::EmptyGroup {
                group: "C".to_string()
            })
        );
    }

    #[test]
    fn validate_empty_plan() {
        let result = SelectionPlan::default().validate();
        assert!(matches!(result, Err(ClimsipsError::InvalidInput(_))));
    }

    #[test]
    fn validate_empty_group() {
        let plan = SelectionPlan::new(members(&["A"]), vec![ModelGroup::new("B", vec![])]);
        assert_eq!(
            plan.validate(),
            Err(ClimsipsError::EmptyGroup {
                group: "B".to_string()
            })
        );
    }

    #[test]
    fn validate_duplicate_member() {
        let plan = SelectionPlan::new(
            members(&["A"]),
            vec![ModelGroup::new("B", members(&["B1", "A"]))],
        );
        assert!(matches!(plan.validate(), Err(ClimsipsError::InvalidInput(_))));
    }

    #[test]
    fn model_group_from_members() {
        let group = ModelGroup::from_members(members(&["MIROC6-r2i1p1f1", "MIROC6-r1i1p1f1"]));
        assert_eq!(group.model, "MIROC6");
        assert_eq!(ModelGroup::from_members(vec![]).model, "");
    }

    #[test]
    fn embedded_plans() {
        let cmip6 = plan(Ensemble::Cmip6).unwrap().unwrap();
        assert_eq!(cmip6.fixed.len(), 14);
        assert_eq!(cmip6.groups.first().unwrap().model, "ACCESS-CM2");
        assert_eq!(cmip6.groups.last().unwrap().model, "UKESM1-0-LL");
        cmip6.validate().unwrap();

        let cmip5 = plan(Ensemble::Cmip5).unwrap().unwrap();
        assert_eq!(cmip5.fixed.len(), 15);
        assert_eq!(cmip5.groups.len(), 11);
        assert!(cmip5.groups.iter().any(|g| g.note.is_some()));
        cmip5.validate().unwrap();

        let rcm = plan(Ensemble::Cmip5Rcm).unwrap().unwrap();
        assert_eq!(rcm.selection_size(), 8);
        rcm.validate().unwrap();

        assert!(plan(Ensemble::Cmip6Rcm).unwrap().is_none());
    }

    #[test]
    fn embedded_groups_are_siblings() {
        for ensemble in [Ensemble::Cmip6, Ensemble::Cmip5, Ensemble::Cmip5Rcm] {
            let plan = plan(ensemble).unwrap().unwrap();
            for group in &plan.groups {
                assert!(
                    group.members.iter().all(|m| m.source_model() == group.model),
                    "group {} mixes source models",
                    group.model
                );
            }
        }
    }
}
