//! Candidate pool resolution
//!
//! The candidate pool is the set of members for which every selected predictor
//! field has data, i.e. the intersection of the per-field member catalogs.

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::member::Member;
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Intersect member catalogs
///
/// The result is sorted by member identifier and does not depend on the order of
/// the catalogs. An empty intersection is a valid result.
///
/// # Errors
///
/// Returns [`ClimsipsError::InvalidInput`] if no catalog is supplied, since the
/// intersection of nothing is undefined.
///
/// # Examples
///
/// ```rust
/// use climsips_core::member::Member;
/// use climsips_core::pool::common_members;
///
/// let tas = vec![Member::new("A"), Member::new("B"), Member::new("C")];
/// let pr = vec![Member::new("C"), Member::new("A")];
///
/// let pool = common_members([&tas, &pr]).unwrap();
/// assert_eq!(pool.into_iter().collect::<Vec<_>>(), vec![Member::new("A"), Member::new("C")]);
/// ```
pub fn common_members<'a, I, C>(catalogs: I) -> ClimsipsResult<BTreeSet<Member>>
where
    I: IntoIterator<Item = C>,
    C: IntoIterator<Item = &'a Member>,
{
    let mut catalogs = catalogs.into_iter();
    let first = catalogs.next().ok_or_else(|| {
        ClimsipsError::InvalidInput(
            "at least one member catalog is required to resolve a candidate pool".to_string(),
        )
    })?;

    let mut pool: BTreeSet<Member> = first.into_iter().cloned().collect();
    let mut n_catalogs = 1;
    for catalog in catalogs {
        let catalog: HashSet<&Member> = catalog.into_iter().collect();
        pool.retain(|member| catalog.contains(member));
        n_catalogs += 1;
    }

    debug!(
        "Intersected {} catalogs into a pool of {} members",
        n_catalogs,
        pool.len()
    );
    Ok(pool)
}
