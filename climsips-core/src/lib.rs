//! Spread-maximising selection of climate model ensemble members
//!
//! Members of a multi-model ensemble are placed in a plane of normalised
//! temperature and precipitation change for a season and region. A subset is then
//! chosen greedily so that it covers as much of that plane as possible while
//! keeping one run per source model.
pub mod catalog;
pub mod loader;
pub mod member;
pub mod normalize;
pub mod plan;
pub mod pool;
pub mod projection;
pub mod python;
pub mod response;
pub mod scenario;
pub mod selector;
pub mod workflow;

pub mod errors;
