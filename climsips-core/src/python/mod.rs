use crate::errors::ClimsipsError;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::{pymodule, Bound, PyResult};

mod selection;

pub use selection::PySelectedMember;

impl From<ClimsipsError> for PyErr {
    fn from(e: ClimsipsError) -> Self {
        match e {
            ClimsipsError::Io { .. } => PyIOError::new_err(e.to_string()),
            _ => PyValueError::new_err(e.to_string()),
        }
    }
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySelectedMember>()?;
    m.add_function(wrap_pyfunction!(selection::normalize_spread_component, m)?)?;
    m.add_function(wrap_pyfunction!(selection::common_members, m)?)?;
    m.add_function(wrap_pyfunction!(selection::candidate_pool, m)?)?;
    m.add_function(wrap_pyfunction!(selection::selection_plan, m)?)?;
    m.add_function(wrap_pyfunction!(
        selection::select_spread_maximizing_members,
        m
    )?)?;
    m.add_function(wrap_pyfunction!(selection::select_ensemble, m)?)?;
    Ok(())
}
