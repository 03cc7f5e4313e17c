use crate::catalog::{catalog, Ensemble, Field};
use crate::errors::ClimsipsError;
use crate::loader::InMemoryLoader;
use crate::member::Member;
use crate::normalize::standardize;
use crate::plan::{plan, ModelGroup, SelectionPlan};
use crate::pool;
use crate::projection::{Point, Projection};
use crate::response::{FloatValue, ResponseSeries, ResponseVariable};
use crate::scenario::Scenario;
use crate::selector::{self, Origin, SelectedMember};
use crate::workflow::spread_maximizing_members;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;
use pythonize::pythonize;
use std::collections::HashMap;

/// A member picked by the selection, with its point in the spread plane
#[pyclass(name = "SelectedMember")]
#[derive(Clone)]
pub struct PySelectedMember(pub SelectedMember);

#[pymethods]
impl PySelectedMember {
    #[getter]
    fn member(&self) -> String {
        self.0.member.to_string()
    }

    #[getter]
    fn x(&self) -> FloatValue {
        self.0.point.x
    }

    #[getter]
    fn y(&self) -> FloatValue {
        self.0.point.y
    }

    /// Source model group the member was chosen from, `None` for fixed members
    #[getter]
    fn group(&self) -> Option<String> {
        match &self.0.origin {
            Origin::Fixed => None,
            Origin::Group { model, .. } => Some(model.clone()),
        }
    }

    /// Distance to the nearest member selected before it, `None` for fixed members
    #[getter]
    fn nearest_distance(&self) -> Option<FloatValue> {
        match &self.0.origin {
            Origin::Fixed => None,
            Origin::Group {
                nearest_distance, ..
            } => Some(*nearest_distance),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SelectedMember(member='{}', x={}, y={})",
            self.0.member, self.0.point.x, self.0.point.y
        )
    }
}

fn parse_predictors(predictors: Option<Vec<String>>) -> PyResult<Vec<Field>> {
    match predictors {
        Some(names) => Ok(names
            .iter()
            .map(|name| name.parse::<Field>())
            .collect::<Result<Vec<_>, _>>()?),
        None => Ok(Field::DEFAULT_PREDICTORS.to_vec()),
    }
}

fn parse_members(ids: Vec<String>) -> PyResult<Vec<Member>> {
    Ok(ids
        .iter()
        .map(|id| Member::parse(id))
        .collect::<Result<Vec<_>, _>>()?)
}

fn series_from_dict(name: &str, values: HashMap<String, FloatValue>) -> PyResult<ResponseSeries> {
    let pairs = values
        .into_iter()
        .map(|(m, v)| Ok((Member::parse(&m)?, v)))
        .collect::<Result<Vec<_>, ClimsipsError>>()?;
    Ok(ResponseSeries::from_pairs(name, pairs)?)
}

/// Standardise a series to zero mean and unit (population) standard deviation
///
/// ```python
/// import numpy as np
/// from climsips._lib.core import normalize_spread_component
///
/// normalize_spread_component(np.array([1.0, 2.0, 3.0]))
/// ```
#[pyfunction]
#[pyo3(signature = (values, name = "series"))]
pub fn normalize_spread_component<'py>(
    py: Python<'py>,
    values: PyReadonlyArray1<'py, FloatValue>,
    name: &str,
) -> PyResult<Bound<'py, PyArray1<FloatValue>>> {
    let normalized = standardize(values.as_array(), name)?;
    Ok(normalized.into_pyarray_bound(py))
}

/// Members present in every one of `catalogs`, sorted
#[pyfunction]
pub fn common_members(catalogs: Vec<Vec<String>>) -> PyResult<Vec<String>> {
    let catalogs = catalogs
        .into_iter()
        .map(parse_members)
        .collect::<PyResult<Vec<_>>>()?;
    Ok(pool::common_members(catalogs.iter())?
        .into_iter()
        .map(|m| m.to_string())
        .collect())
}

/// Candidate pool of an embedded ensemble catalog
///
/// Uses the standard predictor fields when `predictors` is not given.
#[pyfunction]
#[pyo3(signature = (ensemble, predictors = None))]
pub fn candidate_pool(ensemble: &str, predictors: Option<Vec<String>>) -> PyResult<Vec<String>> {
    let ensemble: Ensemble = ensemble.parse()?;
    let predictors = parse_predictors(predictors)?;
    Ok(catalog(ensemble)?
        .candidate_pool(&predictors)?
        .into_iter()
        .map(|m| m.to_string())
        .collect())
}

/// Selection plan of an ensemble as a dict with `fixed` and `groups`
///
/// Ensembles without a curated plan get one derived from their candidate pool.
#[pyfunction]
pub fn selection_plan(py: Python<'_>, ensemble: &str) -> PyResult<PyObject> {
    let ensemble: Ensemble = ensemble.parse()?;
    let plan = match plan(ensemble)? {
        Some(curated) => curated.clone(),
        None => SelectionPlan::from_pool(
            &catalog(ensemble)?.candidate_pool(&Field::DEFAULT_PREDICTORS)?,
        ),
    };
    Ok(pythonize(py, &plan)?)
}

/// Spread-maximising selection for explicit inputs
///
/// `groups` are processed in the order given and `projection` maps each member
/// to its `(x, y)` point. Identifiers must follow the archive naming
/// `<model>-r<N>i<N>p<N>[f<N>]`. Returns the selected member identifiers, fixed
/// members first.
#[pyfunction]
pub fn select_spread_maximizing_members(
    fixed: Vec<String>,
    groups: Vec<Vec<String>>,
    projection: HashMap<String, (FloatValue, FloatValue)>,
) -> PyResult<Vec<String>> {
    let plan = SelectionPlan::new(
        parse_members(fixed)?,
        groups
            .into_iter()
            .map(|g| Ok(ModelGroup::from_members(parse_members(g)?)))
            .collect::<PyResult<Vec<_>>>()?,
    );
    let projection = projection
        .into_iter()
        .map(|(m, p)| Ok((Member::parse(&m)?, Point::from(p))))
        .collect::<Result<Projection, ClimsipsError>>()?;

    Ok(selector::select_spread_maximizing_members(&plan, &projection)?
        .into_iter()
        .map(|e| e.member.to_string())
        .collect())
}

/// Full selection for an embedded ensemble from raw member responses
///
/// `temperature` and `precipitation` map member identifiers to the raw change
/// of the scenario; they must cover the candidate pool.
#[pyfunction]
#[pyo3(signature = (ensemble, scenario, temperature, precipitation, predictors = None))]
pub fn select_ensemble(
    ensemble: &str,
    scenario: &str,
    temperature: HashMap<String, FloatValue>,
    precipitation: HashMap<String, FloatValue>,
    predictors: Option<Vec<String>>,
) -> PyResult<Vec<PySelectedMember>> {
    let ensemble: Ensemble = ensemble.parse()?;
    let scenario: Scenario = scenario.parse()?;
    let predictors = parse_predictors(predictors)?;

    let loader = InMemoryLoader::new()
        .with_series(
            scenario,
            ResponseVariable::Temperature,
            series_from_dict("tas", temperature)?,
        )
        .with_series(
            scenario,
            ResponseVariable::Precipitation,
            series_from_dict("pr", precipitation)?,
        );

    Ok(
        spread_maximizing_members(ensemble, &scenario, &predictors, &loader)?
            .into_iter()
            .map(PySelectedMember)
            .collect(),
    )
}
