//! Standardisation of response series
//!
//! Both axes of the spread plane are brought to a common scale before distances
//! are measured:
//!
//! $$z_i = \frac{x_i - \bar{x}}{\sigma_x}$$
//!
//! where $\sigma_x$ is the population standard deviation (no Bessel correction).

use crate::errors::{ClimsipsError, ClimsipsResult};
use crate::response::{FloatValue, ResponseSeries};
use ndarray::{Array1, ArrayView1};

/// Standardise raw values to zero mean and unit population standard deviation
///
/// `name` only identifies the values in error messages.
///
/// # Errors
///
/// * [`ClimsipsError::InvalidInput`] if `values` is empty or contains a non-finite value
/// * [`ClimsipsError::DegenerateInput`] if all values are identical
pub fn standardize(values: ArrayView1<FloatValue>, name: &str) -> ClimsipsResult<Array1<FloatValue>> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(ClimsipsError::InvalidInput(format!(
            "'{}' has a non-finite value at position {}",
            name, i
        )));
    }
    let mean = values.mean().ok_or_else(|| {
        ClimsipsError::InvalidInput(format!("cannot normalise '{}': the series is empty", name))
    })?;
    let std = values.std(0.0);
    if std == 0.0 || !std.is_finite() {
        return Err(ClimsipsError::DegenerateInput {
            variable: name.to_string(),
        });
    }

    Ok(values.mapv(|v| (v - mean) / std))
}

/// Normalise a response series over its members
///
/// # Examples
///
/// ```rust
/// use climsips_core::member::Member;
/// use climsips_core::normalize::normalize_spread_component;
/// use climsips_core::response::ResponseSeries;
///
/// let series = ResponseSeries::from_pairs(
///     "tas",
///     [(Member::new("A"), 1.0), (Member::new("B"), 3.0)],
/// )
/// .unwrap();
///
/// let normalized = normalize_spread_component(&series).unwrap();
/// assert_eq!(normalized.get("A"), Some(-1.0));
/// assert_eq!(normalized.get("B"), Some(1.0));
/// ```
pub fn normalize_spread_component(series: &ResponseSeries) -> ClimsipsResult<ResponseSeries> {
    let values = standardize(series.values(), series.name())?;
    Ok(series.with_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Member;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn zero_mean_unit_std() {
        let values = array![0.3, -1.2, 4.5, 2.2, 0.0, 7.9];
        let z = standardize(values.view(), "tas").unwrap();
        assert_abs_diff_eq!(z.mean().unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.std(0.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn population_standard_deviation() {
        // mean 2, population variance 2/3
        let z = standardize(array![1.0, 2.0, 3.0].view(), "pr").unwrap();
        let sigma = (2.0_f64 / 3.0).sqrt();
        assert_abs_diff_eq!(z[0], -1.0 / sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z[2], 1.0 / sigma, epsilon = 1e-12);
    }

    #[test]
    fn constant_series_is_degenerate() {
        let result = standardize(array![3.0, 3.0, 3.0].view(), "tas");
        assert_eq!(
            result,
            Err(ClimsipsError::DegenerateInput {
                variable: "tas".to_string()
            })
        );
    }

    #[test]
    fn single_value_is_degenerate() {
        let result = standardize(array![3.0].view(), "tas");
        assert!(matches!(result, Err(ClimsipsError::DegenerateInput { .. })));
    }

    #[test]
    fn empty_series() {
        let result = standardize(Array1::<f64>::zeros(0).view(), "tas");
        assert!(matches!(result, Err(ClimsipsError::InvalidInput(_))));
    }

    #[test]
    fn non_finite_values() {
        let result = standardize(array![1.0, f64::NAN, 2.0].view(), "tas");
        assert!(matches!(result, Err(ClimsipsError::InvalidInput(_))));
    }

    #[test]
    fn series_keeps_members() {
        let series = ResponseSeries::from_pairs(
            "pr",
            [
                (Member::new("B"), 10.0),
                (Member::new("A"), 20.0),
                (Member::new("C"), 30.0),
            ],
        )
        .unwrap();
        let normalized = normalize_spread_component(&series).unwrap();
        assert_eq!(normalized.members(), series.members());
        assert_eq!(normalized.name(), "pr");
        assert_abs_diff_eq!(normalized.get("A").unwrap(), 0.0, epsilon = 1e-12);
        assert!(normalized.get("B").unwrap() < 0.0);
    }

    #[test]
    fn degenerate_series_names_variable() {
        let series = ResponseSeries::from_pairs(
            "pr",
            [(Member::new("A"), 1.0), (Member::new("B"), 1.0)],
        )
        .unwrap();
        let err = normalize_spread_component(&series).unwrap_err();
        assert_eq!(
            err,
            ClimsipsError::DegenerateInput {
                variable: "pr".to_string()
            }
        );
    }
}
