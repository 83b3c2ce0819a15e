//! Parameter grid generation.
//!
//! Recovery runs a deterministic grid search over explicit candidate lists
//! for the three free parameters. Explicit lists keep runs reproducible and
//! let two runs be compared point by point.

use crate::domain::AddmParams;
use crate::error::AppError;

fn validate_range(name: &str, values: &[f64], strictly_positive: bool) -> Result<(), AppError> {
    if values.is_empty() {
        return Err(AppError::new(2, format!("Search range for {name} is empty.")));
    }
    for &v in values {
        if !v.is_finite() {
            return Err(AppError::new(
                2,
                format!("Invalid {name} candidate: {v} (must be finite)."),
            ));
        }
        if strictly_positive && v <= 0.0 {
            return Err(AppError::new(
                2,
                format!("Invalid {name} candidate: {v} (must be > 0)."),
            ));
        }
    }
    Ok(())
}

/// Full cross-product of the three search ranges.
///
/// Grid order is d-major, theta-minor, so candidate indices are stable for a
/// given set of ranges.
pub fn enumerate_grid(
    range_d: &[f64],
    range_sigma: &[f64],
    range_theta: &[f64],
) -> Result<Vec<AddmParams>, AppError> {
    validate_range("d", range_d, true)?;
    validate_range("sigma", range_sigma, true)?;
    validate_range("theta", range_theta, false)?;

    let mut out = Vec::with_capacity(range_d.len() * range_sigma.len() * range_theta.len());
    for &d in range_d {
        for &sigma in range_sigma {
            for &theta in range_theta {
                out.push(AddmParams::new(d, sigma, theta));
            }
        }
    }
    Ok(out)
}
