//! Pearson correlation

use crate::descriptive::mean;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Pearson correlation over paired observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Number of complete pairs used
    pub n: usize,
    /// Coefficient, `None` when fewer than two pairs or a side has zero variance
    pub r: Option<f64>,
}

impl Correlation {
    /// Whether a coefficient could be computed
    pub fn is_defined(&self) -> bool {
        self.r.is_some()
    }
}

/// Calculate the Pearson correlation coefficient of `x` and `y`
///
/// Both slices must be the same length. Undefined cases (n < 2, zero variance)
/// are reported through [`Correlation::r`] being `None` rather than an error.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation> {
    if x.len() != y.len() {
        return Err(Error::SizeMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    let n = x.len();
    let (Some(mean_x), Some(mean_y)) = (mean(x), mean(y)) else {
        return Ok(Correlation { n, r: None });
    };
    if n < 2 {
        return Ok(Correlation { n, r: None });
    }

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;

    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;

        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Ok(Correlation { n, r: None });
    }

    // Rounding can push |r| a hair past 1
    let r = (numerator / denominator).clamp(-1.0, 1.0);
    Ok(Correlation { n, r: Some(r) })
}
