//! Welch's two-sample t-test
//!
//! Compares the means of two independent samples without assuming equal
//! population variances. Degrees of freedom follow Welch-Satterthwaite and the
//! p-value is two-sided under Student's t.

use crate::descriptive::{mean, sample_variance};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

/// Minimum observations per group for the test to run
pub const MIN_OBSERVATIONS: usize = 2;

/// Outcome of a two-group comparison
///
/// Only `Computed` carries a test statistic. The other variants are data-level
/// outcomes, not failures.
///
/// A comparison nominally has two outcomes: a computed statistic or
/// insufficient data. `ZeroVariance` is a deliberate third outcome. When both
/// groups are constant with different means the standard error is zero and the
/// statistic would be infinite, so this variant is reported instead of a
/// non-finite `Computed`. Equal constant means still yield `Computed` with
/// t = 0 and p = 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatResult {
    /// The test ran; `statistic` and `p_value` are finite
    Computed {
        statistic: f64,
        p_value: f64,
        degrees_of_freedom: f64,
        n_a: usize,
        n_b: usize,
        mean_a: f64,
        mean_b: f64,
    },
    /// A group has fewer than two observations
    InsufficientData { n_a: usize, n_b: usize },
    /// Both groups are constant with different means, so the standard error is zero
    ZeroVariance {
        n_a: usize,
        n_b: usize,
        mean_a: f64,
        mean_b: f64,
    },
}

impl StatResult {
    /// Test statistic, if computed
    pub fn statistic(&self) -> Option<f64> {
        match self {
            Self::Computed { statistic, .. } => Some(*statistic),
            _ => None,
        }
    }

    /// Two-sided p-value, if computed
    pub fn p_value(&self) -> Option<f64> {
        match self {
            Self::Computed { p_value, .. } => Some(*p_value),
            _ => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Observation counts of both groups
    pub fn sample_sizes(&self) -> (usize, usize) {
        match *self {
            Self::Computed { n_a, n_b, .. }
            | Self::InsufficientData { n_a, n_b }
            | Self::ZeroVariance { n_a, n_b, .. } => (n_a, n_b),
        }
    }
}

/// Welch's unequal-variance t-test
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchTTest;

impl WelchTTest {
    pub fn new() -> Self {
        Self
    }

    /// Compare `group_a` against `group_b`
    ///
    /// Non-finite values are ignored. Returns `InsufficientData` when either
    /// group has fewer than [`MIN_OBSERVATIONS`] values.
    pub fn test(&self, group_a: &[f64], group_b: &[f64]) -> Result<StatResult> {
        let a: Vec<f64> = group_a.iter().copied().filter(|v| v.is_finite()).collect();
        let b: Vec<f64> = group_b.iter().copied().filter(|v| v.is_finite()).collect();
        let (n_a, n_b) = (a.len(), b.len());

        if n_a < MIN_OBSERVATIONS || n_b < MIN_OBSERVATIONS {
            debug!(n_a, n_b, "Not enough observations for Welch's t-test");
            return Ok(StatResult::InsufficientData { n_a, n_b });
        }

        let (Some(mean_a), Some(mean_b), Some(var_a), Some(var_b)) =
            (mean(&a), mean(&b), sample_variance(&a), sample_variance(&b))
        else {
            return Ok(StatResult::InsufficientData { n_a, n_b });
        };

        let se_a = var_a / n_a as f64;
        let se_b = var_b / n_b as f64;
        let se_sum = se_a + se_b;

        if se_sum == 0.0 {
            if mean_a == mean_b {
                return Ok(StatResult::Computed {
                    statistic: 0.0,
                    p_value: 1.0,
                    degrees_of_freedom: (n_a + n_b - 2) as f64,
                    n_a,
                    n_b,
                    mean_a,
                    mean_b,
                });
            }
            return Ok(StatResult::ZeroVariance {
                n_a,
                n_b,
                mean_a,
                mean_b,
            });
        }

        let statistic = (mean_a - mean_b) / se_sum.sqrt();
        let degrees_of_freedom = welch_satterthwaite(se_a, se_b, n_a, n_b);
        let p_value = two_sided_p(statistic, degrees_of_freedom)?;

        if !statistic.is_finite() || !p_value.is_finite() {
            return Err(Error::Computation(format!(
                "non-finite t-test result (t = {statistic}, p = {p_value})"
            )));
        }

        Ok(StatResult::Computed {
            statistic,
            p_value,
            degrees_of_freedom,
            n_a,
            n_b,
            mean_a,
            mean_b,
        })
    }
}

/// Welch-Satterthwaite degrees of freedom from per-group squared standard errors
fn welch_satterthwaite(se_a: f64, se_b: f64, n_a: usize, n_b: usize) -> f64 {
    let numerator = (se_a + se_b).powi(2);
    let denominator = se_a.powi(2) / (n_a - 1) as f64 + se_b.powi(2) / (n_b - 1) as f64;
    numerator / denominator
}

/// Two-sided p-value of `t` under Student's t with `df` degrees of freedom
pub fn two_sided_p(t: f64, df: f64) -> Result<f64> {
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        Error::Computation(format!("Failed to create t-distribution: {e}"))
    })?;
    let p = 2.0 * (1.0 - t_dist.cdf(t.abs()));
    Ok(p.clamp(0.0, 1.0))
}
