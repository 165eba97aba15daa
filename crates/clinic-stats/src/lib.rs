//! Correlation and two-sample tests for clinic analytics
//!
//! Slice-level statistics used by the aggregation and comparison stages:
//!
//! - **Pearson correlation** between two numeric fields ([`pearson`])
//! - **Welch's t-test** between two subgroups ([`WelchTTest`]), returning a
//!   [`StatResult`] that reports insufficient data explicitly instead of
//!   producing NaN statistics
//!
//! # Example
//!
//! ```rust
//! use clinic_stats::{StatResult, WelchTTest};
//!
//! let bluecross = [100.0, 120.0, 95.0];
//! let aetna = [80.0, 85.0, 90.0, 70.0];
//!
//! let result = WelchTTest::new().test(&bluecross, &aetna).unwrap();
//! assert!(result.p_value().unwrap() <= 1.0);
//!
//! let too_small = WelchTTest::new().test(&[1.0], &aetna).unwrap();
//! assert!(matches!(too_small, StatResult::InsufficientData { n_a: 1, n_b: 4 }));
//! ```

mod correlation;
mod descriptive;
mod error;
mod welch;

pub use correlation::{pearson, Correlation};
pub use descriptive::{complete_pairs, mean, sample_variance};
pub use error::{Error, Result};
pub use welch::{two_sided_p, StatResult, WelchTTest, MIN_OBSERVATIONS};

/// Welch's t-test with default settings
pub fn welch_t_test(group_a: &[f64], group_b: &[f64]) -> Result<StatResult> {
    WelchTTest::new().test(group_a, group_b)
}
