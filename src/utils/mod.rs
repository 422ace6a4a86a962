use crate::error::Result;
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Round to one decimal place, exact halves to the even neighbour
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Random number utilities
pub mod random {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Create RNG with fixed seed
    pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }
}

/// Order statistics over `f64` slices.
///
/// A NaN anywhere in the input makes the result NaN.
pub mod stats {
    /// Median of the values (mean of the two middle values for even lengths)
    pub fn median(values: &[f64]) -> f64 {
        quantile(values, 0.5)
    }

    /// Quantile `q` in `[0, 1]` with linear interpolation between order statistics
    pub fn quantile(values: &[f64], q: f64) -> f64 {
        if values.is_empty() || values.iter().any(|v| v.is_nan()) {
            return f64::NAN;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        quantile_sorted(&sorted, q)
    }

    /// Same as [`quantile`] for data that is already sorted ascending
    pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
        if sorted.is_empty() {
            return f64::NAN;
        }
        let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }

    /// Arithmetic mean, NaN for empty input
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population variance (`ddof = 0`)
    pub fn variance(values: &[f64]) -> f64 {
        let m = mean(values);
        mean(&values.iter().map(|v| (v - m) * (v - m)).collect::<Vec<_>>())
    }
}

/// Validation utilities
pub mod validation {
    use crate::error::{Error, Result};

    /// Validate that value is in range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
        if value < min || value > max {
            return Err(Error::Config(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that value is positive
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(value: T, name: &str) -> Result<()> {
        if value <= T::default() {
            return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(90.0), "1.5m");
        assert_eq!(format_duration(3600.0), "1.0h");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(12.345), 12.3);
        assert_eq!(round1(-0.06), -0.1);
        assert_eq!(round1(7.0), 7.0);
    }

    #[test]
    fn test_round1_half_to_even() {
        assert_eq!(round1(12.25), 12.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(1.25), 1.2);
        assert_eq!(round1(-0.25), -0.2);
    }

    #[test]
    fn test_median_and_quantiles() {
        assert_eq!(stats::median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(stats::median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(stats::quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.25), 2.0);
        assert_eq!(stats::quantile(&[0.0, 10.0], 0.75), 7.5);
        assert!(stats::median(&[]).is_nan());
        assert!(stats::median(&[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_variance() {
        assert_eq!(stats::variance(&[1.0, 3.0]), 1.0);
        assert_eq!(stats::variance(&[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(validation::in_range(0.5, 0.0, 1.0, "value").is_ok());
        assert!(validation::in_range(1.5, 0.0, 1.0, "value").is_err());

        assert!(validation::positive(1.0, "value").is_ok());
        assert!(validation::positive(0.0, "value").is_err());
    }
}
