use std::time::Duration;

use crate::error::FitError;
use crate::shape::ShapeKind;

/// heat never cools below this, so late cycles keep a minimum of motion
pub const MIN_HEAT: i32 = 10;

/// tuning surface for a fitting run.
///
/// the numeric defaults are the empirically tuned values of the original
/// experiments; none of them has a derivation, which is exactly why they are
/// configuration rather than constants.
#[derive(Clone, Debug)]
pub struct FitConfig {
    pub shape_kind: ShapeKind,
    /// shape counts at which the composition is emitted; the largest entry
    /// is the total number of shapes fitted
    pub snapshot_counts: Vec<usize>,
    /// mutation attempts per local search
    pub cycles_per_attempt: usize,
    /// initial maximum perturbation magnitude
    pub start_heat: i32,
    /// heat divisor applied on every accepted improvement
    pub heat_cooling_ratio: f64,
    /// fill opacity of every committed shape
    pub alpha: f64,
    /// multi-start width used below the quality threshold
    pub quality_best_of: usize,
    /// shape counts below this benefit from the wider search; everything
    /// above runs single-start
    pub quality_threshold: usize,
    /// consecutive all-invalid searches tolerated per step before the run
    /// is aborted
    pub max_retries: usize,
    /// guard on collecting a parallel search batch; pool infrastructure
    /// hanging past this is fatal
    pub worker_timeout: Duration,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            shape_kind: ShapeKind::Triangle,
            snapshot_counts: vec![100],
            cycles_per_attempt: 100,
            start_heat: 100,
            heat_cooling_ratio: 1.1,
            alpha: 0.5,
            quality_best_of: 10,
            quality_threshold: 100,
            max_retries: 25,
            worker_timeout: Duration::from_secs(600),
        }
    }
}

impl FitConfig {
    /// eager validation, run before any search work begins
    pub fn validate(&self) -> Result<(), FitError> {
        if self.snapshot_counts.is_empty() {
            return Err(FitError::InvalidConfig(
                "at least one snapshot count is required".into(),
            ));
        }
        if self.snapshot_counts.iter().any(|&n| n == 0) {
            return Err(FitError::InvalidConfig(
                "snapshot counts must be positive".into(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(FitError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.heat_cooling_ratio <= 1.0 {
            return Err(FitError::InvalidConfig(format!(
                "heat cooling ratio must be > 1, got {}",
                self.heat_cooling_ratio
            )));
        }
        if self.cycles_per_attempt == 0 {
            return Err(FitError::InvalidConfig(
                "cycles per attempt must be positive".into(),
            ));
        }
        if self.start_heat < MIN_HEAT {
            return Err(FitError::InvalidConfig(format!(
                "start heat must be at least {MIN_HEAT}, got {}",
                self.start_heat
            )));
        }
        if self.quality_best_of == 0 {
            return Err(FitError::InvalidConfig(
                "quality best-of must be positive".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(FitError::InvalidConfig(
                "max retries must be positive".into(),
            ));
        }
        Ok(())
    }

    /// largest shape count the run will reach
    pub fn max_shape_count(&self) -> usize {
        self.snapshot_counts.iter().copied().max().unwrap_or(0)
    }

    /// largest requested snapshot that still sits below the quality
    /// threshold, if any; steps up to it use the wide multi-start
    pub fn quality_limit(&self) -> Option<usize> {
        self.snapshot_counts
            .iter()
            .copied()
            .filter(|&n| n < self.quality_threshold)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FitConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_alpha() {
        for alpha in [0.0, -0.5, 1.01] {
            let cfg = FitConfig { alpha, ..FitConfig::default() };
            assert!(cfg.validate().is_err(), "alpha {alpha} accepted");
        }
        let cfg = FitConfig { alpha: 1.0, ..FitConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_snapshot_count() {
        let cfg = FitConfig { snapshot_counts: vec![5, 0], ..FitConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = FitConfig { snapshot_counts: vec![], ..FitConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_cooling_ratio() {
        let cfg = FitConfig { heat_cooling_ratio: 1.0, ..FitConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn quality_limit_ignores_counts_above_threshold() {
        let cfg = FitConfig {
            snapshot_counts: vec![5, 50, 500],
            quality_threshold: 100,
            ..FitConfig::default()
        };
        assert_eq!(cfg.quality_limit(), Some(50));
        assert_eq!(cfg.max_shape_count(), 500);

        let cfg = FitConfig {
            snapshot_counts: vec![200, 500],
            quality_threshold: 100,
            ..FitConfig::default()
        };
        assert_eq!(cfg.quality_limit(), None);
    }
}
