// Distance -> confidence: bounded linear proxy, not a calibrated probability
use crate::config::{self, ConfidenceConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceMapper {
    scale: f64,
    min: f64,
    max: f64,
}

impl ConfidenceMapper {
    pub fn new(scale: f64, min: f64, max: f64) -> Self {
        Self { scale, min, max }
    }

    /// `clamp(1 - distance / scale, min, max)`
    pub fn confidence(&self, distance: f64) -> f64 {
        (1.0 - distance / self.scale).min(self.max).max(self.min)
    }
}

impl Default for ConfidenceMapper {
    fn default() -> Self {
        Self::new(config::CONFIDENCE_SCALE, config::MIN_CONFIDENCE, config::MAX_CONFIDENCE)
    }
}

impl From<&ConfidenceConfig> for ConfidenceMapper {
    fn from(config: &ConfidenceConfig) -> Self {
        Self::new(config.scale, config.min, config.max)
    }
}
