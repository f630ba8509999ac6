use thiserror::Error;

/// Minimum score a pairing must strictly exceed to be reported as a move.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be between 0.0 and 1.0, got {0}")]
    Threshold(f64),

    #[error("weight '{name}' must be a non-negative number, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("signal weights must sum to a positive total")]
    ZeroWeights,
}

/// Relative weight of each similarity signal.
///
/// The score of a pairing is the weighted sum of the signals divided by
/// [`SignalWeights::total`], so only the ratios between weights matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub name: f64,
    pub config: f64,
    pub resource_type: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            name: 3.0,
            config: 5.0,
            resource_type: 2.0,
        }
    }
}

impl SignalWeights {
    pub fn total(&self) -> f64 {
        self.name + self.config + self.resource_type
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("name", self.name),
            ("config", self.config),
            ("resource_type", self.resource_type),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }

        if self.total() <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }

        Ok(())
    }
}

/// How deletions are paired with creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Every deletion independently takes its best creation. A creation can
    /// be claimed by several deletions.
    #[default]
    Greedy,
    /// Pairs are assigned one-to-one, highest score first.
    Exclusive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub threshold: f64,
    pub weights: SignalWeights,
    pub strategy: MatchStrategy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            weights: SignalWeights::default(),
            strategy: MatchStrategy::Greedy,
        }
    }
}

impl DetectionConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    pub fn strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        self.weights.validate()
    }
}
