//! Configuration for a scheduling run.

/// Settings shared by every pass of one scheduling invocation.
#[derive(Clone, Debug)]
pub struct SchedConfig {
    /// Clock period bounding chained combinational delay within one cycle.
    pub clock_period: f64,
    /// Log verbosity (0 = silent; see the `logging` module).
    pub verbosity: u8,
}

impl SchedConfig {
    pub fn new(clock_period: f64) -> Self {
        Self {
            clock_period,
            verbosity: 0,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_silent() {
        let config = SchedConfig::new(10.0);
        assert_eq!(config.clock_period, 10.0);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_with_verbosity() {
        let config = SchedConfig::new(5.0).with_verbosity(2);
        assert_eq!(config.verbosity, 2);
    }
}
