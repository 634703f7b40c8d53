//! Blossom solver configuration.

/// Configuration for [`BlossomSolver`](super::BlossomSolver).
///
/// # Examples
///
/// ```
/// use u_matching::blossom::BlossomConfig;
///
/// let config = BlossomConfig::default()
///     .with_max_cardinality(true)
///     .with_verify_optimum(false);
/// assert!(config.max_cardinality);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlossomConfig {
    /// Only consider matchings of maximum cardinality; among those, return
    /// one of maximum weight.
    pub max_cardinality: bool,

    /// Check the LP duality certificate after solving and panic if it does
    /// not hold. Enabled by default in debug builds only.
    pub verify_optimum: bool,

    /// Relative tolerance used by the certificate check.
    pub verify_tolerance: f64,
}

impl Default for BlossomConfig {
    fn default() -> Self {
        Self {
            max_cardinality: false,
            verify_optimum: cfg!(debug_assertions),
            verify_tolerance: 1e-9,
        }
    }
}

impl BlossomConfig {
    /// Enables or disables the maximum-cardinality constraint.
    pub fn with_max_cardinality(mut self, max_cardinality: bool) -> Self {
        self.max_cardinality = max_cardinality;
        self
    }

    /// Enables or disables the optimality certificate check.
    pub fn with_verify_optimum(mut self, verify: bool) -> Self {
        self.verify_optimum = verify;
        self
    }

    /// Sets the relative tolerance of the certificate check.
    pub fn with_verify_tolerance(mut self, tolerance: f64) -> Self {
        self.verify_tolerance = tolerance;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.verify_tolerance.is_finite() || self.verify_tolerance <= 0.0 {
            return Err(format!(
                "verify_tolerance must be positive and finite, got {}",
                self.verify_tolerance
            ));
        }
        Ok(())
    }
}
