use crate::core::forcefield::dreiding::DREIDING_LITE_NAME;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

pub const DEFAULT_TOLERANCE: f64 = 0.1;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_INITIAL_STEP: f64 = 0.1;
pub const DEFAULT_MAX_DISPLACEMENT: f64 = 0.5;

/// Settings of a geometry optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Registry name of the force field.
    pub force_field: String,
    /// Named parameter set; the force field's default when `None`.
    pub parameter_set: Option<String>,
    /// Parameter file, taking precedence over `parameter_set`.
    pub parameter_file: Option<PathBuf>,
    /// Convergence threshold on the RMS gradient, in kcal/(mol·Å).
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Largest single-atom displacement of the first trial step, in Å.
    pub initial_step: f64,
    /// Upper bound on any single-atom displacement per step, in Å.
    pub max_displacement: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            force_field: DREIDING_LITE_NAME.to_string(),
            parameter_set: None,
            parameter_file: None,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_step: DEFAULT_INITIAL_STEP,
            max_displacement: DEFAULT_MAX_DISPLACEMENT,
        }
    }
}

#[derive(Default)]
pub struct OptimizerConfigBuilder {
    force_field: Option<String>,
    parameter_set: Option<String>,
    parameter_file: Option<PathBuf>,
    tolerance: Option<f64>,
    max_iterations: Option<usize>,
    initial_step: Option<f64>,
    max_displacement: Option<f64>,
}

impl OptimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_field(mut self, name: &str) -> Self {
        self.force_field = Some(name.to_string());
        self
    }
    pub fn parameter_set(mut self, name: Option<String>) -> Self {
        self.parameter_set = name;
        self
    }
    pub fn parameter_file(mut self, path: Option<PathBuf>) -> Self {
        self.parameter_file = path;
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn initial_step(mut self, step: f64) -> Self {
        self.initial_step = Some(step);
        self
    }
    pub fn max_displacement(mut self, displacement: f64) -> Self {
        self.max_displacement = Some(displacement);
        self
    }

    pub fn build(self) -> Result<OptimizerConfig, ConfigError> {
        let config = OptimizerConfig {
            force_field: self
                .force_field
                .ok_or(ConfigError::MissingParameter("force_field"))?,
            parameter_set: self.parameter_set,
            parameter_file: self.parameter_file,
            tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            initial_step: self.initial_step.unwrap_or(DEFAULT_INITIAL_STEP),
            max_displacement: self.max_displacement.unwrap_or(DEFAULT_MAX_DISPLACEMENT),
        };

        positive("tolerance", config.tolerance)?;
        positive("initial_step", config.initial_step)?;
        positive("max_displacement", config.max_displacement)?;
        if config.initial_step > config.max_displacement {
            return Err(ConfigError::InvalidValue {
                parameter: "initial_step",
                reason: format!(
                    "{} exceeds max_displacement {}",
                    config.initial_step, config.max_displacement
                ),
            });
        }
        Ok(config)
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_uses_defaults_for_optional_values() {
        let config = OptimizerConfigBuilder::new()
            .force_field("dreiding-lite")
            .build()
            .unwrap();
        assert_eq!(config, OptimizerConfig::default());
    }

    #[test]
    fn build_fails_without_force_field() {
        let result = OptimizerConfigBuilder::new().tolerance(0.01).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("force_field")));
    }

    #[test]
    fn build_rejects_non_positive_tolerance() {
        let result = OptimizerConfigBuilder::new()
            .force_field("dreiding-lite")
            .tolerance(0.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { parameter: "tolerance", .. })
        ));
    }

    #[test]
    fn build_rejects_initial_step_above_max_displacement() {
        let result = OptimizerConfigBuilder::new()
            .force_field("dreiding-lite")
            .initial_step(1.0)
            .max_displacement(0.2)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { parameter: "initial_step", .. })
        ));
    }

    #[test]
    fn build_keeps_explicit_values() {
        let config = OptimizerConfigBuilder::new()
            .force_field("custom")
            .parameter_set(Some("tight".to_string()))
            .parameter_file(Some(PathBuf::from("params.toml")))
            .tolerance(1e-3)
            .max_iterations(50)
            .build()
            .unwrap();
        assert_eq!(config.force_field, "custom");
        assert_eq!(config.parameter_set.as_deref(), Some("tight"));
        assert_eq!(config.parameter_file, Some(PathBuf::from("params.toml")));
        assert_eq!(config.tolerance, 1e-3);
        assert_eq!(config.max_iterations, 50);
    }
}
