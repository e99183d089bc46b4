use crate::cli::{ForceFieldArgs, TuningArgs};
use crate::error::{CliError, Result};
use molmin::engine::config::{self as core_config, OptimizerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOptimizerConfig {
    #[serde(rename = "force-field")]
    force_field: Option<String>,
    #[serde(rename = "parameter-set")]
    parameter_set: Option<String>,
    #[serde(rename = "parameter-file")]
    parameter_file: Option<PathBuf>,
    tolerance: Option<f64>,
    #[serde(rename = "max-iterations")]
    max_iterations: Option<usize>,
    #[serde(rename = "initial-step")]
    initial_step: Option<f64>,
    #[serde(rename = "max-displacement")]
    max_displacement: Option<f64>,
}

/// Settings read from a TOML configuration file, all optional.
///
/// ```toml
/// [optimizer]
/// force-field = "dreiding-lite"
/// tolerance = 0.05
/// max-iterations = 500
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    optimizer: Option<PartialOptimizerConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Loads `path` when given, otherwise starts from an empty configuration.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Combines file values with command-line values; command-line values win.
    pub fn merge_with_cli(
        mut self,
        force_field: &ForceFieldArgs,
        tuning: &TuningArgs,
    ) -> Result<OptimizerConfig> {
        self.apply_set_values(&tuning.set_values)?;
        let file = self.optimizer.take().unwrap_or_default();
        let defaults = OptimizerConfig::default();

        // A parameter choice on the command line replaces both file entries.
        let (parameter_set, parameter_file) =
            if force_field.parameter_set.is_some() || force_field.parameter_file.is_some() {
                (
                    force_field.parameter_set.clone(),
                    force_field.parameter_file.clone(),
                )
            } else {
                let file_path = file.parameter_file.map(|p| self.resolve_relative(p));
                (file.parameter_set, file_path)
            };

        if let Some(path) = &parameter_file {
            if !path.exists() {
                return Err(CliError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Parameter file does not exist: {}", path.display()),
                )));
            }
        }

        let force_field_name = force_field
            .force_field
            .clone()
            .or(file.force_field)
            .unwrap_or(defaults.force_field);

        core_config::OptimizerConfigBuilder::new()
            .force_field(&force_field_name)
            .parameter_set(parameter_set)
            .parameter_file(parameter_file)
            .tolerance(tuning.tolerance.or(file.tolerance).unwrap_or(defaults.tolerance))
            .max_iterations(
                tuning
                    .max_iterations
                    .or(file.max_iterations)
                    .unwrap_or(defaults.max_iterations),
            )
            .initial_step(file.initial_step.unwrap_or(defaults.initial_step))
            .max_displacement(file.max_displacement.unwrap_or(defaults.max_displacement))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn resolve_relative(&self, path: PathBuf) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            let optimizer = self.optimizer.get_or_insert_with(Default::default);
            match key {
                "optimizer.force-field" => optimizer.force_field = Some(value_str.to_string()),
                "optimizer.parameter-set" => {
                    optimizer.parameter_set = Some(value_str.to_string());
                }
                "optimizer.tolerance" => optimizer.tolerance = Some(parse_float(key, value_str)?),
                "optimizer.max-iterations" => {
                    optimizer.max_iterations = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                "optimizer.initial-step" => {
                    optimizer.initial_step = Some(parse_float(key, value_str)?);
                }
                "optimizer.max-displacement" => {
                    optimizer.max_displacement = Some(parse_float(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_float(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid float value for {}: {}", key, value)))
}
