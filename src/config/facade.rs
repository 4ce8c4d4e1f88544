//! ConfigLoader: builds a validated [`PapestashConfig`] from the layered sources.

use config::Environment;
use std::path::Path;
use tracing::debug;

use super::merge::merge_policy;
use super::sources::{environment, explicit_file, global_file};
use super::PapestashConfig;
use crate::error::ApiError;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, optional explicit file, process environment.
    pub fn load(config_path: Option<&Path>) -> Result<PapestashConfig, ApiError> {
        Self::load_layers(config_path, true, environment::environment())
    }

    /// Defaults, the given file, process environment. Skips the global file.
    pub fn load_from_file(path: &Path) -> Result<PapestashConfig, ApiError> {
        Self::load_layers(Some(path), false, environment::environment())
    }

    /// Merge the requested layers and validate the result.
    pub fn load_layers(
        config_path: Option<&Path>,
        include_global: bool,
        env: Environment,
    ) -> Result<PapestashConfig, ApiError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        if include_global {
            builder = global_file::add_to_builder(builder)?;
        }
        if let Some(path) = config_path {
            builder = explicit_file::add_to_builder(builder, path)?;
        }
        builder = environment::add_to_builder(builder, env);

        let config: PapestashConfig = builder.build()?.try_deserialize()?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        debug!(
            config_path = ?config_path,
            include_global,
            base_url = %config.api.base_url,
            "Configuration loaded"
        );
        Ok(config)
    }
}
