//! Explicit config file source (`--config <path>`).

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Add a required TOML file to the builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(format!(
            "configuration file {}",
            path.display()
        )));
    }
    Ok(builder.add_source(
        File::from(path.to_path_buf())
            .format(FileFormat::Toml)
            .required(true),
    ))
}
