//! Environment source: PAPESTASH__<SECTION>__<KEY>, e.g. PAPESTASH__API__BASE_URL.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "PAPESTASH";

/// Environment source reading the process environment.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    environment: Environment,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(environment)
}
