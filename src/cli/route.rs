//! CLI route: single route table and run context. Dispatches to the data source and presentation.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_state_line, format_wallpaper_detail_json, format_wallpaper_detail_text,
    format_wallpaper_list_json, format_wallpaper_list_text,
};
use crate::config::{ConfigLoader, PapestashConfig};
use crate::error::ApiError;
use crate::fetcher::{HttpWallpaperFetcher, JsonFileFetcher, WallpaperFetcher};
use crate::source::{WallpaperDataSource, WallpaperQuery};
use crate::types::{AspectRatio, WallpaperFilter};

/// Runtime context for CLI execution: configuration, the async runtime, and the data source.
/// The cache lives exactly as long as the context.
pub struct RunContext {
    runtime: Runtime,
    config: PapestashConfig,
    source: WallpaperDataSource,
}

impl RunContext {
    /// Create run context from optional config and source paths. Uses ConfigLoader only.
    pub fn new(config_path: Option<PathBuf>, source_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        let fetcher: Arc<dyn WallpaperFetcher> = match source_path {
            Some(path) => Arc::new(JsonFileFetcher::new(path)),
            None => Arc::new(HttpWallpaperFetcher::new(config.api.fetcher_config())?),
        };
        Self::with_fetcher(config, fetcher)
    }

    /// Create run context around an already-built fetcher.
    pub fn with_fetcher(
        config: PapestashConfig,
        fetcher: Arc<dyn WallpaperFetcher>,
    ) -> Result<Self, ApiError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create async runtime: {}", e)))?;
        let source = WallpaperDataSource::new(fetcher, config.query.to_options()?)?;
        Ok(Self {
            runtime,
            config,
            source,
        })
    }

    pub fn config(&self) -> &PapestashConfig {
        &self.config
    }

    pub fn source(&self) -> &WallpaperDataSource {
        &self.source
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::List {
                aspect_ratio,
                min_size,
                max_size,
                format,
            } => {
                let ratio = aspect_ratio
                    .as_deref()
                    .map(AspectRatio::from_str)
                    .transpose()?;
                let filter = WallpaperFilter::new(ratio, *min_size, *max_size)?;
                self.handle_list(&filter, format)
            }
            Commands::Show { id, format } => self.handle_show(*id, format),
            Commands::Watch {
                interval_secs,
                count,
            } => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                self.watch(Duration::from_secs(*interval_secs), *count, &mut out)
            }
            Commands::Config => self.config.to_toml(),
        };
        debug!(
            duration_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Command finished"
        );
        result
    }

    fn handle_list(&self, filter: &WallpaperFilter, format: &str) -> Result<String, ApiError> {
        check_format(format)?;
        let records = self
            .runtime
            .block_on(self.source.fetch_wallpapers_filtered(filter))?;
        let evicted = self.source.evict_unused_filters();
        info!(filter = %filter, count = records.len(), evicted, "Listed wallpapers");
        if format == "json" {
            format_wallpaper_list_json(&records, filter)
        } else {
            Ok(format_wallpaper_list_text(&records, filter))
        }
    }

    fn handle_show(&self, id: i64, format: &str) -> Result<String, ApiError> {
        check_format(format)?;
        let record = self.runtime.block_on(self.source.find(id))?;
        if format == "json" {
            format_wallpaper_detail_json(&record)
        } else {
            Ok(format_wallpaper_detail_text(&record))
        }
    }

    /// Poll the unfiltered list: wait for each refresh to settle, sleep, invalidate, observe.
    /// Writes one line per visible state change; stops after `count` refreshes if given.
    pub fn watch<W: Write>(
        &self,
        interval: Duration,
        count: Option<u32>,
        out: &mut W,
    ) -> Result<String, ApiError> {
        self.runtime.block_on(async {
            let mut handle = self.source.handle();
            let mut last_line = None;
            emit_state(&handle, &mut last_line, out)?;

            let mut refreshes = 0u32;
            loop {
                while handle.is_fetching() {
                    if !handle.changed().await {
                        return Err(ApiError::ConfigError(
                            "Wallpaper query was removed while watching".to_string(),
                        ));
                    }
                    emit_state(&handle, &mut last_line, out)?;
                }
                refreshes += 1;
                if count.map(|c| refreshes >= c).unwrap_or(false) {
                    break;
                }
                tokio::time::sleep(interval).await;
                self.source.invalidate();
                handle.observe();
                emit_state(&handle, &mut last_line, out)?;
            }
            Ok(format!("Watched {} refresh(es)", refreshes))
        })
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.source.shutdown();
    }
}

fn check_format(format: &str) -> Result<(), ApiError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(ApiError::InvalidQuery(format!(
            "Unknown output format: {} (expected text or json)",
            other
        ))),
    }
}

fn emit_state<W: Write>(
    handle: &WallpaperQuery,
    last_line: &mut Option<String>,
    out: &mut W,
) -> Result<(), ApiError> {
    let line = format_state_line(&handle.state());
    if last_line.as_deref() != Some(line.as_str()) {
        writeln!(out, "{}", line)?;
        out.flush()?;
        *last_line = Some(line);
    }
    Ok(())
}
