//! Shared presentation helpers: sizes and query state lines.

use crate::query::{QueryState, QueryStatus};
use crate::source::WallpaperList;

const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

/// Render a byte count with a binary unit, e.g. `1.5 MiB`.
pub fn format_human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn cached_suffix(state: &QueryState<WallpaperList>) -> String {
    match state.data.as_ref() {
        Some(list) => format!(" ({} cached)", list.len()),
        None => String::new(),
    }
}

/// One line describing a wallpaper query state, used by `watch`.
pub fn format_state_line(state: &QueryState<WallpaperList>) -> String {
    match state.status {
        QueryStatus::Idle => "idle".to_string(),
        QueryStatus::Loading => format!("loading{}", cached_suffix(state)),
        QueryStatus::Success => {
            let count = state.data.as_ref().map(|d| d.len()).unwrap_or(0);
            match state.data_updated_at {
                Some(at) => format!(
                    "success: {} wallpaper(s), updated {}",
                    count,
                    at.format("%Y-%m-%dT%H:%M:%SZ")
                ),
                None => format!("success: {} wallpaper(s)", count),
            }
        }
        QueryStatus::Error => format!(
            "error: {}{}",
            state.error_reason().unwrap_or_else(|| "unknown".to_string()),
            cached_suffix(state)
        ),
    }
}
