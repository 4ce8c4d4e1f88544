//! Wallpaper list/show presentation, text and json.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

use super::shared::format_human_size;
use crate::error::ApiError;
use crate::types::{WallpaperFilter, WallpaperRecord};

pub fn format_wallpaper_list_text(records: &[WallpaperRecord], filter: &WallpaperFilter) -> String {
    if records.is_empty() {
        return if filter.is_empty() {
            "No wallpapers found.".to_string()
        } else {
            format!("No wallpapers match {}.", filter)
        };
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Name", "Size", "Resolution", "Ratio", "Color"]);
    for record in records {
        table.add_row(vec![
            record.id.to_string(),
            record.name.clone(),
            format_human_size(record.size_in_bytes),
            format!("{}x{}", record.width, record.height),
            record.aspect_ratio.clone(),
            record.most_frequent_color.clone(),
        ]);
    }
    format!("{}\n\nTotal: {} wallpaper(s)", table, records.len())
}

pub fn format_wallpaper_list_json(
    records: &[WallpaperRecord],
    filter: &WallpaperFilter,
) -> Result<String, ApiError> {
    let out = json!({
        "wallpapers": records,
        "total": records.len(),
        "filter": filter,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}

pub fn format_wallpaper_detail_text(record: &WallpaperRecord) -> String {
    let mut output = format!("Wallpaper: {}\n", record.name);
    output.push_str(&format!("Id: {}\n", record.id));
    output.push_str(&format!("Path: {}\n", record.path));
    output.push_str(&format!("Thumbnail: {}\n", record.thumbnail_path));
    output.push_str(&format!(
        "Resolution: {}x{} ({})\n",
        record.width, record.height, record.aspect_ratio
    ));
    output.push_str(&format!(
        "Size: {} ({} bytes)\n",
        format_human_size(record.size_in_bytes),
        record.size_in_bytes
    ));
    output.push_str(&format!("Color: {}\n", record.most_frequent_color));
    output.push_str(&format!("Created: {}", record.created_at.to_rfc3339()));
    output
}

pub fn format_wallpaper_detail_json(record: &WallpaperRecord) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(record)?)
}
