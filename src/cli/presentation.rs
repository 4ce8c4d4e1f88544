//! CLI presentation: text and json formatters per command family.

mod shared;
mod wallpapers;

pub use shared::{format_human_size, format_state_line};
pub use wallpapers::{
    format_wallpaper_detail_json, format_wallpaper_detail_text, format_wallpaper_list_json,
    format_wallpaper_list_text,
};
