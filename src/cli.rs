//! CLI domain: parse, route, output, and presentation only.
//! No cache orchestration; the single route table dispatches to the data source.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_human_size, format_state_line, format_wallpaper_detail_json,
    format_wallpaper_detail_text, format_wallpaper_list_json, format_wallpaper_list_text,
};
pub use route::RunContext;
