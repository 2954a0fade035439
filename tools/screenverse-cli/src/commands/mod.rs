pub mod clips;
pub mod config;
pub mod import_clicks;
pub mod plan;
