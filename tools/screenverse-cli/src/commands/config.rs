//! Show the effective configuration, optionally writing it to disk.

use screenverse_common::config::{config_file_path, AppConfig};

pub fn run(init: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    let config = AppConfig::load();

    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            config
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
            println!("Wrote {}", path.display());
        }
    }

    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
