//! Show or write the configuration.

use mangareel_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, write: bool) -> anyhow::Result<()> {
    if write {
        // Environment secrets are not persisted.
        let path = AppConfig::load_file().save()?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    println!("# {}", config_file_path().display());
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
