//! Configuration display

use anyhow::Result;
use fincast_core::{config::default_config_path, ConfigSource, FincastConfig};

pub fn cmd_config(config: &FincastConfig, source: &ConfigSource, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("# Source: {}", source);
    if *source == ConfigSource::Embedded {
        if let Some(path) = default_config_path() {
            println!("# Override by creating {}", path.display());
        }
    }
    println!(
        "# API key read from ${} ({})",
        config.rates.api_key_env,
        if std::env::var(&config.rates.api_key_env).is_ok() {
            "set"
        } else {
            "not set"
        }
    );
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}
