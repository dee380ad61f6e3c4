//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    let config_path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => init_config(&config_path)?,

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

fn init_config(config_path: &PathBuf) -> Result<()> {
    if config_path.exists() {
        Output::info(&format!("Config already exists at {}", config_path.display()));
        return Ok(());
    }

    let defaults = Settings::default();
    defaults.save_to(config_path)?;
    Output::success(&format!("Created default config at {}", config_path.display()));
    Output::kv("Provider", &defaults.provider.api_base);
    Output::kv("API key", &format!("read from ${}", defaults.provider.api_key_env));
    Ok(())
}
