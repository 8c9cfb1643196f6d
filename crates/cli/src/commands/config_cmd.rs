//! `eduguardian config`: configuration management commands.

use eduguardian_config::AppConfig;
use std::path::Path;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("# {}", AppConfig::config_path().display());
    println!("{toml_str}");
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();
    if write_default(&config_path)? {
        println!("✅ Wrote default config to {}", config_path.display());
        println!();
        println!("  Next steps:");
        println!("    1. Set GROQ_API_KEY (or add api_key to the file)");
        println!("    2. Set TAVILY_API_KEY for live web search");
        println!("    3. Run `eduguardian doctor`");
    } else {
        println!("  Config file already exists: {}", config_path.display());
    }
    Ok(())
}

/// Write the default config unless a file is already there.
fn write_default(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
