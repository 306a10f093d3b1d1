//! config command - Write or print configuration

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{CacheConfig, Config, FileConfig, HooksConfig, StoreConfig};
use crate::ui::output;

/// The configuration that is in effect, with every default spelled out.
fn effective(ctx: &Context) -> Result<FileConfig> {
    Ok(FileConfig {
        store: Some(StoreConfig {
            path: Some(ctx.state_path()?),
        }),
        cache: Some(CacheConfig {
            capacity: Some(ctx.config.cache_capacity()),
        }),
        hooks: Some(HooksConfig {
            log_events: Some(ctx.config.log_events()),
        }),
    })
}

/// Write the effective configuration to the config file.
pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = match &ctx.config_path {
        Some(path) => path.clone(),
        None => Config::config_path().context("Failed to determine config location")?,
    };
    let file = effective(ctx)?;
    Config::write(&path, &file, force).context("Failed to write config")?;

    output::success(format!("Wrote {}", path.display()), ctx.verbosity);
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn show(ctx: &Context) -> Result<()> {
    let file = effective(ctx)?;
    let source = match ctx.config.loaded_from() {
        Some(path) => path.display().to_string(),
        None => "(defaults)".to_string(),
    };
    let body = toml::to_string_pretty(&file).context("Failed to render config")?;

    output::print(format!("# source: {}\n{}", source, body.trim_end()), ctx.verbosity);
    Ok(())
}
