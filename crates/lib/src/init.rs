//! Initialize the configuration directory: create ~/.line-relay, a default config, and the prompt files.
//!
//! Layout mirrors `crates/lib/config/`: `config/prompt/*.md` → `~/.line-relay/prompt/*.md`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;
use crate::prompt::{DEFAULT_KNOWLEDGE, DEFAULT_PERSONA};

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Creates the prompt directory (from `prompt.directory` or `prompt`) and seeds PERSONA.md and KNOWLEDGE.md if missing.
///
/// Existing files are never overwritten.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let prompt_dir = config::resolve_prompt_dir(&config, config_path);
    std::fs::create_dir_all(&prompt_dir)
        .with_context(|| format!("creating prompt directory {}", prompt_dir.display()))?;

    for (name, contents) in [("PERSONA.md", DEFAULT_PERSONA), ("KNOWLEDGE.md", DEFAULT_KNOWLEDGE)] {
        let path = prompt_dir.join(name);
        if path.exists() {
            log::debug!("{} already exists, skipping", path.display());
            continue;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("writing default {} to {}", name, path.display()))?;
        log::info!("wrote default {} to {}", name, path.display());
    }

    Ok(config_dir.to_path_buf())
}
