use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use ferry::config::{load_layered, ConfigWarning, RawConfig};

use crate::cli::InputArgs;

/// Merge config files, environment and CLI flags into one raw config
pub fn load(input: &InputArgs) -> Result<(RawConfig, Vec<ConfigWarning>)> {
    let working_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let loaded = load_layered(input.config.as_deref(), &working_dir)?;

    let mut cli = input.to_raw();
    if let Some(path) = &input.actions_file {
        cli.actions = Some(read_input(path).context("failed to read actions file")?);
    }
    if let Some(path) = &input.private_key_file {
        cli.private_key = Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read private key {}", path.display()))?,
        );
    }

    Ok((loaded.raw.merge(cli), loaded.warnings))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

pub fn print_config_warnings(warnings: &[ConfigWarning]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}
