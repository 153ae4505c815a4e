//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config (`$XDG_CONFIG_HOME/ferry/config.toml`)
//! 3. Project config (`ferry.toml`, or `--config PATH`)
//! 4. Environment (`INPUT_*`, then `FERRY_*`)
//! 5. CLI flags (merged by the caller)

use std::fs;
use std::path::{Path, PathBuf};

use super::types::{ConfigError, IgnoreList, RawConfig};

/// File name of the project config in the working directory
pub const PROJECT_CONFIG: &str = "ferry.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Merged file and environment layers, plus warnings collected on the way
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub raw: RawConfig,
    pub warnings: Vec<ConfigWarning>,
    /// Files that contributed, lowest precedence first
    pub sources: Vec<PathBuf>,
}

/// Load one TOML file and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> Result<(RawConfig, Vec<ConfigWarning>), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: RawConfig = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load user config, project config and environment overrides.
///
/// An explicit `config_path` must exist; the implicit files are optional.
pub fn load_layered(
    config_path: Option<&Path>,
    working_dir: &Path,
) -> Result<LoadedConfig, ConfigError> {
    let mut loaded = LoadedConfig::default();

    if let Some(user_config) = user_config_path().filter(|p| p.is_file()) {
        loaded.push_file(&user_config)?;
    }

    match config_path {
        Some(path) => loaded.push_file(path)?,
        None => {
            let project = working_dir.join(PROJECT_CONFIG);
            if project.is_file() {
                loaded.push_file(&project)?;
            }
        }
    }

    loaded.raw = with_env_overrides(loaded.raw, |key| std::env::var(key).ok())?;
    Ok(loaded)
}

impl LoadedConfig {
    fn push_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let (layer, warnings) = load_with_warnings(path)?;
        tracing::debug!(path = %path.display(), "loaded config layer");
        self.raw = std::mem::take(&mut self.raw).merge(layer);
        self.warnings.extend(warnings);
        self.sources.push(path.to_path_buf());
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/ferry/config.toml`, falling back to the platform config dir
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("ferry").join("config.toml"))
}

/// Apply environment overrides.
///
/// GitHub Actions inputs (`INPUT_HOST`, ...) are read first, `FERRY_*`
/// variables override them. Empty values count as unset, the way workflow
/// inputs that were not provided arrive.
pub fn with_env_overrides(
    config: RawConfig,
    get_env: impl Fn(&str) -> Option<String>,
) -> Result<RawConfig, ConfigError> {
    let mut merged = config;
    for prefix in ["INPUT_", "FERRY_"] {
        let layer = env_layer(prefix, &get_env)?;
        merged = merged.merge(layer);
    }
    Ok(merged)
}

fn env_layer(
    prefix: &str,
    get_env: &impl Fn(&str) -> Option<String>,
) -> Result<RawConfig, ConfigError> {
    let get = |name: &str| get_env(&format!("{}{}", prefix, name)).filter(|v| !v.is_empty());
    let get_bool = |name: &str| -> Result<Option<bool>, ConfigError> {
        get(name)
            .map(|value| {
                parse_bool(&value).ok_or_else(|| ConfigError::InvalidBool {
                    key: format!("{}{}", prefix, name),
                    value,
                })
            })
            .transpose()
    };

    Ok(RawConfig {
        host: get("HOST"),
        user: get("USER"),
        password: get("PASSWORD"),
        private_key: get("PRIVATE_KEY"),
        private_key_passphrase: get("PRIVATE_KEY_PASSPHRASE"),
        secure: get_bool("SECURE")?,
        remote_path: get("REMOTE_PATH"),
        local_path: get("LOCAL_PATH"),
        ignore: get("IGNORE").map(IgnoreList::Text),
        actions: get("ACTIONS"),
        debug: get_bool("DEBUG")?,
    })
}

/// `true/false`, `1/0`, `yes/no`, `on/off`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "host",
        "user",
        "password",
        "private_key",
        "private_key_passphrase",
        "secure",
        "remote_path",
        "local_path",
        "ignore",
        "actions",
        "debug",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
