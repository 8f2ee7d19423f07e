use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::export::config::{ColorMode, DEFAULT_RESOLUTION, ExportConfig};

fn default_resolution() -> u32 {
    DEFAULT_RESOLUTION
}
fn default_sort() -> bool {
    true
}
fn default_verbose() -> bool {
    false
}

/// Settings read from `polyplot.toml`
///
/// ```toml
/// resolution = 2000
/// color_mode = "specified"
/// specified_color = [0.2, 0.2, 0.8]
/// sort = false
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub specified_color: Option<[f64; 3]>,
    #[serde(default = "default_sort")]
    pub sort: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl FileConfig {
    /// Search the default locations and return the first config that parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Export settings described by this file
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            resolution: self.resolution,
            color_mode: self.color_mode,
            specified_color: self.specified_color.unwrap_or([0.0, 0.0, 0.0]),
            sort: self.sort,
            random_seed: self.seed,
        }
    }
}

/// Verbose if either the command line or the config file asks for it
pub fn resolve_verbose(cli_flag: bool, file: Option<&FileConfig>) -> bool {
    cli_flag || file.is_some_and(|c| c.verbose)
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("polyplot.toml"));
    paths.push(PathBuf::from(".polyplot.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("polyplot").join("config.toml"));
        paths.push(config_dir.join("polyplot.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".polyplot.toml"));
    }

    paths
}
