//! Configuration management for crustify.
//!
//! This module provides the [`Config`] struct which controls analysis and the
//! explicitly chosen spacing options. Configuration can be loaded from:
//! - TOML files (`crustify.toml`)
//! - CLI arguments (which override file settings)
//! - In-file directives (`// crustify: sp_arith=force`)
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being analyzed up to the filesystem root, plus the user's home directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::detect::{OptionId, Settings, SpaceOption};
use crate::lang::LangFlags;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["crustify.toml", ".crustify.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

fn default_tab_size() -> usize {
    8
}

/// Braced initializer alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Line span of an alignment group; 0 disables alignment (default: 0)
    #[serde(default)]
    pub braced_init_list_span: usize,

    /// Column threshold of an alignment group; 0 means unlimited (default: 0)
    #[serde(default)]
    pub braced_init_list_thresh: usize,
}

/// Main configuration struct for crustify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Columns per tab stop in the input (default: 8)
    #[serde(default = "default_tab_size")]
    pub input_tab_size: usize,

    /// Language used when it cannot be guessed from the file extension
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub align: AlignConfig,

    /// Explicit option values; detection never overrides these
    #[serde(default)]
    pub options: BTreeMap<String, SpaceOption>,
}

/// Partial align table for merging
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialAlign {
    pub braced_init_list_span: Option<usize>,
    pub braced_init_list_thresh: Option<usize>,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub input_tab_size: Option<usize>,
    pub language: Option<String>,
    #[serde(default)]
    pub align: PartialAlign,
    #[serde(default)]
    pub options: BTreeMap<String, SpaceOption>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_tab_size: default_tab_size(),
            language: None,
            align: AlignConfig::default(),
            options: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Maximum reasonable tab size
    const MAX_TAB_SIZE: usize = 32;
    /// Maximum alignment span in lines
    const MAX_SPAN: usize = 5000;
    /// Maximum alignment threshold in columns
    const MAX_THRESH: usize = 5000;

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.input_tab_size == 0 {
            return Some("input_tab_size must be at least 1".to_string());
        }
        if self.input_tab_size > Self::MAX_TAB_SIZE {
            return Some(format!(
                "input_tab_size {} exceeds maximum of {}",
                self.input_tab_size,
                Self::MAX_TAB_SIZE
            ));
        }
        if self.align.braced_init_list_span > Self::MAX_SPAN {
            return Some(format!(
                "braced_init_list_span {} exceeds maximum of {}",
                self.align.braced_init_list_span,
                Self::MAX_SPAN
            ));
        }
        if self.align.braced_init_list_thresh > Self::MAX_THRESH {
            return Some(format!(
                "braced_init_list_thresh {} exceeds maximum of {}",
                self.align.braced_init_list_thresh,
                Self::MAX_THRESH
            ));
        }
        if let Some(name) = &self.language {
            if LangFlags::from_name(name).is_none() {
                return Some(format!("unknown language '{name}'"));
            }
        }
        for name in self.options.keys() {
            if let Err(e) = name.parse::<OptionId>() {
                return Some(e);
            }
        }
        None
    }

    /// Configured language, if any and valid
    #[must_use]
    pub fn lang(&self) -> Option<LangFlags> {
        self.language.as_deref().and_then(LangFlags::from_name)
    }

    /// Settings table seeded with the explicit options
    ///
    /// Unknown option names are skipped; `validate` reports them.
    #[must_use]
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        for (name, &value) in &self.options {
            if let Ok(id) = name.parse::<OptionId>() {
                settings.set_explicit(id, value);
            }
        }
        settings
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(&partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialConfig) {
        if let Some(v) = partial.input_tab_size {
            self.input_tab_size = v;
        }
        if let Some(v) = &partial.language {
            self.language = Some(v.clone());
        }
        if let Some(v) = partial.align.braced_init_list_span {
            self.align.braced_init_list_span = v;
        }
        if let Some(v) = partial.align.braced_init_list_thresh {
            self.align.braced_init_list_thresh = v;
        }
        for (k, v) in &partial.options {
            self.options.insert(k.clone(), *v);
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // root first, so nearer files override
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in &Self::discover_config_files(start_path) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(&partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }
}
