//! Configuration file support for pianomap
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/pianomap/config.toml`
//! - macOS: `~/Library/Application Support/pianomap/config.toml`
//! - Windows: `%APPDATA%\pianomap\config.toml`

use crate::error::{Error, Result};
use directories::ProjectDirs;
use pianomap_sfz::{builtin_profile, InstrumentProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_OUTPUT_DIR: &str = "map";

const DEFAULT_CONFIG: &str = r#"# pianomap configuration file

# Directory the JSON documents are written to
output_dir = "map"

# Base directory for relative instrument paths (optional)
# root_dir = "data"

# One entry per instrument to convert.
# `profile` selects the metadata and velocity layer profile; it defaults to
# the instrument name. Built-in profiles: "salamander", "splendid".

# [[instruments]]
# name = "salamander"
# sfz = "salamander/Salamander Grand Piano V3.sfz"

# [[instruments]]
# name = "splendid"
# sfz = "splendid/Splendid Grand Piano.sfz"

# Custom profiles
#
# [profiles.my_piano]
# file_extension = "wav"
# velocity_layers = [
#     { lovel = 1, hivel = 64, name = "soft" },
#     { lovel = 65, hivel = 127, name = "loud" },
# ]
#
# [profiles.my_piano.metadata]
# type = "My Piano"
"#;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `<name>.json` documents are written
    pub output_dir: PathBuf,
    /// Base for relative `sfz` paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    /// Instruments to convert, in order
    pub instruments: Vec<InstrumentEntry>,
    /// Profiles by name; these shadow the built-in ones
    pub profiles: BTreeMap<String, InstrumentProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            root_dir: None,
            instruments: Vec::new(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "pianomap") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::create_config_file_at(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`, refusing to overwrite
    pub fn create_config_file_at(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(Error::Config(format!(
                "Config file already exists at {:?}",
                path
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Profile for an instrument
    ///
    /// Looks in `profiles` first, then at the built-in profiles, and falls
    /// back to the default profile.
    pub fn profile_for(&self, instrument: &InstrumentEntry) -> InstrumentProfile {
        let name = instrument.profile_name();
        self.profiles
            .get(name)
            .cloned()
            .or_else(|| builtin_profile(name))
            .unwrap_or_default()
    }

    /// Root SFZ path of an instrument, relative paths taken from `root_dir`
    pub fn sfz_path(&self, instrument: &InstrumentEntry) -> PathBuf {
        match &self.root_dir {
            Some(root) if instrument.sfz.is_relative() => root.join(&instrument.sfz),
            _ => instrument.sfz.clone(),
        }
    }

    /// Output file of an instrument
    pub fn output_path(&self, instrument: &InstrumentEntry) -> PathBuf {
        self.output_dir.join(format!("{}.json", instrument.name))
    }
}

/// An instrument to convert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    /// Reported as `instrumentName` and used as the output file stem
    pub name: String,
    /// Root SFZ file
    pub sfz: PathBuf,
    /// Profile name, defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl InstrumentEntry {
    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or(&self.name)
    }
}

/// `NAME=PATH`, as given on the command line
impl FromStr for InstrumentEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, sfz) = s
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("Expected NAME=PATH, got {:?}", s)))?;
        let name = name.trim();
        if name.is_empty() || sfz.trim().is_empty() {
            return Err(Error::Config(format!("Expected NAME=PATH, got {:?}", s)));
        }
        Ok(Self {
            name: name.to_string(),
            sfz: PathBuf::from(sfz.trim()),
            profile: None,
        })
    }
}
