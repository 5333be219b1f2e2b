//! Bridge configuration.
//!
//! Configuration is read from `.formbridge.toml` in the working directory,
//! or from the file given with `--config`. Every field is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! terminator = "\u0004"
//! ping_message = "pong"
//! repeating_types = ["datagrid", "editgrid"]
//! resource_dir = "forms"
//! log_file = "formbridge.log"
//!
//! [validator]
//! program = "node"
//! args = ["validate.js", "${resourceDir}"]
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".formbridge.toml";

/// Root bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Message terminator on stdin, stdout and stderr.
    pub terminator: String,
    /// Reply to `ping` and to unknown operations.
    pub ping_message: String,
    /// Component types whose data is a list of rows.
    pub repeating_types: Vec<String>,
    /// Directory holding form resources and custom components.
    pub resource_dir: Option<PathBuf>,
    /// External validation engine.
    pub validator: Option<ValidatorConfig>,
    /// Write logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            terminator: "\u{4}".to_string(),
            ping_message: "pong".to_string(),
            repeating_types: formprune::schema::DEFAULT_REPEATING_TYPES
                .iter()
                .map(|ty| ty.to_string())
                .collect(),
            resource_dir: None,
            validator: None,
            log_file: None,
        }
    }
}

/// External validation engine invocation.
///
/// The engine gets `{"form", "submission", "components"}` on stdin and
/// answers with the validated submission on stdout. Anything on stderr, or
/// a non-zero exit, is a failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ValidatorConfig {
    /// Program to run.
    pub program: String,
    /// Program arguments. `${resourceDir}` is replaced with the resource directory.
    #[serde(default)]
    pub args: Vec<String>,
    /// Seconds to wait for the engine before killing it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl BridgeConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] when the text is not a valid configuration.
    pub fn from_toml_str(content: &str, origin: &Path) -> BridgeResult<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] in `workdir` is used when present and the
    /// defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>, workdir: &Path) -> BridgeResult<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (workdir.join(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            debug!("no {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| BridgeError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content, &path)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
