// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generator configuration, optionally persisted as JSON (`arow.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assemble::Segregation;
use crate::error::GenError;

/// Default Rust path record types are resolved under.
pub const DEFAULT_TYPE_ROOT: &str = "crate";

fn default_type_root() -> String {
    DEFAULT_TYPE_ROOT.to_owned()
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Existing directory output files are written under.
    pub root_path: PathBuf,
    /// File grouping policy.
    #[serde(default)]
    pub segregation: Segregation,
    /// Rust path the record namespaces hang off.
    #[serde(default = "default_type_root")]
    pub type_root: String,
}

impl GeneratorConfig {
    /// Config writing to `root_path` with default policy and type root.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            segregation: Segregation::default(),
            type_root: default_type_root(),
        }
    }

    /// Builder-style policy override.
    pub fn with_segregation(mut self, segregation: Segregation) -> Self {
        self.segregation = segregation;
        self
    }

    /// Builder-style type root override.
    pub fn with_type_root(mut self, type_root: impl Into<String>) -> Self {
        self.type_root = type_root.into();
        self
    }

    /// Load a config file. A missing or empty file yields `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, GenError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GenError::Storage {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), GenError> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data).map_err(|source| GenError::Storage {
            path: path.to_path_buf(),
            source,
        })
    }
}
