//! Registries backed by a local directory tree

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use include_dir::Dir;
use serde_json::Value;
use tracing::{debug, warn};

use super::RegistryRefConfig;
use crate::error::RegistryError;
use crate::key::SchemaKey;

/// Where an embedded registry reads its documents from
#[derive(Clone)]
pub enum EmbeddedSource {
    /// Directory on disk containing a `schemas/` folder
    Filesystem(PathBuf),
    /// Tree compiled into the binary via `include_dir!`
    Bundled(&'static Dir<'static>),
}

impl fmt::Debug for EmbeddedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddedSource::Filesystem(root) => f.debug_tuple("Filesystem").field(root).finish(),
            EmbeddedSource::Bundled(dir) => f.debug_tuple("Bundled").field(&dir.path()).finish(),
        }
    }
}

/// Registry that reads `<root>/schemas/<key path>` without any network access
#[derive(Debug, Clone)]
pub struct EmbeddedRegistry {
    pub config: RegistryRefConfig,
    source: EmbeddedSource,
}

impl EmbeddedRegistry {
    pub fn from_path(config: RegistryRefConfig, root: impl AsRef<Path>) -> Self {
        Self {
            config,
            source: EmbeddedSource::Filesystem(root.as_ref().to_path_buf()),
        }
    }

    pub fn from_bundled(config: RegistryRefConfig, dir: &'static Dir<'static>) -> Self {
        Self {
            config,
            source: EmbeddedSource::Bundled(dir),
        }
    }

    pub fn source(&self) -> &EmbeddedSource {
        &self.source
    }

    /// Missing documents are `Ok(None)`; unreadable or unparseable ones are errors
    pub fn lookup_schema(&self, key: &SchemaKey) -> Result<Option<Value>, RegistryError> {
        let relative = format!("schemas/{}", key.as_path());

        let content = match &self.source {
            EmbeddedSource::Bundled(dir) => match dir.get_file(&relative) {
                Some(file) => file.contents_utf8().map(str::to_owned).ok_or_else(|| {
                    RegistryError::InvalidDocument(format!("{} is not valid UTF-8", relative))
                })?,
                None => {
                    debug!(registry = %self.config.name, %key, "not bundled");
                    return Ok(None);
                }
            },
            EmbeddedSource::Filesystem(root) => {
                if escapes_root(key) {
                    warn!(registry = %self.config.name, %key, "key would resolve outside the registry root");
                    return Ok(None);
                }
                let path = root.join(&relative);
                match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!(registry = %self.config.name, path = %path.display(), "no such file");
                        return Ok(None);
                    }
                    Err(e) => return Err(RegistryError::Io(e)),
                }
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| RegistryError::InvalidDocument(format!("{}: {}", relative, e)))
    }
}

/// A vendor of only dots (`..`) is valid Iglu grammar but is a parent-directory
/// component on disk. Keys built with `SchemaKey::new` are not grammar-checked at all.
fn escapes_root(key: &SchemaKey) -> bool {
    [&key.vendor, &key.name, &key.format].iter().any(|part| {
        part.is_empty() || part.chars().all(|c| c == '.') || part.contains(['/', '\\'])
    })
}
