//! Resolution of named scripts to source text.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::LoadError;

/// Resolves a script name to its source text.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, name: &str) -> Result<String, LoadError>;
}

/// Loads `<root>/<name>.js` and keeps the text in memory after the first read.
#[derive(Debug)]
pub struct DirectoryScriptLoader {
    root: PathBuf,
    loaded: RwLock<HashMap<String, String>>,
}

impl DirectoryScriptLoader {
    /// File extension appended to script names.
    pub const EXTENSION: &'static str = "js";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Directory scripts are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a name resolves to, or an error for names that escape the root.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, LoadError> {
        let invalid = name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..");
        if invalid {
            return Err(LoadError::invalid_name(name));
        }
        Ok(self.root.join(format!("{}.{}", name, Self::EXTENSION)))
    }
}

#[async_trait]
impl ScriptLoader for DirectoryScriptLoader {
    async fn load(&self, name: &str) -> Result<String, LoadError> {
        if let Some(text) = self.loaded.read().await.get(name) {
            return Ok(text.clone());
        }

        let path = self.path_for(name)?;
        let text = tokio::fs::read_to_string(&path).await.map_err(|source| LoadError::Io {
            name: name.to_string(),
            source,
        })?;
        debug!(script = %name, path = %path.display(), "loaded script");

        self.loaded.write().await.insert(name.to_string(), text.clone());
        Ok(text)
    }
}

/// Loader backed by an in-memory table, for embedding or tests.
#[derive(Debug, Default, Clone)]
pub struct StaticScriptLoader {
    scripts: HashMap<String, String>,
}

impl StaticScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `name`.
    pub fn with_script(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), text.into());
        self
    }
}

#[async_trait]
impl ScriptLoader for StaticScriptLoader {
    async fn load(&self, name: &str) -> Result<String, LoadError> {
        self.scripts.get(name).cloned().ok_or_else(|| LoadError::unknown(name))
    }
}
