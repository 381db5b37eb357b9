//! Application configuration
//!
//! Configuration can be built in code with the `with_*` methods or loaded
//! from TOML:
//!
//! ```toml
//! root_url = "/"
//! module_based_resolver = true
//! fallback_kinds = ["helper", "component"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::engine::EngineSettings;
use crate::registry::Kind;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("kind '{0}' cannot be shared through a fallback registry")]
    StructuralFallback(Kind),
}

/// Settings for one application and all of its engines
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix stripped from visited URLs and added to generated ones
    pub root_url: String,
    /// Enables sibling substates such as `post_error` and `application_loading`
    pub module_based_resolver: bool,
    /// Kinds an engine may resolve through its parent's registry
    pub fallback_kinds: Vec<Kind>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_url: "/".to_string(),
            module_based_resolver: false,
            fallback_kinds: vec![Kind::Helper],
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    pub fn with_module_based_resolver(mut self, enabled: bool) -> Self {
        self.module_based_resolver = enabled;
        self
    }

    pub fn with_fallback_kinds(mut self, kinds: impl IntoIterator<Item = Kind>) -> Self {
        self.fallback_kinds = kinds.into_iter().collect();
        self
    }

    /// Reject structural kinds in the fallback whitelist
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fallback_kinds.iter().find(|kind| kind.is_structural()) {
            Some(kind) => Err(ConfigError::StructuralFallback(*kind)),
            None => Ok(()),
        }
    }

    /// Strip the root URL prefix from a visited URL
    pub fn strip_root<'a>(&self, url: &'a str) -> &'a str {
        let root = self.root_url.trim_end_matches('/');
        if root.is_empty() {
            return url;
        }
        match url.strip_prefix(root) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') || rest.starts_with('?') => rest,
            _ => url,
        }
    }

    /// Prefix a generated URL with the root URL
    pub fn with_root(&self, url: &str) -> String {
        let root = self.root_url.trim_end_matches('/');
        format!("{}{}", root, url)
    }

    pub(crate) fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            module_based: self.module_based_resolver,
            fallback_kinds: self.fallback_kinds.iter().copied().collect::<BTreeSet<_>>(),
        }
    }
}

/// Options for a single visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOptions {
    /// When false, hooks run but the outlet tree is left untouched
    pub should_render: bool,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self { should_render: true }
    }
}

impl VisitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_should_render(mut self, should_render: bool) -> Self {
        self.should_render = should_render;
        self
    }
}
