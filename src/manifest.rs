//! TOML application manifests
//!
//! A manifest describes an application without code: templates, controller
//! properties, static models and the route map, for the host and for every
//! engine. Routes listed under `models` resolve their `model` hook with the
//! given value; routes under `rejections` reject it with the given message.
//!
//! ```toml
//! [config]
//! module_based_resolver = true
//!
//! [templates]
//! application = "Application{{outlet}}"
//!
//! [[routes]]
//! mount = "blog"
//!
//! [engines.blog.templates]
//! application = "Engine{{lang}}{{outlet}}"
//! application_error = "Error! {{model.message}}"
//!
//! [engines.blog.controllers.application]
//! query_params = ["lang"]
//! properties = { lang = "" }
//!
//! [[engines.blog.routes]]
//! route = "post"
//!
//! [engines.blog.rejections]
//! post = "Oh, noes!"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;

use crate::application::Application;
use crate::config::AppConfig;
use crate::controller::ControllerDefinition;
use crate::engine::EngineDefinition;
use crate::error::CompileError;
use crate::registry::{Artifact, ComponentDefinition, Registry};
use crate::route::{HookError, HookOutcome, RouteDefinition, RouteMap};
use crate::template::{compile, Template};
use crate::value::Value;

/// Errors that can occur when loading a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse manifest TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("template '{name}' failed to compile")]
    Template {
        name: String,
        text: String,
        errors: Vec<CompileError>,
    },
}

impl ManifestError {
    /// Format compile errors against their template source with ariadne
    pub fn report(&self) -> String {
        match self {
            ManifestError::Template { name, text, errors } => errors
                .iter()
                .map(|e| e.format(text, name))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

/// A controller: default properties and query params
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControllerManifest {
    pub properties: BTreeMap<String, Value>,
    pub query_params: Vec<String>,
}

/// One route map entry: `{ route = "post", path = "/post/:id", children = [...] }`
/// or `{ mount = "blog", as = "news" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RouteManifest {
    Route {
        route: String,
        path: Option<String>,
        #[serde(default)]
        children: Vec<RouteManifest>,
    },
    Mount {
        mount: String,
        #[serde(rename = "as")]
        alias: Option<String>,
        path: Option<String>,
    },
}

/// Registrations for the host or one engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeManifest {
    pub templates: BTreeMap<String, String>,
    /// Component layouts by component name
    pub components: BTreeMap<String, String>,
    pub controllers: BTreeMap<String, ControllerManifest>,
    pub models: BTreeMap<String, Value>,
    pub rejections: BTreeMap<String, String>,
    pub routes: Vec<RouteManifest>,
    pub engines: BTreeMap<String, EngineManifest>,
}

/// An engine: its registrations plus resolver settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineManifest {
    pub module_based: Option<bool>,
    #[serde(flatten)]
    pub scope: ScopeManifest,
}

/// A whole application
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub config: AppConfig,
    #[serde(flatten)]
    pub scope: ScopeManifest,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Compile every template and build the application
    pub fn into_application(self) -> Result<Application, ManifestError> {
        let mut app = Application::with_config(self.config.clone());
        for (name, artifact) in self.scope.artifacts()? {
            app.register(name, artifact);
        }
        app.routes(route_map(&self.scope.routes));
        Ok(app)
    }
}

impl ScopeManifest {
    /// Everything this scope registers, templates compiled
    pub fn artifacts(&self) -> Result<Vec<(String, Artifact)>, ManifestError> {
        let mut artifacts = Vec::new();

        for (name, source) in &self.templates {
            artifacts.push((name.clone(), compile_named(name, source)?.into()));
        }
        for (name, source) in &self.components {
            let layout = compile_named(&format!("components/{}", name), source)?;
            artifacts.push((name.clone(), ComponentDefinition::new().layout(layout).into()));
        }
        for (name, controller) in &self.controllers {
            let mut definition = ControllerDefinition::new().query_params(controller.query_params.clone());
            for (key, value) in &controller.properties {
                definition = definition.property(key.clone(), value.clone());
            }
            artifacts.push((name.clone(), definition.into()));
        }
        for (name, model) in &self.models {
            if self.rejections.contains_key(name) {
                continue;
            }
            let model = model.clone();
            artifacts.push((name.clone(), RouteDefinition::new().model(move |_| model.clone()).into()));
        }
        for (name, message) in &self.rejections {
            let message = message.clone();
            let definition = RouteDefinition::new().model(move |_| HookOutcome::reject(HookError::new(message.clone())));
            artifacts.push((name.clone(), definition.into()));
        }
        for (name, engine) in &self.engines {
            artifacts.push((name.clone(), engine.definition()?.into()));
        }
        Ok(artifacts)
    }
}

impl EngineManifest {
    fn definition(&self) -> Result<EngineDefinition, ManifestError> {
        let artifacts = Rc::new(self.scope.artifacts()?);
        let mut definition = EngineDefinition::new().init(move |registry: &mut Registry| {
            for (name, artifact) in artifacts.iter() {
                registry.register(name.clone(), artifact.clone());
            }
        });
        if !self.scope.routes.is_empty() {
            definition = definition.routes(route_map(&self.scope.routes));
        }
        if let Some(module_based) = self.module_based {
            definition = definition.module_based(module_based);
        }
        Ok(definition)
    }
}

fn compile_named(name: &str, source: &str) -> Result<Rc<Template>, ManifestError> {
    compile(source).map(Rc::new).map_err(|errors| ManifestError::Template {
        name: name.to_string(),
        text: source.to_string(),
        errors,
    })
}

fn route_map(routes: &[RouteManifest]) -> RouteMap {
    RouteMap::build(|map| {
        for entry in routes {
            match entry {
                RouteManifest::Route { route, path, children } => match path {
                    Some(path) => {
                        map.route_at(route.clone(), path.clone(), |m| *m = route_map(children));
                    }
                    None => {
                        map.route_with(route.clone(), |m| *m = route_map(children));
                    }
                },
                RouteManifest::Mount { mount, alias, path } => match alias {
                    Some(alias) => {
                        map.mount_as(mount.clone(), alias.clone(), path.clone());
                    }
                    None if path.is_some() => {
                        map.mount_as(mount.clone(), mount.clone(), path.clone());
                    }
                    None => {
                        map.mount(mount.clone());
                    }
                },
            }
        }
    })
}
