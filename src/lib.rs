//! Engine Router - routable engines with scoped registries
//!
//! An application composes its UI from a tree of routes. Engines are
//! independently packaged sub-applications, each with its own registry of
//! templates, routes and controllers, that can be mounted anywhere in the
//! host's route map or rendered inline with `{{mount}}`. One compiled
//! template may be registered by several engines; its ambiguous references
//! are resolved against whichever engine renders it.
//!
//! # Example
//!
//! ```rust
//! use engine_router::{compile, Application, ControllerDefinition, EngineDefinition, VisitOptions};
//!
//! let shared = std::rc::Rc::new(compile("<h1>{{contextType}}</h1>{{ambiguous-curlies}}{{outlet}}").unwrap());
//!
//! let mut app = Application::new();
//! app.register("application", shared.clone());
//! app.register(
//!     "application",
//!     ControllerDefinition::new()
//!         .property("contextType", "Application")
//!         .property("ambiguous-curlies", "Controller Data!"),
//! );
//! app.register(
//!     "blog",
//!     EngineDefinition::new().init(move |registry| {
//!         registry.register("application", shared.clone());
//!         registry.register("application", ControllerDefinition::new().property("contextType", "Engine"));
//!         registry.register("components/ambiguous-curlies", compile("<p>Component!</p>").unwrap());
//!     }),
//! );
//! app.map(|map| {
//!     map.mount("blog");
//! });
//!
//! app.visit_and_settle("/blog", VisitOptions::default()).unwrap();
//! assert_eq!(app.text(), "ApplicationController Data!EngineComponent!");
//! ```

pub mod application;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod outlet;
pub mod registry;
pub mod render;
pub mod route;
pub mod router;
pub mod runloop;
pub mod template;
pub mod value;

pub use application::Application;
pub use config::{AppConfig, ConfigError, VisitOptions};
pub use controller::{Controller, ControllerDefinition};
pub use engine::{EngineDefinition, EngineId, EngineInstance};
pub use error::CompileError;
pub use manifest::{Manifest, ManifestError};
pub use outlet::{OutletState, Reconciliation};
pub use registry::{ComponentDefinition, HelperDefinition, Key, Kind, Registry, RegistryError};
pub use render::RenderError;
pub use route::{HookContext, HookError, HookKind, HookOutcome, RouteDefinition, RouteHandler, RouteMap};
pub use router::{Navigation, Router, TransitionError};
pub use template::{compile, Template};
pub use value::Value;

use thiserror::Error;

/// Errors surfaced by [`Application`]
#[derive(Debug, Error)]
pub enum AppError {
    /// Template compilation failed
    #[error("template errors: {}", format_compile_errors(.0))]
    Compile(Vec<CompileError>),

    /// An engine or artifact could not be resolved
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A navigation failed
    #[error("transition failed: {0}")]
    Transition(#[from] TransitionError),

    /// Rendering the outlet tree failed
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An operation that needs a booted application
    #[error("application is not booted")]
    NotBooted,
}

impl From<Vec<CompileError>> for AppError {
    fn from(errors: Vec<CompileError>) -> Self {
        AppError::Compile(errors)
    }
}

fn format_compile_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
