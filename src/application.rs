//! The application: host registry, route map and run loop
//!
//! ```
//! use engine_router::{compile, Application, EngineDefinition, VisitOptions};
//!
//! let mut app = Application::new();
//! app.register("application", compile("Application{{outlet}}").unwrap());
//! app.register(
//!     "blog",
//!     EngineDefinition::new().init(|registry| {
//!         registry.register("application", compile("Engine{{outlet}}").unwrap());
//!     }),
//! );
//! app.map(|map| {
//!     map.mount("blog");
//! });
//!
//! let navigation = app.visit("/blog", VisitOptions::default()).unwrap();
//! app.block_on(navigation).unwrap();
//! assert_eq!(app.text(), "ApplicationEngine");
//! ```

use std::rc::Rc;

use crate::config::{AppConfig, VisitOptions};
use crate::engine::Engines;
use crate::outlet::Reconciliation;
use crate::registry::{Artifact, Registry};
use crate::render::text_content;
use crate::route::{Params, RouteMap};
use crate::router::{Navigation, Router};
use crate::runloop::RunLoop;
use crate::value::Value;
use crate::AppError;

/// A host application with its engines
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    registry: Option<Registry>,
    routes: RouteMap,
    run_loop: RunLoop,
    router: Option<Rc<Router>>,
    last_render: Option<Reconciliation>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            registry: Some(Registry::new("application")),
            routes: RouteMap::new(),
            run_loop: RunLoop::new(),
            router: None,
            last_render: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register an artifact in the host registry
    ///
    /// The registry is frozen at boot; later registrations are ignored.
    pub fn register(&mut self, name: impl Into<String>, artifact: impl Into<Artifact>) -> &mut Self {
        match &mut self.registry {
            Some(registry) => {
                registry.register(name, artifact);
            }
            None => {
                tracing::warn!(name = %name.into(), "registration after boot ignored");
            }
        }
        self
    }

    /// Declare the host route map
    pub fn map(&mut self, f: impl FnOnce(&mut RouteMap)) -> &mut Self {
        f(&mut self.routes);
        self
    }

    pub fn routes(&mut self, routes: RouteMap) -> &mut Self {
        self.routes = routes;
        self
    }

    pub fn is_booted(&self) -> bool {
        self.router.is_some()
    }

    /// Freeze the host registry, instantiate routable engines and build the route tree
    pub fn boot(&mut self) -> Result<Rc<Router>, AppError> {
        if let Some(router) = &self.router {
            return Ok(router.clone());
        }
        self.config.validate()?;
        let registry = self.registry.take().unwrap_or_else(|| Registry::new("application"));
        let engines = Rc::new(Engines::new(registry, self.config.engine_settings()));
        let router = Rc::new(Router::new(
            engines,
            &self.routes,
            self.config.clone(),
            self.run_loop.spawner(),
        )?);
        tracing::debug!("application booted");
        self.router = Some(router.clone());
        Ok(router)
    }

    pub fn router(&self) -> Option<&Rc<Router>> {
        self.router.as_ref()
    }

    /// Start a navigation to a URL, booting first if needed
    pub fn visit(&mut self, url: &str, options: VisitOptions) -> Result<Navigation, AppError> {
        Ok(self.boot()?.visit(url, options))
    }

    /// Start a navigation to a named route
    pub fn transition_to(&mut self, name: &str) -> Result<Navigation, AppError> {
        Ok(self.boot()?.transition_to(name))
    }

    pub fn transition_with_params(&mut self, name: &str, params: Params) -> Result<Navigation, AppError> {
        Ok(self.boot()?.transition_with_params(name, params))
    }

    /// Run queued tasks until none can progress, then flush rendering
    pub fn settle(&mut self) -> Result<(), AppError> {
        self.run_loop.run_until_stalled();
        self.flush()
    }

    /// Drive the run loop until the navigation settles, then flush rendering
    ///
    /// The navigation's error takes precedence over a render error.
    pub fn block_on(&mut self, navigation: Navigation) -> Result<(), AppError> {
        let result = self.run_loop.run_until(navigation);
        self.run_loop.run_until_stalled();
        let rendered = self.flush();
        result?;
        rendered
    }

    /// Visit a URL and wait for it to settle
    pub fn visit_and_settle(&mut self, url: &str, options: VisitOptions) -> Result<(), AppError> {
        let navigation = self.visit(url, options)?;
        self.block_on(navigation)
    }

    fn flush(&mut self) -> Result<(), AppError> {
        if let Some(router) = &self.router {
            if let Some(reconciliation) = router.flush()? {
                self.last_render = Some(reconciliation);
            }
        }
        Ok(())
    }

    /// The depths retained and replaced by the last outlet rebuild
    pub fn last_render(&self) -> Option<&Reconciliation> {
        self.last_render.as_ref()
    }

    /// Rendered markup
    pub fn html(&self) -> String {
        self.router.as_ref().map(|r| r.output()).unwrap_or_default()
    }

    /// Rendered text content, markup stripped
    pub fn text(&self) -> String {
        text_content(&self.html())
    }

    pub fn current_url(&self) -> Option<String> {
        self.router.as_ref().and_then(|r| r.current_url())
    }

    /// Set a controller property of an active route; re-renders on the next flush
    pub fn set(&mut self, route: &str, key: &str, value: impl Into<Value>) -> Result<(), AppError> {
        let router = self.router.as_ref().ok_or(AppError::NotBooted)?;
        router.set(route, key, value.into())?;
        Ok(())
    }

    /// Exit every active route and destroy all route handlers
    pub fn destroy(&mut self) {
        if let Some(router) = self.router.take() {
            router.teardown();
        }
        self.last_render = None;
    }
}
