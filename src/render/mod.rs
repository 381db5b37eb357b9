//! Rendering the outlet tree to markup
//!
//! Rendering walks the outlet chain top-down. Every level renders its
//! template in a frame bound to the engine that owns the level, so that
//! `{{partial}}`, `{{mount}}` and ambiguous references resolve through that
//! engine's registry. Components and partials inherit the frame's engine.

mod resolve;

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::engine::{EngineInstance, Engines};
use crate::outlet::OutletState;
use crate::registry::RegistryError;
use crate::template::{Expr, Invocation, Mustache, Node, Template};
use crate::value::Value;

pub use resolve::{evaluate, resolve, Resolution};

/// Errors that can occur while rendering
///
/// Rendering happens when queued work is flushed, after the transition that
/// queued it has committed its routes and URL. These errors are therefore
/// reported by `Application::settle` and `Application::block_on`, never by the
/// transition's `Navigation`, and the committed route state is left in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("partial '{name}' is not registered in '{owner}'")]
    MissingPartial { name: String, owner: String },

    #[error("'{name}' is neither a helper nor a component in '{owner}'")]
    UnknownHelper { name: String, owner: String },

    #[error("cannot mount engine: {0}")]
    Mount(#[from] RegistryError),
}

struct Frame<'a> {
    engine: Rc<EngineInstance>,
    context: Value,
    outlet: Option<&'a OutletState>,
}

/// Renders outlet chains using the engines of one application
pub struct Renderer<'e> {
    engines: &'e Engines,
}

impl<'e> Renderer<'e> {
    pub fn new(engines: &'e Engines) -> Self {
        Self { engines }
    }

    /// Render a whole outlet chain
    pub fn render(&self, root: &OutletState) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_outlet(root, &mut out)?;
        Ok(out)
    }

    fn render_outlet(&self, state: &OutletState, out: &mut String) -> Result<(), RenderError> {
        let mut context = state.controller.borrow().context();
        if let Value::Map(map) = &mut context {
            map.insert("model".to_string(), state.model.clone());
        }
        let frame = Frame {
            engine: self.engines.get(state.engine),
            context,
            outlet: state.child.as_deref(),
        };
        self.render_template(&state.template, &frame, out)
    }

    fn render_template(&self, template: &Template, frame: &Frame<'_>, out: &mut String) -> Result<(), RenderError> {
        for node in &template.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Mustache(Mustache::Outlet) => {
                    if let Some(child) = frame.outlet {
                        self.render_outlet(child, out)?;
                    }
                }
                Node::Mustache(Mustache::Partial(expr)) => self.render_partial(expr, frame, out)?,
                Node::Mustache(Mustache::Mount(name)) => self.render_mount(name, frame, out)?,
                Node::Mustache(Mustache::Invoke(invocation)) => self.render_invocation(invocation, frame, out)?,
            }
        }
        Ok(())
    }

    fn render_partial(&self, expr: &Expr, frame: &Frame<'_>, out: &mut String) -> Result<(), RenderError> {
        let name = evaluate(expr, &frame.context).to_string();
        let registry = frame.engine.registry();
        let partial = registry.template(&name).ok_or_else(|| RenderError::MissingPartial {
            name: name.clone(),
            owner: registry.owner().to_string(),
        })?;
        self.render_template(&partial, frame, out)
    }

    fn render_mount(&self, name: &str, frame: &Frame<'_>, out: &mut String) -> Result<(), RenderError> {
        let engine = self.engines.mount_routeless(frame.engine.id(), name)?;
        let controller = engine.controller_for("application");
        let template = engine.template_for("application");
        let context = controller.borrow().context();
        let mounted = Frame {
            engine,
            context,
            outlet: None,
        };
        self.render_template(&template, &mounted, out)
    }

    fn render_invocation(&self, invocation: &Invocation, frame: &Frame<'_>, out: &mut String) -> Result<(), RenderError> {
        match resolve(invocation, frame.engine.registry(), &frame.context)? {
            Resolution::Property(value) => out.push_str(&value.to_string()),
            Resolution::Helper(helper) => {
                let params: Vec<Value> = invocation.params.iter().map(|p| evaluate(p, &frame.context)).collect();
                let hash = self.evaluate_hash(invocation, &frame.context);
                out.push_str(&helper.call(&params, &hash).to_string());
            }
            Resolution::Component { definition, layout } => {
                let Some(layout) = layout else {
                    return Ok(());
                };
                let attrs = self.evaluate_hash(invocation, &frame.context);
                let mut properties = definition.map(|d| d.properties.clone()).unwrap_or_default();
                properties.extend(attrs.clone());
                properties.insert("attrs".to_string(), Value::Map(attrs));
                let component = Frame {
                    engine: frame.engine.clone(),
                    context: Value::Map(properties),
                    outlet: None,
                };
                self.render_template(&layout, &component, out)?;
            }
        }
        Ok(())
    }

    fn evaluate_hash(&self, invocation: &Invocation, context: &Value) -> BTreeMap<String, Value> {
        invocation
            .hash
            .iter()
            .map(|(key, expr)| (key.clone(), evaluate(expr, context)))
            .collect()
    }
}

/// Text content of rendered markup: everything outside `<...>` tags
pub fn text_content(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}
