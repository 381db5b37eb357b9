//! Render-site resolution of template references
//!
//! A compiled template only knows the *shape* of a reference. Whether
//! `{{ambiguous-curlies}}` is a helper call, a component or a property of the
//! context is decided here, against the registry of the engine that is
//! rendering, never the one that registered the template.

use std::rc::Rc;

use super::RenderError;
use crate::registry::{ComponentDefinition, HelperDefinition, Registry};
use crate::template::{Expr, Invocation, Template};
use crate::value::Value;

/// What a reference means in one registry
#[derive(Debug, Clone)]
pub enum Resolution<'r> {
    Property(Value),
    Helper(&'r HelperDefinition),
    Component {
        definition: Option<&'r ComponentDefinition>,
        layout: Option<Rc<Template>>,
    },
}

impl Resolution<'_> {
    pub fn is_property(&self) -> bool {
        matches!(self, Resolution::Property(_))
    }
}

/// Resolve an invocation against the rendering registry and context
///
/// Dashed single-segment names try helper, then component, then property.
/// Any other name without arguments is a property. A name with arguments
/// must resolve to a helper or component.
pub fn resolve<'r>(
    invocation: &Invocation,
    registry: &'r Registry,
    context: &Value,
) -> Result<Resolution<'r>, RenderError> {
    let path = &invocation.path;
    let name = path.head();

    if path.is_dashed_name() || invocation.has_arguments() {
        if let Some(helper) = registry.helper(name) {
            return Ok(Resolution::Helper(helper));
        }
        let definition = registry.component(name);
        let layout = definition
            .and_then(|d| d.layout.clone())
            .or_else(|| registry.component_layout(name));
        if definition.is_some() || layout.is_some() {
            return Ok(Resolution::Component { definition, layout });
        }
        if invocation.has_arguments() {
            return Err(RenderError::UnknownHelper {
                name: path.to_string(),
                owner: registry.owner().to_string(),
            });
        }
    }

    Ok(Resolution::Property(lookup(context, path.property_segments())))
}

/// Evaluate an argument expression in a context
pub fn evaluate(expr: &Expr, context: &Value) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Path(path) => lookup(context, path.property_segments()),
    }
}

fn lookup(context: &Value, segments: &[String]) -> Value {
    if segments.is_empty() {
        return context.clone();
    }
    context.get_path(segments).cloned().unwrap_or_default()
}
