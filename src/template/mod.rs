//! Template language
//!
//! Templates are compiled once into an immutable [`Template`] value that can be
//! registered in any number of registries. Compilation only records structure;
//! what a bare reference such as `{{ambiguous-curlies}}` means is decided when
//! the template is rendered, by the registry of the engine rendering it.
//!
//! # Example
//!
//! ```text
//! <h1>{{contextType}}</h1>
//! {{ambiguous-curlies}}
//! {{partial "footer"}}
//! {{foo-bar wat=contextType}}
//! {{outlet}}
//! ```

mod ast;
mod grammar;
pub mod lexer;

pub use ast::{Expr, Invocation, Mustache, Node, Path, Template};
pub use grammar::compile;
