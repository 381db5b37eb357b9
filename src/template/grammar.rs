//! Template parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::*;
use super::lexer::{lex, Token};
use crate::error::CompileError;
use crate::value::Value;

/// A mustache argument before it is split into params and hash pairs
#[derive(Debug, Clone)]
enum Argument {
    Positional(Expr),
    Named(String, Expr),
}

/// Compile template source into a [`Template`]
pub fn compile(input: &str) -> Result<Template, Vec<CompileError>> {
    let len = input.len();

    let token_iter = lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, SimpleSpan::from(span)));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map(Template::new)
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Vec<Node>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let path = select! {
        Token::Path(p) => Path::parse(&p),
    };

    let literal = select! {
        Token::String(s) => Value::String(s),
        Token::Number(n) => Value::Number(n),
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
    };

    let expr = choice((literal.map(Expr::Literal), path.clone().map(Expr::Path)));

    let named = select! { Token::Path(key) => key }
        .then_ignore(just(Token::Equals))
        .then(expr.clone())
        .map(|(key, value)| Argument::Named(key, value));

    let argument = named.or(expr.clone().map(Argument::Positional));

    let invocation = path
        .then(argument.repeated().collect::<Vec<_>>())
        .map(|(path, arguments)| {
            let mut params = Vec::new();
            let mut hash = Vec::new();
            for argument in arguments {
                match argument {
                    Argument::Positional(expr) => params.push(expr),
                    Argument::Named(key, expr) => hash.push((key, expr)),
                }
            }
            Mustache::Invoke(Invocation { path, params, hash })
        });

    let outlet = just(Token::Outlet).to(Mustache::Outlet);

    let partial = just(Token::Partial)
        .ignore_then(expr)
        .map(Mustache::Partial);

    let mount = just(Token::Mount)
        .ignore_then(select! { Token::String(name) => name })
        .map(Mustache::Mount);

    let mustache = choice((outlet, partial, mount, invocation))
        .delimited_by(just(Token::Open), just(Token::Close))
        .map(Node::Mustache);

    let text = select! {
        Token::Text(t) => Node::Text(t),
    };

    choice((text, mustache))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}
