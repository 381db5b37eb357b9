//! Error types for template compilation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Template syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl CompileError {
    pub fn span(&self) -> &Span {
        match self {
            CompileError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            CompileError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);

                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for CompileError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        CompileError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Text(_) => "text".to_string(),
        Token::Open => "'{{'".to_string(),
        Token::Close => "'}}'".to_string(),
        Token::Invalid => "invalid character".to_string(),
        Token::Outlet => "keyword 'outlet'".to_string(),
        Token::Partial => "keyword 'partial'".to_string(),
        Token::Mount => "keyword 'mount'".to_string(),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Path(p) => format!("path '{}'", p),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
    }
}

#[cfg(test)]
mod tests {
    use crate::template::compile;

    #[test]
    fn test_error_reports_found_token() {
        let errors = compile("{{mount chat}}").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("path 'chat'"));
    }

    #[test]
    fn test_format_includes_filename() {
        let source = "Hello {{name";
        let errors = compile(source).unwrap_err();
        let report = errors[0].format(source, "greeting.hbs");
        assert!(report.contains("greeting.hbs"));
    }
}
