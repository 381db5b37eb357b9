//! Lexer for the template language using logos
//!
//! Templates are plain text with `{{ ... }}` mustaches. Text outside a
//! mustache is emitted as a single [`Token::Text`]; the inside of each
//! mustache is tokenized by logos.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Produced by the outer scanner, never by logos
    Text(String),
    Open,
    Close,
    Invalid,

    // Keywords
    #[token("outlet")]
    Outlet,
    #[token("partial")]
    Partial,
    #[token("mount")]
    Mount,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("=")]
    Equals,

    // Property paths and dashed names: `model.message`, `ambiguous-curlies`
    #[regex(r"[a-zA-Z_@][a-zA-Z0-9_\-]*(\.[a-zA-Z0-9_\-]+)*", |lex| lex.slice().to_string(), priority = 1)]
    Path(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Lex template source into tokens with spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < input.len() {
        let rest = &input[offset..];
        let Some(start) = rest.find(OPEN) else {
            tokens.push((Token::Text(rest.to_string()), offset..input.len()));
            break;
        };

        if start > 0 {
            tokens.push((Token::Text(rest[..start].to_string()), offset..offset + start));
        }

        let open_at = offset + start;
        tokens.push((Token::Open, open_at..open_at + OPEN.len()));

        let inner_start = open_at + OPEN.len();
        let inner_end = input[inner_start..]
            .find(CLOSE)
            .map(|i| inner_start + i)
            .unwrap_or(input.len());

        for (tok, span) in Token::lexer(&input[inner_start..inner_end]).spanned() {
            let span = inner_start + span.start..inner_start + span.end;
            tokens.push((tok.unwrap_or(Token::Invalid), span));
        }

        if inner_end < input.len() {
            tokens.push((Token::Close, inner_end..inner_end + CLOSE.len()));
            offset = inner_end + CLOSE.len();
        } else {
            // Unterminated mustache; the parser reports the missing `}}`
            offset = inner_end;
        }
    }

    tokens
}
