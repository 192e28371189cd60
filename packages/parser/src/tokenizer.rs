//! Two-level lexer for document markup.
//!
//! The outer [`Token`] stream splits the source into tags and text runs.
//! Each tag is then re-lexed with [`TagToken`] to read its name and
//! attributes, so text content never goes through the attribute grammar.

use crate::error::{ParseError, ParseResult};
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Top-level markup tokens
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// `<name attr="value">` or `<name/>`
    #[regex(r#"<[a-z_][a-z0-9_]*([^<>"]|"[^"]*")*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    /// `</name>`
    #[regex(r"</[a-z_][a-z0-9_]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    /// Raw text up to the next `<`
    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a single tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TagToken<'src> {
    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[regex(r"[a-z_][a-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    String(&'src str),
}

impl<'src> Token<'src> {
    /// Element name of a close tag
    pub fn close_name(slice: &'src str) -> &'src str {
        slice
            .trim_start_matches("</")
            .trim_end_matches('>')
            .trim_end()
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenTag(s) => write!(f, "tag {}", s),
            Token::CloseTag(s) => write!(f, "closing tag {}", s),
            Token::Text(s) => write!(f, "text {:?}", s),
        }
    }
}

impl<'src> fmt::Display for TagToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagToken::LAngle => write!(f, "<"),
            TagToken::RAngle => write!(f, ">"),
            TagToken::SelfClose => write!(f, "/>"),
            TagToken::Equals => write!(f, "="),
            TagToken::Ident(s) => write!(f, "identifier '{}'", s),
            TagToken::String(s) => write!(f, "string \"{}\"", s),
        }
    }
}

/// Tokenize a source string
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Range<usize>)>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ParseError::lex_error(
                span.clone(),
                format!("unexpected {:?}", &source[span]),
            )),
        })
        .collect()
}

/// Tokenize the inside of a tag. Spans are shifted by `base` so they point
/// into the full document.
pub fn tokenize_tag(tag: &str, base: usize) -> ParseResult<Vec<(TagToken<'_>, Range<usize>)>> {
    TagToken::lexer(tag)
        .spanned()
        .map(|(result, span)| {
            let absolute = span.start + base..span.end + base;
            match result {
                Ok(token) => Ok((token, absolute)),
                Err(()) => Err(ParseError::lex_error(
                    absolute,
                    format!("unexpected {:?} in tag", &tag[span]),
                )),
            }
        })
        .collect()
}
