//! # Quire Parser
//!
//! Tagged markup for Quire documents.
//!
//! ```text
//! <doc>
//!   <paragraph text_align="center">Hi <bold><color color="#f00">x</color></bold></paragraph>
//!   <image src="a.png" width="200" height="100"/>
//! </doc>
//! ```
//!
//! Element names are node or mark type names, attributes are node or mark
//! attributes. Attributes equal to their schema default are omitted when
//! serializing and filled back in when parsing.

pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use error::{ParseError, ParseResult, Span};
pub use parser::{parse, Parser};
pub use serializer::{serialize, serialize_pretty, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("<doc><paragraph>x</paragraph></doc>").unwrap();
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_parse_then_serialize() {
        let source = r#"<doc><heading level="2">Title</heading><paragraph>Body</paragraph></doc>"#;
        let doc = parse(source).unwrap();
        assert_eq!(serialize(&doc), source);
    }
}
