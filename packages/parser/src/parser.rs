use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, tokenize_tag, TagToken, Token};
use quire_model::{
    AttrSpec, Attrs, ContentRule, Mark, MarkSet, MarkType, ModelError, Node, NodeType,
};
use std::ops::Range;

/// A parsed opening tag
struct Tag<'src> {
    name: &'src str,
    attrs: Vec<(&'src str, &'src str, Range<usize>)>,
    self_closing: bool,
    span: Range<usize>,
}

/// Element names resolve to either a node or a mark
enum Element {
    Node(NodeType),
    Mark(MarkType),
}

/// Recursive-descent parser for document markup
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    /// Parse a complete `<doc>` element
    pub fn parse_document(&mut self) -> ParseResult<Node> {
        self.skip_whitespace();
        let tag = self.expect_open_tag("<doc>")?;
        if tag.name != NodeType::Doc.name() {
            return Err(ParseError::unexpected_token(
                tag.span,
                "<doc>",
                format!("<{}>", tag.name),
            ));
        }
        let doc = self.parse_node(NodeType::Doc, tag)?;

        self.skip_whitespace();
        if let Some((token, span)) = self.peek() {
            return Err(ParseError::unexpected_token(
                span.clone(),
                "end of input",
                token.to_string(),
            ));
        }
        Ok(doc)
    }

    fn parse_node(&mut self, node_type: NodeType, tag: Tag<'src>) -> ParseResult<Node> {
        let attrs = parse_attrs(node_type.name(), node_type.attr_specs(), &tag)?;

        let content = if tag.self_closing {
            Vec::new()
        } else {
            let content = match node_type.content_rule() {
                ContentRule::Blocks | ContentRule::ListItems => self.parse_block_content(&tag)?,
                ContentRule::Inline | ContentRule::PlainText => {
                    let mut out = Vec::new();
                    self.parse_inline_content(&tag, &MarkSet::new(), &mut out)?;
                    out
                }
                ContentRule::Leaf => Vec::new(),
            };
            self.expect_close_tag(tag.name)?;
            content
        };

        Node::create(node_type, &attrs, content).map_err(|error| ParseError::model(tag.span, error))
    }

    fn parse_block_content(&mut self, parent: &Tag<'src>) -> ParseResult<Vec<Node>> {
        let mut children = Vec::new();
        loop {
            let Some((token, span)) = self.peek().cloned() else {
                return Err(ParseError::unexpected_eof(format!("</{}>", parent.name)));
            };
            match token {
                Token::CloseTag(_) => return Ok(children),
                Token::Text(text) if text.trim().is_empty() => {
                    self.advance();
                }
                Token::Text(_) => {
                    return Err(ParseError::invalid_syntax(
                        span,
                        format!("text is not allowed directly inside <{}>", parent.name),
                    ));
                }
                Token::OpenTag(_) => {
                    let tag = self.expect_open_tag("element")?;
                    match classify(&tag)? {
                        Element::Node(node_type) => children.push(self.parse_node(node_type, tag)?),
                        Element::Mark(_) => {
                            return Err(ParseError::invalid_syntax(
                                tag.span,
                                format!("<{}> can only wrap text", tag.name),
                            ));
                        }
                    }
                }
            }
        }
    }

    fn parse_inline_content(
        &mut self,
        parent: &Tag<'src>,
        marks: &MarkSet,
        out: &mut Vec<Node>,
    ) -> ParseResult<()> {
        loop {
            let Some((token, _)) = self.peek().cloned() else {
                return Err(ParseError::unexpected_eof(format!("</{}>", parent.name)));
            };
            match token {
                Token::CloseTag(_) => return Ok(()),
                Token::Text(text) => {
                    self.advance();
                    let decoded = html_escape::decode_html_entities(text);
                    out.push(Node::new_text(decoded.as_ref(), marks.clone()));
                }
                Token::OpenTag(_) => {
                    let tag = self.expect_open_tag("element")?;
                    match classify(&tag)? {
                        Element::Node(node_type) => out.push(self.parse_node(node_type, tag)?),
                        Element::Mark(mark_type) => {
                            let attrs = parse_attrs(mark_type.name(), mark_type.attr_specs(), &tag)?;
                            let mark = Mark::with_attrs(mark_type, &attrs)
                                .map_err(|error| ParseError::model(tag.span.clone(), error))?;
                            if tag.self_closing {
                                continue;
                            }
                            let inner = mark.add_to_set(marks);
                            self.parse_inline_content(&tag, &inner, out)?;
                            self.expect_close_tag(tag.name)?;
                        }
                    }
                }
            }
        }
    }

    fn expect_open_tag(&mut self, expected: &str) -> ParseResult<Tag<'src>> {
        match self.peek().cloned() {
            Some((Token::OpenTag(slice), span)) => {
                self.advance();
                parse_tag(slice, span)
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span,
                expected,
                token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(expected)),
        }
    }

    fn expect_close_tag(&mut self, name: &str) -> ParseResult<()> {
        let expected = format!("</{}>", name);
        match self.peek().cloned() {
            Some((Token::CloseTag(slice), span)) => {
                if Token::close_name(slice) != name {
                    return Err(ParseError::unexpected_token(span, expected, slice));
                }
                self.advance();
                Ok(())
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span,
                expected,
                token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(expected)),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some((Token::Text(text), _)) = self.peek() {
            if !text.trim().is_empty() {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

fn classify(tag: &Tag<'_>) -> ParseResult<Element> {
    if let Some(node_type) = NodeType::from_name(tag.name) {
        if node_type != NodeType::Text && node_type != NodeType::Doc {
            return Ok(Element::Node(node_type));
        }
    }
    if let Some(mark_type) = MarkType::from_name(tag.name) {
        return Ok(Element::Mark(mark_type));
    }
    Err(ParseError::invalid_syntax(
        tag.span.clone(),
        format!("unknown element <{}>", tag.name),
    ))
}

/// Read the name and attributes of an opening tag
fn parse_tag(slice: &str, span: Range<usize>) -> ParseResult<Tag<'_>> {
    let tokens = tokenize_tag(slice, span.start)?;
    let mut iter = tokens.into_iter().peekable();

    match iter.next() {
        Some((TagToken::LAngle, _)) => {}
        other => return Err(unexpected_in_tag(other, "<", &span)),
    }
    let name = match iter.next() {
        Some((TagToken::Ident(name), _)) => name,
        other => return Err(unexpected_in_tag(other, "element name", &span)),
    };

    let mut attrs: Vec<(&str, &str, Range<usize>)> = Vec::new();
    loop {
        match iter.next() {
            Some((TagToken::RAngle, _)) => {
                return Ok(Tag {
                    name,
                    attrs,
                    self_closing: false,
                    span,
                })
            }
            Some((TagToken::SelfClose, _)) => {
                return Ok(Tag {
                    name,
                    attrs,
                    self_closing: true,
                    span,
                })
            }
            Some((TagToken::Ident(attr), attr_span)) => {
                match iter.next() {
                    Some((TagToken::Equals, _)) => {}
                    other => return Err(unexpected_in_tag(other, "=", &span)),
                }
                let (value, value_span) = match iter.next() {
                    Some((TagToken::String(value), value_span)) => (value, value_span),
                    other => return Err(unexpected_in_tag(other, "quoted value", &span)),
                };
                if attrs.iter().any(|(existing, _, _)| *existing == attr) {
                    return Err(ParseError::invalid_syntax(
                        attr_span,
                        format!("duplicate attribute '{}'", attr),
                    ));
                }
                attrs.push((attr, value, attr_span.start..value_span.end));
            }
            other => return Err(unexpected_in_tag(other, "attribute or >", &span)),
        }
    }
}

fn unexpected_in_tag(
    found: Option<(TagToken<'_>, Range<usize>)>,
    expected: &str,
    tag_span: &Range<usize>,
) -> ParseError {
    match found {
        Some((token, span)) => ParseError::unexpected_token(span, expected, token.to_string()),
        None => ParseError::unexpected_token(tag_span.clone(), expected, "end of tag"),
    }
}

/// Convert raw attribute strings into typed values. Omitted attributes are
/// left for the model to fill with defaults.
fn parse_attrs(owner: &str, specs: &[AttrSpec], tag: &Tag<'_>) -> ParseResult<Attrs> {
    let mut attrs = Attrs::new();
    for (name, raw, span) in &tag.attrs {
        let spec = specs.iter().find(|spec| spec.name == *name).ok_or_else(|| {
            ParseError::model(
                span.clone(),
                ModelError::invalid_attr(owner, *name, "unknown attribute"),
            )
        })?;
        let decoded = html_escape::decode_html_entities(raw);
        let value = spec.parse(&decoded).ok_or_else(|| {
            ParseError::model(
                span.clone(),
                ModelError::invalid_attr(owner, *name, format!("invalid value \"{}\"", decoded)),
            )
        })?;
        attrs.insert(name.to_string(), value);
    }
    Ok(attrs)
}

/// Parse a markup document
pub fn parse(source: &str) -> ParseResult<Node> {
    let mut parser = Parser::new(source)?;
    parser.parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::build::*;
    use quire_model::AttrValue;

    #[test]
    fn test_parse_simple_document() {
        let parsed = parse("<doc><paragraph>Hello</paragraph></doc>").unwrap();
        assert_eq!(parsed, doc(vec![paragraph(vec![text("Hello")])]));
    }

    #[test]
    fn test_whitespace_between_blocks_is_ignored() {
        let source = "\n<doc>\n  <paragraph>a</paragraph>\n  <horizontal_rule/>\n</doc>\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.child_count(), 2);
        assert_eq!(doc.child(0).unwrap().text_content(), "a");
    }

    #[test]
    fn test_text_inside_textblock_is_verbatim() {
        let doc = parse("<doc><paragraph>  two  spaces </paragraph></doc>").unwrap();
        assert_eq!(doc.text_content(), "  two  spaces ");
    }

    #[test]
    fn test_nested_marks() {
        let doc = parse(
            r##"<doc><paragraph>Hi <bold><color color="#f00">x</color>y</bold></paragraph></doc>"##,
        )
        .unwrap();
        let p = doc.child(0).unwrap();
        assert_eq!(p.child_count(), 3);
        assert_eq!(p.child(1).unwrap().marks(), &vec![Mark::bold(), Mark::color("#f00")]);
        assert_eq!(p.child(2).unwrap().marks(), &vec![Mark::bold()]);
    }

    #[test]
    fn test_attributes_and_defaults() {
        let doc = parse(r#"<doc><image src="a.png" width="200"/></doc>"#).unwrap();
        let img = doc.child(0).unwrap();
        assert_eq!(img.attr("width"), Some(&AttrValue::Int(200)));
        assert_eq!(img.attr("height"), Some(&AttrValue::Null));
        assert_eq!(img.attr("align"), Some(&AttrValue::from("center")));
    }

    #[test]
    fn test_entities_decoded() {
        let doc = parse(r#"<doc><paragraph>a &lt;b&gt; &amp; c</paragraph></doc>"#).unwrap();
        assert_eq!(doc.text_content(), "a <b> & c");
    }

    #[test]
    fn test_mismatched_close_tag() {
        let err = parse("<doc><paragraph>a</heading></doc>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "</paragraph>"));
    }

    #[test]
    fn test_unknown_element() {
        let err = parse("<doc><table></table></doc>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_invalid_attr_value() {
        let err = parse(r#"<doc><heading level="9">x</heading></doc>"#).unwrap_err();
        assert!(matches!(err, ParseError::Model { error: ModelError::InvalidAttr { .. }, .. }));
    }

    #[test]
    fn test_schema_violation_reported() {
        let err = parse("<doc><paragraph><paragraph>x</paragraph></paragraph></doc>").unwrap_err();
        assert!(matches!(err, ParseError::Model { error: ModelError::InvalidContent { .. }, .. }));
    }

    #[test]
    fn test_text_at_block_level_rejected() {
        let err = parse("<doc>loose</doc>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_unclosed_document() {
        let err = parse("<doc><paragraph>a</paragraph>").unwrap_err();
        assert_eq!(err, ParseError::unexpected_eof("</doc>"));
    }
}
