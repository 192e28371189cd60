//! Shorthand constructors for building documents in code.
//!
//! Builders fill in default attributes but skip content validation; call
//! [`Node::check`] on the result when the input is untrusted.

use crate::attrs::{AttrValue, Attrs};
use crate::fragment::Fragment;
use crate::mark::{normalize_marks, Mark, MarkSet};
use crate::node::Node;
use crate::schema::NodeType;

/// Default attributes for `node_type`
pub fn default_attrs(node_type: NodeType) -> Attrs {
    node_type
        .attr_specs()
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default.to_value()))
        .collect()
}

/// Element with defaults overridden by `overrides`
pub fn node(node_type: NodeType, overrides: &[(&str, AttrValue)], content: Vec<Node>) -> Node {
    let mut attrs = default_attrs(node_type);
    for (name, value) in overrides {
        attrs.insert(name.to_string(), value.clone());
    }
    Node::from_parts(node_type, attrs, Fragment::from_nodes(content), MarkSet::new())
}

pub fn doc(children: Vec<Node>) -> Node {
    node(NodeType::Doc, &[], children)
}

pub fn paragraph(children: Vec<Node>) -> Node {
    node(NodeType::Paragraph, &[], children)
}

pub fn aligned_paragraph(align: &str, children: Vec<Node>) -> Node {
    node(NodeType::Paragraph, &[("text_align", align.into())], children)
}

pub fn heading(level: i64, children: Vec<Node>) -> Node {
    node(NodeType::Heading, &[("level", level.into())], children)
}

pub fn blockquote(children: Vec<Node>) -> Node {
    node(NodeType::Blockquote, &[], children)
}

pub fn bullet_list(items: Vec<Node>) -> Node {
    node(NodeType::BulletList, &[], items)
}

pub fn ordered_list(items: Vec<Node>) -> Node {
    node(NodeType::OrderedList, &[], items)
}

pub fn list_item(children: Vec<Node>) -> Node {
    node(NodeType::ListItem, &[], children)
}

pub fn code_block(language: Option<&str>, code: &str) -> Node {
    node(
        NodeType::CodeBlock,
        &[("language", language.into())],
        vec![text(code)],
    )
}

pub fn image(src: &str, width: i64, height: i64) -> Node {
    node(
        NodeType::Image,
        &[
            ("src", src.into()),
            ("width", width.into()),
            ("height", height.into()),
        ],
        vec![],
    )
}

pub fn horizontal_rule() -> Node {
    node(NodeType::HorizontalRule, &[], vec![])
}

pub fn hard_break() -> Node {
    node(NodeType::HardBreak, &[], vec![])
}

pub fn text(s: &str) -> Node {
    Node::new_text(s, MarkSet::new())
}

pub fn marked(s: &str, marks: Vec<Mark>) -> Node {
    Node::new_text(s, normalize_marks(&marks))
}
