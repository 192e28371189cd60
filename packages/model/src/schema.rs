//! # Schema
//!
//! Node and mark types, their attributes and content rules.
//!
//! ```text
//! doc            block+
//! paragraph      inline*            text_align
//! heading        inline*            level, text_align
//! blockquote     block+
//! bullet_list    list_item+
//! ordered_list   list_item+         start
//! list_item      block+
//! code_block     text* (no marks)   language
//! image          atom               src, alt, width, height, align
//! horizontal_rule leaf
//! hard_break     inline leaf
//! ```

use crate::attrs::{AttrDefault, AttrKind, AttrSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TEXT_ALIGNS: &[&str] = &["left", "center", "right", "justify"];
pub const MEDIA_ALIGNS: &[&str] = &["left", "center", "right"];

const TEXT_ALIGN: AttrSpec = AttrSpec::new(
    "text_align",
    AttrKind::OneOf(TEXT_ALIGNS),
    AttrDefault::Str("left"),
);

const PARAGRAPH_ATTRS: &[AttrSpec] = &[TEXT_ALIGN];
const HEADING_ATTRS: &[AttrSpec] = &[
    AttrSpec::new("level", AttrKind::Int { min: 1, max: 6 }, AttrDefault::Int(1)),
    TEXT_ALIGN,
];
const ORDERED_LIST_ATTRS: &[AttrSpec] = &[AttrSpec::new(
    "start",
    AttrKind::Int {
        min: 0,
        max: i64::MAX,
    },
    AttrDefault::Int(1),
)];
const CODE_BLOCK_ATTRS: &[AttrSpec] = &[AttrSpec::nullable("language", AttrKind::Str)];
const IMAGE_ATTRS: &[AttrSpec] = &[
    AttrSpec::new("src", AttrKind::Str, AttrDefault::Str("")),
    AttrSpec::new("alt", AttrKind::Str, AttrDefault::Str("")),
    AttrSpec::nullable("width", AttrKind::Int { min: 0, max: 100_000 }),
    AttrSpec::nullable("height", AttrKind::Int { min: 0, max: 100_000 }),
    AttrSpec::new("align", AttrKind::OneOf(MEDIA_ALIGNS), AttrDefault::Str("center")),
];

const COLOR_ATTRS: &[AttrSpec] = &[AttrSpec::new("color", AttrKind::Str, AttrDefault::Str(""))];
const LINK_ATTRS: &[AttrSpec] = &[AttrSpec::new("href", AttrKind::Str, AttrDefault::Str(""))];

/// What a node may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// One or more block nodes
    Blocks,
    /// Zero or more inline nodes
    Inline,
    /// Zero or more unmarked text nodes
    PlainText,
    /// One or more list items
    ListItems,
    /// No content at all
    Leaf,
}

/// Node types known to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    Image,
    HorizontalRule,
    HardBreak,
    Text,
}

impl NodeType {
    pub const ALL: &'static [NodeType] = &[
        NodeType::Doc,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::Blockquote,
        NodeType::BulletList,
        NodeType::OrderedList,
        NodeType::ListItem,
        NodeType::CodeBlock,
        NodeType::Image,
        NodeType::HorizontalRule,
        NodeType::HardBreak,
        NodeType::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::Blockquote => "blockquote",
            NodeType::BulletList => "bullet_list",
            NodeType::OrderedList => "ordered_list",
            NodeType::ListItem => "list_item",
            NodeType::CodeBlock => "code_block",
            NodeType::Image => "image",
            NodeType::HorizontalRule => "horizontal_rule",
            NodeType::HardBreak => "hard_break",
            NodeType::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn content_rule(self) -> ContentRule {
        match self {
            NodeType::Doc | NodeType::Blockquote | NodeType::ListItem => ContentRule::Blocks,
            NodeType::Paragraph | NodeType::Heading => ContentRule::Inline,
            NodeType::CodeBlock => ContentRule::PlainText,
            NodeType::BulletList | NodeType::OrderedList => ContentRule::ListItems,
            NodeType::Image | NodeType::HorizontalRule | NodeType::HardBreak | NodeType::Text => {
                ContentRule::Leaf
            }
        }
    }

    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph
                | NodeType::Heading
                | NodeType::Blockquote
                | NodeType::BulletList
                | NodeType::OrderedList
                | NodeType::CodeBlock
                | NodeType::Image
                | NodeType::HorizontalRule
        )
    }

    pub fn is_inline(self) -> bool {
        matches!(self, NodeType::Text | NodeType::HardBreak)
    }

    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph | NodeType::Heading | NodeType::CodeBlock
        )
    }

    /// Leaves have no content and occupy a single position
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::Image | NodeType::HorizontalRule | NodeType::HardBreak
        )
    }

    /// Atoms can only be selected or deleted as a whole
    pub fn is_atom(self) -> bool {
        self.is_leaf()
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeType::BulletList | NodeType::OrderedList)
    }

    pub fn allows_child(self, child: NodeType) -> bool {
        match self.content_rule() {
            ContentRule::Blocks => child.is_block(),
            ContentRule::Inline => child.is_inline(),
            ContentRule::PlainText => child == NodeType::Text,
            ContentRule::ListItems => child == NodeType::ListItem,
            ContentRule::Leaf => false,
        }
    }

    /// `block+` and `list_item+` nodes may not be empty
    pub fn requires_content(self) -> bool {
        matches!(
            self.content_rule(),
            ContentRule::Blocks | ContentRule::ListItems
        )
    }

    pub fn allows_marks(self) -> bool {
        self.content_rule() == ContentRule::Inline
    }

    pub fn attr_specs(self) -> &'static [AttrSpec] {
        match self {
            NodeType::Paragraph => PARAGRAPH_ATTRS,
            NodeType::Heading => HEADING_ATTRS,
            NodeType::OrderedList => ORDERED_LIST_ATTRS,
            NodeType::CodeBlock => CODE_BLOCK_ATTRS,
            NodeType::Image => IMAGE_ATTRS,
            _ => &[],
        }
    }

    pub fn attr_spec(self, name: &str) -> Option<&'static AttrSpec> {
        self.attr_specs().iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inline formatting types, declared in rank order.
/// Lower rank marks wrap higher rank marks when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkType {
    Link,
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Subscript,
    Superscript,
    Color,
    Highlight,
}

impl MarkType {
    pub const ALL: &'static [MarkType] = &[
        MarkType::Link,
        MarkType::Bold,
        MarkType::Italic,
        MarkType::Underline,
        MarkType::Strike,
        MarkType::Code,
        MarkType::Subscript,
        MarkType::Superscript,
        MarkType::Color,
        MarkType::Highlight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkType::Link => "link",
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Underline => "underline",
            MarkType::Strike => "strike",
            MarkType::Code => "code",
            MarkType::Subscript => "subscript",
            MarkType::Superscript => "superscript",
            MarkType::Color => "color",
            MarkType::Highlight => "highlight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn attr_specs(self) -> &'static [AttrSpec] {
        match self {
            MarkType::Color | MarkType::Highlight => COLOR_ATTRS,
            MarkType::Link => LINK_ATTRS,
            _ => &[],
        }
    }

    /// Whether adding `self` drops an existing `other` from a mark set
    pub fn excludes(self, other: MarkType) -> bool {
        self == other
            || matches!(
                (self, other),
                (MarkType::Subscript, MarkType::Superscript)
                    | (MarkType::Superscript, MarkType::Subscript)
            )
    }

    /// Inclusive marks extend to text typed at their end
    pub fn inclusive(self) -> bool {
        self != MarkType::Link
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for t in NodeType::ALL {
            assert_eq!(NodeType::from_name(t.name()), Some(*t));
        }
        for t in MarkType::ALL {
            assert_eq!(MarkType::from_name(t.name()), Some(*t));
        }
    }

    #[test]
    fn test_content_rules() {
        assert!(NodeType::Doc.allows_child(NodeType::Image));
        assert!(!NodeType::Doc.allows_child(NodeType::Text));
        assert!(NodeType::Paragraph.allows_child(NodeType::HardBreak));
        assert!(!NodeType::CodeBlock.allows_child(NodeType::HardBreak));
        assert!(NodeType::BulletList.allows_child(NodeType::ListItem));
        assert!(!NodeType::BulletList.allows_child(NodeType::Paragraph));
        assert!(!NodeType::Image.allows_child(NodeType::Text));
    }

    #[test]
    fn test_sub_and_superscript_exclusive() {
        assert!(MarkType::Subscript.excludes(MarkType::Superscript));
        assert!(MarkType::Bold.excludes(MarkType::Bold));
        assert!(!MarkType::Bold.excludes(MarkType::Italic));
    }
}
