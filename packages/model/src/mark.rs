//! Inline marks and mark sets

use crate::attrs::{complete_attrs, AttrValue, Attrs};
use crate::error::ModelResult;
use crate::schema::MarkType;
use serde::{Deserialize, Serialize};

/// A formatting annotation on a text run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: MarkType,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

/// Marks on a text node, sorted by rank with at most one mark per type
pub type MarkSet = Vec<Mark>;

impl Mark {
    /// Mark with default attributes
    pub fn new(mark_type: MarkType) -> Self {
        let attrs = mark_type
            .attr_specs()
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.to_value()))
            .collect();
        Self { mark_type, attrs }
    }

    /// Mark with validated attributes
    pub fn with_attrs(mark_type: MarkType, attrs: &Attrs) -> ModelResult<Self> {
        let attrs = complete_attrs(mark_type.name(), mark_type.attr_specs(), attrs)?;
        Ok(Self { mark_type, attrs })
    }

    pub fn bold() -> Self {
        Self::new(MarkType::Bold)
    }

    pub fn italic() -> Self {
        Self::new(MarkType::Italic)
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self::single(MarkType::Color, "color", color.into())
    }

    pub fn highlight(color: impl Into<String>) -> Self {
        Self::single(MarkType::Highlight, "color", color.into())
    }

    pub fn link(href: impl Into<String>) -> Self {
        Self::single(MarkType::Link, "href", href.into())
    }

    fn single(mark_type: MarkType, key: &str, value: String) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert(key.to_string(), AttrValue::String(value));
        Self { mark_type, attrs }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Add this mark to `set`, replacing marks it excludes
    pub fn add_to_set(&self, set: &[Mark]) -> MarkSet {
        let mut out: MarkSet = set
            .iter()
            .filter(|m| !self.mark_type.excludes(m.mark_type))
            .cloned()
            .collect();
        let at = out
            .iter()
            .position(|m| m.mark_type.rank() > self.mark_type.rank())
            .unwrap_or(out.len());
        out.insert(at, self.clone());
        out
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }
}

/// Drop every mark of `mark_type` from `set`
pub fn remove_mark_type(set: &[Mark], mark_type: MarkType) -> MarkSet {
    set.iter()
        .filter(|m| m.mark_type != mark_type)
        .cloned()
        .collect()
}

pub fn find_mark(set: &[Mark], mark_type: MarkType) -> Option<&Mark> {
    set.iter().find(|m| m.mark_type == mark_type)
}

/// Normalize an arbitrary list of marks into a proper mark set
pub fn normalize_marks(marks: &[Mark]) -> MarkSet {
    marks
        .iter()
        .fold(MarkSet::new(), |set, mark| mark.add_to_set(&set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_rank_order() {
        let set = Mark::new(MarkType::Highlight).add_to_set(&[]);
        let set = Mark::bold().add_to_set(&set);
        let set = Mark::link("https://example.com").add_to_set(&set);
        let types: Vec<_> = set.iter().map(|m| m.mark_type).collect();
        assert_eq!(types, vec![MarkType::Link, MarkType::Bold, MarkType::Highlight]);
    }

    #[test]
    fn test_add_replaces_same_type() {
        let set = Mark::color("#f00").add_to_set(&[]);
        let set = Mark::color("#00f").add_to_set(&set);
        assert_eq!(set, vec![Mark::color("#00f")]);
    }

    #[test]
    fn test_superscript_drops_subscript() {
        let set = Mark::new(MarkType::Subscript).add_to_set(&[Mark::bold()]);
        let set = Mark::new(MarkType::Superscript).add_to_set(&set);
        assert_eq!(set, vec![Mark::bold(), Mark::new(MarkType::Superscript)]);
    }

    #[test]
    fn test_remove_by_type() {
        let set = vec![Mark::bold(), Mark::color("#f00")];
        assert_eq!(remove_mark_type(&set, MarkType::Color), vec![Mark::bold()]);
    }
}
