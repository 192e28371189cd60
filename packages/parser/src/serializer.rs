use quire_model::{AttrSpec, Attrs, Fragment, Mark, Node};

/// Serializer converts a document tree back to markup.
///
/// Compact output puts the whole document on one line. Pretty output puts
/// every block on its own indented line; inline content stays verbatim, so
/// both forms parse back to the same tree.
pub struct Serializer {
    pretty: bool,
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            pretty: false,
            indent_level: 0,
            indent_string: String::new(),
        }
    }

    pub fn pretty() -> Self {
        Self::with_indent("  ")
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            pretty: true,
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a document to markup
    pub fn serialize(&mut self, doc: &Node) -> String {
        let mut output = String::new();
        self.serialize_block(doc, &mut output);
        output
    }

    fn serialize_block(&mut self, node: &Node, output: &mut String) {
        self.write_indent(output);
        let name = node.node_type().name();

        if node.is_leaf() {
            open_tag(name, node.node_type().attr_specs(), node.attrs(), true, output);
            self.newline(output);
            return;
        }

        open_tag(name, node.node_type().attr_specs(), node.attrs(), false, output);
        if node.is_textblock() {
            serialize_inline(node.content(), output);
        } else if !node.content().is_empty() {
            self.newline(output);
            self.indent_level += 1;
            for child in node.content().iter() {
                self.serialize_block(child, output);
            }
            self.indent_level -= 1;
            self.write_indent(output);
        }
        close_tag(name, output);
        self.newline(output);
    }

    fn write_indent(&self, output: &mut String) {
        if self.pretty {
            for _ in 0..self.indent_level {
                output.push_str(&self.indent_string);
            }
        }
    }

    fn newline(&self, output: &mut String) {
        if self.pretty {
            output.push('\n');
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Write inline children, opening and closing mark elements as the mark sets
/// of neighbouring runs change. Lower ranked marks wrap higher ranked ones.
fn serialize_inline(content: &Fragment, output: &mut String) {
    let mut active: Vec<&Mark> = Vec::new();

    for child in content.iter() {
        let marks = child.marks();
        let keep = active
            .iter()
            .zip(marks.iter())
            .take_while(|(a, b)| **a == *b)
            .count();
        while active.len() > keep {
            if let Some(mark) = active.pop() {
                close_tag(mark.mark_type.name(), output);
            }
        }
        for mark in &marks[keep..] {
            open_tag(mark.mark_type.name(), mark.mark_type.attr_specs(), &mark.attrs, false, output);
            active.push(mark);
        }

        match child.text() {
            Some(text) => output.push_str(&html_escape::encode_text(text)),
            None => open_tag(
                child.node_type().name(),
                child.node_type().attr_specs(),
                child.attrs(),
                true,
                output,
            ),
        }
    }

    while let Some(mark) = active.pop() {
        close_tag(mark.mark_type.name(), output);
    }
}

fn open_tag(name: &str, specs: &[AttrSpec], attrs: &Attrs, self_closing: bool, output: &mut String) {
    output.push('<');
    output.push_str(name);
    for spec in specs {
        let Some(value) = attrs.get(spec.name) else {
            continue;
        };
        if value.is_null() || *value == spec.default.to_value() {
            continue;
        }
        output.push(' ');
        output.push_str(spec.name);
        output.push_str("=\"");
        output.push_str(&html_escape::encode_double_quoted_attribute(&value.to_string()));
        output.push('"');
    }
    output.push_str(if self_closing { "/>" } else { ">" });
}

fn close_tag(name: &str, output: &mut String) {
    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

/// Serialize a document on a single line
pub fn serialize(doc: &Node) -> String {
    Serializer::new().serialize(doc)
}

/// Serialize a document with one block per line
pub fn serialize_pretty(doc: &Node) -> String {
    Serializer::pretty().serialize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use quire_model::build::*;

    #[test]
    fn test_serialize_compact() {
        let d = doc(vec![
            aligned_paragraph(
                "center",
                vec![
                    text("Hi "),
                    marked("x", vec![Mark::bold(), Mark::color("#f00")]),
                ],
            ),
            image("a.png", 200, 100),
        ]);
        assert_eq!(
            serialize(&d),
            r##"<doc><paragraph text_align="center">Hi <bold><color color="#f00">x</color></bold></paragraph><image src="a.png" width="200" height="100"/></doc>"##
        );
    }

    #[test]
    fn test_serialize_pretty() {
        let d = doc(vec![
            blockquote(vec![paragraph(vec![text("quoted")])]),
            horizontal_rule(),
        ]);
        let expected = "<doc>\n  <blockquote>\n    <paragraph>quoted</paragraph>\n  </blockquote>\n  <horizontal_rule/>\n</doc>\n";
        assert_eq!(serialize_pretty(&d), expected);
        assert_eq!(parse(expected).unwrap(), d);
    }

    #[test]
    fn test_shared_marks_stay_open() {
        let d = doc(vec![paragraph(vec![
            marked("a", vec![Mark::bold()]),
            marked("b", vec![Mark::bold(), Mark::italic()]),
            marked("c", vec![Mark::bold()]),
        ])]);
        assert_eq!(
            serialize(&d),
            "<doc><paragraph><bold>a<italic>b</italic>c</bold></paragraph></doc>"
        );
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let d = doc(vec![paragraph(vec![marked(
            "<a> & b",
            vec![Mark::link("https://x.y/?a=1&b=\"2\"")],
        )])]);
        let out = serialize(&d);
        assert!(out.contains("&lt;a&gt; &amp; b"));
        assert!(!out.contains("\"2\""));
        assert_eq!(parse(&out).unwrap(), d);
    }

    #[test]
    fn test_hard_break_closes_marks() {
        let d = doc(vec![paragraph(vec![
            marked("a", vec![Mark::bold()]),
            hard_break(),
            marked("b", vec![Mark::bold()]),
        ])]);
        assert_eq!(
            serialize(&d),
            "<doc><paragraph><bold>a</bold><hard_break/><bold>b</bold></paragraph></doc>"
        );
    }
}
