//! Commands offered by the palette

use crate::commands;
use crate::errors::StepResult;
use crate::transaction::Transaction;
use quire_model::NodeType;
use serde::Serialize;

/// Input the host must collect before the command can finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostRequest {
    /// Pick or upload an image
    ImageInput,
    /// Enter a link address
    LinkInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaletteAction {
    Heading { level: i64 },
    BulletList,
    OrderedList,
    Quote,
    CodeBlock,
    Divider,
    Image,
    Link,
}

impl PaletteAction {
    /// Add the action's steps to `tr`
    pub fn apply(self, tr: &mut Transaction) -> StepResult<Option<HostRequest>> {
        match self {
            PaletteAction::Heading { level } => {
                commands::toggle_heading(tr, level)?;
            }
            PaletteAction::BulletList => {
                commands::toggle_list(tr, NodeType::BulletList)?;
            }
            PaletteAction::OrderedList => {
                commands::toggle_list(tr, NodeType::OrderedList)?;
            }
            PaletteAction::Quote => {
                commands::toggle_blockquote(tr)?;
            }
            PaletteAction::CodeBlock => {
                commands::toggle_code_block(tr)?;
            }
            PaletteAction::Divider => {
                commands::insert_horizontal_rule(tr)?;
            }
            PaletteAction::Image => return Ok(Some(HostRequest::ImageInput)),
            PaletteAction::Link => return Ok(Some(HostRequest::LinkInput)),
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteCommand {
    pub title: String,
    pub description: String,
    pub action: PaletteAction,
}

impl PaletteCommand {
    pub fn new(title: &str, description: &str, action: PaletteAction) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            action,
        }
    }
}

/// The built-in commands, in menu order
pub fn default_commands() -> Vec<PaletteCommand> {
    vec![
        PaletteCommand::new("标题 1", "大标题", PaletteAction::Heading { level: 1 }),
        PaletteCommand::new("标题 2", "中标题", PaletteAction::Heading { level: 2 }),
        PaletteCommand::new("标题 3", "小标题", PaletteAction::Heading { level: 3 }),
        PaletteCommand::new("无序列表", "创建简单的无序列表", PaletteAction::BulletList),
        PaletteCommand::new("有序列表", "创建带编号的列表", PaletteAction::OrderedList),
        PaletteCommand::new("引用", "插入引用块", PaletteAction::Quote),
        PaletteCommand::new("代码块", "插入代码片段", PaletteAction::CodeBlock),
        PaletteCommand::new("分割线", "插入水平分割线", PaletteAction::Divider),
        PaletteCommand::new("图片", "上传或嵌入图片", PaletteAction::Image),
        PaletteCommand::new("链接", "插入超链接", PaletteAction::Link),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EditorState;
    use quire_model::build::*;
    use quire_model::Selection;

    #[test]
    fn test_default_commands() {
        let commands = default_commands();
        assert_eq!(commands.len(), 10);
        assert_eq!(commands[0].title, "标题 1");
        assert_eq!(commands[9].action, PaletteAction::Link);
    }

    #[test]
    fn test_host_requests() {
        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        let mut tr = state.tr();
        assert_eq!(
            PaletteAction::Image.apply(&mut tr).unwrap(),
            Some(HostRequest::ImageInput)
        );
        assert!(!tr.doc_changed());
    }

    #[test]
    fn test_divider_action() {
        let state = EditorState::with_selection(
            doc(vec![paragraph(vec![text("a")])]),
            Selection::caret(2),
        );
        let mut tr = state.tr();
        assert_eq!(PaletteAction::Divider.apply(&mut tr).unwrap(), None);
        assert_eq!(tr.doc().child(1).unwrap().node_type(), NodeType::HorizontalRule);
    }
}
