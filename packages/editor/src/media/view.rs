//! Image node views and their registry.

use super::resize::ResizeState;
use crate::config::ResizeConfig;
use crate::context::EditorContext;
use crate::errors::{EditorError, StepError};
use crate::geometry::{Point, Size};
use crate::listeners::{EventKind, ListenerGuard, ListenerRegistry, ListenerTarget};
use crate::mapping::Mapping;
use crate::transaction::InputKind;
use quire_model::schema::MEDIA_ALIGNS;
use quire_model::{AttrValue, Attrs, Node, NodeType, Selection};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Stable identity of a mounted view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViewId(u64);

/// Controller bound to one node instance
pub trait NodeView {
    /// What the host draws
    type Render;

    fn render(&self) -> Self::Render;

    /// Reflect new attributes of the same node in place
    fn update(&mut self, node: &Node);

    /// Release everything the view holds
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRender {
    pub src: String,
    pub alt: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub align: String,
    pub resizing: bool,
    /// The max-width constraint is lifted while resizing
    pub lift_max_width: bool,
    pub cursor: Option<&'static str>,
    pub show_toolbar: bool,
}

#[derive(Debug)]
pub struct ImageView {
    id: ViewId,
    attrs: Attrs,
    hovered: bool,
    selected: bool,
    resize: ResizeState,
    listeners: ListenerRegistry,
    mounted: Vec<ListenerGuard>,
    /// Document-wide move/up listeners, held only while dragging
    dragging: Vec<ListenerGuard>,
    destroyed: bool,
    updates: usize,
}

impl ImageView {
    pub fn new(id: ViewId, node: &Node, listeners: &ListenerRegistry) -> Self {
        let mounted = vec![
            listeners.listen(ListenerTarget::View(id), EventKind::PointerEnter),
            listeners.listen(ListenerTarget::View(id), EventKind::PointerLeave),
            listeners.listen(ListenerTarget::ResizeHandle(id), EventKind::PointerDown),
        ];
        Self {
            id,
            attrs: node.attrs().clone(),
            hovered: false,
            selected: false,
            resize: ResizeState::Idle,
            listeners: listeners.clone(),
            mounted,
            dragging: Vec::new(),
            destroyed: false,
            updates: 0,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn resize_state(&self) -> &ResizeState {
        &self.resize
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of in-place updates received
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn toolbar_visible(&self) -> bool {
        !self.destroyed && (self.hovered || self.selected)
    }

    fn attr_size(&self) -> Option<Size> {
        let width = self.attrs.get("width").and_then(AttrValue::as_int)?;
        let height = self.attrs.get("height").and_then(AttrValue::as_int)?;
        Some(Size::new(width as f64, height as f64))
    }

    /// Pointer down on the resize handle. `rendered` is the on-screen size,
    /// used when the node carries no explicit size.
    pub fn begin_resize(&mut self, at: Point, rendered: Option<Size>) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(start) = rendered.or_else(|| self.attr_size()) else {
            return false;
        };
        if !self.resize.begin(at, start) {
            return false;
        }
        self.dragging = vec![
            self.listeners.listen(ListenerTarget::Document, EventKind::PointerMove),
            self.listeners.listen(ListenerTarget::Document, EventKind::PointerUp),
        ];
        debug!(view = self.id.0, "resize started");
        true
    }

    /// Returns true when the host should schedule an animation frame
    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.resize.pointer_move(at)
    }

    pub fn frame(&mut self, config: &ResizeConfig) -> Option<Size> {
        self.resize.frame(config)
    }

    /// Pointer up: commit the final size as a single attribute change.
    /// Returns whether a transaction was dispatched.
    pub fn commit_resize(
        &mut self,
        at: Point,
        config: &ResizeConfig,
        ctx: &mut EditorContext<'_>,
    ) -> Result<bool, EditorError> {
        let Some((width, height)) = self.resize.finish(at, config) else {
            return Ok(false);
        };
        self.dragging.clear();

        let Some(pos) = self.node_pos(ctx) else {
            debug!(view = self.id.0, "image left the document, dropping resize");
            return Ok(false);
        };
        let mut attrs = Attrs::new();
        attrs.insert("width".to_string(), AttrValue::Int(width));
        attrs.insert("height".to_string(), AttrValue::Int(height));

        let mut tr = ctx.state().tr();
        tr.set_attrs(pos, attrs)?
            .set_input(InputKind::Media)
            .set_description("Resize image");
        ctx.dispatch(tr)?;
        Ok(true)
    }

    pub fn cancel_resize(&mut self) {
        self.resize.cancel();
        self.dragging.clear();
    }

    /// Toolbar: change the alignment
    pub fn set_align(&mut self, align: &str, ctx: &mut EditorContext<'_>) -> Result<bool, EditorError> {
        if !self.toolbar_visible() {
            return Ok(false);
        }
        if !MEDIA_ALIGNS.contains(&align) {
            return Err(StepError::invalid(format!("unknown image alignment '{}'", align)).into());
        }
        let Some(pos) = self.node_pos(ctx) else {
            debug!(view = self.id.0, "image left the document, dropping align");
            return Ok(false);
        };
        let mut attrs = Attrs::new();
        attrs.insert("align".to_string(), align.into());

        let mut tr = ctx.state().tr();
        tr.set_attrs(pos, attrs)?.set_input(InputKind::Media);
        ctx.dispatch(tr)?;
        Ok(true)
    }

    /// Toolbar: delete the image
    pub fn remove(&mut self, ctx: &mut EditorContext<'_>) -> Result<bool, EditorError> {
        if !self.toolbar_visible() {
            return Ok(false);
        }
        let Some(pos) = self.node_pos(ctx) else {
            debug!(view = self.id.0, "image left the document, dropping delete");
            return Ok(false);
        };
        let mut tr = ctx.state().tr();
        tr.delete(pos, pos + 1)?
            .set_selection(Selection::caret(pos))
            .set_input(InputKind::Media);
        ctx.dispatch(tr)?;
        Ok(true)
    }

    /// Current position, if an image still starts there
    fn node_pos(&self, ctx: &EditorContext<'_>) -> Option<usize> {
        let pos = ctx.get_pos()?;
        let node = ctx.state().doc().node_at(pos)?;
        (node.node_type() == NodeType::Image).then_some(pos)
    }
}

impl NodeView for ImageView {
    type Render = ImageRender;

    fn render(&self) -> ImageRender {
        let text = |name: &str| {
            self.attrs
                .get(name)
                .and_then(AttrValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let size = match self.resize.drag() {
            Some(drag) => Some(drag.preview()),
            None => self.attr_size(),
        };
        let resizing = self.resize.is_resizing();
        ImageRender {
            src: text("src"),
            alt: text("alt"),
            width: size.map(|s| s.width),
            height: size.map(|s| s.height),
            align: text("align"),
            resizing,
            lift_max_width: resizing,
            cursor: resizing.then_some("nwse-resize"),
            show_toolbar: self.toolbar_visible(),
        }
    }

    fn update(&mut self, node: &Node) {
        self.attrs = node.attrs().clone();
        self.updates += 1;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            warn!(view = self.id.0, "view destroyed twice");
            return;
        }
        self.resize.cancel();
        self.dragging.clear();
        self.mounted.clear();
        self.destroyed = true;
    }
}

#[derive(Debug)]
struct Mounted {
    pos: usize,
    view: ImageView,
}

/// Image views of one editor, keyed by [`ViewId`]
#[derive(Debug)]
pub struct ViewRegistry {
    next_id: u64,
    views: BTreeMap<ViewId, Mounted>,
    listeners: ListenerRegistry,
    created: usize,
    destroyed: usize,
}

impl ViewRegistry {
    pub fn new(listeners: ListenerRegistry) -> Self {
        Self {
            next_id: 0,
            views: BTreeMap::new(),
            listeners,
            created: 0,
            destroyed: 0,
        }
    }

    /// Bring the views in line with `doc`.
    ///
    /// Positions are first carried through `mapping`; a view whose node was
    /// deleted is destroyed, one whose attributes changed is updated in
    /// place, and images without a view get one.
    pub fn sync(&mut self, doc: &Node, mapping: Option<&Mapping>, selection: Selection) {
        if let Some(mapping) = mapping {
            let mut gone = Vec::new();
            for (id, mounted) in self.views.iter_mut() {
                let start = mapping.map(mounted.pos);
                let end = mapping.map(mounted.pos + 1);
                if end <= start {
                    gone.push(*id);
                } else {
                    mounted.pos = start;
                }
            }
            for id in gone {
                self.destroy(id);
            }
        }

        let mut images = BTreeMap::new();
        doc.descendants(|node, pos, _, _| {
            if node.node_type() == NodeType::Image {
                images.insert(pos, node.clone());
            }
            !node.is_textblock()
        });

        let ids: Vec<ViewId> = self.views.keys().copied().collect();
        for id in ids {
            let Some(mounted) = self.views.get_mut(&id) else {
                continue;
            };
            match images.remove(&mounted.pos) {
                Some(node) => {
                    if node.attrs() != mounted.view.attrs() {
                        mounted.view.update(&node);
                    }
                }
                None => self.destroy(id),
            }
        }
        for (pos, node) in images {
            self.mount(pos, &node);
        }

        let selected = selection
            .selected_node(doc)
            .filter(|node| node.node_type() == NodeType::Image)
            .map(|_| selection.from());
        for mounted in self.views.values_mut() {
            mounted.view.set_selected(selected == Some(mounted.pos));
        }
    }

    fn mount(&mut self, pos: usize, node: &Node) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        let view = ImageView::new(id, node, &self.listeners);
        self.views.insert(id, Mounted { pos, view });
        self.created += 1;
        debug!(view = id.0, pos, "image view mounted");
        id
    }

    fn destroy(&mut self, id: ViewId) {
        if let Some(mut mounted) = self.views.remove(&id) {
            mounted.view.destroy();
            self.destroyed += 1;
            debug!(view = id.0, "image view destroyed");
        }
    }

    /// Destroy every view
    pub fn clear(&mut self) {
        let ids: Vec<ViewId> = self.views.keys().copied().collect();
        for id in ids {
            self.destroy(id);
        }
    }

    pub fn get(&self, id: ViewId) -> Option<&ImageView> {
        self.views.get(&id).map(|mounted| &mounted.view)
    }

    /// The view with its current position
    pub fn get_mut(&mut self, id: ViewId) -> Option<(usize, &mut ImageView)> {
        self.views
            .get_mut(&id)
            .map(|mounted| (mounted.pos, &mut mounted.view))
    }

    pub fn position(&self, id: ViewId) -> Option<usize> {
        self.views.get(&id).map(|mounted| mounted.pos)
    }

    pub fn view_at(&self, pos: usize) -> Option<ViewId> {
        self.views
            .iter()
            .find(|(_, mounted)| mounted.pos == pos)
            .map(|(id, _)| *id)
    }

    pub fn ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    pub fn views_mut(&mut self) -> impl Iterator<Item = &mut ImageView> {
        self.views.values_mut().map(|mounted| &mut mounted.view)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }
}

impl Drop for ViewRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
