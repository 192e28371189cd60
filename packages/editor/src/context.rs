use crate::errors::EditorError;
use crate::state::EditorState;
use crate::transaction::Transaction;

/// What a controller may see and do while handling an event.
///
/// Built by the editor for the duration of one call. `get_pos` answers the
/// current position of the controller's own node, or `None` once the node
/// has left the document.
pub struct EditorContext<'a> {
    state: &'a EditorState,
    get_pos: &'a dyn Fn() -> Option<usize>,
    dispatch: &'a mut dyn FnMut(Transaction) -> Result<(), EditorError>,
}

impl<'a> EditorContext<'a> {
    pub fn new(
        state: &'a EditorState,
        get_pos: &'a dyn Fn() -> Option<usize>,
        dispatch: &'a mut dyn FnMut(Transaction) -> Result<(), EditorError>,
    ) -> Self {
        Self {
            state,
            get_pos,
            dispatch,
        }
    }

    pub fn state(&self) -> &EditorState {
        self.state
    }

    pub fn get_pos(&self) -> Option<usize> {
        (self.get_pos)()
    }

    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), EditorError> {
        (self.dispatch)(tr)
    }
}
