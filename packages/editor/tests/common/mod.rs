//! Shared fixtures for editor integration tests

#![allow(dead_code)]

use quire_editor::{
    CaretGeometry, Editor, EditorError, EditorHost, EditorOptions, HostRequest, Rect,
};

/// Host that records every callback
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub contents: Vec<String>,
    pub errors: Vec<String>,
    pub frames: usize,
    pub requests: Vec<HostRequest>,
    pub geometry: Option<CaretGeometry>,
}

impl EditorHost for RecordingHost {
    fn content_changed(&mut self, content: &str) {
        self.contents.push(content.to_string());
    }

    fn report_error(&mut self, error: &EditorError) {
        self.errors.push(error.to_string());
    }

    fn request_animation_frame(&mut self) {
        self.frames += 1;
    }

    fn caret_geometry(&self, _pos: usize) -> Option<CaretGeometry> {
        self.geometry
    }

    fn request_input(&mut self, request: HostRequest) {
        self.requests.push(request);
    }
}

pub fn editor(content: &str) -> Editor<RecordingHost> {
    let options = EditorOptions {
        content: content.to_string(),
        ..Default::default()
    };
    Editor::new(options, RecordingHost::default()).unwrap()
}

/// Caret near the top of a tall viewport
pub fn geometry() -> CaretGeometry {
    CaretGeometry {
        caret: Rect::new(120.0, 100.0, 1.0, 20.0),
        editor: Rect::new(100.0, 50.0, 600.0, 1000.0),
        viewport_height: 800.0,
    }
}
