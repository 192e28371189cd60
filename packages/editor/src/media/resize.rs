//! # Drag Resize
//!
//! ```text
//! Idle --pointer down--> Resizing --pointer up--> Idle (commit)
//!                          |  ^
//!                   move   |  | frame
//!                          v  |
//!                     pending pointer
//! ```
//!
//! Moves only record the latest pointer. The preview size is computed once
//! per animation frame and the document is touched only at commit.

use crate::config::ResizeConfig;
use crate::geometry::{Point, Size};

/// Size for a drag of `(dx, dy)` from `start`, keeping `aspect`
/// (width / height). The width follows the signed diagonal and is clamped;
/// with inverted bounds the maximum wins.
pub fn target_size(start: Size, aspect: f64, dx: f64, dy: f64, config: &ResizeConfig) -> Size {
    let diagonal = (dx + dy).signum() * dx.hypot(dy);
    let width = (start.width + (dx + diagonal) / (1.0 + aspect))
        .max(config.min_width)
        .min(config.max_width);
    Size::new(width, width / aspect)
}

/// An active drag
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    origin: Point,
    start: Size,
    aspect: f64,
    latest: Point,
    frame_requested: bool,
    preview: Size,
}

impl Drag {
    pub fn start(&self) -> Size {
        self.start
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    /// Size shown by the last frame
    pub fn preview(&self) -> Size {
        self.preview
    }

    fn size_at(&self, at: Point, config: &ResizeConfig) -> Size {
        target_size(
            self.start,
            self.aspect,
            at.x - self.origin.x,
            at.y - self.origin.y,
            config,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResizeState {
    #[default]
    Idle,
    Resizing(Drag),
}

impl ResizeState {
    pub fn is_resizing(&self) -> bool {
        matches!(self, ResizeState::Resizing(_))
    }

    pub fn drag(&self) -> Option<&Drag> {
        match self {
            ResizeState::Resizing(drag) => Some(drag),
            ResizeState::Idle => None,
        }
    }

    /// Start a drag from `at` on an image currently `start` large. Returns
    /// false if already resizing or the size is degenerate.
    pub fn begin(&mut self, at: Point, start: Size) -> bool {
        if self.is_resizing() || start.width <= 0.0 || start.height <= 0.0 {
            return false;
        }
        *self = ResizeState::Resizing(Drag {
            origin: at,
            start,
            aspect: start.width / start.height,
            latest: at,
            frame_requested: false,
            preview: start,
        });
        true
    }

    /// Record a pointer move. Returns true when a frame must be requested,
    /// which happens once per frame however many moves arrive.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let ResizeState::Resizing(drag) = self else {
            return false;
        };
        drag.latest = at;
        !std::mem::replace(&mut drag.frame_requested, true)
    }

    /// Compute the preview for this frame
    pub fn frame(&mut self, config: &ResizeConfig) -> Option<Size> {
        let ResizeState::Resizing(drag) = self else {
            return None;
        };
        if !drag.frame_requested {
            return None;
        }
        drag.frame_requested = false;
        drag.preview = drag.size_at(drag.latest, config);
        Some(drag.preview)
    }

    /// End the drag at `at`, returning the size to commit in whole pixels
    pub fn finish(&mut self, at: Point, config: &ResizeConfig) -> Option<(i64, i64)> {
        let ResizeState::Resizing(drag) = std::mem::take(self) else {
            return None;
        };
        let size = drag.size_at(at, config);
        Some((size.width.round() as i64, size.height.round() as i64))
    }

    pub fn cancel(&mut self) {
        *self = ResizeState::Idle;
    }
}
