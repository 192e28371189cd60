use crate::config::PaletteConfig;
use crate::geometry::{CaretGeometry, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Below,
    Above,
}

/// Menu offset relative to the editor box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MenuPosition {
    pub left: f64,
    pub top: f64,
    pub placement: Placement,
}

/// Place the menu under the caret, or above it when it would overflow the
/// viewport and there is more room above
pub fn position_menu(geometry: &CaretGeometry, config: &PaletteConfig) -> MenuPosition {
    let CaretGeometry {
        caret,
        editor,
        viewport_height,
    } = *geometry;
    let space_below = viewport_height - caret.bottom();
    let space_above = caret.y;
    let overflows = caret.bottom() + config.offset + config.menu_height > viewport_height;

    if overflows && space_above > space_below {
        MenuPosition {
            left: caret.x - editor.x,
            top: caret.y - editor.y - config.offset - config.menu_height,
            placement: Placement::Above,
        }
    } else {
        below(caret, editor, config)
    }
}

fn below(caret: Rect, editor: Rect, config: &PaletteConfig) -> MenuPosition {
    MenuPosition {
        left: caret.x - editor.x,
        top: caret.bottom() - editor.y + config.offset,
        placement: Placement::Below,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(caret_y: f64) -> CaretGeometry {
        CaretGeometry {
            caret: Rect::new(120.0, caret_y, 1.0, 20.0),
            editor: Rect::new(100.0, 50.0, 600.0, 2000.0),
            viewport_height: 800.0,
        }
    }

    #[test]
    fn test_fits_below() {
        let position = position_menu(&geometry(100.0), &PaletteConfig::default());
        assert_eq!(position.placement, Placement::Below);
        assert_eq!(position.left, 20.0);
        assert_eq!(position.top, 78.0);
    }

    #[test]
    fn test_flips_above_near_bottom() {
        let position = position_menu(&geometry(700.0), &PaletteConfig::default());
        assert_eq!(position.placement, Placement::Above);
        assert_eq!(position.top, 700.0 - 50.0 - 8.0 - 320.0);
    }

    #[test]
    fn test_stays_below_when_above_is_smaller() {
        let mut g = geometry(100.0);
        g.viewport_height = 400.0;
        let position = position_menu(&g, &PaletteConfig::default());
        assert_eq!(position.placement, Placement::Below);
    }
}
