use egui::Color32;
use image::Rgba;

use crate::surface::BACKGROUND;

pub const MIN_STROKE_WIDTH: f32 = 1.0;
pub const MAX_STROKE_WIDTH: f32 = 10.0;

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;
const ZOOM_STEP: f32 = 1.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    ColorPicker,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Eraser => "Eraser",
            Tool::ColorPicker => "Pick color",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Pen, Tool::Eraser, Tool::ColorPicker]
    }
}

/// Session-global tool state, shared across tab switches. Strokes are baked
/// into the raster immediately, so changes here only affect what is drawn
/// next — never committed content.
#[derive(Clone, Copy, Debug)]
pub struct ToolState {
    pub tool: Tool,
    pub color: Color32,
    pub width: f32,
    pub zoom: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: Color32::BLACK,
            width: 2.0,
            zoom: 1.0,
        }
    }
}

impl ToolState {
    /// The ink a stroke segment paints with, or `None` for tools that never
    /// enter the drawing state. This is the single point where a tool decides
    /// its stroke behavior.
    pub fn stroke_ink(&self) -> Option<Rgba<u8>> {
        match self.tool {
            Tool::Pen => Some(color32_to_rgba(self.color)),
            Tool::Eraser => Some(BACKGROUND),
            Tool::ColorPicker => None,
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }
}

pub fn color32_to_rgba(color: Color32) -> Rgba<u8> {
    Rgba([color.r(), color.g(), color.b(), color.a()])
}

pub fn rgba_to_color32(color: Rgba<u8>) -> Color32 {
    Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eraser_paints_with_background() {
        let mut state = ToolState {
            color: Color32::from_rgb(200, 30, 30),
            ..ToolState::default()
        };
        assert_eq!(state.stroke_ink(), Some(Rgba([200, 30, 30, 255])));

        state.tool = Tool::Eraser;
        assert_eq!(state.stroke_ink(), Some(BACKGROUND));

        state.tool = Tool::ColorPicker;
        assert_eq!(state.stroke_ink(), None);
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut state = ToolState::default();
        for _ in 0..32 {
            state.zoom_in();
        }
        assert_eq!(state.zoom, MAX_ZOOM);
        for _ in 0..32 {
            state.zoom_out();
        }
        assert_eq!(state.zoom, MIN_ZOOM);
    }
}
