//! Editor windows
//!
//! Each window is built once per UI frame from the state the frame loop hands
//! the editor.

use crate::frame_loop::FrameInfo;
use crate::gfx::{
    rendering::render_pass::{Capabilities, RenderPass},
    resources::uniforms::FrameMatrices,
};

/// What editor windows may read and edit during one UI frame
pub struct EditorState<'a> {
    pub frame: &'a FrameInfo,
    pub render_pass: &'a mut RenderPass,
    /// Matrices of the last drawn frame
    pub matrices: &'a FrameMatrices,
}

pub trait EditorWindow {
    fn name(&self) -> &str;

    fn build(&mut self, ui: &imgui::Ui, state: &mut EditorState<'_>);
}

/// Clear color, viewport and capabilities of the scene pass
#[derive(Debug, Default)]
pub struct RenderPassWindow;

impl EditorWindow for RenderPassWindow {
    fn name(&self) -> &str {
        "Render Pass"
    }

    fn build(&mut self, ui: &imgui::Ui, state: &mut EditorState<'_>) {
        ui.window(self.name())
            .size([320.0, 160.0], imgui::Condition::FirstUseEver)
            .position([20.0, 20.0], imgui::Condition::FirstUseEver)
            .build(|| {
                let mut color = state.render_pass.current_clear_color();
                if ui.color_edit3("Clear color", &mut color) {
                    state.render_pass.clear_color(color);
                }

                let pass = state.render_pass.state();
                ui.text(format!(
                    "Viewport: {}x{} at ({}, {})",
                    pass.viewport.size.width,
                    pass.viewport.size.height,
                    pass.viewport.origin[0],
                    pass.viewport.origin[1]
                ));
                ui.text(format!(
                    "Capabilities: {}",
                    capability_names(state.render_pass.capabilities())
                ));
            });
    }
}

/// Read-out of the matrices the scene was drawn with
#[derive(Debug, Default)]
pub struct CameraWindow;

impl EditorWindow for CameraWindow {
    fn name(&self) -> &str {
        "Camera"
    }

    fn build(&mut self, ui: &imgui::Ui, state: &mut EditorState<'_>) {
        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return;
        }

        ui.window(self.name())
            .size([360.0, 360.0], imgui::Condition::FirstUseEver)
            .position([display_size[0] - 380.0, 20.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!(
                    "Frame {} at {:.2}s, {:.0} fps",
                    state.frame.frame,
                    state.frame.total_time,
                    ui.io().framerate
                ));
                ui.separator();

                for (label, matrix) in [
                    ("Model", &state.matrices.model),
                    ("View", &state.matrices.view),
                    ("Projection", &state.matrices.projection),
                ] {
                    if ui.collapsing_header(label, imgui::TreeNodeFlags::DEFAULT_OPEN) {
                        for row in matrix_rows(matrix) {
                            ui.text(row);
                        }
                    }
                }
            });
    }
}

/// Formats a column-major matrix as four printable rows.
pub fn matrix_rows(matrix: &[[f32; 4]; 4]) -> [String; 4] {
    std::array::from_fn(|row| {
        format!(
            "{:8.3} {:8.3} {:8.3} {:8.3}",
            matrix[0][row], matrix[1][row], matrix[2][row], matrix[3][row]
        )
    })
}

fn capability_names(capabilities: Capabilities) -> String {
    if capabilities.is_empty() {
        return "none".to_owned();
    }
    capabilities
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(" | ")
}
