use egui::Color32;

use crate::wires::WirePolicy;

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pixels per lattice step.
    pub grid_size: f32,
    pub tick_rate_hz: f32,
    /// Upper bound on simulation steps run in one frame.
    pub max_steps_per_frame: u32,
    pub wire_policy: WirePolicy,
    pub wire_thickness: f32,
    pub element_stroke: f32,
    pub pin_radius: f32,
    pub grid_dot_color: Color32,
    pub element_fill_color: Color32,
    pub element_stroke_color: Color32,
    pub wire_color: Color32,
    pub pin_unknown_color: Color32,
    pub pin_low_color: Color32,
    pub pin_high_color: Color32,
    pub selection_color: Color32,
    pub cursor_color: Color32,
    /// Alpha applied to elements drawn as a preview.
    pub ghost_alpha: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 16.0,
            tick_rate_hz: 65.0,
            max_steps_per_frame: 8,
            wire_policy: WirePolicy::Toggle,
            wire_thickness: 2.0,
            element_stroke: 2.0,
            pin_radius: 3.0,
            grid_dot_color: Color32::GRAY,
            element_fill_color: Color32::WHITE,
            element_stroke_color: Color32::BLACK,
            wire_color: Color32::DARK_GRAY,
            pin_unknown_color: Color32::GRAY,
            pin_low_color: Color32::DARK_GREEN,
            pin_high_color: Color32::GREEN,
            selection_color: Color32::LIGHT_BLUE,
            cursor_color: Color32::from_rgb(0x1e, 0x90, 0xff),
            ghost_alpha: 0.5,
        }
    }
}
