//! Immediate-mode UI helpers for the macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter
//! can remain agnostic of macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};

/// Snapshot of the tray panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TrayPanelUiContext {
    /// Current window width in screen pixels.
    pub screen_width: f32,
    /// Whether the quick-build tray is currently shown.
    pub tray_visible: bool,
}

/// Outcome of rendering the tray panel UI for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TrayPanelUiResult {
    /// Whether the tray toggle button was pressed during this frame.
    pub tray_toggle_pressed: bool,
}

/// Renders the small settings panel hosting the tray toggle button.
pub(crate) fn draw_tray_panel_ui(ui: &mut Ui, context: TrayPanelUiContext) -> TrayPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let background = Color::from_rgba(30, 30, 36, 230);
    let window_style = ui
        .style_builder()
        .color(background)
        .color_hovered(background)
        .color_clicked(background)
        .color_selected(background)
        .color_selected_hovered(background)
        .color_inactive(background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(12.0, 12.0, 12.0, 12.0))
        .build();
    skin.window_style = window_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .color_selected(Color::from_rgba(70, 70, 70, 255))
        .color_selected_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_inactive(Color::from_rgba(56, 56, 56, 200))
        .margin(RectOffset::new(0.0, 0.0, 6.0, 6.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let size = Vec2::new(160.0, 84.0);
    let origin = Vec2::new(context.screen_width - size.x - 12.0, 12.0);
    let mut button_pressed = false;
    let _ = ui.window(hash!("tray_panel"), origin, size, |ui| {
        let status = if context.tray_visible {
            "Tray: shown"
        } else {
            "Tray: hidden"
        };
        ui.label(None, status);
        button_pressed = ui.button(None, "Toggle Tray");
    });

    ui.pop_skin();

    TrayPanelUiResult {
        tray_toggle_pressed: button_pressed,
    }
}
