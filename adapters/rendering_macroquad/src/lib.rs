#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the quick-build client.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! All uses of macroquad's immediate-mode UI live inside the local `ui`
//! module so the rest of the adapter stays agnostic of its widget types.

mod ui;

use self::ui::{draw_tray_panel_ui, TrayPanelUiContext, TrayPanelUiResult};
use anyhow::Result;
use macroquad::input::{
    is_key_pressed, is_mouse_button_pressed, is_mouse_button_released, mouse_position, KeyCode,
    MouseButton,
};
use quickbuild_core::ScreenPosition;
use quickbuild_rendering::{
    Color, FeedbackMarker, FrameInput, PointerSnapshot, Presentation, RenderingBackend, Scene,
    ScreenRect, TrayItemView,
};
use std::time::{Duration, Instant};

/// Tracks UI-sourced interactions so they can be merged with physical input
/// on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TrayPanelInputState {
    tray_toggle_latched: bool,
}

impl TrayPanelInputState {
    /// Returns whether the UI requested a tray toggle and clears the latch so
    /// the action fires only once.
    pub fn take_tray_toggle(&mut self) -> bool {
        let latched = self.tray_toggle_latched;
        self.tray_toggle_latched = false;
        latched
    }

    /// Records that the panel button requested a tray toggle this frame.
    pub fn register_tray_toggle(&mut self) {
        self.tray_toggle_latched = true;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
    /// `B` toggles quick-build tray visibility.
    toggle_tray: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            toggle_tray: is_key_pressed(KeyCode::B),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second average once one
    /// second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = if seconds <= f32::EPSILON {
            None
        } else {
            Some(self.frames as f32 / seconds)
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        per_second
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut panel_input = TrayPanelInputState::default();

            loop {
                let frame_start = Instant::now();
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input(
                    keyboard.toggle_tray || panel_input.take_tray_toggle(),
                    screen_width,
                    screen_height,
                );

                update_scene(frame_dt, frame_input, &mut scene);

                draw_tray(&scene, screen_width, screen_height);
                draw_drag_preview(&scene);
                draw_feedback_markers(scene.feedback.markers());

                let mut panel_ui = macroquad::ui::root_ui();
                let TrayPanelUiResult { tray_toggle_pressed } = draw_tray_panel_ui(
                    &mut panel_ui,
                    TrayPanelUiContext {
                        screen_width,
                        tray_visible: scene.tray.visible,
                    },
                );
                if tray_toggle_pressed {
                    panel_input.register_tray_toggle();
                }

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_start.elapsed()) {
                        println!("fps: {per_second:.1}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Captures this frame's pointer and shortcut state.
///
/// The window hosts a single canvas, so the viewport-relative and the
/// canvas-relative pointer positions coincide here.
fn gather_frame_input(tray_toggle: bool, screen_width: f32, screen_height: f32) -> FrameInput {
    let (mouse_x, mouse_y) = mouse_position();
    let position = ScreenPosition::new(mouse_x, mouse_y);
    FrameInput {
        pointer: Some(PointerSnapshot {
            screen: position,
            canvas: position,
            pressed: is_mouse_button_pressed(MouseButton::Left),
            released: is_mouse_button_released(MouseButton::Left),
        }),
        drop_payload: None,
        tray_toggle,
        screen_width,
        screen_height,
    }
}

const SLOT_FILL: Color = Color::from_rgb_u8(38, 38, 46);
const SLOT_BORDER: Color = Color::from_rgb_u8(90, 90, 104);
const TOOLTIP_FILL: Color = Color::from_rgb_u8(24, 24, 28);

fn draw_tray(scene: &Scene, screen_width: f32, screen_height: f32) {
    if !scene.tray.visible {
        return;
    }
    let layout = scene.tray_layout;
    let items = &scene.tray.items;

    for (index, item) in items.iter().enumerate() {
        let rect = layout.item_rect(screen_width, screen_height, items.len(), index);
        draw_tray_slot(&rect, item);
    }

    if let Some(hovered) = scene.tray.hovered {
        if let Some(item) = items.get(hovered) {
            let rect = layout.item_rect(screen_width, screen_height, items.len(), hovered);
            draw_tooltip(&rect, item);
        }
    }
}

fn draw_tray_slot(rect: &ScreenRect, item: &TrayItemView) {
    let alpha = if item.enabled { 1.0 } else { 0.4 };
    draw_rect(rect, SLOT_FILL.with_alpha(alpha));
    draw_rect_outline(rect, SLOT_BORDER.with_alpha(alpha));

    // Icon assets render as their short label until an atlas lands.
    let icon_label = icon_label(item.icon);
    draw_text_centered(
        icon_label,
        rect.x + rect.width * 0.5,
        rect.y + rect.height * 0.45,
        18.0,
        Color::new(1.0, 1.0, 1.0, alpha),
    );
    draw_text_centered(
        &item.cost_text,
        rect.x + rect.width * 0.5,
        rect.y + rect.height - 6.0,
        14.0,
        Color::new(1.0, 0.85, 0.3, alpha),
    );

    if let Some(count) = &item.count_text {
        draw_text_centered(
            count,
            rect.x + rect.width - 8.0,
            rect.y + 12.0,
            14.0,
            Color::new(0.8, 0.9, 1.0, alpha),
        );
    }
}

/// Shortens an icon asset path to a displayable tag.
fn icon_label(icon: &str) -> &str {
    icon.rsplit('/').next().unwrap_or(icon)
}

fn draw_tooltip(anchor: &ScreenRect, item: &TrayItemView) {
    let width = 220.0;
    let height = 44.0;
    let rect = ScreenRect::new(
        anchor.x + anchor.width * 0.5 - width * 0.5,
        anchor.y - height - 8.0,
        width,
        height,
    );
    draw_rect(&rect, TOOLTIP_FILL.with_alpha(0.92));
    draw_rect_outline(&rect, SLOT_BORDER);
    draw_text_centered(
        &item.label,
        rect.x + rect.width * 0.5,
        rect.y + 18.0,
        16.0,
        Color::new(1.0, 1.0, 1.0, 1.0),
    );
    draw_text_centered(
        &item.tooltip,
        rect.x + rect.width * 0.5,
        rect.y + 36.0,
        13.0,
        Color::new(0.8, 0.8, 0.8, 1.0),
    );
}

fn draw_drag_preview(scene: &Scene) {
    let Some(preview) = scene.drag_preview else {
        return;
    };
    let size = scene.tray_layout.slot_size * 0.75;
    let rect = ScreenRect::new(
        preview.position.x - size * 0.5,
        preview.position.y - size * 0.5,
        size,
        size,
    );
    draw_rect(&rect, SLOT_FILL.with_alpha(0.6));
    draw_text_centered(
        icon_label(preview.icon),
        rect.x + rect.width * 0.5,
        rect.y + rect.height * 0.55,
        16.0,
        Color::new(1.0, 1.0, 1.0, 0.8),
    );
}

fn draw_feedback_markers(markers: &[FeedbackMarker]) {
    for marker in markers {
        // Fade the glyph out over its lifetime.
        let fade = marker.remaining.as_secs_f32()
            / quickbuild_rendering::FeedbackOverlay::MARKER_LIFETIME.as_secs_f32();
        let color = marker.color().with_alpha(fade.clamp(0.0, 1.0));
        draw_text_centered(
            marker.glyph(),
            marker.position.x,
            marker.position.y,
            32.0,
            color,
        );
    }
}

fn draw_rect(rect: &ScreenRect, color: Color) {
    macroquad::shapes::draw_rectangle(
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        to_macroquad_color(color),
    );
}

fn draw_rect_outline(rect: &ScreenRect, color: Color) {
    macroquad::shapes::draw_rectangle_lines(
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        2.0,
        to_macroquad_color(color),
    );
}

fn draw_text_centered(text: &str, center_x: f32, baseline_y: f32, font_size: f32, color: Color) {
    let dimensions = macroquad::text::measure_text(text, None, font_size as u16, 1.0);
    macroquad::text::draw_text(
        text,
        center_x - dimensions.width * 0.5,
        baseline_y,
        font_size,
        to_macroquad_color(color),
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
