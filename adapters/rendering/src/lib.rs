#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for the quick-build adapters.
//!
//! Backends present a [`Scene`] describing the tray, any in-flight drag
//! preview, and short-lived placement feedback markers. Everything here is
//! backend-agnostic: the macroquad adapter consumes these descriptors, and
//! tests drive them directly.

use anyhow::Result as AnyResult;
use glam::Vec2;
use quickbuild_core::{PlacementOutcome, ScreenPosition, UnitType};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }
}

/// Axis-aligned rectangle expressed in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenRect {
    /// Horizontal offset of the left edge.
    pub x: f32,
    /// Vertical offset of the top edge.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl ScreenRect {
    /// Creates a new screen rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the provided position lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, position: ScreenPosition) -> bool {
        position.x >= self.x
            && position.x < self.x + self.width
            && position.y >= self.y
            && position.y < self.y + self.height
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> ScreenPosition {
        ScreenPosition::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Mapping between screen pixels and world grid cells.
///
/// The camera pans by whole pixels and scales uniformly, so the translation
/// is a subtraction and a division. Out-of-map results are legal here; bounds
/// are enforced by the placement dispatcher, not the transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransform {
    /// Screen position of the world origin.
    pub offset: Vec2,
    /// Side length of one world cell in screen pixels.
    pub cell_px: f32,
}

impl CameraTransform {
    /// Creates a new camera transform.
    ///
    /// Returns an error when `cell_px` is not strictly positive.
    pub fn new(offset: Vec2, cell_px: f32) -> Result<Self, RenderingError> {
        if cell_px <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_px });
        }
        Ok(Self { offset, cell_px })
    }

    /// Translates a canvas-relative screen position into world cell
    /// coordinates.
    ///
    /// The result may lie outside the map; callers decide what to do with
    /// out-of-bounds cells.
    #[must_use]
    pub fn screen_to_world(&self, position: ScreenPosition) -> (i32, i32) {
        let x = ((position.x - self.offset.x) / self.cell_px).floor();
        let y = ((position.y - self.offset.y) / self.cell_px).floor();
        (x as i32, y as i32)
    }

    /// Translates world cell coordinates into the screen position of the
    /// cell's top-left corner.
    #[must_use]
    pub fn world_to_screen(&self, x: i32, y: i32) -> ScreenPosition {
        ScreenPosition::new(
            self.offset.x + x as f32 * self.cell_px,
            self.offset.y + y as f32 * self.cell_px,
        )
    }
}

/// Pointer state captured by the backend at the start of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSnapshot {
    /// Pointer position relative to the viewport.
    pub screen: ScreenPosition,
    /// Pointer position relative to the game canvas.
    pub canvas: ScreenPosition,
    /// Whether the primary button went down on this frame.
    pub pressed: bool,
    /// Whether the primary button went up on this frame.
    pub released: bool,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer state for this frame, when a pointer exists.
    pub pointer: Option<PointerSnapshot>,
    /// Serialized drag payload dropped onto the canvas this frame.
    pub drop_payload: Option<String>,
    /// Whether the adapter detected a tray visibility toggle on this frame.
    pub tray_toggle: bool,
    /// Current window width in screen pixels.
    pub screen_width: f32,
    /// Current window height in screen pixels.
    pub screen_height: f32,
}

/// Single entry of the tray as the backend should draw it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrayItemView {
    /// Unit type offered by this entry.
    pub unit_type: UnitType,
    /// Icon asset reference for the entry.
    pub icon: &'static str,
    /// Display label for the entry.
    pub label: String,
    /// Cost text rendered under the icon.
    pub cost_text: String,
    /// Owned-unit count chip, when the entry is countable.
    pub count_text: Option<String>,
    /// Tooltip body shown while hovering the entry.
    pub tooltip: String,
    /// Whether the entry is currently buildable and therefore interactive.
    pub enabled: bool,
}

/// Geometry of the tray strip anchored to the bottom centre of the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrayLayout {
    /// Side length of one tray slot in pixels.
    pub slot_size: f32,
    /// Gap between adjacent slots in pixels.
    pub slot_gap: f32,
    /// Distance between the tray and the bottom screen edge in pixels.
    pub bottom_margin: f32,
}

impl TrayLayout {
    /// Layout used by the shipped client.
    pub const DEFAULT: Self = Self {
        slot_size: 56.0,
        slot_gap: 8.0,
        bottom_margin: 16.0,
    };

    /// Rectangle occupied by the whole tray on a screen of the provided size.
    #[must_use]
    pub fn tray_rect(&self, screen_width: f32, screen_height: f32, items: usize) -> ScreenRect {
        let width = items as f32 * self.slot_size + items.saturating_sub(1) as f32 * self.slot_gap;
        ScreenRect::new(
            (screen_width - width) * 0.5,
            screen_height - self.bottom_margin - self.slot_size,
            width,
            self.slot_size,
        )
    }

    /// Rectangle occupied by the slot at the provided index.
    #[must_use]
    pub fn item_rect(
        &self,
        screen_width: f32,
        screen_height: f32,
        items: usize,
        index: usize,
    ) -> ScreenRect {
        let tray = self.tray_rect(screen_width, screen_height, items);
        ScreenRect::new(
            tray.x + index as f32 * (self.slot_size + self.slot_gap),
            tray.y,
            self.slot_size,
            self.slot_size,
        )
    }

    /// Index of the slot under the provided position, if any.
    #[must_use]
    pub fn hit_test(
        &self,
        screen_width: f32,
        screen_height: f32,
        items: usize,
        position: ScreenPosition,
    ) -> Option<usize> {
        (0..items).find(|index| {
            self.item_rect(screen_width, screen_height, items, *index)
                .contains(position)
        })
    }
}

/// Tray content as the backend should draw it this frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrayPresentation {
    /// Whether the tray is visible at all.
    pub visible: bool,
    /// Entries to draw, in display order.
    pub items: Vec<TrayItemView>,
    /// Index of the entry whose tooltip should be shown, if any.
    pub hovered: Option<usize>,
}

/// Ghost icon following the pointer while a tray drag is in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragPreview {
    /// Unit type being dragged.
    pub unit_type: UnitType,
    /// Icon asset reference for the dragged entry.
    pub icon: &'static str,
    /// Current pointer position relative to the viewport.
    pub position: ScreenPosition,
}

/// Short-lived placement feedback marker anchored at the gesture position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackMarker {
    /// Screen position the marker is anchored at.
    pub position: ScreenPosition,
    /// Outcome the marker communicates.
    pub outcome: PlacementOutcome,
    /// Time the marker has left before it is removed.
    pub remaining: Duration,
}

impl FeedbackMarker {
    /// Glyph drawn for the marker.
    #[must_use]
    pub const fn glyph(&self) -> &'static str {
        match self.outcome {
            PlacementOutcome::Success => "\u{2713}",
            PlacementOutcome::Failure => "\u{2717}",
        }
    }

    /// Fill color of the marker's glyph.
    #[must_use]
    pub const fn color(&self) -> Color {
        match self.outcome {
            PlacementOutcome::Success => Color::from_rgb_u8(74, 222, 128),
            PlacementOutcome::Failure => Color::from_rgb_u8(248, 113, 113),
        }
    }
}

/// Collection of active feedback markers with fixed lifetimes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedbackOverlay {
    markers: Vec<FeedbackMarker>,
}

impl FeedbackOverlay {
    /// Lifetime of every marker from spawn to removal.
    pub const MARKER_LIFETIME: Duration = Duration::from_secs(1);

    /// Spawns a new marker at the provided position.
    pub fn spawn(&mut self, position: ScreenPosition, outcome: PlacementOutcome) {
        self.markers.push(FeedbackMarker {
            position,
            outcome,
            remaining: Self::MARKER_LIFETIME,
        });
    }

    /// Advances marker lifetimes and removes the expired ones.
    pub fn tick(&mut self, elapsed: Duration) {
        for marker in &mut self.markers {
            marker.remaining = marker.remaining.saturating_sub(elapsed);
        }
        self.markers.retain(|marker| !marker.remaining.is_zero());
    }

    /// Markers that should be drawn this frame.
    #[must_use]
    pub fn markers(&self) -> &[FeedbackMarker] {
        &self.markers
    }
}

/// Scene description combining the tray, drag preview, and feedback markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tray content for this frame.
    pub tray: TrayPresentation,
    /// Layout used to place the tray on screen.
    pub tray_layout: TrayLayout,
    /// Camera transform mapping the canvas to the world grid.
    pub camera: CameraTransform,
    /// Ghost icon following an in-flight drag, if any.
    pub drag_preview: Option<DragPreview>,
    /// Active placement feedback markers.
    pub feedback: FeedbackOverlay,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(tray: TrayPresentation, tray_layout: TrayLayout, camera: CameraTransform) -> Self {
        Self {
            tray,
            tray_layout,
            camera,
            drag_preview: None,
            feedback: FeedbackOverlay::default(),
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting quick-build scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell size must be positive to keep the camera transform invertible.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_px: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_px } => {
                write!(f, "cell_px must be positive (received {cell_px})")
            }
        }
    }
}

impl Error for RenderingError {}
