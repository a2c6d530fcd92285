#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the quick-build client.
//!
//! Wires the tray and the placement dispatcher to a demo game session and
//! pumps the event batch once per frame: tray gestures become placement
//! requests, the dispatcher validates them against the session, and confirmed
//! build intents are enacted by the session itself.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use glam::Vec2;
use quickbuild_core::{Cell, Event, Gold};
use quickbuild_game::GameSession;
use quickbuild_rendering::{
    CameraTransform, Color, DragPreview, FrameInput, Presentation, RenderingBackend, Scene,
    TrayItemView, TrayLayout, TrayPresentation,
};
use quickbuild_rendering_macroquad::MacroquadBackend;
use quickbuild_system_dispatcher::Dispatcher;
use quickbuild_system_tray::{DropSample, PointerSample, Tray, TrayInput};

/// Launches the quick-build demo client.
#[derive(Debug, Parser)]
#[command(name = "quickbuild", about = "Quick-build placement demo client")]
struct Args {
    /// Number of map columns.
    #[arg(long, default_value_t = 64)]
    columns: u32,
    /// Number of map rows.
    #[arg(long, default_value_t = 48)]
    rows: u32,
    /// Starting gold for the local player.
    #[arg(long, default_value_t = 500)]
    gold: u64,
    /// Gold granted per second while the session runs.
    #[arg(long, default_value_t = 25)]
    income: u64,
    /// Side length of one world cell in screen pixels.
    #[arg(long, default_value_t = 16.0)]
    cell_px: f32,
    /// Disable vertical synchronisation.
    #[arg(long)]
    no_vsync: bool,
    /// Print frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the quick-build command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut session = GameSession::new(args.columns, args.rows);
    // A water strip along the western edge so naval entries have somewhere
    // legal to land.
    for y in 0..args.rows {
        for x in 0..args.columns.min(4) {
            session.set_water(Cell::new(x, y));
        }
    }
    let _player = session.spawn_player(Gold::new(args.gold));

    let camera = CameraTransform::new(Vec2::ZERO, args.cell_px)?;
    let scene = Scene::new(TrayPresentation::default(), TrayLayout::DEFAULT, camera);
    let presentation = Presentation::new("Quick Build", Color::from_rgb_u8(18, 18, 22), scene);

    let mut tray = Tray::new();
    let mut dispatcher = Dispatcher::new();
    let mut events: Vec<Event> = Vec::new();
    let mut income_accum = Duration::ZERO;
    let income = Gold::new(args.income);

    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps);

    backend.run(presentation, move |dt, input, scene| {
        income_accum += dt;
        while income_accum >= Duration::from_secs(1) {
            income_accum -= Duration::from_secs(1);
            session.add_gold(income);
        }

        tray.tick(&session);

        let tray_input = distill_tray_input(&input, &tray, &session, scene.tray_layout);
        tray.handle(&session, &tray_input, &mut events);

        let camera = scene.camera;
        dispatcher.handle(&events, &session, |canvas| camera.screen_to_world(canvas));
        events.clear();
        dispatcher.poll(&session, &mut events, |at, outcome| {
            scene.feedback.spawn(at, outcome);
        });
        for event in events.drain(..) {
            let Event::BuildIntentIssued { unit_type, cell } = event else {
                continue;
            };
            if session.apply_build_intent(unit_type, cell) {
                log::info!("built {unit_type:?} at ({}, {})", cell.x(), cell.y());
            } else {
                log::warn!("build intent for {unit_type:?} rejected by the session");
            }
        }

        scene.feedback.tick(dt);
        populate_scene(scene, &tray, &session, &tray_input);
    })
}

/// Distills the backend's raw frame input into the tray's input contract.
fn distill_tray_input(
    input: &FrameInput,
    tray: &Tray,
    session: &GameSession,
    layout: TrayLayout,
) -> TrayInput {
    let item_count = tray.items(session).len();
    let pointer = input.pointer.map(|pointer| {
        let over_item = if tray.visible() {
            layout.hit_test(
                input.screen_width,
                input.screen_height,
                item_count,
                pointer.screen,
            )
        } else {
            None
        };
        PointerSample {
            screen: pointer.screen,
            canvas: pointer.canvas,
            pressed: pointer.pressed,
            released: pointer.released,
            over_item,
        }
    });
    let drop = input
        .drop_payload
        .clone()
        .zip(input.pointer)
        .map(|(payload, pointer)| DropSample {
            screen: pointer.screen,
            canvas: pointer.canvas,
            payload,
        });
    TrayInput {
        pointer,
        drop,
        toggle: input.tray_toggle,
    }
}

/// Rebuilds the presentation channels the backend draws from.
fn populate_scene(scene: &mut Scene, tray: &Tray, session: &GameSession, input: &TrayInput) {
    scene.tray.visible = tray.visible();
    scene.tray.items = tray
        .items(session)
        .iter()
        .map(|item| {
            let cost = tray.cost(item.unit_type);
            let enabled = tray.can_build(item.unit_type);
            let tooltip = tray.tooltip(item);
            TrayItemView {
                unit_type: item.unit_type,
                icon: item.icon,
                label: item.unit_type.name().to_owned(),
                cost_text: cost.to_string(),
                count_text: tray.count_text(session, item),
                tooltip,
                enabled,
            }
        })
        .collect();
    scene.tray.hovered = input.pointer.and_then(|pointer| {
        if tray.drag().is_none() {
            pointer.over_item
        } else {
            None
        }
    });
    scene.drag_preview = tray.drag().zip(input.pointer).map(|(drag, pointer)| DragPreview {
        unit_type: drag.unit_type,
        icon: drag.icon,
        position: pointer.screen,
    });
}
