use std::cell::RefCell;

use quickbuild_core::{
    BuildableUnit, Cell, DropPayload, Event, Gold, PlayerActions, ScreenPosition, UnitType,
};
use quickbuild_game::{ActionsQuery, ActionsResponder, PlayerId, SessionView, TileRef};
use quickbuild_system_tray::{DropSample, PointerSample, Tray, TrayInput};

/// Session double that records every buildability query and lets tests
/// resolve them in any order.
struct FakeSession {
    player: Option<PlayerId>,
    alive: bool,
    spawn_phase: bool,
    columns: u32,
    rows: u32,
    disabled: Vec<UnitType>,
    responders: RefCell<Vec<ActionsResponder>>,
    queried_tiles: RefCell<Vec<TileRef>>,
}

impl FakeSession {
    fn with_live_player() -> Self {
        Self {
            player: Some(PlayerId::new(1)),
            alive: true,
            spawn_phase: false,
            columns: 10,
            rows: 8,
            disabled: Vec::new(),
            responders: RefCell::new(Vec::new()),
            queried_tiles: RefCell::new(Vec::new()),
        }
    }

    fn without_player() -> Self {
        Self {
            player: None,
            ..Self::with_live_player()
        }
    }

    /// Resolves the query at the provided issue index with a snapshot.
    fn resolve(&self, index: usize, actions: PlayerActions) {
        let responder = self.responders.borrow_mut().remove(index);
        responder.resolve(actions);
    }
}

impl SessionView for FakeSession {
    fn local_player(&self) -> Option<PlayerId> {
        self.player
    }

    fn is_alive(&self, player: PlayerId) -> bool {
        self.player == Some(player) && self.alive
    }

    fn in_spawn_phase(&self) -> bool {
        self.spawn_phase
    }

    fn map_columns(&self) -> u32 {
        self.columns
    }

    fn map_rows(&self) -> u32 {
        self.rows
    }

    fn is_valid_coord(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.columns && (y as u32) < self.rows
    }

    fn tile_ref(&self, cell: Cell) -> TileRef {
        TileRef::new(cell.y() as u64 * self.columns as u64 + cell.x() as u64)
    }

    fn actions_at(&self, _player: PlayerId, tile: TileRef) -> ActionsQuery {
        self.queried_tiles.borrow_mut().push(tile);
        let (responder, query) = ActionsQuery::channel();
        self.responders.borrow_mut().push(responder);
        query
    }

    fn unit_count(&self, _player: PlayerId, unit_type: UnitType) -> usize {
        if unit_type == UnitType::City {
            3
        } else {
            0
        }
    }

    fn is_unit_disabled(&self, unit_type: UnitType) -> bool {
        self.disabled.contains(&unit_type)
    }
}

fn snapshot_with_city(cost: u64, can_build: bool) -> PlayerActions {
    PlayerActions::new(vec![BuildableUnit::new(
        UnitType::City,
        Gold::new(cost),
        can_build,
    )])
}

fn release_at(canvas: ScreenPosition, screen: ScreenPosition) -> PointerSample {
    PointerSample {
        screen,
        canvas,
        pressed: false,
        released: true,
        over_item: None,
    }
}

fn press_on(index: usize) -> PointerSample {
    PointerSample {
        screen: ScreenPosition::new(400.0, 560.0),
        canvas: ScreenPosition::new(400.0, 560.0),
        pressed: true,
        released: false,
        over_item: Some(index),
    }
}

#[test]
fn tray_stays_hidden_without_a_player() {
    let session = FakeSession::without_player();
    let mut tray = Tray::new();

    tray.tick(&session);
    assert!(!tray.visible(), "no player means no tray");
    assert!(
        session.queried_tiles.borrow().is_empty(),
        "no refresh should be issued without a player",
    );
}

#[test]
fn tray_hides_during_spawn_phase_and_shows_once_alive() {
    let mut session = FakeSession::with_live_player();
    session.spawn_phase = true;
    let mut tray = Tray::new();

    tray.tick(&session);
    assert!(!tray.visible(), "spawn phase hides the tray");

    session.spawn_phase = false;
    tray.tick(&session);
    assert!(tray.visible(), "a live player brings the tray back");
}

#[test]
fn manual_hide_is_overridden_on_the_next_tick_while_alive() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    assert!(tray.visible());

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            toggle: true,
            ..TrayInput::default()
        },
        &mut events,
    );
    assert!(!tray.visible(), "toggle hides the tray immediately");

    tray.tick(&session);
    assert!(
        tray.visible(),
        "the lifecycle reconciliation re-shows the tray while the player lives",
    );
}

#[test]
fn refresh_queries_the_map_center_tile_every_tick() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();

    tray.tick(&session);
    tray.tick(&session);

    let center = session.tile_ref(Cell::new(5, 4));
    let tiles = session.queried_tiles.borrow();
    assert_eq!(tiles.len(), 2, "one refresh per tick");
    assert!(tiles.iter().all(|tile| *tile == center));
}

#[test]
fn stale_refresh_cannot_overwrite_a_newer_snapshot() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();

    // Two overlapping refreshes in flight.
    tray.tick(&session);
    tray.tick(&session);

    // The second (newer) refresh completes first.
    session.resolve(1, snapshot_with_city(100, true));
    tray.tick(&session);
    assert_eq!(tray.cost(UnitType::City), Gold::new(100));
    assert!(tray.can_build(UnitType::City));

    // The first refresh straggles in afterwards with different data.
    session.resolve(0, snapshot_with_city(999, false));
    tray.tick(&session);
    assert_eq!(
        tray.cost(UnitType::City),
        Gold::new(100),
        "a stale refresh must be discarded, not applied",
    );
    assert!(tray.can_build(UnitType::City));
}

#[test]
fn display_falls_back_before_the_first_snapshot() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);

    assert_eq!(tray.cost(UnitType::City), Gold::ZERO);
    assert!(!tray.can_build(UnitType::City));
}

#[test]
fn count_text_counts_for_countable_entries_and_falls_back_without_a_player() {
    let session = FakeSession::with_live_player();
    let tray = Tray::new();
    let items = tray.items(&session);
    let city = items
        .iter()
        .find(|item| item.unit_type == UnitType::City)
        .expect("city entry");
    let bomb = items
        .iter()
        .find(|item| item.unit_type == UnitType::AtomBomb)
        .expect("bomb entry");

    assert_eq!(tray.count_text(&session, city), Some("3".to_owned()));
    assert_eq!(tray.count_text(&session, bomb), None, "ordnance has no count chip");

    let empty = FakeSession::without_player();
    assert_eq!(tray.count_text(&empty, city), Some("?".to_owned()));
}

#[test]
fn disabled_units_are_removed_from_the_tray() {
    let mut session = FakeSession::with_live_player();
    session.disabled.push(UnitType::Mirv);
    let tray = Tray::new();

    let items = tray.items(&session);
    assert!(items.iter().all(|item| item.unit_type != UnitType::Mirv));
    assert_eq!(items.len(), 9, "the remaining allow-list entries survive");
}

#[test]
fn press_and_release_off_the_tray_requests_a_placement() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, true));
    tray.tick(&session);

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            pointer: Some(press_on(0)),
            ..TrayInput::default()
        },
        &mut events,
    );
    assert!(events.is_empty(), "pressing only arms the drag");
    assert_eq!(tray.drag().map(|drag| drag.unit_type), Some(UnitType::City));

    let canvas = ScreenPosition::new(250.0, 180.0);
    let screen = ScreenPosition::new(260.0, 200.0);
    tray.handle(
        &session,
        &TrayInput {
            pointer: Some(release_at(canvas, screen)),
            ..TrayInput::default()
        },
        &mut events,
    );

    match events.as_slice() {
        [Event::PlacementRequested(gesture)] => {
            assert_eq!(gesture.unit_type, UnitType::City);
            assert_eq!(gesture.canvas, canvas);
            assert_eq!(gesture.screen, screen);
        }
        other => panic!("expected a single placement request, got {other:?}"),
    }
    assert!(tray.drag().is_none(), "the drag ends with the gesture");
}

#[test]
fn release_over_the_tray_still_forwards_the_gesture() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, true));
    tray.tick(&session);

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            pointer: Some(press_on(0)),
            ..TrayInput::default()
        },
        &mut events,
    );

    // Released back over the tray strip; the release coordinate forwards
    // regardless, placement validity is the dispatcher's call.
    let release = ScreenPosition::new(410.0, 565.0);
    tray.handle(
        &session,
        &TrayInput {
            pointer: Some(release_at(release, release)),
            ..TrayInput::default()
        },
        &mut events,
    );

    match events.as_slice() {
        [Event::PlacementRequested(gesture)] => {
            assert_eq!(gesture.unit_type, UnitType::City);
            assert_eq!(gesture.screen, release, "the release coordinate travels with the gesture");
        }
        other => panic!("expected a single placement request, got {other:?}"),
    }
    assert!(tray.drag().is_none());
}

#[test]
fn no_refresh_is_issued_while_the_tray_stays_hidden() {
    let mut session = FakeSession::with_live_player();
    session.alive = false;
    let mut tray = Tray::new();

    tray.tick(&session);
    tray.tick(&session);

    assert!(!tray.visible(), "a dead player never shows the tray");
    assert!(
        session.queried_tiles.borrow().is_empty(),
        "a hidden tray must not query buildability",
    );
}

#[test]
fn tooltip_names_describes_and_prices_buildable_entries() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, true));
    tray.tick(&session);

    let items = tray.items(&session);
    let city = items
        .iter()
        .find(|item| item.unit_type == UnitType::City)
        .copied()
        .expect("city entry");

    let tooltip = tray.tooltip(city);
    assert!(tooltip.contains("City"), "tooltip names the entry: {tooltip}");
    assert!(tooltip.contains("100 gold"), "tooltip prices the entry: {tooltip}");
}

#[test]
fn tooltip_collapses_to_a_money_notice_when_unbuildable() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, false));
    tray.tick(&session);

    let items = tray.items(&session);
    let city = items
        .iter()
        .find(|item| item.unit_type == UnitType::City)
        .copied()
        .expect("city entry");

    assert_eq!(tray.tooltip(city), "Not enough money");
}

#[test]
fn unbuildable_entries_cannot_start_a_drag() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, false));
    tray.tick(&session);

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            pointer: Some(press_on(0)),
            ..TrayInput::default()
        },
        &mut events,
    );

    assert!(tray.drag().is_none(), "unbuildable entries are inert");
    assert!(tray.drag_payload(&session, 0).is_none());
}

#[test]
fn drag_payload_is_offered_for_buildable_entries() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);
    session.resolve(0, snapshot_with_city(100, true));
    tray.tick(&session);

    let payload = tray.drag_payload(&session, 0).expect("buildable entry payload");
    let decoded = DropPayload::parse(&payload).expect("payload parses back");
    assert_eq!(decoded.unit_type, UnitType::City);
}

#[test]
fn dropped_payload_requests_a_placement() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            drop: Some(DropSample {
                screen: ScreenPosition::new(320.0, 240.0),
                canvas: ScreenPosition::new(300.0, 220.0),
                payload: DropPayload::build(UnitType::Factory).encode(),
            }),
            ..TrayInput::default()
        },
        &mut events,
    );

    match events.as_slice() {
        [Event::PlacementRequested(gesture)] => {
            assert_eq!(gesture.unit_type, UnitType::Factory);
            assert_eq!(gesture.canvas, ScreenPosition::new(300.0, 220.0));
            assert_eq!(gesture.screen, ScreenPosition::new(320.0, 240.0));
        }
        other => panic!("expected a single placement request, got {other:?}"),
    }
}

#[test]
fn malformed_and_foreign_drops_are_ignored_without_panicking() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();
    tray.tick(&session);

    let mut events = Vec::new();
    for payload in ["{broken", r#"{"unitType":"City","action":"inspect"}"#] {
        tray.handle(
            &session,
            &TrayInput {
                drop: Some(DropSample {
                    screen: ScreenPosition::default(),
                    canvas: ScreenPosition::default(),
                    payload: payload.to_owned(),
                }),
                ..TrayInput::default()
            },
            &mut events,
        );
    }

    assert!(events.is_empty(), "bad payloads never become placement requests");
}

#[test]
fn hidden_tray_ignores_gestures() {
    let session = FakeSession::with_live_player();
    let mut tray = Tray::new();

    let mut events = Vec::new();
    tray.handle(
        &session,
        &TrayInput {
            drop: Some(DropSample {
                screen: ScreenPosition::default(),
                canvas: ScreenPosition::default(),
                payload: DropPayload::build(UnitType::City).encode(),
            }),
            pointer: Some(press_on(0)),
            ..TrayInput::default()
        },
        &mut events,
    );

    assert!(events.is_empty());
    assert!(tray.drag().is_none());
}
