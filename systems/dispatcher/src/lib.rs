#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement request dispatcher.
//!
//! Consumes [`Event::PlacementRequested`] values published by the tray,
//! validates them against the live session, and publishes
//! [`Event::BuildIntentIssued`] for confirmed placements. Every gesture ends
//! in exactly one of three ways: a silent abort (no player, or the drop
//! landed outside the map), success feedback alongside a build intent, or
//! failure feedback.
//!
//! Feedback is delivered through a caller-provided closure rather than the
//! event bus; the dispatcher's only bus output is the build intent.

use quickbuild_core::{Cell, Event, PlacementOutcome, ScreenPosition, UnitType};
use quickbuild_game::{ActionsQuery, QueryPoll, SessionView};

#[derive(Debug)]
struct PendingPlacement {
    unit_type: UnitType,
    cell: Cell,
    screen: ScreenPosition,
    query: ActionsQuery,
}

/// Placement dispatcher state machine.
///
/// Gestures whose buildability query has not resolved yet are carried across
/// frames; [`poll`](Self::poll) settles them as results arrive.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: Vec<PendingPlacement>,
}

impl Dispatcher {
    /// Creates a new dispatcher with no gestures in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gestures currently awaiting a buildability result.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Consumes this frame's events and starts validation for each placement
    /// request.
    ///
    /// The `screen_to_world` closure translates a canvas-relative position
    /// into world cell coordinates; results outside the map abort the gesture
    /// silently, as do gestures arriving while no local player exists.
    pub fn handle<F>(&mut self, events: &[Event], view: &impl SessionView, mut screen_to_world: F)
    where
        F: FnMut(ScreenPosition) -> (i32, i32),
    {
        for event in events {
            let Event::PlacementRequested(gesture) = event else {
                continue;
            };
            let Some(player) = view.local_player() else {
                log::debug!("dropping placement request: no local player");
                continue;
            };

            let (x, y) = screen_to_world(gesture.canvas);
            if !view.is_valid_coord(x, y) {
                log::debug!(
                    "dropping placement request for {:?}: ({x}, {y}) is outside the map",
                    gesture.unit_type,
                );
                continue;
            }

            let cell = Cell::new(x as u32, y as u32);
            self.pending.push(PendingPlacement {
                unit_type: gesture.unit_type,
                cell,
                screen: gesture.screen,
                query: view.actions_at(player, view.tile_ref(cell)),
            });
        }
    }

    /// Settles gestures whose buildability query has resolved.
    ///
    /// Confirmed placements publish a build intent and report
    /// [`PlacementOutcome::Success`] through the `feedback` closure; rejected
    /// ones report [`PlacementOutcome::Failure`]. A gesture resolving after
    /// the local player left the session is aborted silently.
    pub fn poll<F>(&mut self, view: &impl SessionView, out: &mut Vec<Event>, mut feedback: F)
    where
        F: FnMut(ScreenPosition, PlacementOutcome),
    {
        let mut still_pending = Vec::new();
        for placement in self.pending.drain(..) {
            let PendingPlacement {
                unit_type,
                cell,
                screen,
                query,
            } = placement;
            match query.poll() {
                QueryPoll::Pending(query) => still_pending.push(PendingPlacement {
                    unit_type,
                    cell,
                    screen,
                    query,
                }),
                QueryPoll::Ready(Ok(actions)) => {
                    if view.local_player().is_none() {
                        log::debug!("dropping resolved placement: local player left");
                        continue;
                    }
                    let can_build = actions
                        .buildable(unit_type)
                        .is_some_and(|unit| unit.can_build);
                    if can_build {
                        out.push(Event::BuildIntentIssued { unit_type, cell });
                        feedback(screen, PlacementOutcome::Success);
                    } else {
                        feedback(screen, PlacementOutcome::Failure);
                    }
                }
                QueryPoll::Ready(Err(error)) => {
                    log::warn!("placement validation failed for {unit_type:?}: {error}");
                    feedback(screen, PlacementOutcome::Failure);
                }
            }
        }
        self.pending = still_pending;
    }
}
