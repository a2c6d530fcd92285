#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Quick-build tray system.
//!
//! Owns the tray's visibility, its buildability snapshot, and the pointer
//! gestures that turn a tray entry into a placement request. The tray never
//! validates placements itself; it publishes
//! [`Event::PlacementRequested`] values and leaves validation to the
//! placement dispatcher.
//!
//! Snapshot refreshes are asynchronous and may complete out of order. Every
//! refresh carries a generation token and a response is accepted only when
//! its token is newer than the last accepted one, so a slow early query can
//! never overwrite a fresher snapshot.

use quickbuild_core::{
    build_catalogue, translate, BuildItem, DropPayload, Event, Gold, PlacementGesture,
    PlayerActions, ScreenPosition, UnitType, QUICK_BUILD_UNIT_TYPES,
};
use quickbuild_game::{map_center, ActionsQuery, QueryPoll, SessionView};

/// Pointer state distilled by the adapter for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    /// Pointer position relative to the viewport.
    pub screen: ScreenPosition,
    /// Pointer position relative to the game canvas.
    pub canvas: ScreenPosition,
    /// Whether the primary button went down on this frame.
    pub pressed: bool,
    /// Whether the primary button went up on this frame.
    pub released: bool,
    /// Tray entry currently under the pointer, if any.
    pub over_item: Option<usize>,
}

/// Completed OS-level drop captured by the adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct DropSample {
    /// Drop position relative to the viewport.
    pub screen: ScreenPosition,
    /// Drop position relative to the game canvas.
    pub canvas: ScreenPosition,
    /// Serialized payload attached to the drag at its origin.
    pub payload: String,
}

/// Input snapshot consumed by the tray on one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrayInput {
    /// Pointer state for this frame, when a pointer exists.
    pub pointer: Option<PointerSample>,
    /// Drop completed on the canvas this frame, if any.
    pub drop: Option<DropSample>,
    /// Whether the player asked to toggle tray visibility this frame.
    pub toggle: bool,
}

/// Tray entry being dragged by the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveDrag {
    /// Unit type carried by the drag.
    pub unit_type: UnitType,
    /// Icon asset reference for the dragged entry.
    pub icon: &'static str,
}

/// Quick-build tray state machine.
#[derive(Debug, Default)]
pub struct Tray {
    visible: bool,
    actions: Option<PlayerActions>,
    pending: Vec<(u64, ActionsQuery)>,
    issued: u64,
    accepted: u64,
    drag: Option<ActiveDrag>,
}

impl Tray {
    /// Creates a new tray. Starts hidden until a live player exists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tray is currently visible.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Drag currently in flight, if any.
    #[must_use]
    pub const fn drag(&self) -> Option<ActiveDrag> {
        self.drag
    }

    /// Shows the tray ahead of the automatic lifecycle.
    ///
    /// The next [`tick`](Self::tick) hides it again if the session no longer
    /// warrants a tray.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hides the tray and cancels any in-flight drag.
    ///
    /// The next [`tick`](Self::tick) shows it again while the local player
    /// lives.
    pub fn hide(&mut self) {
        self.visible = false;
        self.drag = None;
    }

    /// Advances the tray by one game tick.
    ///
    /// Reconciles visibility with the session lifecycle, folds in any
    /// refreshes that completed since the last tick, and, while visible,
    /// issues this tick's snapshot refresh at the map-centre reference tile.
    pub fn tick(&mut self, view: &impl SessionView) {
        // Drain first so refreshes settle even across hidden ticks.
        self.poll_pending();

        let Some(player) = view.local_player() else {
            self.hide();
            return;
        };
        if view.in_spawn_phase() {
            self.hide();
            return;
        }
        if view.is_alive(player) && !self.visible {
            self.visible = true;
        }
        if !self.visible {
            return;
        }

        // The tray reads buildability as a global affordability signal, so
        // any fixed tile works; the map centre matches the camera's default.
        let tile = view.tile_ref(map_center(view));
        self.issued += 1;
        self.pending.push((self.issued, view.actions_at(player, tile)));
    }

    fn poll_pending(&mut self) {
        let mut still_pending = Vec::new();
        for (token, query) in self.pending.drain(..) {
            match query.poll() {
                QueryPoll::Pending(query) => still_pending.push((token, query)),
                QueryPoll::Ready(Ok(actions)) => {
                    if token > self.accepted {
                        self.accepted = token;
                        self.actions = Some(actions);
                    } else {
                        log::debug!("discarding stale tray snapshot (generation {token})");
                    }
                }
                QueryPoll::Ready(Err(error)) => {
                    log::warn!("tray snapshot refresh failed: {error}");
                }
            }
        }
        self.pending = still_pending;
    }

    /// Consumes this frame's input and publishes placement requests.
    ///
    /// Gestures are only honoured while the tray is visible; a hidden tray
    /// cannot originate drags, and drops carrying its payload are stale.
    /// `over_item` indices refer to the entry order returned by
    /// [`items`](Self::items) for the same session view.
    pub fn handle(&mut self, view: &impl SessionView, input: &TrayInput, out: &mut Vec<Event>) {
        if input.toggle {
            self.visible = !self.visible;
            if !self.visible {
                self.drag = None;
            }
        }
        if !self.visible {
            return;
        }

        if let Some(drop) = &input.drop {
            match DropPayload::parse(&drop.payload) {
                Ok(payload) => out.push(Event::PlacementRequested(PlacementGesture::new(
                    drop.canvas,
                    drop.screen,
                    payload.unit_type,
                ))),
                Err(error) => log::warn!("ignoring drop: {error}"),
            }
        }

        let Some(pointer) = input.pointer else {
            return;
        };

        if pointer.pressed {
            if let Some(index) = pointer.over_item {
                if let Some(item) = self.items(view).get(index).copied() {
                    if self.can_build(item.unit_type) {
                        self.drag = Some(ActiveDrag {
                            unit_type: item.unit_type,
                            icon: item.icon,
                        });
                    }
                }
            }
        }

        if pointer.released {
            // Every armed drag forwards on release; the dispatcher's bounds
            // and buildability checks decide what becomes of it.
            if let Some(drag) = self.drag.take() {
                out.push(Event::PlacementRequested(PlacementGesture::new(
                    pointer.canvas,
                    pointer.screen,
                    drag.unit_type,
                )));
            }
        }
    }

    /// Catalogue entries the tray displays, in display order.
    ///
    /// The fixed allow-list intersected with the catalogue; entries the
    /// session disables are removed by [`items`](Self::items).
    fn items_for_display(&self) -> Vec<&'static BuildItem> {
        QUICK_BUILD_UNIT_TYPES
            .iter()
            .filter_map(|unit_type| {
                build_catalogue()
                    .iter()
                    .find(|item| item.unit_type == *unit_type)
            })
            .collect()
    }

    /// Entries to display for the provided session, excluding disabled units.
    #[must_use]
    pub fn items(&self, view: &impl SessionView) -> Vec<&'static BuildItem> {
        self.items_for_display()
            .into_iter()
            .filter(|item| !view.is_unit_disabled(item.unit_type))
            .collect()
    }

    /// Whether the latest snapshot marks the unit type as buildable.
    ///
    /// Defaults to `false` before the first snapshot arrives, which keeps
    /// every entry inert until the session answers.
    #[must_use]
    pub fn can_build(&self, unit_type: UnitType) -> bool {
        self.actions
            .as_ref()
            .and_then(|actions| actions.buildable(unit_type))
            .is_some_and(|unit| unit.can_build)
    }

    /// Cost of the unit type according to the latest snapshot.
    ///
    /// Defaults to zero before the first snapshot arrives.
    #[must_use]
    pub fn cost(&self, unit_type: UnitType) -> Gold {
        self.actions
            .as_ref()
            .and_then(|actions| actions.buildable(unit_type))
            .map_or(Gold::ZERO, |unit| unit.cost)
    }

    /// Owned-unit count chip text for a countable entry.
    ///
    /// Shows a question mark when no local player exists to count for.
    #[must_use]
    pub fn count_text(&self, view: &impl SessionView, item: &BuildItem) -> Option<String> {
        if !item.countable {
            return None;
        }
        Some(match view.local_player() {
            Some(player) => view.unit_count(player, item.unit_type).to_string(),
            None => "?".to_owned(),
        })
    }

    /// Tooltip text for a tray entry against the latest snapshot.
    ///
    /// Buildable entries show the catalogue name, description and cost;
    /// everything else collapses to a plain "not enough money" notice.
    #[must_use]
    pub fn tooltip(&self, item: &BuildItem) -> String {
        if !self.can_build(item.unit_type) {
            return translate("build_menu.not_enough_money").to_owned();
        }
        format!(
            "{}: {}. Cost: {} gold",
            translate(item.name_key),
            translate(item.description_key),
            self.cost(item.unit_type),
        )
    }

    /// Payload the adapter should attach when an OS-level drag starts on the
    /// entry at the provided display index.
    ///
    /// Returns `None` for unknown indices and for entries that are not
    /// currently buildable.
    #[must_use]
    pub fn drag_payload(&self, view: &impl SessionView, index: usize) -> Option<String> {
        let item = *self.items(view).get(index)?;
        if !self.can_build(item.unit_type) {
            return None;
        }
        Some(DropPayload::build(item.unit_type).encode())
    }
}

#[cfg(test)]
mod tests {
    use super::Tray;
    use quickbuild_core::{Gold, UnitType};

    #[test]
    fn tray_starts_hidden_with_zero_cost_fallbacks() {
        let tray = Tray::new();
        assert!(!tray.visible());
        assert!(!tray.can_build(UnitType::City));
        assert_eq!(tray.cost(UnitType::City), Gold::ZERO);
        assert!(tray.drag().is_none());
    }
}
