#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game-state accessor surface consumed by the quick-build systems.
//!
//! The tray and the dispatcher never talk to the authoritative rule engine
//! directly. They observe the session through the [`SessionView`] trait and
//! receive buildability snapshots through [`ActionsQuery`] handles, which
//! model the engine's asynchronous queries as single-threaded poll points:
//! the caller issues a query, carries the handle across frames, and polls it
//! until the responder delivers a result. Queries carry no timeout and cannot
//! be cancelled; dropping the responder surfaces as
//! [`QueryError::Disconnected`] on the next poll.
//!
//! [`GameSession`] is a reference implementation used by the demo binary and
//! by tests. It resolves every query immediately, which is the common case in
//! production as well — the handle-based contract exists so slow engines and
//! test doubles can defer resolution without changing any caller.

use std::sync::mpsc;

use quickbuild_core::{
    build_catalogue, BuildableUnit, Cell, Gold, PlayerActions, QueryError, UnitType,
};

/// Unique identifier assigned to a player within the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque handle identifying one cell of the world grid.
///
/// Obtained from [`SessionView::tile_ref`] and only meaningful to the session
/// that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRef(u64);

impl TileRef {
    /// Creates a tile reference from a session-internal index.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Retrieves the session-internal index of the tile.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Pending asynchronous buildability query.
///
/// Backed by a `std::sync::mpsc` channel so responders can deliver results
/// from anywhere in the frame without sharing mutable state with the caller.
#[derive(Debug)]
pub struct ActionsQuery {
    rx: mpsc::Receiver<Result<PlayerActions, QueryError>>,
}

/// Result of polling an [`ActionsQuery`].
#[derive(Debug)]
pub enum QueryPoll {
    /// The responder delivered a result (or was dropped).
    Ready(Result<PlayerActions, QueryError>),
    /// No result yet; the query is handed back to be polled again later.
    Pending(ActionsQuery),
}

impl ActionsQuery {
    /// Creates a connected responder/query pair.
    #[must_use]
    pub fn channel() -> (ActionsResponder, Self) {
        let (tx, rx) = mpsc::channel();
        (ActionsResponder { tx }, Self { rx })
    }

    /// Creates a query that is already resolved with the provided result.
    #[must_use]
    pub fn ready(result: Result<PlayerActions, QueryError>) -> Self {
        let (responder, query) = Self::channel();
        responder.deliver(result);
        query
    }

    /// Polls the query once, consuming it when a result is available.
    #[must_use]
    pub fn poll(self) -> QueryPoll {
        match self.rx.try_recv() {
            Ok(result) => QueryPoll::Ready(result),
            Err(mpsc::TryRecvError::Empty) => QueryPoll::Pending(self),
            Err(mpsc::TryRecvError::Disconnected) => {
                QueryPoll::Ready(Err(QueryError::Disconnected))
            }
        }
    }
}

/// Sending half of a buildability query.
#[derive(Debug)]
pub struct ActionsResponder {
    tx: mpsc::Sender<Result<PlayerActions, QueryError>>,
}

impl ActionsResponder {
    /// Delivers a successful snapshot to the polling side.
    pub fn resolve(self, actions: PlayerActions) {
        self.deliver(Ok(actions));
    }

    /// Delivers a query failure to the polling side.
    pub fn fail(self, error: QueryError) {
        self.deliver(Err(error));
    }

    fn deliver(self, result: Result<PlayerActions, QueryError>) {
        // The polling side may already be gone; late delivery is a no-op.
        let _ = self.tx.send(result);
    }
}

/// Read-only view of the game session required by the quick-build systems.
///
/// Mirrors the collaborator contract of the surrounding client: player
/// lifecycle, map validity, per-tile buildability queries, owned-unit counts,
/// and session configuration.
pub trait SessionView {
    /// Identifier of the local player, when one exists.
    fn local_player(&self) -> Option<PlayerId>;

    /// Whether the provided player is currently alive.
    fn is_alive(&self, player: PlayerId) -> bool;

    /// Whether the session is still in its pre-game spawn phase.
    fn in_spawn_phase(&self) -> bool;

    /// Number of cell columns in the world grid.
    fn map_columns(&self) -> u32;

    /// Number of cell rows in the world grid.
    fn map_rows(&self) -> u32;

    /// Whether the provided coordinates identify a cell inside the map.
    fn is_valid_coord(&self, x: i32, y: i32) -> bool;

    /// Resolves a world cell into an opaque tile reference.
    ///
    /// Callers must validate the coordinates through
    /// [`is_valid_coord`](Self::is_valid_coord) first.
    fn tile_ref(&self, cell: Cell) -> TileRef;

    /// Issues an asynchronous buildability query for the provided tile.
    fn actions_at(&self, player: PlayerId, tile: TileRef) -> ActionsQuery;

    /// Number of units of the provided type currently owned by the player.
    fn unit_count(&self, player: PlayerId, unit_type: UnitType) -> usize;

    /// Whether the session configuration globally disables the unit type.
    fn is_unit_disabled(&self, unit_type: UnitType) -> bool;
}

/// Cell of the world grid in the tray's reference-tile convention.
///
/// The tray treats buildability as a global affordability signal, so any
/// fixed reference tile suffices; the map centre matches the original
/// client's convention.
#[must_use]
pub fn map_center(view: &impl SessionView) -> Cell {
    Cell::new(view.map_columns() / 2, view.map_rows() / 2)
}

/// Base construction cost charged for the provided unit type.
#[must_use]
pub const fn unit_cost(unit_type: UnitType) -> Gold {
    match unit_type {
        UnitType::City => Gold::new(125),
        UnitType::DefensePost => Gold::new(50),
        UnitType::Factory => Gold::new(100),
        UnitType::Port => Gold::new(250),
        UnitType::MissileSilo => Gold::new(100),
        UnitType::SamLauncher => Gold::new(75),
        UnitType::Warship => Gold::new(250),
        UnitType::AtomBomb => Gold::new(750),
        UnitType::HydrogenBomb => Gold::new(5000),
        UnitType::Mirv => Gold::new(35000),
        UnitType::TransportShip => Gold::new(150),
        UnitType::TradeShip => Gold::new(150),
    }
}

/// Terrain classification of a single map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Terrain {
    /// Dry land suitable for structures.
    #[default]
    Land,
    /// Open water suitable for naval units.
    Water,
}

const fn requires_water(unit_type: UnitType) -> bool {
    matches!(
        unit_type,
        UnitType::Port | UnitType::Warship | UnitType::TransportShip | UnitType::TradeShip
    )
}

const fn requires_silo(unit_type: UnitType) -> bool {
    matches!(
        unit_type,
        UnitType::AtomBomb | UnitType::HydrogenBomb | UnitType::Mirv
    )
}

#[derive(Clone, Debug)]
struct PlayerState {
    id: PlayerId,
    gold: Gold,
    alive: bool,
    units: Vec<UnitType>,
}

/// Reference game session implementing [`SessionView`].
///
/// Carries just enough rules to exercise the quick-build flow end to end:
/// terrain gates naval construction, ordnance requires an operational missile
/// silo, and affordability tracks the player's gold. The authoritative rule
/// engine of a full client replaces this wholesale.
#[derive(Clone, Debug)]
pub struct GameSession {
    columns: u32,
    rows: u32,
    terrain: Vec<Terrain>,
    disabled_units: Vec<UnitType>,
    spawn_phase: bool,
    player: Option<PlayerState>,
    next_player: u32,
}

impl GameSession {
    /// Creates a session with an all-land map of the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let cells = (columns as usize).saturating_mul(rows as usize);
        Self {
            columns,
            rows,
            terrain: vec![Terrain::Land; cells],
            disabled_units: Vec::new(),
            spawn_phase: true,
            player: None,
            next_player: 1,
        }
    }

    /// Marks the provided cell as water.
    pub fn set_water(&mut self, cell: Cell) {
        if let Some(index) = self.index(cell) {
            self.terrain[index] = Terrain::Water;
        }
    }

    /// Globally disables the provided unit type for this session.
    pub fn disable_unit(&mut self, unit_type: UnitType) {
        if !self.disabled_units.contains(&unit_type) {
            self.disabled_units.push(unit_type);
        }
    }

    /// Spawns the local player with the provided starting gold and ends the
    /// spawn phase.
    pub fn spawn_player(&mut self, gold: Gold) -> PlayerId {
        let id = PlayerId::new(self.next_player);
        self.next_player += 1;
        self.player = Some(PlayerState {
            id,
            gold,
            alive: true,
            units: Vec::new(),
        });
        self.spawn_phase = false;
        id
    }

    /// Marks the local player as eliminated.
    pub fn eliminate_player(&mut self) {
        if let Some(player) = &mut self.player {
            player.alive = false;
        }
    }

    /// Removes the local player entirely, as on disconnect.
    pub fn remove_player(&mut self) {
        self.player = None;
    }

    /// Grants additional gold to the local player.
    pub fn add_gold(&mut self, amount: Gold) {
        if let Some(player) = &mut self.player {
            player.gold = Gold::new(player.gold.get().saturating_add(amount.get()));
        }
    }

    /// Gold currently held by the local player.
    #[must_use]
    pub fn player_gold(&self) -> Option<Gold> {
        self.player.as_ref().map(|player| player.gold)
    }

    /// Enacts a validated build intent, charging its cost and recording the
    /// new unit.
    ///
    /// Returns `false` when the intent fails authoritative re-validation,
    /// which can happen when the session changed between dispatch and
    /// enactment.
    pub fn apply_build_intent(&mut self, unit_type: UnitType, cell: Cell) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        let buildable = self.buildable_at(unit_type, self.terrain[index]);
        let Some(player) = &mut self.player else {
            return false;
        };
        if !buildable {
            return false;
        }
        player.gold = Gold::new(player.gold.get() - unit_cost(unit_type).get());
        player.units.push(unit_type);
        true
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x() < self.columns && cell.y() < self.rows {
            Some(cell.y() as usize * self.columns as usize + cell.x() as usize)
        } else {
            None
        }
    }

    fn buildable_at(&self, unit_type: UnitType, terrain: Terrain) -> bool {
        let Some(player) = &self.player else {
            return false;
        };
        if !player.alive || self.disabled_units.contains(&unit_type) {
            return false;
        }
        if player.gold < unit_cost(unit_type) {
            return false;
        }
        let terrain_ok = if requires_water(unit_type) {
            terrain == Terrain::Water
        } else {
            terrain == Terrain::Land
        };
        if !terrain_ok {
            return false;
        }
        if requires_silo(unit_type) && !player.units.contains(&UnitType::MissileSilo) {
            return false;
        }
        true
    }

    fn snapshot_at(&self, terrain: Terrain) -> PlayerActions {
        let units = build_catalogue()
            .iter()
            .filter(|item| !self.disabled_units.contains(&item.unit_type))
            .map(|item| {
                BuildableUnit::new(
                    item.unit_type,
                    unit_cost(item.unit_type),
                    self.buildable_at(item.unit_type, terrain),
                )
            })
            .collect();
        PlayerActions::new(units)
    }
}

impl SessionView for GameSession {
    fn local_player(&self) -> Option<PlayerId> {
        self.player.as_ref().map(|player| player.id)
    }

    fn is_alive(&self, player: PlayerId) -> bool {
        self.player
            .as_ref()
            .is_some_and(|state| state.id == player && state.alive)
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

    fn actions_at(&self, player: PlayerId, tile: TileRef) -> ActionsQuery {
        if self.player.as_ref().map(|state| state.id) != Some(player) {
            return ActionsQuery::ready(Err(QueryError::PlayerMissing));
        }
        let terrain = usize::try_from(tile.get())
            .ok()
            .and_then(|index| self.terrain.get(index).copied())
            .unwrap_or_default();
        ActionsQuery::ready(Ok(self.snapshot_at(terrain)))
    }

    fn unit_count(&self, player: PlayerId, unit_type: UnitType) -> usize {
        self.player
            .as_ref()
            .filter(|state| state.id == player)
            .map_or(0, |state| {
                state
                    .units
                    .iter()
                    .filter(|unit| **unit == unit_type)
                    .count()
            })
    }

    fn is_unit_disabled(&self, unit_type: UnitType) -> bool {
        self.disabled_units.contains(&unit_type)
    }
}
