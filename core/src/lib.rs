#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the quick-build placement subsystem.
//!
//! This crate defines the message surface that connects the quick-build tray,
//! the placement dispatcher, and the surrounding game client. The tray
//! publishes [`Event::PlacementRequested`] values describing completed
//! pointer gestures, the dispatcher validates them against live game state,
//! and confirmed placements are broadcast as [`Event::BuildIntentIssued`]
//! values for the simulation layer to enact. All variants are plain data so
//! event batches can be pumped through a single-threaded frame loop.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

/// Types of units a player can construct through the build menus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Population centre that generates income.
    City,
    /// Defensive structure guarding nearby territory.
    DefensePost,
    /// Production structure that accelerates unit output.
    Factory,
    /// Harbour structure enabling naval construction and trade.
    Port,
    /// Launch site for missile-type ordnance.
    MissileSilo,
    /// Anti-missile battery.
    SamLauncher,
    /// Offensive naval vessel.
    Warship,
    /// Single-warhead atomic bomb.
    AtomBomb,
    /// High-yield hydrogen bomb.
    HydrogenBomb,
    /// Multiple independently targetable re-entry vehicle.
    Mirv,
    /// Naval vessel that ferries ground forces.
    TransportShip,
    /// Civilian vessel that generates trade income.
    TradeShip,
}

impl UnitType {
    /// Human-readable name used by adapters when no translation is available.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::City => "City",
            Self::DefensePost => "Defense Post",
            Self::Factory => "Factory",
            Self::Port => "Port",
            Self::MissileSilo => "Missile Silo",
            Self::SamLauncher => "SAM Launcher",
            Self::Warship => "Warship",
            Self::AtomBomb => "Atom Bomb",
            Self::HydrogenBomb => "Hydrogen Bomb",
            Self::Mirv => "MIRV",
            Self::TransportShip => "Transport Ship",
            Self::TradeShip => "Trade Ship",
        }
    }
}

/// Amount of gold expressed in whole coins.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Gold(u64);

impl Gold {
    /// Creates a new gold amount with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Gold amount representing zero coins.
    pub const ZERO: Self = Self(0);

    /// Retrieves the numeric amount of gold.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Gold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a single world grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    x: u32,
    y: u32,
}

impl Cell {
    /// Creates a new world cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Horizontal cell index within the map.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Vertical cell index within the map.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Position expressed in screen pixels.
///
/// Whether the value is viewport-relative or canvas-relative depends on the
/// carrying message; [`PlacementGesture`] documents both of its positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPosition {
    /// Horizontal pixel offset.
    pub x: f32,
    /// Vertical pixel offset.
    pub y: f32,
}

impl ScreenPosition {
    /// Creates a new screen position from pixel offsets.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Completed pointer gesture requesting a quick-build placement.
///
/// Created once per user action by the tray and consumed exactly once by the
/// dispatcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementGesture {
    /// Drop position relative to the game canvas, used for world translation.
    pub canvas: ScreenPosition,
    /// Raw pointer position relative to the viewport, used to anchor feedback.
    pub screen: ScreenPosition,
    /// Unit type the player asked to place.
    pub unit_type: UnitType,
}

impl PlacementGesture {
    /// Creates a new placement gesture descriptor.
    #[must_use]
    pub const fn new(canvas: ScreenPosition, screen: ScreenPosition, unit_type: UnitType) -> Self {
        Self {
            canvas,
            screen,
            unit_type,
        }
    }
}

/// Events exchanged between the tray, the dispatcher, and the simulation.
///
/// The dispatcher subscribes only to [`Event::PlacementRequested`] and may
/// only publish [`Event::BuildIntentIssued`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// The tray captured a completed placement gesture.
    PlacementRequested(PlacementGesture),
    /// The dispatcher confirmed a placement and proposes a build action.
    ///
    /// Final legality is still enforced by the authoritative rule engine;
    /// this event only carries the player's validated proposal.
    BuildIntentIssued {
        /// Unit type the player proposes to build.
        unit_type: UnitType,
        /// World cell resolved from the gesture's canvas position.
        cell: Cell,
    },
}

/// Outcome of a placement attempt surfaced to the player as feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementOutcome {
    /// The placement was accepted and a build intent was issued.
    Success,
    /// The placement was rejected by the buildability rules.
    Failure,
}

/// Immutable descriptor of one entry in the static build catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildItem {
    /// Unit type constructed by this entry.
    pub unit_type: UnitType,
    /// Icon asset reference displayed in menus.
    pub icon: &'static str,
    /// Translation key for the entry's display name.
    pub name_key: &'static str,
    /// Translation key for the entry's description.
    pub description_key: &'static str,
    /// Whether the number of owned units is displayed on the entry.
    pub countable: bool,
}

impl BuildItem {
    /// Creates a new build catalogue entry.
    #[must_use]
    pub const fn new(
        unit_type: UnitType,
        icon: &'static str,
        name_key: &'static str,
        description_key: &'static str,
        countable: bool,
    ) -> Self {
        Self {
            unit_type,
            icon,
            name_key,
            description_key,
            countable,
        }
    }
}

/// Static build catalogue shared by the build menus.
///
/// The quick-build tray filters this table down to
/// [`QUICK_BUILD_UNIT_TYPES`]; the full build menu shows every entry.
#[must_use]
pub const fn build_catalogue() -> &'static [BuildItem] {
    // A named const so the slice lives in static storage; a bare literal
    // here would be a temporary of the function body.
    const CATALOGUE: &[BuildItem] = &[
        BuildItem::new(
            UnitType::City,
            "icons/city",
            "unit_type.city",
            "unit_type.city.desc",
            true,
        ),
        BuildItem::new(
            UnitType::DefensePost,
            "icons/defense_post",
            "unit_type.defense_post",
            "unit_type.defense_post.desc",
            true,
        ),
        BuildItem::new(
            UnitType::Factory,
            "icons/factory",
            "unit_type.factory",
            "unit_type.factory.desc",
            true,
        ),
        BuildItem::new(
            UnitType::Port,
            "icons/port",
            "unit_type.port",
            "unit_type.port.desc",
            true,
        ),
        BuildItem::new(
            UnitType::MissileSilo,
            "icons/missile_silo",
            "unit_type.missile_silo",
            "unit_type.missile_silo.desc",
            true,
        ),
        BuildItem::new(
            UnitType::SamLauncher,
            "icons/sam_launcher",
            "unit_type.sam_launcher",
            "unit_type.sam_launcher.desc",
            true,
        ),
        BuildItem::new(
            UnitType::Warship,
            "icons/warship",
            "unit_type.warship",
            "unit_type.warship.desc",
            true,
        ),
        BuildItem::new(
            UnitType::AtomBomb,
            "icons/atom_bomb",
            "unit_type.atom_bomb",
            "unit_type.atom_bomb.desc",
            false,
        ),
        BuildItem::new(
            UnitType::HydrogenBomb,
            "icons/hydrogen_bomb",
            "unit_type.hydrogen_bomb",
            "unit_type.hydrogen_bomb.desc",
            false,
        ),
        BuildItem::new(
            UnitType::Mirv,
            "icons/mirv",
            "unit_type.mirv",
            "unit_type.mirv.desc",
            false,
        ),
        BuildItem::new(
            UnitType::TransportShip,
            "icons/transport_ship",
            "unit_type.transport_ship",
            "unit_type.transport_ship.desc",
            true,
        ),
        BuildItem::new(
            UnitType::TradeShip,
            "icons/trade_ship",
            "unit_type.trade_ship",
            "unit_type.trade_ship.desc",
            true,
        ),
    ];
    CATALOGUE
}

/// Resolves a catalogue translation key to its built-in English text.
///
/// Unknown keys fall back to the key itself so a missing entry stays
/// visible in the UI instead of vanishing.
#[must_use]
pub fn translate(key: &'static str) -> &'static str {
    match key {
        "unit_type.city" => "City",
        "unit_type.city.desc" => "Raises your maximum population",
        "unit_type.defense_post" => "Defense Post",
        "unit_type.defense_post.desc" => "Defends the surrounding territory",
        "unit_type.factory" => "Factory",
        "unit_type.factory.desc" => "Speeds up gold income",
        "unit_type.port" => "Port",
        "unit_type.port.desc" => "Opens sea trade routes",
        "unit_type.missile_silo" => "Missile Silo",
        "unit_type.missile_silo.desc" => "Launches atom and hydrogen bombs",
        "unit_type.sam_launcher" => "SAM Launcher",
        "unit_type.sam_launcher.desc" => "Intercepts incoming missiles",
        "unit_type.warship" => "Warship",
        "unit_type.warship.desc" => "Patrols the sea and sinks enemy ships",
        "unit_type.atom_bomb" => "Atom Bomb",
        "unit_type.atom_bomb.desc" => "Small nuclear strike",
        "unit_type.hydrogen_bomb" => "Hydrogen Bomb",
        "unit_type.hydrogen_bomb.desc" => "Large nuclear strike",
        "unit_type.mirv" => "MIRV",
        "unit_type.mirv.desc" => "Splits into many warheads over a wide area",
        "unit_type.transport_ship" => "Transport Ship",
        "unit_type.transport_ship.desc" => "Carries troops across water",
        "unit_type.trade_ship" => "Trade Ship",
        "unit_type.trade_ship.desc" => "Earns gold trading with friendly ports",
        "build_menu.not_enough_money" => "Not enough money",
        _ => key,
    }
}

/// Fixed allow-list of commonly used unit types shown in the quick-build tray.
pub const QUICK_BUILD_UNIT_TYPES: &[UnitType] = &[
    UnitType::City,
    UnitType::DefensePost,
    UnitType::Factory,
    UnitType::Port,
    UnitType::MissileSilo,
    UnitType::SamLauncher,
    UnitType::Warship,
    UnitType::AtomBomb,
    UnitType::HydrogenBomb,
    UnitType::Mirv,
];

/// Buildability record for a single unit type at a queried location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildableUnit {
    /// Unit type described by this record.
    pub unit_type: UnitType,
    /// Cost charged when constructing the unit.
    pub cost: Gold,
    /// Whether the player can currently build the unit at the queried tile.
    pub can_build: bool,
}

impl BuildableUnit {
    /// Creates a new buildability record.
    #[must_use]
    pub const fn new(unit_type: UnitType, cost: Gold, can_build: bool) -> Self {
        Self {
            unit_type,
            cost,
            can_build,
        }
    }
}

/// Snapshot of the actions available to a player at a queried tile.
///
/// Produced on demand by the game-state accessor. Treated as immutable once
/// fetched; callers replace the whole snapshot on refresh instead of
/// mutating it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerActions {
    buildable_units: Vec<BuildableUnit>,
}

impl PlayerActions {
    /// Creates a snapshot from the provided buildability records.
    #[must_use]
    pub fn new(buildable_units: Vec<BuildableUnit>) -> Self {
        Self { buildable_units }
    }

    /// All buildability records captured by the snapshot, in catalogue order.
    #[must_use]
    pub fn buildable_units(&self) -> &[BuildableUnit] {
        &self.buildable_units
    }

    /// Finds the buildability record matching the provided unit type.
    #[must_use]
    pub fn buildable(&self, unit_type: UnitType) -> Option<&BuildableUnit> {
        self.buildable_units
            .iter()
            .find(|unit| unit.unit_type == unit_type)
    }
}

/// Action tag carried by drag payloads that request a build placement.
pub const DROP_ACTION_BUILD: &str = "build";

/// Wire format of the payload attached to an OS-level drag gesture.
///
/// Matches the JSON document the tray serialises at drag-start, so drops that
/// originate outside the tray (or from a stale drag) can be recognised and
/// rejected without panicking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    /// Unit type the drag proposes to build.
    #[serde(rename = "unitType")]
    pub unit_type: UnitType,
    /// Requested action; only [`DROP_ACTION_BUILD`] is honoured.
    pub action: String,
}

impl DropPayload {
    /// Creates a build payload for the provided unit type.
    #[must_use]
    pub fn build(unit_type: UnitType) -> Self {
        Self {
            unit_type,
            action: DROP_ACTION_BUILD.to_owned(),
        }
    }

    /// Serialises the payload into its JSON wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a payload from its JSON wire form.
    ///
    /// Returns an error for malformed documents or non-build actions; callers
    /// are expected to log and skip, never to propagate.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let payload: Self = serde_json::from_str(raw).map_err(|source| PayloadError::Malformed {
            detail: source.to_string(),
        })?;
        if payload.action != DROP_ACTION_BUILD {
            return Err(PayloadError::UnsupportedAction {
                action: payload.action,
            });
        }
        Ok(payload)
    }
}

/// Reasons a drag payload may be rejected during parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload was not a valid JSON document of the expected shape.
    Malformed {
        /// Parser diagnostic describing the failure.
        detail: String,
    },
    /// The payload parsed but requested an action other than building.
    UnsupportedAction {
        /// Action tag carried by the payload.
        action: String,
    },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { detail } => write!(f, "malformed drag payload: {detail}"),
            Self::UnsupportedAction { action } => {
                write!(f, "drag payload requested unsupported action {action:?}")
            }
        }
    }
}

impl Error for PayloadError {}

/// Reasons an asynchronous buildability query may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryError {
    /// The responder was dropped before producing a result.
    Disconnected,
    /// The queried player no longer exists in the session.
    PlayerMissing,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "buildability query abandoned by responder"),
            Self::PlayerMissing => write!(f, "queried player left the session"),
        }
    }
}

impl Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::{
        build_catalogue, translate, BuildableUnit, Cell, DropPayload, Gold, PayloadError,
        PlayerActions, UnitType, QUICK_BUILD_UNIT_TYPES,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_round_trips_through_bincode() {
        assert_round_trip(&Cell::new(12, 34));
    }

    #[test]
    fn unit_type_round_trips_through_bincode() {
        assert_round_trip(&UnitType::MissileSilo);
    }

    #[test]
    fn catalogue_covers_every_quick_build_type() {
        for unit_type in QUICK_BUILD_UNIT_TYPES {
            assert!(
                build_catalogue()
                    .iter()
                    .any(|item| item.unit_type == *unit_type),
                "catalogue must describe quick-build type {unit_type:?}",
            );
        }
    }

    #[test]
    fn catalogue_is_one_static_table() {
        assert!(
            std::ptr::eq(build_catalogue(), build_catalogue()),
            "every call must hand out the same static slice",
        );
    }

    #[test]
    fn every_catalogue_key_has_a_translation() {
        for item in build_catalogue() {
            assert_ne!(
                translate(item.name_key),
                item.name_key,
                "missing name text for {:?}",
                item.unit_type,
            );
            assert_ne!(
                translate(item.description_key),
                item.description_key,
                "missing description text for {:?}",
                item.unit_type,
            );
        }
    }

    #[test]
    fn catalogue_contains_types_outside_the_allow_list() {
        let extras: Vec<_> = build_catalogue()
            .iter()
            .filter(|item| !QUICK_BUILD_UNIT_TYPES.contains(&item.unit_type))
            .collect();
        assert!(
            !extras.is_empty(),
            "the tray's allow-list must be a strict subset of the catalogue",
        );
    }

    #[test]
    fn buildable_lookup_matches_unit_type() {
        let actions = PlayerActions::new(vec![
            BuildableUnit::new(UnitType::City, Gold::new(125), true),
            BuildableUnit::new(UnitType::Port, Gold::new(250), false),
        ]);

        let port = actions.buildable(UnitType::Port).expect("port entry");
        assert_eq!(port.cost, Gold::new(250));
        assert!(!port.can_build);
        assert!(actions.buildable(UnitType::Mirv).is_none());
    }

    #[test]
    fn drop_payload_round_trips_through_json() {
        let payload = DropPayload::build(UnitType::Factory);
        let encoded = payload.encode();
        let decoded = DropPayload::parse(&encoded).expect("well-formed payload");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn drop_payload_rejects_malformed_documents_without_panicking() {
        let error = DropPayload::parse("{not json").expect_err("malformed payload must error");
        assert!(matches!(error, PayloadError::Malformed { .. }));
    }

    #[test]
    fn drop_payload_rejects_foreign_actions() {
        let error = DropPayload::parse(r#"{"unitType":"City","action":"inspect"}"#)
            .expect_err("non-build action must be rejected");
        assert_eq!(
            error,
            PayloadError::UnsupportedAction {
                action: "inspect".to_owned(),
            },
        );
    }
}
