//! v1 cross-boundary contracts for the grid kernel, API facade, and CLI.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

mod payload;

pub use payload::{
    ActionRequest, ActionResult, ActionState, ActionsPayload, CandidateSummary, ConversionError,
    EntitySelector, SelectorRole, SummarizedActionOutcome, SummarizedActionPayload,
    VisualDescriptor, WorldEvent, WorldEventOutcome,
};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Attribute names with engine-defined meaning.
///
/// `id`, `name`, `kind`, `node`, `stored_in`, `inventory` and `position` are
/// derived from the entity's identity and location rather than stored in its
/// attribute map. `node`, `stored_in` and `inventory` are relational: writing
/// them re-points a relationship instead of storing a literal.
pub mod attr {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const KIND: &str = "kind";
    pub const NODE: &str = "node";
    pub const STORED_IN: &str = "stored_in";
    pub const INVENTORY: &str = "inventory";
    pub const POSITION: &str = "position";
    pub const ENTITIES: &str = "entities";

    pub const BLOCKS_MOVEMENT: &str = "blocks_movement";
    pub const BLOCKS_LIGHT: &str = "blocks_light";
    pub const CAN_ACT: &str = "can_act";
    pub const IS_PICKUPABLE: &str = "is_pickupable";
    pub const IS_LOCKED: &str = "is_locked";
    pub const OPEN: &str = "open";
    pub const KEY_NAME: &str = "key_name";

    pub const RELATIONAL: [&str; 3] = [NODE, STORED_IN, INVENTORY];
    pub const DERIVED: [&str; 5] = [ID, NAME, KIND, POSITION, ENTITIES];

    pub fn is_relational(name: &str) -> bool {
        RELATIONAL.contains(&name)
    }

    pub fn is_derived(name: &str) -> bool {
        DERIVED.contains(&name)
    }
}

/// Identifier shared by entities and nodes. Serialized as a decimal string so
/// JavaScript consumers never lose precision; accepts a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdInput {
            String(String),
            Number(u64),
        }

        match IdInput::deserialize(deserializer)? {
            IdInput::String(raw) => raw
                .trim_start_matches('#')
                .parse::<u64>()
                .map(EntityId)
                .map_err(D::Error::custom),
            IdInput::Number(value) => Ok(EntityId(value)),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A grid coordinate. `x` grows to the right, `y` grows downward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// True when `other` is one king-move away (or the same cell when
    /// `include_self`).
    pub fn touches(self, other: Position, allow_diagonal: bool, include_self: bool) -> bool {
        let step = if allow_diagonal {
            self.chebyshev(other)
        } else {
            self.manhattan(other)
        };
        step == 1 || (include_self && step == 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Closed set of attribute value kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Position(Position),
    /// Relational: the node an entity occupies, by position.
    Node(Option<Position>),
    /// Relational: a reference to another entity.
    Entity(Option<EntityId>),
    /// Relational: an ordered list of entity references.
    Entities(Vec<EntityId>),
}

impl AttributeValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::Position(_) => "position",
            Self::Node(_) => "node",
            Self::Entity(_) => "entity",
            Self::Entities(_) => "entities",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Spatial reading of the value: a literal position or an occupied node.
    pub fn as_position(&self) -> Option<Position> {
        match self {
            Self::Position(position) => Some(*position),
            Self::Node(position) => *position,
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => *id,
            _ => None,
        }
    }

    pub fn as_entities(&self) -> Option<&[EntityId]> {
        match self {
            Self::Entities(ids) => Some(ids.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Position> for AttributeValue {
    fn from(value: Position) -> Self {
        Self::Position(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Position(position) => write!(f, "{position}"),
            Self::Node(Some(position)) => write!(f, "node{position}"),
            Self::Entity(Some(id)) => write!(f, "{id}"),
            Self::Node(None) | Self::Entity(None) => write!(f, "none"),
            Self::Entities(ids) => {
                write!(f, "[")?;
                for (idx, id) in ids.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Where an entity lives. Node placement and container storage are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    #[default]
    Nowhere,
    Node {
        position: Position,
    },
    StoredIn {
        container: EntityId,
    },
}

impl Location {
    pub fn node(&self) -> Option<Position> {
        match self {
            Self::Node { position } => Some(*position),
            _ => None,
        }
    }

    pub fn container(&self) -> Option<EntityId> {
        match self {
            Self::StoredIn { container } => Some(*container),
            _ => None,
        }
    }
}

/// Read-only copy of an entity (or node) taken at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub location: Location,
    /// Derived position: the node's position, or the container's position
    /// (recursively). `None` when the entity is nowhere.
    pub position: Option<Position>,
    #[serde(default)]
    pub inventory: Vec<EntityId>,
}

impl EntitySnapshot {
    /// Reads an attribute by name, resolving the derived and relational names.
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            attr::ID => Some(AttributeValue::Entity(Some(self.id))),
            attr::NAME => Some(AttributeValue::Text(self.name.clone())),
            attr::KIND => Some(AttributeValue::Text(self.kind.clone())),
            attr::NODE => Some(AttributeValue::Node(self.location.node())),
            attr::STORED_IN => Some(AttributeValue::Entity(self.location.container())),
            attr::INVENTORY => Some(AttributeValue::Entities(self.inventory.clone())),
            attr::POSITION => self.position.map(AttributeValue::Position),
            _ => self.attributes.get(name).cloned(),
        }
    }

    /// Boolean attribute, `false` when absent or not a bool.
    pub fn flag(&self, name: &str) -> bool {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false)
    }

    pub fn is_node(&self) -> bool {
        self.kind == NODE_KIND
    }
}

pub const NODE_KIND: &str = "node";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathHeuristic {
    /// Sum of axis distances. Not admissible when diagonal steps cost 1.
    Manhattan,
    /// Largest axis distance. Admissible under 8-connectivity.
    #[default]
    Chebyshev,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_extent")]
    pub width: u32,
    #[serde(default = "default_extent")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub allow_diagonal: bool,
    #[serde(default)]
    pub path_heuristic: PathHeuristic,
    #[serde(default = "default_shadow_samples")]
    pub shadow_samples: u32,
}

impl WorldConfig {
    pub fn with_extent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn node_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "grid extent must be at least 1x1, got {}x{}",
                self.width, self.height
            ));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err("grid extent exceeds the coordinate range".to_string());
        }
        if self.shadow_samples == 0 {
            return Err("shadow_samples must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            width: default_extent(),
            height: default_extent(),
            allow_diagonal: true,
            path_heuristic: PathHeuristic::default(),
            shadow_samples: default_shadow_samples(),
        }
    }
}

fn default_schema_version() -> String {
    SCHEMA_VERSION_V1.to_string()
}

fn default_extent() -> u32 {
    16
}

fn default_true() -> bool {
    true
}

fn default_shadow_samples() -> u32 {
    360
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldStatus {
    pub schema_version: String,
    pub turn: u64,
    pub width: u32,
    pub height: u32,
    pub entity_count: usize,
    pub event_count: usize,
}

impl fmt::Display for WorldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "turn={} extent={}x{} entities={} events={}",
            self.turn, self.width, self.height, self.entity_count, self.event_count
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    EntityNotFound,
    OutOfBounds,
    InvalidScenario,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub schema_version: String,
    pub query_type: String,
    pub generated_at_turn: u64,
    pub data: Value,
}
