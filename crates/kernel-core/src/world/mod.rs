use std::collections::BTreeSet;

mod commands;
mod commit;
mod events;
mod inspect;
mod registry;
mod spatial;
mod translate;

use contracts::{
    ActionRequest, ActionResult, ActionState, ActionsPayload, CandidateSummary, ConversionError,
    EntityId, EntitySelector, EntitySnapshot, Location, Position, SelectorRole,
    SummarizedActionOutcome, SummarizedActionPayload, WorldConfig, WorldEvent, WorldEventOutcome,
    WorldStatus, NODE_KIND, SCHEMA_VERSION_V1,
};
use tracing::{debug, info, warn};

use crate::actions::ActionCatalog;
use crate::entity::EntityArena;
use crate::error::WorldError;
use crate::grid::Grid;
use crate::kinds;
use crate::rules::{Action, EntityLookup};

pub use inspect::NodeView;
pub use spatial::Reachable;

/// One simulation: the grid, every entity ever created, the known action and
/// entity-type names, the turn clock and the event log.
///
/// Nodes and entities share one identifier space. Node ids are the row-major
/// cell indices; entity ids follow.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: Grid,
    entities: EntityArena,
    catalog: ActionCatalog,
    entity_types: BTreeSet<String>,
    next_entity_id: u64,
    turn: u64,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Builds an empty grid with the standard actions and kinds registered.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate().map_err(WorldError::InvalidConfig)?;
        let grid = Grid::new(config.width, config.height);
        let next_entity_id = grid.node_count();
        let entity_types = std::iter::once(NODE_KIND)
            .chain(kinds::STANDARD_KINDS)
            .map(str::to_string)
            .collect();
        info!(
            width = config.width,
            height = config.height,
            allow_diagonal = config.allow_diagonal,
            "world created"
        );
        Ok(Self {
            config,
            grid,
            entities: EntityArena::new(),
            catalog: ActionCatalog::standard(),
            entity_types,
            next_entity_id,
            turn: 0,
            event_log: Vec::new(),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn entities(&self) -> &EntityArena {
        &self.entities
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn register_action(&mut self, action: Action) -> Result<(), WorldError> {
        self.catalog.register(action)
    }

    /// Registers an entity type name. Returns false when it was already known.
    pub fn register_entity_type(&mut self, kind: impl Into<String>) -> bool {
        self.entity_types.insert(kind.into())
    }

    pub fn is_entity_type(&self, kind: &str) -> bool {
        self.entity_types.contains(kind)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entity_types.iter().map(String::as_str)
    }

    pub fn status(&self) -> WorldStatus {
        WorldStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: self.turn,
            width: self.grid.width(),
            height: self.grid.height(),
            entity_count: self.entities.len(),
            event_count: self.event_log.len(),
        }
    }

    /// Snapshot of the entity or node with this id.
    pub fn snapshot(&self, id: EntityId) -> Option<EntitySnapshot> {
        if self.grid.is_node_id(id) {
            return self.grid.node_by_id(id).map(|node| node.snapshot());
        }
        self.entities.snapshot(id)
    }
}

impl EntityLookup for World {
    fn lookup(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.snapshot(id)
    }
}
