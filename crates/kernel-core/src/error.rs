use contracts::{EntityId, Position};
use thiserror::Error;

use crate::shapes::ShapeError;

/// Errors raised by registry, grid, and relocation operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("{0} is a node, not an entity")]
    NotAnEntity(EntityId),

    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    #[error("entity {entity} is stored in {container} and cannot be placed on a node")]
    StoredEntityOnNode {
        entity: EntityId,
        container: EntityId,
    },

    #[error("storing {entity} in {container} would create a containment cycle")]
    ContainmentCycle {
        entity: EntityId,
        container: EntityId,
    },

    #[error("attribute `{0}` is derived and cannot be written")]
    ReservedAttribute(String),

    #[error("attribute `{attribute}` expects a {expected} value")]
    InvalidRelationalValue {
        attribute: String,
        expected: &'static str,
    },

    #[error("node {0} cannot be modified through an action")]
    NodeNotWritable(EntityId),

    #[error("action `{0}` is already registered")]
    DuplicateAction(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),

    #[error("invalid world config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}
