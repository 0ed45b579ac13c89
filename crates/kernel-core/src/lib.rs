//! Deterministic turn-based grid simulation core.
//!
//! Entities carry typed attributes and live on grid nodes or inside other
//! entities' inventories. Legal state changes are declarative actions
//! (prerequisites plus consequences) applied in batches by [`World`].
//! Spatial queries return invariant-checked shape values built from live node
//! state.

pub mod actions;
pub mod entity;
pub mod error;
pub mod grid;
pub mod kinds;
pub mod render;
pub mod rules;
pub mod scenario;
pub mod shapes;
pub mod spatial;
pub mod visibility;
pub mod world;

pub use actions::ActionCatalog;
pub use entity::{Entity, EntityArena};
pub use error::WorldError;
pub use grid::{Grid, Node};
pub use render::{VisualRule, VisualRuleSet};
pub use rules::{
    Action, ActionError, Consequences, EntityLookup, Predicate, Prerequisites, RuleError,
    Statement,
};
pub use scenario::{door_demo, EntitySpawn, ScenarioError, ScenarioSpec, ScenarioStep, StepTarget};
pub use shapes::{BlockedRaycast, Path, Radius, RayCast, Rectangle, ShapeError, Shadow, Sightline};
pub use world::{NodeView, Reachable, World};
