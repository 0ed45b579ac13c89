//! In-process engine facade over one grid world, plus the HTTP server that
//! exposes it.

mod server;

use std::collections::BTreeMap;

use contracts::{
    ActionResult, ActionsPayload, EntityId, EntitySnapshot, Position, SummarizedActionOutcome,
    SummarizedActionPayload, WorldConfig, WorldEvent, WorldStatus,
};
use kernel_core::{
    door_demo, NodeView, Path, Radius, Reachable, Rectangle, ScenarioError, ScenarioSpec, Shadow,
    Sightline, VisualRuleSet, World, WorldError,
};
use serde::Serialize;
use tracing::info;

pub use server::{serve, ServerError};

/// Outcome of loading a scenario: the name table and the results of its
/// steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub status: WorldStatus,
    pub names: BTreeMap<String, EntityId>,
    pub results: Vec<ActionResult>,
}

#[derive(Debug)]
pub struct EngineApi {
    world: World,
    visuals: VisualRuleSet,
}

impl EngineApi {
    pub fn from_config(config: WorldConfig) -> Result<Self, WorldError> {
        Ok(Self {
            world: World::new(config)?,
            visuals: VisualRuleSet::standard(),
        })
    }

    /// Builds the scenario's world and applies its steps as the first turn.
    pub fn from_scenario(spec: &ScenarioSpec) -> Result<(Self, ScenarioReport), ScenarioError> {
        let run = spec.run()?;
        let applied = run.results.iter().filter(|result| result.success).count();
        info!(
            entities = run.names.len(),
            steps = run.results.len(),
            applied,
            "scenario started"
        );
        let report = ScenarioReport {
            status: run.world.status(),
            names: run.names,
            results: run.results,
        };
        let engine = Self {
            world: run.world,
            visuals: VisualRuleSet::standard(),
        };
        Ok((engine, report))
    }

    /// The locked-door demo with its steps already applied.
    pub fn demo() -> Result<(Self, ScenarioReport), ScenarioError> {
        Self::from_scenario(&door_demo())
    }

    pub fn with_visuals(mut self, visuals: VisualRuleSet) -> Self {
        self.visuals = visuals;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn status(&self) -> WorldStatus {
        self.world.status()
    }

    pub fn apply_actions(&mut self, payload: &ActionsPayload) -> Vec<ActionResult> {
        self.world.apply_actions_payload(payload)
    }

    pub fn apply_summarized(
        &mut self,
        payloads: &[SummarizedActionPayload],
    ) -> Vec<SummarizedActionOutcome> {
        self.world.apply_summarized_payload(payloads)
    }

    pub fn entity(&self, id: EntityId) -> Result<EntitySnapshot, WorldError> {
        self.world
            .get_instance(id)
            .ok_or(WorldError::UnknownEntity(id))
    }

    /// Snapshots of every instance of `kind`, or of every entity when no kind
    /// is given. Nodes are only listed when asked for by kind.
    pub fn entities(&self, kind: Option<&str>) -> Result<Vec<EntitySnapshot>, WorldError> {
        match kind {
            Some(kind) if !self.world.is_entity_type(kind) => {
                Err(WorldError::UnknownEntityType(kind.to_string()))
            }
            Some(kind) => Ok(self.world.all_by_type(kind)),
            None => Ok(self
                .world
                .entities()
                .iter()
                .filter_map(|entity| self.world.get_instance(entity.id()))
                .collect()),
        }
    }

    pub fn node(&self, position: Position) -> Result<NodeView, WorldError> {
        self.world.inspect_node(position, &self.visuals)
    }

    pub fn events(&self) -> &[WorldEvent] {
        self.world.events()
    }

    pub fn path(&self, start: Position, goal: Position) -> Result<Option<Path>, WorldError> {
        self.world.get_path(start, goal)
    }

    pub fn path_distance(
        &self,
        start: Position,
        max_distance: u32,
    ) -> Result<Vec<Reachable>, WorldError> {
        self.world.get_path_distance(start, max_distance)
    }

    pub fn radius(&self, source: Position, max_radius: u32) -> Result<Radius, WorldError> {
        self.world.get_radius(source, max_radius)
    }

    pub fn shadow(&self, source: Position, max_radius: u32) -> Result<Shadow, WorldError> {
        self.world.get_shadow(source, max_radius)
    }

    pub fn raycast(&self, source: Position, target: Position) -> Result<Sightline, WorldError> {
        self.world.get_raycast(source, target)
    }

    pub fn rectangle(
        &self,
        top_left: Position,
        bottom_right: Position,
    ) -> Result<Rectangle, WorldError> {
        self.world.get_rectangle(top_left, bottom_right)
    }
}
