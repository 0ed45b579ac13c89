//! Scenario documents: a world config, an ordered list of spawns, and a list of
//! named steps that become one action batch.

use std::collections::BTreeMap;

use contracts::{
    attr, ActionRequest, ActionResult, ActionsPayload, AttributeValue, EntityId, Position,
    WorldConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::actions;
use crate::error::WorldError;
use crate::kinds;
use crate::world::World;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub config: WorldConfig,
    #[serde(default)]
    pub entities: Vec<EntitySpawn>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpawn {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub position: Option<Position>,
    /// Name of an earlier spawn to store this entity in.
    #[serde(default)]
    pub stored_in: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl EntitySpawn {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            position: None,
            stored_in: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn inside(mut self, container: impl Into<String>) -> Self {
        self.stored_in = Some(container.into());
        self
    }

    pub fn with(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepTarget {
    Entity(String),
    Node(Position),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub source: String,
    pub target: StepTarget,
    pub action: String,
}

impl ScenarioStep {
    pub fn on_entity(source: &str, action: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: StepTarget::Entity(target.to_string()),
            action: action.to_string(),
        }
    }

    pub fn on_node(source: &str, action: &str, x: i32, y: i32) -> Self {
        Self {
            source: source.to_string(),
            target: StepTarget::Node(Position::new(x, y)),
            action: action.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entity name `{0}` is used more than once")]
    DuplicateName(String),

    #[error("entity `{0}` sets both a position and a container")]
    ConflictingLocation(String),

    #[error("entity `{entity}` is stored in `{container}`, which is not an earlier spawn")]
    UnknownContainer { entity: String, container: String },

    #[error("step {index} names unknown entity `{name}`")]
    UnknownReference { index: usize, name: String },

    #[error(transparent)]
    World(#[from] WorldError),
}

/// A built world plus the name table and the batch the steps compile to.
#[derive(Debug)]
pub struct LoadedScenario {
    pub world: World,
    pub names: BTreeMap<String, EntityId>,
    pub payload: ActionsPayload,
}

#[derive(Debug)]
pub struct ScenarioRun {
    pub world: World,
    pub names: BTreeMap<String, EntityId>,
    pub results: Vec<ActionResult>,
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(&self) -> Result<LoadedScenario, ScenarioError> {
        let mut world = World::new(self.config.clone())?;
        let mut names: BTreeMap<String, EntityId> = BTreeMap::new();

        for spawn in &self.entities {
            if names.contains_key(&spawn.name) {
                return Err(ScenarioError::DuplicateName(spawn.name.clone()));
            }
            if spawn.position.is_some() && spawn.stored_in.is_some() {
                return Err(ScenarioError::ConflictingLocation(spawn.name.clone()));
            }
            let id = world.spawn(spawn.name.clone(), &spawn.kind, spawn.attributes.clone())?;
            if let Some(position) = spawn.position {
                world.place(id, position)?;
            }
            if let Some(container) = &spawn.stored_in {
                let holder = names.get(container).copied().ok_or_else(|| {
                    ScenarioError::UnknownContainer {
                        entity: spawn.name.clone(),
                        container: container.clone(),
                    }
                })?;
                world.store(id, holder)?;
            }
            names.insert(spawn.name.clone(), id);
        }

        let mut actions = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let resolve = |name: &str| {
                names
                    .get(name)
                    .copied()
                    .ok_or_else(|| ScenarioError::UnknownReference {
                        index,
                        name: name.to_string(),
                    })
            };
            let source = resolve(&step.source)?;
            let target = match &step.target {
                StepTarget::Entity(name) => resolve(name)?,
                StepTarget::Node(position) => world
                    .grid()
                    .node(*position)
                    .map(|node| node.id())
                    .ok_or(WorldError::OutOfBounds(*position))?,
            };
            actions.push(ActionRequest::new(source, target, step.action.clone()));
        }

        info!(
            entities = names.len(),
            steps = actions.len(),
            "scenario loaded"
        );
        Ok(LoadedScenario {
            world,
            names,
            payload: ActionsPayload::from(actions),
        })
    }

    /// Loads the scenario and applies its steps as one batch.
    pub fn run(&self) -> Result<ScenarioRun, ScenarioError> {
        let LoadedScenario {
            mut world,
            names,
            payload,
        } = self.load()?;
        let results = world.apply_actions_payload(&payload);
        Ok(ScenarioRun {
            world,
            names,
            results,
        })
    }
}

/// 5x5 room with a locked door at (2, 2). The hero at (1, 2) carries the
/// matching key, unlocks and opens the door, then walks through.
pub fn door_demo() -> ScenarioSpec {
    ScenarioSpec {
        config: WorldConfig::with_extent(5, 5),
        entities: vec![
            EntitySpawn::new("hero", kinds::CHARACTER).at(1, 2),
            EntitySpawn::new("brass key", kinds::KEY)
                .inside("hero")
                .with(attr::KEY_NAME, "brass"),
            EntitySpawn::new("cellar door", kinds::DOOR)
                .at(2, 2)
                .with(attr::IS_LOCKED, true)
                .with(attr::KEY_NAME, "brass"),
            EntitySpawn::new("north wall", kinds::WALL).at(2, 1),
            EntitySpawn::new("south wall", kinds::WALL).at(2, 3),
        ],
        steps: vec![
            ScenarioStep::on_entity("hero", actions::UNLOCK, "cellar door"),
            ScenarioStep::on_entity("hero", actions::OPEN, "cellar door"),
            ScenarioStep::on_node("hero", actions::MOVE, 2, 2),
            ScenarioStep::on_node("hero", actions::MOVE, 3, 2),
        ],
    }
}
