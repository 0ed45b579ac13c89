use contracts::VisualDescriptor;
use serde::Serialize;

use super::*;
use crate::render::VisualRuleSet;

/// A node together with the entities on it and their visual projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub node: EntitySnapshot,
    pub entities: Vec<EntitySnapshot>,
    pub visuals: Vec<VisualDescriptor>,
}

impl World {
    /// Snapshots of the entities on a node, in placement order.
    pub fn entities_at(&self, position: Position) -> Result<Vec<EntitySnapshot>, WorldError> {
        let node = self
            .grid
            .node(position)
            .ok_or(WorldError::OutOfBounds(position))?;
        Ok(node
            .entities()
            .iter()
            .filter_map(|id| self.entities.snapshot(*id))
            .collect())
    }

    pub fn node_visuals(
        &self,
        position: Position,
        rules: &VisualRuleSet,
    ) -> Result<Vec<VisualDescriptor>, WorldError> {
        Ok(rules.project(&self.entities_at(position)?))
    }

    pub fn inspect_node(
        &self,
        position: Position,
        rules: &VisualRuleSet,
    ) -> Result<NodeView, WorldError> {
        let node = self
            .grid
            .node(position)
            .ok_or(WorldError::OutOfBounds(position))?
            .snapshot();
        let entities = self.entities_at(position)?;
        let visuals = rules.project(&entities);
        Ok(NodeView {
            node,
            entities,
            visuals,
        })
    }
}
