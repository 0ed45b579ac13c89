//! Spatial graph: a fixed 2D grid of nodes, each owning the entities placed on
//! it and aggregated blocking flags.

use contracts::{attr, AttributeValue, EntityId, EntitySnapshot, Location, Position, NODE_KIND};

use crate::entity::EntityArena;
use crate::error::WorldError;
use crate::spatial::PassabilityMatrix;

/// Cardinal offsets first, then diagonals. Resolvers expand neighbours in this
/// order, which fixes tie-breaking between equal-cost candidates.
const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

pub(crate) fn neighbor_offsets(allow_diagonal: bool) -> impl Iterator<Item = (i32, i32)> {
    let diagonals: &[(i32, i32)] = if allow_diagonal {
        &DIAGONAL_OFFSETS
    } else {
        &[]
    };
    CARDINAL_OFFSETS.iter().chain(diagonals.iter()).copied()
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: EntityId,
    position: Position,
    entities: Vec<EntityId>,
    blocks_movement: bool,
    blocks_light: bool,
}

impl Node {
    fn new(id: EntityId, position: Position) -> Self {
        Self {
            id,
            position,
            entities: Vec::new(),
            blocks_movement: false,
            blocks_light: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Entities on this node, in placement order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn blocks_movement(&self) -> bool {
        self.blocks_movement
    }

    pub fn blocks_light(&self) -> bool {
        self.blocks_light
    }

    /// Adds an entity and recomputes the aggregates. Refuses entities that are
    /// stored in a container.
    pub(crate) fn add_entity(
        &mut self,
        entity_id: EntityId,
        arena: &EntityArena,
    ) -> Result<(), WorldError> {
        let entity = arena
            .get(entity_id)
            .ok_or(WorldError::UnknownEntity(entity_id))?;
        if let Location::StoredIn { container } = entity.location() {
            return Err(WorldError::StoredEntityOnNode {
                entity: entity_id,
                container,
            });
        }
        if !self.entities.contains(&entity_id) {
            self.entities.push(entity_id);
        }
        self.refresh(arena);
        Ok(())
    }

    /// Removes an entity and recomputes the aggregates. Returns whether the
    /// entity was present.
    pub(crate) fn remove_entity(
        &mut self,
        entity_id: EntityId,
        arena: &EntityArena,
    ) -> Result<bool, WorldError> {
        let entity = arena
            .get(entity_id)
            .ok_or(WorldError::UnknownEntity(entity_id))?;
        if let Location::StoredIn { container } = entity.location() {
            return Err(WorldError::StoredEntityOnNode {
                entity: entity_id,
                container,
            });
        }
        let before = self.entities.len();
        self.entities.retain(|id| *id != entity_id);
        let removed = before != self.entities.len();
        self.refresh(arena);
        Ok(removed)
    }

    /// Recomputes both aggregates from current membership. Called after every
    /// membership change and after a member's blocking flags are written.
    pub(crate) fn refresh(&mut self, arena: &EntityArena) {
        let mut blocks_movement = false;
        let mut blocks_light = false;
        for entity in self.entities.iter().filter_map(|id| arena.get(*id)) {
            if entity.location().container().is_some() {
                continue;
            }
            blocks_movement |= entity.blocks_movement();
            blocks_light |= entity.blocks_light();
        }
        self.blocks_movement = blocks_movement;
        self.blocks_light = blocks_light;
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            name: format!("node{}", self.position),
            kind: NODE_KIND.to_string(),
            attributes: [
                (
                    attr::BLOCKS_MOVEMENT.to_string(),
                    AttributeValue::Bool(self.blocks_movement),
                ),
                (
                    attr::BLOCKS_LIGHT.to_string(),
                    AttributeValue::Bool(self.blocks_light),
                ),
                (
                    attr::ENTITIES.to_string(),
                    AttributeValue::Entities(self.entities.clone()),
                ),
            ]
            .into_iter()
            .collect(),
            location: Location::Node {
                position: self.position,
            },
            position: Some(self.position),
            inventory: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Eagerly allocated `width * height` nodes, row-major. Node ids equal their
/// row-major index.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut nodes = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let id = EntityId(nodes.len() as u64);
                nodes.push(Node::new(id, Position::new(x, y)));
            }
        }
        Self {
            width,
            height,
            nodes,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    pub fn node(&self, position: Position) -> Option<&Node> {
        self.index(position).map(|idx| &self.nodes[idx])
    }

    pub(crate) fn node_mut(&mut self, position: Position) -> Result<&mut Node, WorldError> {
        match self.index(position) {
            Some(idx) => Ok(&mut self.nodes[idx]),
            None => Err(WorldError::OutOfBounds(position)),
        }
    }

    pub fn node_by_id(&self, id: EntityId) -> Option<&Node> {
        usize::try_from(id.0).ok().and_then(|idx| self.nodes.get(idx))
    }

    pub fn is_node_id(&self, id: EntityId) -> bool {
        id.0 < self.node_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// In-bounds neighbours: up to 4 cardinal, plus up to 4 diagonal when
    /// `allow_diagonal`.
    pub fn neighbors(&self, position: Position, allow_diagonal: bool) -> Vec<&Node> {
        neighbor_offsets(allow_diagonal)
            .filter_map(|(dx, dy)| self.node(position.offset(dx, dy)))
            .collect()
    }

    /// Walkability matrix derived from the live blocking flags.
    pub fn walkable_matrix(&self) -> PassabilityMatrix {
        PassabilityMatrix::new(
            self.width,
            self.height,
            self.nodes.iter().map(|node| !node.blocks_movement).collect(),
        )
    }

    /// Light-passability matrix derived from the live blocking flags.
    pub fn visibility_matrix(&self) -> PassabilityMatrix {
        PassabilityMatrix::new(
            self.width,
            self.height,
            self.nodes.iter().map(|node| !node.blocks_light).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::entity::Entity;

    fn wall(id: u64, position: Position) -> Entity {
        let mut entity = Entity::new(
            EntityId(id),
            "wall",
            "wall",
            BTreeMap::from([
                (attr::BLOCKS_MOVEMENT.to_string(), AttributeValue::Bool(true)),
                (attr::BLOCKS_LIGHT.to_string(), AttributeValue::Bool(true)),
            ]),
        );
        entity.set_location(Location::Node { position });
        entity
    }

    #[test]
    fn node_ids_are_row_major() {
        let grid = Grid::new(3, 2);
        assert_eq!(grid.node_count(), 6);
        let node = grid.node(Position::new(2, 1)).expect("in bounds");
        assert_eq!(node.id(), EntityId(5));
        assert_eq!(grid.node_by_id(EntityId(5)).map(Node::position), Some(Position::new(2, 1)));
        assert!(grid.node(Position::new(3, 0)).is_none());
        assert!(grid.node(Position::new(-1, 0)).is_none());
    }

    #[test]
    fn neighbors_clip_to_bounds() {
        let grid = Grid::new(3, 3);
        assert_eq!(grid.neighbors(Position::new(0, 0), true).len(), 3);
        assert_eq!(grid.neighbors(Position::new(0, 0), false).len(), 2);
        assert_eq!(grid.neighbors(Position::new(1, 1), true).len(), 8);
        assert_eq!(grid.neighbors(Position::new(1, 1), false).len(), 4);
    }

    #[test]
    fn aggregates_follow_membership() {
        let mut grid = Grid::new(2, 2);
        let mut arena = EntityArena::new();
        let at = Position::new(1, 1);
        arena.insert(wall(10, at));

        let node = grid.node_mut(at).expect("node");
        node.add_entity(EntityId(10), &arena).expect("add");
        assert!(node.blocks_movement());
        assert!(node.blocks_light());

        assert!(node.remove_entity(EntityId(10), &arena).expect("remove"));
        assert!(!node.blocks_movement());
        assert!(!node.blocks_light());
        assert!(!node.remove_entity(EntityId(10), &arena).expect("second remove"));
    }

    #[test]
    fn stored_entities_cannot_join_a_node() {
        let mut grid = Grid::new(2, 2);
        let mut arena = EntityArena::new();
        let mut key = Entity::new(EntityId(11), "key", "key", BTreeMap::new());
        key.set_location(Location::StoredIn {
            container: EntityId(12),
        });
        arena.insert(key);

        let node = grid.node_mut(Position::new(0, 0)).expect("node");
        let err = node.add_entity(EntityId(11), &arena).unwrap_err();
        assert_eq!(
            err,
            WorldError::StoredEntityOnNode {
                entity: EntityId(11),
                container: EntityId(12),
            }
        );
        assert!(node.entities().is_empty());
        assert!(node.remove_entity(EntityId(11), &arena).is_err());
    }

    #[test]
    fn matrices_mirror_node_flags() {
        let mut grid = Grid::new(3, 1);
        let mut arena = EntityArena::new();
        let mut glass = wall(20, Position::new(1, 0));
        glass
            .set_attribute(attr::BLOCKS_LIGHT, AttributeValue::Bool(false))
            .expect("plain attribute");
        arena.insert(glass);
        grid.node_mut(Position::new(1, 0))
            .expect("node")
            .add_entity(EntityId(20), &arena)
            .expect("add");

        let walkable = grid.walkable_matrix();
        let visible = grid.visibility_matrix();
        assert!(!walkable.is_open(Position::new(1, 0)));
        assert!(visible.is_open(Position::new(1, 0)));
        assert!(walkable.is_open(Position::new(0, 0)));
    }
}
