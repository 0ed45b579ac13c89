//! Entity arena: named, typed entities with an attribute map and a single
//! location.
//!
//! Entities never hold references to nodes or containers, only identifiers.
//! The arena is the only owner; nodes refer back into it by [`EntityId`].

use std::collections::BTreeMap;

use contracts::{attr, AttributeValue, EntityId, EntitySnapshot, Location, Position};

use crate::error::WorldError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    name: String,
    kind: String,
    attributes: BTreeMap<String, AttributeValue>,
    location: Location,
    inventory: Vec<EntityId>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: impl Into<String>,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            attributes,
            location: Location::Nowhere,
            inventory: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn inventory(&self) -> &[EntityId] {
        &self.inventory
    }

    pub fn blocks_movement(&self) -> bool {
        self.flag(attr::BLOCKS_MOVEMENT)
    }

    pub fn blocks_light(&self) -> bool {
        self.flag(attr::BLOCKS_LIGHT)
    }

    fn flag(&self, name: &str) -> bool {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false)
    }

    /// The one place an entity's location changes. Callers keep node
    /// membership and container inventories in step.
    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Writes a plain attribute. Derived and relational names are refused;
    /// those go through relocation.
    pub(crate) fn set_attribute(
        &mut self,
        name: &str,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>, WorldError> {
        if attr::is_derived(name) || attr::is_relational(name) {
            return Err(WorldError::ReservedAttribute(name.to_string()));
        }
        Ok(self.attributes.insert(name.to_string(), value))
    }

    pub(crate) fn stow(&mut self, item: EntityId) {
        if !self.inventory.contains(&item) {
            self.inventory.push(item);
        }
    }

    pub(crate) fn unstow(&mut self, item: EntityId) -> bool {
        let before = self.inventory.len();
        self.inventory.retain(|held| *held != item);
        before != self.inventory.len()
    }
}

/// Identifier-indexed store of every entity created during the world's life.
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = EntityId> + 'a {
        self.entities
            .values()
            .filter(move |entity| entity.kind == kind)
            .map(|entity| entity.id)
    }

    /// Derived position: the occupied node, or the container's position,
    /// followed up the containment chain.
    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        let mut current = self.entities.get(&id)?;
        // A chain longer than the arena means a cycle slipped through.
        for _ in 0..=self.entities.len() {
            match current.location {
                Location::Nowhere => return None,
                Location::Node { position } => return Some(position),
                Location::StoredIn { container } => current = self.entities.get(&container)?,
            }
        }
        None
    }

    /// True when `id` is `ancestor` or is stored (at any depth) inside it.
    pub fn is_within(&self, id: EntityId, ancestor: EntityId) -> bool {
        let mut current = id;
        for _ in 0..=self.entities.len() {
            if current == ancestor {
                return true;
            }
            match self.entities.get(&current).map(Entity::location) {
                Some(Location::StoredIn { container }) => current = container,
                _ => return false,
            }
        }
        false
    }

    pub fn snapshot(&self, id: EntityId) -> Option<EntitySnapshot> {
        let entity = self.entities.get(&id)?;
        Some(EntitySnapshot {
            id: entity.id,
            name: entity.name.clone(),
            kind: entity.kind.clone(),
            attributes: entity.attributes.clone(),
            location: entity.location,
            position: self.position_of(id),
            inventory: entity.inventory.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_chest_and_coin() -> EntityArena {
        let mut arena = EntityArena::new();
        let mut chest = Entity::new(EntityId(10), "chest", "item", BTreeMap::new());
        chest.set_location(Location::Node {
            position: Position::new(3, 1),
        });
        chest.stow(EntityId(11));
        let mut coin = Entity::new(EntityId(11), "coin", "item", BTreeMap::new());
        coin.set_location(Location::StoredIn {
            container: EntityId(10),
        });
        arena.insert(chest);
        arena.insert(coin);
        arena
    }

    #[test]
    fn stored_entity_inherits_container_position() {
        let arena = arena_with_chest_and_coin();
        assert_eq!(arena.position_of(EntityId(11)), Some(Position::new(3, 1)));
        let snapshot = arena.snapshot(EntityId(11)).expect("coin snapshot");
        assert_eq!(snapshot.position, Some(Position::new(3, 1)));
        assert_eq!(snapshot.location.node(), None);
    }

    #[test]
    fn entity_nowhere_has_no_position() {
        let mut arena = EntityArena::new();
        arena.insert(Entity::new(EntityId(1), "ghost", "item", BTreeMap::new()));
        assert_eq!(arena.position_of(EntityId(1)), None);
    }

    #[test]
    fn containment_chain_is_walked() {
        let arena = arena_with_chest_and_coin();
        assert!(arena.is_within(EntityId(11), EntityId(10)));
        assert!(!arena.is_within(EntityId(10), EntityId(11)));
        assert!(arena.is_within(EntityId(10), EntityId(10)));
    }

    #[test]
    fn relational_attributes_are_not_plain_writes() {
        let mut entity = Entity::new(EntityId(1), "rat", "character", BTreeMap::new());
        let err = entity
            .set_attribute(attr::NODE, AttributeValue::Node(None))
            .unwrap_err();
        assert_eq!(err, WorldError::ReservedAttribute("node".to_string()));
        assert!(entity.set_attribute(attr::CAN_ACT, true.into()).is_ok());
        assert!(entity.set_attribute(attr::POSITION, Position::new(0, 0).into()).is_err());
    }

    #[test]
    fn stow_is_idempotent() {
        let mut bag = Entity::new(EntityId(2), "bag", "item", BTreeMap::new());
        bag.stow(EntityId(3));
        bag.stow(EntityId(3));
        assert_eq!(bag.inventory(), &[EntityId(3)]);
        assert!(bag.unstow(EntityId(3)));
        assert!(!bag.unstow(EntityId(3)));
    }
}
