use std::collections::BTreeMap;

use contracts::{attr, AttributeValue};

use super::*;
use crate::entity::Entity;

impl World {
    /// Read-only view of the entity or node with this id.
    pub fn get_instance(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.snapshot(id)
    }

    /// Ids of every instance of `kind`. `node` lists the grid's nodes.
    pub fn all_instances(&self, kind: &str) -> Vec<EntityId> {
        if kind == NODE_KIND {
            return self.grid.nodes().map(|node| node.id()).collect();
        }
        self.entities.ids_of_kind(kind).collect()
    }

    /// Snapshots of every instance of `kind`, in id order.
    pub fn all_by_type(&self, kind: &str) -> Vec<EntitySnapshot> {
        self.all_instances(kind)
            .into_iter()
            .filter_map(|id| self.snapshot(id))
            .collect()
    }

    /// Creates an entity of a registered kind. The entity starts nowhere with
    /// `attributes` merged over the kind's defaults.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        kind: &str,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<EntityId, WorldError> {
        if !self.is_entity_type(kind) || kind == NODE_KIND {
            return Err(WorldError::UnknownEntityType(kind.to_string()));
        }
        if let Some(reserved) = attributes
            .keys()
            .find(|name| attr::is_derived(name) || attr::is_relational(name))
        {
            return Err(WorldError::ReservedAttribute(reserved.clone()));
        }
        let mut merged = kinds::default_attributes(kind);
        merged.extend(attributes);

        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        let name = name.into();
        debug!(%id, %name, kind, "entity spawned");
        self.entities.insert(Entity::new(id, name, kind, merged));
        Ok(id)
    }

    /// Puts an entity on a node, detaching it from wherever it was.
    pub fn place(&mut self, id: EntityId, position: Position) -> Result<(), WorldError> {
        self.require_entity(id)?;
        self.relocate(id, Location::Node { position })
    }

    /// Moves an entity into a container's inventory.
    pub fn store(&mut self, id: EntityId, container: EntityId) -> Result<(), WorldError> {
        self.require_entity(id)?;
        self.relocate(id, Location::StoredIn { container })
    }

    /// Detaches an entity from its node or container. It stays registered
    /// with no position.
    pub fn remove_from_world(&mut self, id: EntityId) -> Result<(), WorldError> {
        self.require_entity(id)?;
        self.relocate(id, Location::Nowhere)
    }

    /// Writes one attribute. Relational names re-point the relationship;
    /// derived names are refused.
    pub fn set_attribute(
        &mut self,
        id: EntityId,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), WorldError> {
        self.require_entity(id)?;
        match (name, value) {
            (attr::NODE, AttributeValue::Node(Some(position)))
            | (attr::NODE, AttributeValue::Position(position)) => self.place(id, position),
            (attr::NODE, AttributeValue::Node(None)) => {
                if self.location_of(id)?.node().is_some() {
                    self.relocate(id, Location::Nowhere)?;
                }
                Ok(())
            }
            (attr::STORED_IN, AttributeValue::Entity(Some(container))) => self.store(id, container),
            (attr::STORED_IN, AttributeValue::Entity(None)) => {
                if self.location_of(id)?.container().is_some() {
                    self.relocate(id, Location::Nowhere)?;
                }
                Ok(())
            }
            (attr::INVENTORY, AttributeValue::Entities(items)) => {
                self.replace_inventory(id, &items)
            }
            (attr::NODE, _) => Err(WorldError::InvalidRelationalValue {
                attribute: name.to_string(),
                expected: "node",
            }),
            (attr::STORED_IN, _) => Err(WorldError::InvalidRelationalValue {
                attribute: name.to_string(),
                expected: "entity",
            }),
            (attr::INVENTORY, _) => Err(WorldError::InvalidRelationalValue {
                attribute: name.to_string(),
                expected: "entities",
            }),
            (_, value) => self.write_plain(id, name, value),
        }
    }

    fn replace_inventory(
        &mut self,
        holder: EntityId,
        items: &[EntityId],
    ) -> Result<(), WorldError> {
        let current = self
            .entities
            .get(holder)
            .map(|entity| entity.inventory().to_vec())
            .unwrap_or_default();
        let stored = Location::StoredIn { container: holder };
        for item in items {
            self.require_entity(*item)?;
            self.check_destination(*item, stored)?;
        }

        for item in current.iter().filter(|item| !items.contains(item)) {
            self.relocate(*item, Location::Nowhere)?;
        }
        for item in items {
            self.relocate(*item, stored)?;
        }
        Ok(())
    }

    pub(super) fn require_entity(&self, id: EntityId) -> Result<(), WorldError> {
        if self.grid.is_node_id(id) {
            return Err(WorldError::NotAnEntity(id));
        }
        if !self.entities.contains(id) {
            return Err(WorldError::UnknownEntity(id));
        }
        Ok(())
    }

    pub(super) fn location_of(&self, id: EntityId) -> Result<Location, WorldError> {
        self.entities
            .get(id)
            .map(Entity::location)
            .ok_or(WorldError::UnknownEntity(id))
    }
}
