use contracts::{attr, AttributeValue};

use super::*;

/// Registry mutations derived from an action's before/after snapshots.
/// Built and validated in full before anything is written.
#[derive(Debug, Default)]
struct CommitPlan {
    writes: Vec<(EntityId, String, AttributeValue)>,
    relocations: Vec<(EntityId, Location)>,
}

impl CommitPlan {
    fn relocate(&mut self, id: EntityId, location: Location) {
        match self.relocations.iter_mut().find(|(entity, _)| *entity == id) {
            Some(existing) => existing.1 = location,
            None => self.relocations.push((id, location)),
        }
    }

    fn relocates(&self, id: EntityId) -> bool {
        self.relocations.iter().any(|(entity, _)| *entity == id)
    }
}

impl World {
    /// Applies the difference between each `(before, after)` pair to the live
    /// registry. Nothing is written unless the whole plan validates.
    pub(super) fn commit(
        &mut self,
        changes: &[(&EntitySnapshot, &EntitySnapshot)],
    ) -> Result<(), WorldError> {
        let plan = self.plan_commit(changes)?;
        for (id, name, value) in plan.writes {
            self.write_plain(id, &name, value)?;
        }
        for (id, location) in plan.relocations {
            self.relocate(id, location)?;
        }
        Ok(())
    }

    fn plan_commit(
        &self,
        changes: &[(&EntitySnapshot, &EntitySnapshot)],
    ) -> Result<CommitPlan, WorldError> {
        let mut plan = CommitPlan::default();

        // Explicit changes first: plain attributes and the entity's own
        // location.
        for (before, after) in changes {
            if before.is_node() {
                if before != after {
                    return Err(WorldError::NodeNotWritable(before.id));
                }
                continue;
            }
            for (name, value) in &after.attributes {
                if before.attributes.get(name) == Some(value) {
                    continue;
                }
                if attr::is_derived(name) || attr::is_relational(name) {
                    return Err(WorldError::ReservedAttribute(name.clone()));
                }
                plan.writes.push((after.id, name.clone(), value.clone()));
            }
            if before.location != after.location {
                plan.relocate(after.id, after.location);
            }
        }

        // Inventory edits only move items whose own snapshot said nothing.
        for (before, after) in changes {
            if before.is_node() {
                continue;
            }
            for item in after.inventory.iter().filter(|item| !before.inventory.contains(item)) {
                if !plan.relocates(*item) {
                    plan.relocate(*item, Location::StoredIn { container: after.id });
                }
            }
            for item in before.inventory.iter().filter(|item| !after.inventory.contains(item)) {
                if !plan.relocates(*item) {
                    let fallback = after
                        .location
                        .node()
                        .map_or(Location::Nowhere, |position| Location::Node { position });
                    plan.relocate(*item, fallback);
                }
            }
        }

        for (id, location) in &plan.relocations {
            self.require_entity(*id)?;
            self.check_destination(*id, *location)?;
        }
        Ok(plan)
    }

    /// Writes a plain attribute and refreshes the occupied node's aggregates.
    pub(super) fn write_plain(
        &mut self,
        id: EntityId,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), WorldError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(WorldError::UnknownEntity(id))?;
        entity.set_attribute(name, value)?;
        if let Location::Node { position } = entity.location() {
            self.grid.node_mut(position)?.refresh(&self.entities);
        }
        Ok(())
    }

    pub(super) fn check_destination(&self, id: EntityId, to: Location) -> Result<(), WorldError> {
        match to {
            Location::Nowhere => Ok(()),
            Location::Node { position } => {
                if self.grid.contains(position) {
                    Ok(())
                } else {
                    Err(WorldError::OutOfBounds(position))
                }
            }
            Location::StoredIn { container } => {
                self.require_entity(container)?;
                if self.entities.is_within(container, id) {
                    return Err(WorldError::ContainmentCycle {
                        entity: id,
                        container,
                    });
                }
                Ok(())
            }
        }
    }

    /// Re-points an entity's location: detach from the old node or container,
    /// then attach to the new one. The entity is never on a node and in a
    /// container at the same time.
    pub(super) fn relocate(&mut self, id: EntityId, to: Location) -> Result<(), WorldError> {
        let from = self.location_of(id)?;
        if from == to {
            return Ok(());
        }
        self.check_destination(id, to)?;

        match from {
            Location::Node { position } => {
                self.grid
                    .node_mut(position)?
                    .remove_entity(id, &self.entities)?;
            }
            Location::StoredIn { container } => {
                if let Some(holder) = self.entities.get_mut(container) {
                    holder.unstow(id);
                }
            }
            Location::Nowhere => {}
        }
        self.entity_mut(id)?.set_location(Location::Nowhere);

        match to {
            Location::Node { position } => {
                self.entity_mut(id)?.set_location(to);
                self.grid
                    .node_mut(position)?
                    .add_entity(id, &self.entities)?;
            }
            Location::StoredIn { container } => {
                self.entity_mut(id)?.set_location(to);
                self.entity_mut(container)?.stow(id);
            }
            Location::Nowhere => {}
        }
        debug!(%id, ?from, ?to, "entity relocated");
        Ok(())
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut crate::entity::Entity, WorldError> {
        self.entities
            .get_mut(id)
            .ok_or(WorldError::UnknownEntity(id))
    }
}
