//! Action catalog and the standard action library: movement, carrying, and a
//! small door state machine (closed-locked, closed-unlocked, open).

use std::collections::BTreeMap;

use contracts::{attr, AttributeValue, EntitySnapshot, NODE_KIND};

use crate::error::WorldError;
use crate::rules::{
    equals, same_position, within_reach, Action, Consequences, EntityLookup, Prerequisites,
    Statement,
};

pub const MOVE: &str = "move";
pub const PICKUP: &str = "pickup";
pub const DROP: &str = "drop";
pub const OPEN: &str = "open";
pub const CLOSE: &str = "close";
pub const LOCK: &str = "lock";
pub const UNLOCK: &str = "unlock";

// ---------------------------------------------------------------------------
// ActionCatalog
// ---------------------------------------------------------------------------

/// Registry of known actions, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<Action>,
    by_name: BTreeMap<String, usize>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with every standard action.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for action in [
            move_action(),
            pickup_action(),
            drop_action(),
            open_action(),
            close_action(),
            lock_action(),
            unlock_action(),
        ] {
            let idx = catalog.actions.len();
            catalog.by_name.insert(action.name().to_string(), idx);
            catalog.actions.push(action);
        }
        catalog
    }

    pub fn register(&mut self, action: Action) -> Result<(), WorldError> {
        if self.by_name.contains_key(action.name()) {
            return Err(WorldError::DuplicateAction(action.name().to_string()));
        }
        let idx = self.actions.len();
        self.by_name.insert(action.name().to_string(), idx);
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.by_name.get(name).map(|idx| &self.actions[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Shared statements
// ---------------------------------------------------------------------------

fn can_act() -> Statement {
    Statement::new("can_act").with_condition(attr::CAN_ACT, true)
}

fn holds_matching_key(
    lookup: &dyn EntityLookup,
    source: &EntitySnapshot,
    target: Option<&EntitySnapshot>,
) -> bool {
    let Some(wanted) = target.and_then(|t| t.attribute(attr::KEY_NAME)) else {
        return false;
    };
    source.inventory.iter().any(|item| {
        lookup
            .lookup(*item)
            .and_then(|snapshot| snapshot.attribute(attr::KEY_NAME))
            .is_some_and(|name| name == wanted)
    })
}

fn carries_key() -> Statement {
    Statement::new("has_key").with_check(
        "source must carry a key whose key_name matches the target",
        holds_matching_key,
    )
}

fn lying_on_node(
    _: &dyn EntityLookup,
    subject: &EntitySnapshot,
    _: Option<&EntitySnapshot>,
) -> bool {
    subject.location.node().is_some()
}

fn has_position(
    _: &dyn EntityLookup,
    subject: &EntitySnapshot,
    _: Option<&EntitySnapshot>,
) -> bool {
    subject.position.is_some()
}

// ---------------------------------------------------------------------------
// Standard actions
// ---------------------------------------------------------------------------

/// Source steps onto an adjacent (or its own) walkable node.
pub fn move_action() -> Action {
    Action::new(
        MOVE,
        "move the source onto the target node",
        Prerequisites::new()
            .on_source(can_act())
            .on_target(
                Statement::new("walkable_node")
                    .with_condition(attr::KIND, NODE_KIND)
                    .with_condition(attr::BLOCKS_MOVEMENT, false),
            )
            .on_pair(Statement::new("adjacent").with_comparison(
                "adjacent_or_same",
                attr::POSITION,
                attr::POSITION,
                within_reach,
            )),
        Consequences::new()
            .compute_source(attr::NODE, |_, target| AttributeValue::Node(target.position)),
    )
}

/// Target leaves its node and enters the source's inventory.
pub fn pickup_action() -> Action {
    Action::new(
        PICKUP,
        "pick the target up into the source's inventory",
        Prerequisites::new()
            .on_source(can_act())
            .on_target(
                Statement::new("pickupable")
                    .with_condition(attr::IS_PICKUPABLE, true)
                    .with_check("target must be lying on a node", lying_on_node),
            )
            .on_pair(Statement::new("co_located").with_comparison(
                "same_position",
                attr::POSITION,
                attr::POSITION,
                same_position,
            )),
        Consequences::new()
            .compute_source(attr::INVENTORY, |source, target| {
                let mut items = source.inventory.clone();
                items.push(target.id);
                AttributeValue::Entities(items)
            })
            .set_target(attr::NODE, AttributeValue::Node(None))
            .compute_target(attr::STORED_IN, |source, _| {
                AttributeValue::Entity(Some(source.id))
            }),
    )
}

/// Target leaves the source's inventory and lands on the source's node.
pub fn drop_action() -> Action {
    Action::new(
        DROP,
        "drop the target from the source's inventory",
        Prerequisites::new()
            .on_source(
                Statement::new("placed")
                    .with_condition(attr::CAN_ACT, true)
                    .with_check("source must have a position to drop onto", has_position),
            )
            .on_pair(Statement::new("holding").with_comparison(
                "holder",
                attr::ID,
                attr::STORED_IN,
                equals,
            )),
        Consequences::new()
            .compute_source(attr::INVENTORY, |source, target| {
                AttributeValue::Entities(
                    source
                        .inventory
                        .iter()
                        .copied()
                        .filter(|item| *item != target.id)
                        .collect(),
                )
            })
            .set_target(attr::STORED_IN, AttributeValue::Entity(None))
            .compute_target(attr::NODE, |source, _| AttributeValue::Node(source.position)),
    )
}

pub fn open_action() -> Action {
    Action::new(
        OPEN,
        "open an unlocked, closed target",
        Prerequisites::new().on_source(can_act()).on_target(
            Statement::new("closed_unlocked")
                .with_condition(attr::IS_LOCKED, false)
                .with_condition(attr::OPEN, false),
        ),
        Consequences::new()
            .set_target(attr::OPEN, true)
            .set_target(attr::BLOCKS_MOVEMENT, false)
            .set_target(attr::BLOCKS_LIGHT, false),
    )
}

pub fn close_action() -> Action {
    Action::new(
        CLOSE,
        "close an open target",
        Prerequisites::new()
            .on_source(can_act())
            .on_target(Statement::new("open").with_condition(attr::OPEN, true)),
        Consequences::new()
            .set_target(attr::OPEN, false)
            .set_target(attr::BLOCKS_MOVEMENT, true)
            .set_target(attr::BLOCKS_LIGHT, true),
    )
}

pub fn lock_action() -> Action {
    Action::new(
        LOCK,
        "lock a closed target with a matching key",
        Prerequisites::new()
            .on_source(can_act())
            .on_target(
                Statement::new("closed_unlocked")
                    .with_condition(attr::IS_LOCKED, false)
                    .with_condition(attr::OPEN, false),
            )
            .on_pair(carries_key()),
        Consequences::new().set_target(attr::IS_LOCKED, true),
    )
}

pub fn unlock_action() -> Action {
    Action::new(
        UNLOCK,
        "unlock a locked target with a matching key",
        Prerequisites::new()
            .on_source(can_act())
            .on_target(Statement::new("locked").with_condition(attr::IS_LOCKED, true))
            .on_pair(carries_key()),
        Consequences::new().set_target(attr::IS_LOCKED, false),
    )
}

#[cfg(test)]
mod tests {
    use contracts::{EntityId, Location, Position};

    use super::*;

    #[derive(Default)]
    struct Registry(BTreeMap<EntityId, EntitySnapshot>);

    impl EntityLookup for Registry {
        fn lookup(&self, id: EntityId) -> Option<EntitySnapshot> {
            self.0.get(&id).cloned()
        }
    }

    fn entity(
        id: u64,
        kind: &str,
        at: Option<Position>,
        attrs: &[(&str, AttributeValue)],
    ) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId(id),
            name: format!("{kind}-{id}"),
            kind: kind.to_string(),
            attributes: attrs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            location: at.map_or(Location::Nowhere, |position| Location::Node { position }),
            position: at,
            inventory: Vec::new(),
        }
    }

    fn node(id: u64, at: Position, blocked: bool) -> EntitySnapshot {
        entity(id, NODE_KIND, Some(at), &[(attr::BLOCKS_MOVEMENT, blocked.into())])
    }

    fn hero(at: Position) -> EntitySnapshot {
        entity(100, "character", Some(at), &[(attr::CAN_ACT, true.into())])
    }

    fn door(locked: bool, open: bool) -> EntitySnapshot {
        entity(
            200,
            "door",
            Some(Position::new(2, 2)),
            &[
                (attr::IS_LOCKED, locked.into()),
                (attr::OPEN, open.into()),
                (attr::KEY_NAME, "brass".into()),
                (attr::BLOCKS_MOVEMENT, (!open).into()),
                (attr::BLOCKS_LIGHT, (!open).into()),
            ],
        )
    }

    #[test]
    fn standard_catalog_has_every_action() {
        let catalog = ActionCatalog::standard();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["close", "drop", "lock", "move", "open", "pickup", "unlock"]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = ActionCatalog::standard();
        assert_eq!(
            catalog.register(move_action()),
            Err(WorldError::DuplicateAction("move".to_string()))
        );
        assert_eq!(catalog.len(), 7);
    }

    #[test]
    fn move_requires_adjacent_walkable_node() {
        let registry = Registry::default();
        let action = move_action();
        let source = hero(Position::new(1, 1));
        assert_eq!(
            action.is_applicable(&registry, &source, &node(8, Position::new(2, 2), false)),
            Ok(true)
        );
        assert_eq!(
            action.is_applicable(&registry, &source, &node(9, Position::new(3, 1), false)),
            Ok(false)
        );
        assert_eq!(
            action.is_applicable(&registry, &source, &node(8, Position::new(2, 2), true)),
            Ok(false)
        );

        let (moved, _) = action
            .apply(&registry, &source, &node(8, Position::new(2, 2), false))
            .expect("applies");
        assert_eq!(moved.location.node(), Some(Position::new(2, 2)));
    }

    #[test]
    fn pickup_moves_target_into_inventory() {
        let registry = Registry::default();
        let at = Position::new(0, 0);
        let key = entity(5, "key", Some(at), &[(attr::IS_PICKUPABLE, true.into())]);
        let (source, target) = pickup_action()
            .apply(&registry, &hero(at), &key)
            .expect("co-located pickup");
        assert_eq!(source.inventory, vec![EntityId(5)]);
        assert_eq!(target.location.container(), Some(EntityId(100)));
        assert_eq!(target.location.node(), None);
    }

    #[test]
    fn unlock_needs_the_matching_key() {
        let mut registry = Registry::default();
        let mut holder = hero(Position::new(1, 2));
        let action = unlock_action();
        assert_eq!(action.is_applicable(&registry, &holder, &door(true, false)), Ok(false));

        let wrong = entity(6, "key", None, &[(attr::KEY_NAME, "iron".into())]);
        registry.0.insert(wrong.id, wrong);
        holder.inventory.push(EntityId(6));
        assert_eq!(action.is_applicable(&registry, &holder, &door(true, false)), Ok(false));

        let right = entity(7, "key", None, &[(attr::KEY_NAME, "brass".into())]);
        registry.0.insert(right.id, right);
        holder.inventory.push(EntityId(7));
        let (_, unlocked) = action
            .apply(&registry, &holder, &door(true, false))
            .expect("matching key");
        assert_eq!(unlocked.attribute(attr::IS_LOCKED), Some(false.into()));
    }

    #[test]
    fn open_and_close_flip_blocking_flags() {
        let registry = Registry::default();
        let source = hero(Position::new(1, 2));
        let (_, opened) = open_action()
            .apply(&registry, &source, &door(false, false))
            .expect("unlocked door opens");
        assert!(!opened.flag(attr::BLOCKS_MOVEMENT));
        assert!(!opened.flag(attr::BLOCKS_LIGHT));
        assert!(opened.flag(attr::OPEN));

        assert_eq!(
            open_action().is_applicable(&registry, &source, &door(true, false)),
            Ok(false)
        );
        let (_, closed) = close_action()
            .apply(&registry, &source, &opened)
            .expect("open door closes");
        assert!(closed.flag(attr::BLOCKS_MOVEMENT));
        assert!(!closed.flag(attr::OPEN));
    }

    #[test]
    fn drop_requires_the_source_to_hold_the_target() {
        let registry = Registry::default();
        let at = Position::new(3, 3);
        let mut holder = hero(at);
        let mut key = entity(5, "key", None, &[]);
        assert_eq!(drop_action().is_applicable(&registry, &holder, &key), Ok(false));

        key.location = Location::StoredIn {
            container: holder.id,
        };
        key.position = Some(at);
        holder.inventory.push(key.id);
        let (source, target) = drop_action()
            .apply(&registry, &holder, &key)
            .expect("held key drops");
        assert!(source.inventory.is_empty());
        assert_eq!(target.location.node(), Some(at));
    }
}
