//! Standard entity kinds and their default attributes.

use std::collections::BTreeMap;

use contracts::{attr, AttributeValue};

pub const CHARACTER: &str = "character";
pub const DOOR: &str = "door";
pub const KEY: &str = "key";
pub const ITEM: &str = "item";
pub const WALL: &str = "wall";

pub const STANDARD_KINDS: [&str; 5] = [CHARACTER, DOOR, KEY, ITEM, WALL];

/// Attributes every entity of `kind` starts with. Unknown kinds start with
/// non-blocking flags only.
pub fn default_attributes(kind: &str) -> BTreeMap<String, AttributeValue> {
    let (blocks, extra): (bool, &[(&str, bool)]) = match kind {
        CHARACTER => (false, &[(attr::CAN_ACT, true)]),
        DOOR => (true, &[(attr::IS_LOCKED, false), (attr::OPEN, false)]),
        KEY | ITEM => (false, &[(attr::IS_PICKUPABLE, true)]),
        WALL => (true, &[]),
        _ => (false, &[]),
    };
    let mut attributes = BTreeMap::from([
        (attr::BLOCKS_MOVEMENT.to_string(), AttributeValue::Bool(blocks)),
        (attr::BLOCKS_LIGHT.to_string(), AttributeValue::Bool(blocks)),
    ]);
    for (name, value) in extra {
        attributes.insert(name.to_string(), AttributeValue::Bool(*value));
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doors_start_closed_and_blocking() {
        let door = default_attributes(DOOR);
        assert_eq!(door.get(attr::OPEN), Some(&AttributeValue::Bool(false)));
        assert_eq!(door.get(attr::BLOCKS_LIGHT), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn unknown_kind_is_passable() {
        let barrel = default_attributes("barrel");
        assert_eq!(barrel.len(), 2);
        assert_eq!(barrel.get(attr::BLOCKS_MOVEMENT), Some(&AttributeValue::Bool(false)));
    }
}
