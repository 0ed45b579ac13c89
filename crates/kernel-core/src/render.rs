//! Render-facing projection: matches entity snapshots against an ordered rule
//! list and emits visual descriptors. Never touches world state.

use std::collections::BTreeMap;

use contracts::{attr, AttributeValue, EntitySnapshot, VisualDescriptor};
use serde::{Deserialize, Serialize};

use crate::kinds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualRule {
    #[serde(default)]
    pub kind: Option<String>,
    /// Glob over the entity name; `*` matches any run of characters.
    #[serde(default)]
    pub name_pattern: Option<String>,
    /// Exact matches against the entity's attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    pub sprite: String,
    /// `{name}` is replaced by the entity name.
    pub label: String,
    #[serde(default)]
    pub draw_order: i32,
}

impl VisualRule {
    pub fn new(sprite: impl Into<String>, label: impl Into<String>, draw_order: i32) -> Self {
        Self {
            kind: None,
            name_pattern: None,
            attributes: BTreeMap::new(),
            sprite: sprite.into(),
            label: label.into(),
            draw_order,
        }
    }

    pub fn for_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn named(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    pub fn when(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }

    pub fn matches(&self, entity: &EntitySnapshot) -> bool {
        if self.kind.as_deref().is_some_and(|kind| kind != entity.kind) {
            return false;
        }
        if self
            .name_pattern
            .as_deref()
            .is_some_and(|pattern| !glob_match(pattern, &entity.name))
        {
            return false;
        }
        self.attributes
            .iter()
            .all(|(name, value)| entity.attribute(name).as_ref() == Some(value))
    }

    fn describe(&self, entity: &EntitySnapshot) -> VisualDescriptor {
        VisualDescriptor {
            entity_id: entity.id,
            sprite: self.sprite.clone(),
            label: self.label.replace("{name}", &entity.name),
            draw_order: self.draw_order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualRuleSet {
    rules: Vec<VisualRule>,
}

impl VisualRuleSet {
    pub fn new(rules: Vec<VisualRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: VisualRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[VisualRule] {
        &self.rules
    }

    /// Rules for the standard kinds. Door variants come before the generic
    /// door rule so the first match wins.
    pub fn standard() -> Self {
        Self::new(vec![
            VisualRule::new("door_locked", "{name} (locked)", 20)
                .for_kind(kinds::DOOR)
                .when(attr::IS_LOCKED, true),
            VisualRule::new("door_open", "{name} (open)", 20)
                .for_kind(kinds::DOOR)
                .when(attr::OPEN, true),
            VisualRule::new("door_closed", "{name}", 20).for_kind(kinds::DOOR),
            VisualRule::new("wall", "{name}", 10).for_kind(kinds::WALL),
            VisualRule::new("key", "{name}", 30).for_kind(kinds::KEY),
            VisualRule::new("item", "{name}", 30).for_kind(kinds::ITEM),
            VisualRule::new("character", "{name}", 40).for_kind(kinds::CHARACTER),
        ])
    }

    /// First matching rule per entity; unmatched entities are skipped. Output
    /// is stably sorted by draw order, so equal orders keep node order.
    pub fn project(&self, entities: &[EntitySnapshot]) -> Vec<VisualDescriptor> {
        let mut descriptors: Vec<VisualDescriptor> = entities
            .iter()
            .filter_map(|entity| {
                self.rules
                    .iter()
                    .find(|rule| rule.matches(entity))
                    .map(|rule| rule.describe(entity))
            })
            .collect();
        descriptors.sort_by_key(|descriptor| descriptor.draw_order);
        descriptors
    }
}

/// Glob match supporting `*` only.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return true;
    };
    let Some(mut rest) = text.strip_prefix(head) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No `*` at all: exact match.
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
