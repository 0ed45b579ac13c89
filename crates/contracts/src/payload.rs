//! Action request/result envelopes, loosely-typed requests, and render payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttributeValue, EntityId, EntitySnapshot, Position};

// ---------------------------------------------------------------------------
// Strict action envelopes
// ---------------------------------------------------------------------------

/// One concrete `(source, target, action)` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub action_name: String,
}

impl ActionRequest {
    pub fn new(source_id: EntityId, target_id: EntityId, action_name: impl Into<String>) -> Self {
        Self {
            source_id,
            target_id,
            action_name: action_name.into(),
        }
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} -> {})",
            self.action_name, self.source_id, self.target_id
        )
    }
}

/// An ordered batch of action requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionsPayload {
    pub actions: Vec<ActionRequest>,
}

impl ActionsPayload {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl From<Vec<ActionRequest>> for ActionsPayload {
    fn from(actions: Vec<ActionRequest>) -> Self {
        Self { actions }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    pub source: Option<EntitySnapshot>,
    pub target: Option<EntitySnapshot>,
}

/// Outcome of one request in a batch. Results are returned in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub request: ActionRequest,
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub failed_prerequisites: Vec<String>,
    pub state_before: ActionState,
    pub state_after: Option<ActionState>,
}

impl ActionResult {
    pub fn applied(request: ActionRequest, before: ActionState, after: ActionState) -> Self {
        Self {
            request,
            success: true,
            error: None,
            failed_prerequisites: Vec::new(),
            state_before: before,
            state_after: Some(after),
        }
    }

    pub fn rejected(request: ActionRequest, before: ActionState, reasons: Vec<String>) -> Self {
        Self {
            request,
            success: false,
            error: Some("prerequisites not met".to_string()),
            failed_prerequisites: reasons,
            state_before: before,
            state_after: None,
        }
    }

    pub fn failed(request: ActionRequest, before: ActionState, error: impl Into<String>) -> Self {
        Self {
            request,
            success: false,
            error: Some(error.into()),
            failed_prerequisites: Vec::new(),
            state_before: before,
            state_after: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loosely-typed requests
// ---------------------------------------------------------------------------

/// Identifies an entity by type and position, with optional tie-breakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySelector {
    pub entity_type: String,
    pub position: Position,
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, AttributeValue>,
}

impl EntitySelector {
    pub fn new(entity_type: impl Into<String>, position: Position) -> Self {
        Self {
            entity_type: entity_type.into(),
            position,
            id: None,
            name: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extra(mut self, attribute: impl Into<String>, value: AttributeValue) -> Self {
        self.extra.insert(attribute.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedActionPayload {
    pub source: EntitySelector,
    pub target: EntitySelector,
    pub action_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorRole {
    Source,
    Target,
}

impl fmt::Display for SelectorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Short description of one candidate in an ambiguous match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: EntityId,
    pub name: String,
    pub kind: String,
    pub position: Option<Position>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Why a loosely-typed request could not be turned into an `ActionRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ConversionError {
    #[error("unknown action `{action_name}`")]
    UnknownAction {
        action_name: String,
    },
    #[error("{role}: unknown entity type `{entity_type}`")]
    UnknownEntityType {
        role: SelectorRole,
        entity_type: String,
    },
    #[error("{role}: no {entity_type} at {position}")]
    EntityNotFound {
        role: SelectorRole,
        entity_type: String,
        position: Position,
    },
    #[error(
        "{role}: {} candidates match; disambiguate with one of [{}]",
        .candidates.len(),
        .distinguishing_fields.join(", ")
    )]
    Ambiguous {
        role: SelectorRole,
        candidates: Vec<CandidateSummary>,
        /// Selector fields whose values differ between candidates, so
        /// supplying one of them would narrow the match.
        distinguishing_fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummarizedActionOutcome {
    Converted { result: ActionResult },
    Rejected { error: ConversionError },
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEventOutcome {
    Applied,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub event_id: String,
    pub turn: u64,
    pub sequence_in_turn: u64,
    pub action_name: String,
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub outcome: WorldEventOutcome,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Render-facing projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualDescriptor {
    pub entity_id: EntityId,
    pub sprite: String,
    pub label: String,
    pub draw_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_errors_name_the_selector_role() {
        let missing = ConversionError::EntityNotFound {
            role: SelectorRole::Target,
            entity_type: "door".to_string(),
            position: Position::new(2, 1),
        };
        assert!(missing.to_string().contains("no door at"));

        let ambiguous = ConversionError::Ambiguous {
            role: SelectorRole::Source,
            candidates: Vec::new(),
            distinguishing_fields: vec!["name".to_string(), "id".to_string()],
        };
        assert!(ambiguous
            .to_string()
            .ends_with("0 candidates match; disambiguate with one of [name, id]"));
    }

    #[test]
    fn actions_payload_is_a_bare_json_array() {
        let payload = ActionsPayload::from(vec![ActionRequest::new(
            EntityId(30),
            EntityId(4),
            "move",
        )]);
        let encoded = serde_json::to_value(&payload).expect("serialize");
        assert!(encoded.is_array());
        assert_eq!(encoded[0]["source_id"], "30");

        let decoded: ActionsPayload = serde_json::from_str(
            r#"[{"source_id": 30, "target_id": "4", "action_name": "move"}]"#,
        )
        .expect("mixed id encodings");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn conversion_error_carries_tag_and_message() {
        let error = ConversionError::EntityNotFound {
            role: SelectorRole::Target,
            entity_type: "door".to_string(),
            position: Position::new(2, 2),
        };
        let encoded = serde_json::to_value(&error).expect("serialize");
        assert_eq!(encoded["error"], "entity_not_found");
        assert_eq!(error.to_string(), "target: no door at (2, 2)");
    }
}
