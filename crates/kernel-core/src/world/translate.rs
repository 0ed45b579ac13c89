use super::*;

impl World {
    /// Resolves a loosely-typed request into a concrete one against the live
    /// registry.
    pub fn translate_summarized(
        &self,
        payload: &SummarizedActionPayload,
    ) -> Result<ActionRequest, ConversionError> {
        if !self.catalog.contains(&payload.action_name) {
            return Err(ConversionError::UnknownAction {
                action_name: payload.action_name.clone(),
            });
        }
        let source = self.resolve_selector(SelectorRole::Source, &payload.source)?;
        let target = self.resolve_selector(SelectorRole::Target, &payload.target)?;
        Ok(ActionRequest::new(source, target, payload.action_name.clone()))
    }

    /// Translates and applies each request in order as one turn. Each request
    /// is resolved against the state left by the ones before it.
    pub fn apply_summarized_payload(
        &mut self,
        payloads: &[SummarizedActionPayload],
    ) -> Vec<SummarizedActionOutcome> {
        let turn = self.begin_turn();
        let mut sequence = 0;
        let mut outcomes = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match self.translate_summarized(payload) {
                Ok(request) => {
                    let result = self.execute_request(&request, sequence);
                    sequence += 1;
                    outcomes.push(SummarizedActionOutcome::Converted { result });
                }
                Err(error) => {
                    warn!(turn, action = %payload.action_name, %error, "request not converted");
                    outcomes.push(SummarizedActionOutcome::Rejected { error });
                }
            }
        }
        info!(turn, requests = payloads.len(), converted = sequence, "summarized batch processed");
        outcomes
    }

    fn resolve_selector(
        &self,
        role: SelectorRole,
        selector: &EntitySelector,
    ) -> Result<EntityId, ConversionError> {
        if !self.is_entity_type(&selector.entity_type) {
            return Err(ConversionError::UnknownEntityType {
                role,
                entity_type: selector.entity_type.clone(),
            });
        }
        let not_found = || ConversionError::EntityNotFound {
            role,
            entity_type: selector.entity_type.clone(),
            position: selector.position,
        };

        if selector.entity_type == NODE_KIND {
            let node = self.grid.node(selector.position).ok_or_else(not_found)?;
            if selector.id.is_some_and(|id| id != node.id()) {
                return Err(not_found());
            }
            return Ok(node.id());
        }

        let candidates: Vec<EntitySnapshot> = self
            .entities
            .ids_of_kind(&selector.entity_type)
            .filter_map(|id| self.entities.snapshot(id))
            .filter(|snapshot| snapshot.position == Some(selector.position))
            .filter(|snapshot| selector.id.map_or(true, |id| id == snapshot.id))
            .filter(|snapshot| {
                selector
                    .name
                    .as_deref()
                    .map_or(true, |name| name == snapshot.name)
            })
            .filter(|snapshot| {
                selector
                    .extra
                    .iter()
                    .all(|(name, value)| snapshot.attribute(name).as_ref() == Some(value))
            })
            .collect();

        match candidates.as_slice() {
            [] => Err(not_found()),
            [only] => Ok(only.id),
            _ => Err(ConversionError::Ambiguous {
                role,
                distinguishing_fields: distinguishing_fields(&candidates),
                candidates: candidates
                    .iter()
                    .map(|snapshot| CandidateSummary {
                        id: snapshot.id,
                        name: snapshot.name.clone(),
                        kind: snapshot.kind.clone(),
                        position: snapshot.position,
                        attributes: snapshot.attributes.clone(),
                    })
                    .collect(),
            }),
        }
    }
}

/// Selector fields that would tell the candidates apart: `name` when names
/// differ, each attribute whose values differ, and always `id`.
fn distinguishing_fields(candidates: &[EntitySnapshot]) -> Vec<String> {
    let mut fields = Vec::new();
    let Some(first) = candidates.first() else {
        return fields;
    };
    if candidates.iter().any(|c| c.name != first.name) {
        fields.push("name".to_string());
    }
    let keys: BTreeSet<&String> = candidates.iter().flat_map(|c| c.attributes.keys()).collect();
    for key in keys {
        if candidates
            .iter()
            .any(|c| c.attributes.get(key) != first.attributes.get(key))
        {
            fields.push(key.clone());
        }
    }
    fields.push("id".to_string());
    fields
}
