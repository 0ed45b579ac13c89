use super::*;

impl World {
    /// Applies a batch in submitted order as one turn. Every request gets a
    /// result in the same position; a failed request never stops the batch
    /// and nothing is rolled back across requests.
    pub fn apply_actions_payload(&mut self, payload: &ActionsPayload) -> Vec<ActionResult> {
        let turn = self.begin_turn();
        let mut results = Vec::with_capacity(payload.len());
        for (sequence, request) in payload.actions.iter().enumerate() {
            results.push(self.execute_request(request, sequence as u64));
        }
        let applied = results.iter().filter(|result| result.success).count();
        info!(
            turn,
            requests = results.len(),
            applied,
            rejected = results.len() - applied,
            "batch processed"
        );
        results
    }

    pub(super) fn begin_turn(&mut self) -> u64 {
        self.turn += 1;
        self.turn
    }

    pub(super) fn execute_request(
        &mut self,
        request: &ActionRequest,
        sequence_in_turn: u64,
    ) -> ActionResult {
        let result = self.evaluate_request(request);
        if result.success {
            debug!(%request, "action applied");
        } else {
            debug!(%request, error = ?result.error, "action not applied");
        }
        self.push_event(&result, sequence_in_turn);
        result
    }

    fn evaluate_request(&mut self, request: &ActionRequest) -> ActionResult {
        let before = ActionState {
            source: self.snapshot(request.source_id),
            target: self.snapshot(request.target_id),
        };
        let Some(action) = self.catalog.get(&request.action_name) else {
            let error = format!("unknown action `{}`", request.action_name);
            return ActionResult::failed(request.clone(), before, error);
        };
        let (Some(source), Some(target)) = (before.source.clone(), before.target.clone()) else {
            let missing = if before.source.is_none() {
                request.source_id
            } else {
                request.target_id
            };
            let error = WorldError::UnknownEntity(missing).to_string();
            return ActionResult::failed(request.clone(), before, error);
        };

        let lookup: &dyn EntityLookup = &*self;
        match action.is_applicable(lookup, &source, &target) {
            Ok(true) => {}
            Ok(false) => {
                return match action.prerequisites().explain(lookup, &source, &target) {
                    Ok(reasons) => ActionResult::rejected(request.clone(), before, reasons),
                    Err(error) => ActionResult::failed(request.clone(), before, error.to_string()),
                };
            }
            Err(error) => return ActionResult::failed(request.clone(), before, error.to_string()),
        }
        let (new_source, new_target) = match action.consequences().apply(lookup, &source, &target)
        {
            Ok(updated) => updated,
            Err(error) => return ActionResult::failed(request.clone(), before, error.to_string()),
        };

        let mut changes = vec![(&source, &new_source)];
        if target.id != source.id {
            changes.push((&target, &new_target));
        }
        if let Err(error) = self.commit(&changes) {
            warn!(%request, %error, "commit refused");
            return ActionResult::failed(request.clone(), before, error.to_string());
        }

        let after = ActionState {
            source: self.snapshot(source.id),
            target: self.snapshot(target.id),
        };
        ActionResult::applied(request.clone(), before, after)
    }
}
