use super::*;

impl World {
    pub(super) fn push_event(&mut self, result: &ActionResult, sequence_in_turn: u64) {
        let request = &result.request;
        let (outcome, summary) = if result.success {
            (WorldEventOutcome::Applied, format!("{request} applied"))
        } else {
            let reason = match (&result.error, result.failed_prerequisites.first()) {
                (_, Some(first)) => first.clone(),
                (Some(error), None) => error.clone(),
                (None, None) => "not applied".to_string(),
            };
            (WorldEventOutcome::Rejected, format!("{request} rejected: {reason}"))
        };
        self.event_log.push(WorldEvent {
            event_id: format!("evt:{:06}:{:04}", self.turn, sequence_in_turn),
            turn: self.turn,
            sequence_in_turn,
            action_name: request.action_name.clone(),
            source_id: request.source_id,
            target_id: request.target_id,
            outcome,
            summary,
        });
    }

    /// Append-only log of every processed request.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn events_for_turn(&self, turn: u64) -> impl Iterator<Item = &WorldEvent> {
        self.event_log.iter().filter(move |event| event.turn == turn)
    }
}
