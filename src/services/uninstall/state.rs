use crate::services::host::{MessageRef, UserId};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallStep {
    ConfirmFirst,
    ConfirmSecond,
    Executing,
}

#[derive(Debug, Clone)]
pub struct UninstallState {
    pub step: UninstallStep,
    pub started_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
}

impl UninstallState {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        // TTL 15 mins, Idle 3 mins
        now - self.created_at >= Duration::minutes(15)
            || now - self.last_interaction >= Duration::minutes(3)
    }
}

/// Tracks uninstall confirmations per form, so a step can only be reached
/// from the one before it.
#[derive(Default)]
pub struct UninstallStateService {
    states: DashMap<MessageRef, UninstallState>,
}

impl UninstallStateService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, form: MessageRef, user: UserId) {
        let now = Utc::now();
        self.states.insert(
            form,
            UninstallState {
                step: UninstallStep::ConfirmFirst,
                started_by: user,
                created_at: now,
                last_interaction: now,
            },
        );
    }

    pub fn step(&self, form: MessageRef) -> Option<UninstallStep> {
        self.states.get(&form).map(|s| s.step)
    }

    /// Moves `form` from `from` to `to`. Fails when the form is unknown,
    /// expired, pressed by someone else, or in another step.
    pub fn advance(
        &self,
        form: MessageRef,
        user: UserId,
        from: UninstallStep,
        to: UninstallStep,
    ) -> bool {
        let now = Utc::now();

        if self
            .states
            .get(&form)
            .is_some_and(|state| state.is_expired(now))
        {
            debug!("Uninstall confirmation {:?} expired", form);
            self.states.remove(&form);
            return false;
        }

        match self.states.get_mut(&form) {
            Some(mut state) if state.step == from && state.started_by == user => {
                state.step = to;
                state.last_interaction = now;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&self, form: MessageRef) -> bool {
        self.states.remove(&form).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: MessageRef = MessageRef {
        chat_id: 1,
        message_id: 10,
    };

    #[test]
    fn test_steps_cannot_be_skipped() {
        let states = UninstallStateService::new();

        assert!(!states.advance(FORM, 1, UninstallStep::ConfirmFirst, UninstallStep::ConfirmSecond));

        states.begin(FORM, 1);
        assert!(!states.advance(FORM, 1, UninstallStep::ConfirmSecond, UninstallStep::Executing));
        assert!(!states.advance(FORM, 2, UninstallStep::ConfirmFirst, UninstallStep::ConfirmSecond));
        assert!(states.advance(FORM, 1, UninstallStep::ConfirmFirst, UninstallStep::ConfirmSecond));
        assert_eq!(states.step(FORM), Some(UninstallStep::ConfirmSecond));
        assert!(states.advance(FORM, 1, UninstallStep::ConfirmSecond, UninstallStep::Executing));

        assert!(states.cancel(FORM));
        assert_eq!(states.step(FORM), None);
    }

    #[test]
    fn test_expired_confirmation_is_dropped() {
        let states = UninstallStateService::new();
        states.begin(FORM, 1);
        if let Some(mut state) = states.states.get_mut(&FORM) {
            state.last_interaction = Utc::now() - Duration::minutes(5);
        }

        assert!(!states.advance(FORM, 1, UninstallStep::ConfirmFirst, UninstallStep::ConfirmSecond));
        assert_eq!(states.step(FORM), None);
    }
}
