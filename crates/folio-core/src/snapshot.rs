use crate::MutationPhase;

/// Immutable view of one component's optimistic state.
///
/// Every transition returns a new snapshot; the imperative shell decides where
/// to store it. `in_flight` counts applies that have not been committed or
/// rolled back yet; nothing here prevents it from exceeding one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot<S> {
    pub value: S,
    pub phase: MutationPhase,
    pub in_flight: u32,
}

impl<S> Snapshot<S> {
    pub fn new(value: S) -> Self {
        Self { value, phase: MutationPhase::Idle, in_flight: 0 }
    }

    pub fn apply(&self, f: impl FnOnce(&S) -> S) -> Self {
        Self { value: f(&self.value), phase: MutationPhase::Applied, in_flight: self.in_flight + 1 }
    }

    /// Local state is left as applied. The phase stays `Applied` while other
    /// mutations are still in flight.
    pub fn commit(&self) -> Self
    where
        S: Clone,
    {
        Self::settle(self.value.clone(), MutationPhase::Committed, self.in_flight)
    }

    pub fn rollback(&self, f: impl FnOnce(&S) -> S) -> Self {
        Self::settle(f(&self.value), MutationPhase::RolledBack, self.in_flight)
    }

    fn settle(value: S, terminal: MutationPhase, in_flight: u32) -> Self {
        let in_flight = in_flight.saturating_sub(1);
        let phase = if in_flight > 0 { MutationPhase::Applied } else { terminal };
        Self { value, phase, in_flight }
    }

    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LikeState, LikeToggle, Transition};

    #[test]
    fn apply_then_commit_keeps_optimistic_value() {
        let s0 = Snapshot::new(LikeState::new(false, 10));
        let t = LikeToggle::from_clicked(s0.value);
        let s1 = s0.apply(|v| t.apply(v));
        assert_eq!(s1.phase, MutationPhase::Applied);
        assert!(!s1.is_settled());

        let s2 = s1.commit();
        assert_eq!(s2.value, LikeState::new(true, 11));
        assert_eq!(s2.phase, MutationPhase::Committed);
        assert!(s2.is_settled());
    }

    #[test]
    fn apply_then_rollback_restores_previous_value() {
        let s0 = Snapshot::new(LikeState::new(false, 10));
        let t = LikeToggle::from_clicked(s0.value);
        let s2 = s0.apply(|v| t.apply(v)).rollback(|v| t.rollback(v));
        assert_eq!(s2.value, s0.value);
        assert_eq!(s2.phase, MutationPhase::RolledBack);
    }

    #[test]
    fn phase_stays_applied_until_last_mutation_settles() {
        let s0 = Snapshot::new(LikeState::new(false, 10));
        let t = LikeToggle::from_clicked(s0.value);
        let two = s0.apply(|v| t.apply(v)).apply(|v| t.apply(v));
        assert_eq!(two.in_flight, 2);

        let one_left = two.commit();
        assert_eq!(one_left.phase, MutationPhase::Applied);
        assert_eq!(one_left.in_flight, 1);

        let done = one_left.rollback(|v| t.rollback(v));
        assert_eq!(done.phase, MutationPhase::RolledBack);
        assert_eq!(done.value, LikeState::new(false, 10));
        assert!(done.is_settled());
    }

    #[test]
    fn transitions_do_not_touch_the_source_snapshot() {
        let s0 = Snapshot::new(1u32);
        let _ = s0.apply(|v| v + 1);
        assert_eq!(s0, Snapshot::new(1u32));
    }
}
