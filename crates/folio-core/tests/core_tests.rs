use folio_core::{
    ChangeKind, Fingerprint, FollowState, FollowToggle, LikeState, LikeToggle, MutationOutcome, MutationPhase,
    PendingPolicy, RemoteError, RetryPolicy, Snapshot, Transition,
};

#[test]
fn test_mutation_phase_serde() {
    let serialized = serde_json::to_string(&MutationPhase::RolledBack).unwrap();
    assert_eq!(serialized, r#""rolled_back""#);
    let deserialized: MutationPhase = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, MutationPhase::RolledBack);
}

#[test]
fn test_pending_policy_serde() {
    let policy: PendingPolicy = serde_json::from_str(r#""reject_while_pending""#).unwrap();
    assert_eq!(policy, PendingPolicy::RejectWhilePending);
    assert_eq!(PendingPolicy::default(), PendingPolicy::Allow);
}

#[test]
fn test_change_kind_serde() {
    assert_eq!(serde_json::to_string(&ChangeKind::Delete).unwrap(), r#""delete""#);
}

#[test]
fn test_retry_policy_serde() {
    let policy: RetryPolicy =
        serde_json::from_str(r#"{"max_attempts":5,"delay":{"strategy":"exponential","base_ms":50,"max_ms":400}}"#).unwrap();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay_before(3), std::time::Duration::from_millis(100));
}

#[test]
fn test_like_snapshot_lifecycle() {
    let s0 = Snapshot::new(LikeState::new(true, 11));
    let unlike = LikeToggle::from_clicked(s0.value);
    let applied = s0.apply(|v| unlike.apply(v));
    assert_eq!(applied.value, LikeState::new(false, 10));
    let committed = applied.commit();
    assert_eq!(committed.value, LikeState::new(false, 10));
    assert!(committed.phase.is_terminal());
}

#[test]
fn test_follow_rollback_twice_matches_once() {
    let before = FollowState::new(true, 7);
    let t = FollowToggle::from_clicked(before);
    let applied = Snapshot::new(before).apply(|v| t.apply(v));
    let once = applied.rollback(|v| t.rollback(v));
    let twice = once.rollback(|v| t.rollback(v));
    assert_eq!(once.value, twice.value);
    assert_eq!(twice.value, before);
}

#[test]
fn test_outcome_carries_pending_fingerprint() {
    let fp = Fingerprint::new("follow", "author-3");
    let outcome: MutationOutcome<()> = MutationOutcome::RolledBack(RemoteError::Pending(fp.clone()));
    assert_eq!(outcome.error(), Some(&RemoteError::Pending(fp)));
}
