use combiner_core::domain::{threshold_domain_state, DomainState};

fn enabled(counter: u64, timer: u64) -> DomainState {
    DomainState { timer, counter, disabled: false, now: 1_000 }
}

#[test]
fn threshold_state_is_order_independent() {
    let mut states = vec![enabled(7, 3), enabled(1, 9), enabled(4, 2), enabled(2, 2), enabled(9, 0)];
    let forward = threshold_domain_state(&states, 3, 5);
    states.reverse();
    assert_eq!(threshold_domain_state(&states, 3, 5), forward);
    assert_eq!(forward.counter, 4);
}

#[test]
fn t_of_t_reports_most_restrictive() {
    let states = vec![enabled(1, 0), enabled(6, 0), enabled(3, 0)];
    assert_eq!(threshold_domain_state(&states, 3, 3).counter, 6);
}

#[test]
fn too_few_enabled_states_is_disabled() {
    let states = vec![enabled(1, 0)];
    let combined = threshold_domain_state(&states, 2, 3);
    assert!(combined.disabled);
    assert_eq!(combined.now, 1_000);
}

#[test]
fn disabled_beyond_tolerance_wins() {
    let mut states = vec![enabled(1, 0), enabled(2, 0), enabled(3, 0)];
    states.push(DomainState { disabled: true, now: 2_000, ..DomainState::default() });
    states.push(DomainState { disabled: true, now: 1_500, ..DomainState::default() });
    // n=5, t=4 tolerates a single disabled signer.
    let combined = threshold_domain_state(&states, 4, 5);
    assert!(combined.disabled);
    assert_eq!(combined.now, 2_000);
    assert_eq!(combined.counter, 0);
}
