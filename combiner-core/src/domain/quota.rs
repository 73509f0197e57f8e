use crate::domain::model::{AccountQuota, DomainState};

/// Combines per-signer quota states into the state at least `threshold` signers agree on.
///
/// More than `total - threshold` disabled reports means fewer than `threshold` signers
/// could still serve the domain, so it is reported disabled. Otherwise enabled states are
/// ordered by `(counter, timer)` and the `threshold`-th least restrictive one is returned.
pub fn threshold_domain_state(states: &[DomainState], threshold: usize, total: usize) -> DomainState {
    let max_now = states.iter().map(|s| s.now).max().unwrap_or(0);
    let disabled = states.iter().filter(|s| s.disabled).count();
    if threshold == 0 || disabled > total.saturating_sub(threshold) {
        return DomainState::disabled_at(max_now);
    }

    let mut enabled: Vec<DomainState> = states.iter().filter(|s| !s.disabled).copied().collect();
    if enabled.len() < threshold {
        return DomainState::disabled_at(max_now);
    }
    enabled.sort_by_key(|s| (s.counter, s.timer));
    enabled[threshold - 1]
}

/// Combines per-signer account quotas into the allowance at least `threshold` signers grant.
///
/// Query count and total quota are taken independently: the `threshold`-th lowest count
/// and the `threshold`-th highest total. Block number is the highest seen.
pub fn threshold_account_quota(quotas: &[AccountQuota], threshold: usize) -> Option<AccountQuota> {
    if threshold == 0 || quotas.len() < threshold {
        return None;
    }
    let mut counts: Vec<u64> = quotas.iter().map(|q| q.performed_query_count).collect();
    counts.sort_unstable();
    let mut totals: Vec<u64> = quotas.iter().map(|q| q.total_quota).collect();
    totals.sort_unstable_by(|a, b| b.cmp(a));
    Some(AccountQuota {
        performed_query_count: counts[threshold - 1],
        total_quota: totals[threshold - 1],
        block_number: quotas.iter().filter_map(|q| q.block_number).max(),
    })
}
