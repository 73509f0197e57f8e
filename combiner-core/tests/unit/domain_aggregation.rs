use combiner_core::domain::{aggregate_failures, majority_status, ErrorClassification, SignerFailure};

fn failures(statuses: &[u16]) -> Vec<SignerFailure> {
    statuses
        .iter()
        .enumerate()
        .map(|(idx, status)| SignerFailure {
            url: format!("http://signer-{idx}"),
            status: *status,
            classification: ErrorClassification::from_status(*status),
        })
        .collect()
}

#[test]
fn majority_wins_over_arrival_order() {
    assert_eq!(majority_status(&failures(&[500, 429, 500])), Some(500));
    assert_eq!(majority_status(&failures(&[429, 500, 500])), Some(500));
}

#[test]
fn first_seen_breaks_ties() {
    assert_eq!(majority_status(&failures(&[429, 500])), Some(429));
    assert_eq!(majority_status(&failures(&[500, 429])), Some(500));
    assert_eq!(majority_status(&failures(&[403, 429, 500, 502])), Some(403));
}

#[test]
fn aggregate_defaults_when_empty() {
    let aggregated = aggregate_failures(&[]);
    assert_eq!(aggregated.status, 500);
    assert!(aggregated.classification.is_none());
}

#[test]
fn aggregate_carries_classification_of_majority() {
    let aggregated = aggregate_failures(&failures(&[401, 401, 500]));
    assert_eq!(aggregated.status, 401);
    assert_eq!(aggregated.classification, Some(ErrorClassification::Unauthenticated));
}
