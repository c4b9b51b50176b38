//! Merging local and backend outcomes into the final import report

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::duplicates::normalize_identifier;
use super::validator::{CandidateRecord, RowOutcome};
use crate::api::models::BatchCreateResponse;

/// A row the backend persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedRow {
    pub row: u32,
    pub identifier: String,
    pub name: String,
    pub username: String,
}

/// A row rejected locally or by the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: u32,
    pub identifier: String,
    pub name: String,
    pub error: String,
}

/// Terminal artifact of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub successes: Vec<AcceptedRow>,
    pub failures: Vec<RejectedRow>,
}

/// Merge backend per-item outcomes with the locally rejected rows
///
/// Backend outcomes are traced back to spreadsheet rows through the
/// identifier echoed in each descriptor; candidates reaching submission are
/// identifier-unique, so the lookup is unambiguous. A submitted candidate
/// the backend reported in neither list is surfaced as a failure rather
/// than silently dropped. Failures list backend rejections first, then the
/// local ones, each with its messages joined.
pub fn reconcile(
    total: usize,
    submitted: &[CandidateRecord],
    response: &BatchCreateResponse,
    rejected: &[RowOutcome],
) -> ImportReport {
    let row_by_identifier: HashMap<String, u32> = submitted
        .iter()
        .map(|record| (normalize_identifier(&record.identifier), record.row))
        .collect();
    let row_for = |identifier: &str| {
        row_by_identifier
            .get(&normalize_identifier(identifier))
            .copied()
            .unwrap_or(0)
    };

    let mut reported: HashSet<String> = HashSet::new();

    let successes: Vec<AcceptedRow> = response
        .successes
        .iter()
        .map(|created| {
            reported.insert(normalize_identifier(&created.identifier));
            AcceptedRow {
                row: row_for(&created.identifier),
                identifier: created.identifier.clone(),
                name: created.name.clone(),
                username: created.username.clone(),
            }
        })
        .collect();

    let mut failures: Vec<RejectedRow> = response
        .failures
        .iter()
        .map(|failed| {
            reported.insert(normalize_identifier(&failed.identifier));
            RejectedRow {
                row: row_for(&failed.identifier),
                identifier: failed.identifier.clone(),
                name: failed.name.clone(),
                error: failed.error.clone(),
            }
        })
        .collect();

    for record in submitted {
        if !reported.contains(&normalize_identifier(&record.identifier)) {
            log::warn!(
                "Backend reported no outcome for row {} ({})",
                record.row,
                record.identifier
            );
            failures.push(RejectedRow {
                row: record.row,
                identifier: record.identifier.clone(),
                name: record.name.clone(),
                error: "backend reported no outcome for this record".to_string(),
            });
        }
    }

    failures.extend(rejected.iter().filter_map(local_failure));

    ImportReport {
        total,
        successes,
        failures,
    }
}

/// Build the report of a run that made no backend call, either because it
/// was a dry run or because nothing was admissible. Admissible rows are
/// reported as would-be successes without a username.
pub fn local_report(
    total: usize,
    candidates: &[CandidateRecord],
    rejected: &[RowOutcome],
) -> ImportReport {
    ImportReport {
        total,
        successes: candidates
            .iter()
            .map(|record| AcceptedRow {
                row: record.row,
                identifier: record.identifier.clone(),
                name: record.name.clone(),
                username: String::new(),
            })
            .collect(),
        failures: rejected.iter().filter_map(local_failure).collect(),
    }
}

fn local_failure(outcome: &RowOutcome) -> Option<RejectedRow> {
    match outcome {
        RowOutcome::Rejected {
            row,
            identifier,
            name,
            errors,
        } => Some(RejectedRow {
            row: *row,
            identifier: identifier.clone(),
            name: name.clone(),
            error: errors.join("; "),
        }),
        RowOutcome::Valid(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{CreatedAuthority, FailedAuthority};

    fn candidate(row: u32, identifier: &str, name: &str) -> CandidateRecord {
        CandidateRecord {
            row,
            identifier: identifier.to_string(),
            name: name.to_string(),
            email: format!("{}@colegio.edu.ec", identifier),
            phone: String::new(),
            birth_date: String::new(),
            institution_id: 5,
            city_id: 1,
            specialty: String::new(),
        }
    }

    fn rejection(row: u32, identifier: &str, errors: &[&str]) -> RowOutcome {
        RowOutcome::Rejected {
            row,
            identifier: identifier.to_string(),
            name: format!("Person {}", row),
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_reconcile_merges_backend_and_local_outcomes() {
        let submitted = vec![candidate(4, "1710034065", "Ana Pérez")];
        let response = BatchCreateResponse {
            successes: vec![CreatedAuthority {
                identifier: "1710034065".to_string(),
                name: "Ana Pérez".to_string(),
                username: "aperez".to_string(),
            }],
            failures: vec![],
        };
        let rejected = vec![
            rejection(2, "1710034064", &["cédula check digit does not match"]),
            rejection(3, "0926687856", &["institution 'X' not found", "city 'Y' not found"]),
        ];

        let report = reconcile(3, &submitted, &response, &rejected);

        assert_eq!(report.total, 3);
        assert_eq!(report.successes.len(), 1);
        assert_eq!(report.failures.len(), 2);
        // Row numbers trace back to physical spreadsheet lines.
        assert_eq!(report.successes[0].row, 4);
        assert_eq!(report.successes[0].username, "aperez");
        assert_eq!(report.failures[0].row, 2);
        assert_eq!(report.failures[1].row, 3);
        assert_eq!(
            report.failures[1].error,
            "institution 'X' not found; city 'Y' not found"
        );
    }

    #[test]
    fn test_backend_failures_precede_local_rejections() {
        let submitted = vec![
            candidate(2, "1710034065", "Ana Pérez"),
            candidate(3, "0926687856", "Luis Mora"),
        ];
        let response = BatchCreateResponse {
            successes: vec![CreatedAuthority {
                identifier: "1710034065".to_string(),
                name: "Ana Pérez".to_string(),
                username: "aperez".to_string(),
            }],
            failures: vec![FailedAuthority {
                identifier: "0926687856".to_string(),
                name: "Luis Mora".to_string(),
                error: "username pool exhausted".to_string(),
            }],
        };
        let rejected = vec![rejection(4, "", &["identifier is required"])];

        let report = reconcile(3, &submitted, &response, &rejected);

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].row, 3);
        assert_eq!(report.failures[0].error, "username pool exhausted");
        assert_eq!(report.failures[1].row, 4);
    }

    #[test]
    fn test_unreported_candidate_becomes_failure() {
        let submitted = vec![
            candidate(2, "1710034065", "Ana Pérez"),
            candidate(3, "0926687856", "Luis Mora"),
        ];
        let response = BatchCreateResponse {
            successes: vec![CreatedAuthority {
                identifier: "1710034065".to_string(),
                name: "Ana Pérez".to_string(),
                username: "aperez".to_string(),
            }],
            failures: vec![],
        };

        let report = reconcile(2, &submitted, &response, &[]);

        assert_eq!(report.successes.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 3);
        assert!(report.failures[0].error.contains("no outcome"));
    }

    #[test]
    fn test_identifier_matching_ignores_formatting() {
        let submitted = vec![candidate(2, "171003406-5", "Ana Pérez")];
        let response = BatchCreateResponse {
            successes: vec![CreatedAuthority {
                identifier: "1710034065".to_string(),
                name: "Ana Pérez".to_string(),
                username: "aperez".to_string(),
            }],
            failures: vec![],
        };

        let report = reconcile(1, &submitted, &response, &[]);
        assert_eq!(report.successes[0].row, 2);
    }

    #[test]
    fn test_local_report() {
        let candidates = vec![candidate(2, "1710034065", "Ana Pérez")];
        let rejected = vec![rejection(3, "bad", &["identifier is required"])];

        let report = local_report(2, &candidates, &rejected);

        assert_eq!(report.total, 2);
        assert_eq!(report.successes.len(), 1);
        assert_eq!(report.successes[0].username, "");
        assert_eq!(report.failures.len(), 1);
    }
}
