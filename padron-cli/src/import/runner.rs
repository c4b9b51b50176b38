//! Import run orchestration
//!
//! Drives one import end to end: fetch the reference catalogs and the
//! existing-credential corpus, build the read-only indices, validate every
//! row, submit the admissible ones in a single batch-create call, and merge
//! all outcomes into the final report. Row validation itself is pure and
//! synchronous; the catalog fetch and the batch call are the only awaited
//! points.

use anyhow::{Context, Result};

use super::duplicates::DuplicateIndex;
use super::mapping::{ColumnMapping, ImportField, MappingSpec};
use super::report::{ImportReport, local_report, reconcile};
use super::resolve::CatalogIndex;
use super::sheet::SheetData;
use super::validator::{CandidateRecord, RowContext, RowOutcome, validate_rows};
use crate::api::ConsoleApi;

/// Options of one import run
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Validate and partition only; skip the batch-create call
    pub dry_run: bool,
}

/// Run the import pipeline over an ingested sheet
pub async fn run_import(
    api: &dyn ConsoleApi,
    sheet: &SheetData,
    spec: &MappingSpec,
    options: ImportOptions,
) -> Result<ImportReport> {
    let mapping =
        ColumnMapping::resolve(spec, &sheet.headers).context("Column mapping is invalid")?;

    // Independent read-only snapshots; fetched concurrently.
    let (institutions, cities, existing) = tokio::try_join!(
        api.list_institutions(),
        api.list_cities(),
        api.list_existing_credentials(),
    )
    .context("Failed to load reference data from the console")?;

    log::info!(
        "Loaded {} institutions, {} cities, {} existing credentials",
        institutions.len(),
        cities.len(),
        existing.len()
    );

    let institutions = CatalogIndex::build(&institutions);
    let cities = CatalogIndex::build(&cities);

    // The duplicate index must be complete before the first row is
    // validated; it is read-only from here on.
    let batch_keys: Vec<(u32, String, String)> = sheet
        .rows
        .iter()
        .map(|row| {
            (
                row.row_number,
                mapping.text(ImportField::Identifier, row),
                mapping.text(ImportField::Email, row),
            )
        })
        .collect();
    let duplicates = DuplicateIndex::build(&batch_keys, &existing);

    let ctx = RowContext {
        mapping: &mapping,
        institutions: &institutions,
        cities: &cities,
        duplicates: &duplicates,
    };

    let outcomes = validate_rows(&sheet.rows, &ctx);
    let total = outcomes.len();

    let (candidates, rejected): (Vec<RowOutcome>, Vec<RowOutcome>) =
        outcomes.into_iter().partition(|outcome| outcome.is_valid());
    let candidates: Vec<CandidateRecord> = candidates
        .into_iter()
        .filter_map(|outcome| match outcome {
            RowOutcome::Valid(record) => Some(record),
            RowOutcome::Rejected { .. } => None,
        })
        .collect();

    log::info!(
        "Validated {} rows: {} admissible, {} rejected",
        total,
        candidates.len(),
        rejected.len()
    );

    if options.dry_run || candidates.is_empty() {
        // No batch call: dry run, or nothing admissible to submit. The
        // report still itemizes every rejection.
        return Ok(local_report(total, &candidates, &rejected));
    }

    let response = api
        .batch_create_authorities(&candidates)
        .await
        .context("Batch create failed")?;

    Ok(reconcile(total, &candidates, &response, &rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{
        BatchCreateResponse, CatalogEntry, CreatedAuthority, ExistingCredential,
    };
    use crate::import::mapping::ColumnRef;
    use crate::import::sheet::ingest_grid;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// In-memory backend: assigns usernames to every submitted record.
    struct MockConsole {
        existing: Vec<ExistingCredential>,
        submitted: Mutex<Vec<CandidateRecord>>,
        calls: Mutex<usize>,
    }

    impl MockConsole {
        fn new(existing: Vec<ExistingCredential>) -> Self {
            Self {
                existing,
                submitted: Mutex::new(Vec::new()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ConsoleApi for MockConsole {
        async fn list_institutions(&self) -> Result<Vec<CatalogEntry>> {
            Ok(vec![CatalogEntry {
                id: 5,
                name: "Colegio Nacional Quito".to_string(),
            }])
        }

        async fn list_cities(&self) -> Result<Vec<CatalogEntry>> {
            Ok(vec![CatalogEntry {
                id: 1,
                name: "Quito".to_string(),
            }])
        }

        async fn list_existing_credentials(&self) -> Result<Vec<ExistingCredential>> {
            Ok(self.existing.clone())
        }

        async fn batch_create_authorities(
            &self,
            records: &[CandidateRecord],
        ) -> Result<BatchCreateResponse> {
            *self.calls.lock().unwrap() += 1;
            self.submitted.lock().unwrap().extend(records.iter().cloned());
            Ok(BatchCreateResponse {
                successes: records
                    .iter()
                    .map(|record| CreatedAuthority {
                        identifier: record.identifier.clone(),
                        name: record.name.clone(),
                        username: format!("user{}", record.row),
                    })
                    .collect(),
                failures: vec![],
            })
        }
    }

    fn spec() -> MappingSpec {
        MappingSpec {
            identifier: Some(ColumnRef::Index(0)),
            full_name: Some(ColumnRef::Index(1)),
            email: Some(ColumnRef::Index(2)),
            phone: None,
            birth_date: None,
            institution: Some(ColumnRef::Index(3)),
            city: Some(ColumnRef::Index(4)),
            specialty: None,
        }
    }

    fn header_row() -> Vec<Value> {
        ["Cédula", "Nombres", "Correo", "Institución", "Ciudad"]
            .iter()
            .map(|c| json!(*c))
            .collect()
    }

    fn data_row(identifier: &str, name: &str, email: &str, institution: &str) -> Vec<Value> {
        vec![
            json!(identifier),
            json!(name),
            json!(email),
            json!(institution),
            json!("Quito"),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_partition() {
        // Row 2: invalid checksum. Row 3: unresolvable institution.
        // Row 4: fully valid.
        let grid = vec![
            header_row(),
            data_row("1710034064", "Mal Checksum", "a@b.ec", "Colegio Nacional Quito"),
            data_row("0926687856", "Mal Colegio", "b@c.ec", "Instituto Fantasma"),
            data_row("1710034065", "Ana Pérez", "ana@colegio.edu.ec", "Colegio Nacional Quito"),
        ];
        let sheet = ingest_grid(grid).unwrap();
        let console = MockConsole::new(vec![]);

        let report = run_import(&console, &sheet, &spec(), ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.successes.len(), 1);
        // The valid row keeps its physical row number through to the report.
        assert_eq!(report.successes[0].row, 4);
        assert_eq!(report.successes[0].username, "user4");
        // Only the admissible row was submitted.
        assert_eq!(console.submitted.lock().unwrap().len(), 1);
        assert_eq!(*console.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_all_rows_rejected_skips_batch_call() {
        let grid = vec![
            header_row(),
            data_row("123", "Ana", "a@b.ec", "Colegio Nacional Quito"),
        ];
        let sheet = ingest_grid(grid).unwrap();
        let console = MockConsole::new(vec![]);

        let report = run_import(&console, &sheet, &spec(), ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.successes.is_empty());
        assert_eq!(*console.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_backend_call() {
        let grid = vec![
            header_row(),
            data_row("1710034065", "Ana Pérez", "ana@colegio.edu.ec", "Colegio Nacional Quito"),
        ];
        let sheet = ingest_grid(grid).unwrap();
        let console = MockConsole::new(vec![]);

        let report = run_import(&console, &sheet, &spec(), ImportOptions { dry_run: true })
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.successes.len(), 1);
        assert_eq!(report.successes[0].username, "");
        assert_eq!(*console.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_corpus_rejects_duplicates() {
        let grid = vec![
            header_row(),
            data_row("1710034065", "Ana Pérez", "ana@colegio.edu.ec", "Colegio Nacional Quito"),
        ];
        let sheet = ingest_grid(grid).unwrap();
        let console = MockConsole::new(vec![ExistingCredential {
            identifier: "1710034065".to_string(),
            email: "otra@colegio.edu.ec".to_string(),
        }]);

        let report = run_import(&console, &sheet, &spec(), ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("already registered"));
        assert_eq!(*console.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mapping_error_is_fatal() {
        let grid = vec![header_row(), data_row("1710034065", "Ana", "a@b.ec", "X")];
        let sheet = ingest_grid(grid).unwrap();
        let console = MockConsole::new(vec![]);

        let mut bad_spec = spec();
        bad_spec.email = None;
        let result = run_import(&console, &sheet, &bad_spec, ImportOptions::default()).await;
        assert!(result.is_err());
    }
}
