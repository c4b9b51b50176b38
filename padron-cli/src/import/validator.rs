//! Per-row validation
//!
//! Runs every applicable check for a row and accumulates the failures
//! instead of stopping at the first one, so the operator sees all problems
//! of a row at once. A row with zero failures becomes a candidate record;
//! anything else is rejected with the full message list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::cedula::validate_cedula;
use super::dates::normalize_date;
use super::duplicates::DuplicateIndex;
use super::mapping::{ColumnMapping, ImportField};
use super::resolve::CatalogIndex;
use super::sheet::DataRow;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// A mapped, normalized row ready for submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    /// Physical spreadsheet row (header is row 1)
    pub row: u32,
    pub identifier: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// ISO date or empty when the sheet carried none
    pub birth_date: String,
    pub institution_id: i64,
    pub city_id: i64,
    pub specialty: String,
}

/// Outcome of validating one data row
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Valid(CandidateRecord),
    Rejected {
        row: u32,
        identifier: String,
        name: String,
        errors: Vec<String>,
    },
}

impl RowOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowOutcome::Valid(_))
    }

    pub fn row_number(&self) -> u32 {
        match self {
            RowOutcome::Valid(record) => record.row,
            RowOutcome::Rejected { row, .. } => *row,
        }
    }
}

/// Read-only context shared by all row validations
///
/// Everything here is fully built before the first row is validated.
pub struct RowContext<'a> {
    pub mapping: &'a ColumnMapping,
    pub institutions: &'a CatalogIndex,
    pub cities: &'a CatalogIndex,
    pub duplicates: &'a DuplicateIndex,
}

/// Validate a single row against every constraint class
pub fn validate_row(row: &DataRow, ctx: &RowContext) -> RowOutcome {
    let mut errors: Vec<String> = Vec::new();

    let identifier = ctx.mapping.text(ImportField::Identifier, row);
    if identifier.is_empty() {
        errors.push("identifier is required".to_string());
    } else {
        let check = validate_cedula(&identifier);
        if !check.valid {
            errors.push(check.message);
        }
        let conflicts = ctx.duplicates.identifier_conflicts(row.row_number, &identifier);
        if !conflicts.is_empty() {
            errors.push(format!(
                "identifier is duplicated in row(s) {}",
                join_rows(&conflicts)
            ));
        }
        if ctx.duplicates.identifier_in_corpus(&identifier) {
            errors.push("identifier is already registered".to_string());
        }
    }

    let name = ctx.mapping.text(ImportField::FullName, row);
    if name.is_empty() {
        errors.push("full name is required".to_string());
    }

    let email = ctx.mapping.text(ImportField::Email, row);
    if email.is_empty() {
        errors.push("email is required".to_string());
    } else if !EMAIL.is_match(&email) {
        errors.push("email format is invalid".to_string());
    } else {
        // Duplicate checks only apply to well-formed emails.
        let conflicts = ctx.duplicates.email_conflicts(row.row_number, &email);
        if !conflicts.is_empty() {
            errors.push(format!(
                "email is duplicated in row(s) {}",
                join_rows(&conflicts)
            ));
        }
        if ctx.duplicates.email_in_corpus(&email) {
            errors.push("email is already registered".to_string());
        }
    }

    let institution_name = ctx.mapping.text(ImportField::Institution, row);
    let institution_id = if institution_name.is_empty() {
        errors.push("institution is required".to_string());
        None
    } else {
        let resolved = ctx.institutions.resolve(&institution_name);
        if resolved.is_none() {
            errors.push(format!("institution '{}' not found", institution_name));
        }
        resolved
    };

    let city_name = ctx.mapping.text(ImportField::City, row);
    let city_id = if city_name.is_empty() {
        errors.push("city is required".to_string());
        None
    } else {
        let resolved = ctx.cities.resolve(&city_name);
        if resolved.is_none() {
            errors.push(format!("city '{}' not found", city_name));
        }
        resolved
    };

    let phone = ctx.mapping.text(ImportField::Phone, row);
    let specialty = ctx.mapping.text(ImportField::Specialty, row);
    let birth_date = normalize_date(ctx.mapping.cell(ImportField::BirthDate, row));

    match (errors.is_empty(), institution_id, city_id) {
        (true, Some(institution_id), Some(city_id)) => RowOutcome::Valid(CandidateRecord {
            row: row.row_number,
            identifier,
            name,
            email,
            phone,
            birth_date,
            institution_id,
            city_id,
            specialty,
        }),
        _ => RowOutcome::Rejected {
            row: row.row_number,
            identifier,
            name,
            errors,
        },
    }
}

/// Validate every data row, preserving sheet order
pub fn validate_rows(rows: &[DataRow], ctx: &RowContext) -> Vec<RowOutcome> {
    rows.iter().map(|row| validate_row(row, ctx)).collect()
}

fn join_rows(rows: &[u32]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
