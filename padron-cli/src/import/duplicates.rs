//! Duplicate detection indices for uniqueness-sensitive fields
//!
//! Two fields must be unique across the system: the identifier and the
//! email. Each gets two read-only indices built once per import run: an
//! intra-batch index (normalized value -> rows where it occurs) and a corpus
//! set of values already persisted in the backend. Row validation only reads
//! these, never mutates them.

use std::collections::{HashMap, HashSet};

use crate::api::models::ExistingCredential;

/// Normalize an identifier for duplicate comparison
///
/// Keeps digits only, so "171003406-5" and "1710034065" collide. Falls back
/// to the trimmed lowercase string when no digits are present.
pub fn normalize_identifier(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        raw.trim().to_lowercase()
    } else {
        digits
    }
}

/// Normalize an email for duplicate comparison
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Per-field duplicate index
#[derive(Debug, Default)]
struct FieldIndex {
    batch: HashMap<String, Vec<u32>>,
    corpus: HashSet<String>,
}

impl FieldIndex {
    fn insert_batch(&mut self, normalized: String, row: u32) {
        if normalized.is_empty() {
            return;
        }
        self.batch.entry(normalized).or_default().push(row);
    }

    fn insert_corpus(&mut self, normalized: String) {
        if !normalized.is_empty() {
            self.corpus.insert(normalized);
        }
    }

    /// Other rows in this batch carrying the same normalized value
    fn conflicts(&self, row: u32, normalized: &str) -> Vec<u32> {
        if normalized.is_empty() {
            return Vec::new();
        }
        match self.batch.get(normalized) {
            Some(rows) if rows.len() > 1 => {
                rows.iter().copied().filter(|r| *r != row).collect()
            }
            _ => Vec::new(),
        }
    }

    fn in_corpus(&self, normalized: &str) -> bool {
        !normalized.is_empty() && self.corpus.contains(normalized)
    }

    fn collision_count(&self) -> usize {
        self.batch.values().filter(|rows| rows.len() > 1).count()
    }
}

/// Read-only duplicate indices for one import run
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    identifiers: FieldIndex,
    emails: FieldIndex,
}

impl DuplicateIndex {
    /// Build the indices from the batch rows and the existing corpus
    ///
    /// `batch` yields `(row_number, raw identifier, raw email)` for every
    /// data row in the upload; rows with blank values are not indexed.
    pub fn build(batch: &[(u32, String, String)], existing: &[ExistingCredential]) -> Self {
        let mut index = Self::default();

        for (row, identifier, email) in batch {
            index
                .identifiers
                .insert_batch(normalize_identifier(identifier), *row);
            index.emails.insert_batch(normalize_email(email), *row);
        }

        for credential in existing {
            index
                .identifiers
                .insert_corpus(normalize_identifier(&credential.identifier));
            index.emails.insert_corpus(normalize_email(&credential.email));
        }

        log::info!(
            "Duplicate index built: {} corpus identifiers, {} corpus emails, {} batch identifier collisions, {} batch email collisions",
            index.identifiers.corpus.len(),
            index.emails.corpus.len(),
            index.identifiers.collision_count(),
            index.emails.collision_count(),
        );

        index
    }

    /// Other batch rows sharing this identifier, ascending
    pub fn identifier_conflicts(&self, row: u32, raw: &str) -> Vec<u32> {
        let mut rows = self.identifiers.conflicts(row, &normalize_identifier(raw));
        rows.sort_unstable();
        rows
    }

    pub fn identifier_in_corpus(&self, raw: &str) -> bool {
        self.identifiers.in_corpus(&normalize_identifier(raw))
    }

    /// Other batch rows sharing this email, ascending
    pub fn email_conflicts(&self, row: u32, raw: &str) -> Vec<u32> {
        let mut rows = self.emails.conflicts(row, &normalize_email(raw));
        rows.sort_unstable();
        rows
    }

    pub fn email_in_corpus(&self, raw: &str) -> bool {
        self.emails.in_corpus(&normalize_email(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(identifier: &str, email: &str) -> ExistingCredential {
        ExistingCredential {
            identifier: identifier.to_string(),
            email: email.to_string(),
        }
    }

    fn batch_row(row: u32, identifier: &str, email: &str) -> (u32, String, String) {
        (row, identifier.to_string(), email.to_string())
    }

    #[test]
    fn test_normalize_identifier_keeps_digits() {
        assert_eq!(normalize_identifier("171003406-5"), "1710034065");
        assert_eq!(normalize_identifier(" 1710034065 "), "1710034065");
        assert_eq!(normalize_identifier("ABC"), "abc");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn test_intra_batch_conflicts_reference_other_rows() {
        let batch = vec![
            batch_row(2, "1710034065", "a@b.com"),
            batch_row(3, "0926687856", "A@B.COM"),
            batch_row(4, "0604234568", "c@d.com"),
        ];
        let index = DuplicateIndex::build(&batch, &[]);

        // Each duplicated row lists the other row, not itself.
        assert_eq!(index.email_conflicts(2, "a@b.com"), vec![3]);
        assert_eq!(index.email_conflicts(3, "A@B.COM"), vec![2]);
        assert_eq!(index.email_conflicts(4, "c@d.com"), Vec::<u32>::new());
    }

    #[test]
    fn test_corpus_membership_is_independent_of_batch() {
        let batch = vec![batch_row(2, "1710034065", "new@school.edu")];
        let existing = vec![credential("1710034065", "old@school.edu")];
        let index = DuplicateIndex::build(&batch, &existing);

        assert!(index.identifier_in_corpus("1710034065"));
        assert!(index.identifier_in_corpus("171003406-5"));
        assert!(!index.identifier_in_corpus("0926687856"));
        assert!(index.email_in_corpus("OLD@school.edu"));
        assert!(!index.email_in_corpus("new@school.edu"));
    }

    #[test]
    fn test_blank_values_never_collide() {
        let batch = vec![
            batch_row(2, "", ""),
            batch_row(3, "  ", "   "),
        ];
        let index = DuplicateIndex::build(&batch, &[]);

        assert_eq!(index.identifier_conflicts(2, ""), Vec::<u32>::new());
        assert_eq!(index.email_conflicts(3, "   "), Vec::<u32>::new());
        assert!(!index.email_in_corpus(""));
    }

    #[test]
    fn test_three_way_collision_lists_both_other_rows() {
        let batch = vec![
            batch_row(2, "1", "x@y.com"),
            batch_row(5, "2", "x@y.com"),
            batch_row(9, "3", "x@y.com"),
        ];
        let index = DuplicateIndex::build(&batch, &[]);

        assert_eq!(index.email_conflicts(5, "x@y.com"), vec![2, 9]);
    }
}
