//! Column mapping from spreadsheet columns to roster fields
//!
//! The operator declares which spreadsheet column feeds each logical field
//! in a TOML mapping file. Columns may be referenced by header text
//! (case-insensitive) or by 0-based index; the resolved mapping is checked
//! against the actual header row before any validation runs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sheet::{ColumnHeader, DataRow, cell_to_string};

/// Logical fields of a roster row, in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportField {
    Identifier,
    FullName,
    Email,
    Phone,
    BirthDate,
    Institution,
    City,
    Specialty,
}

impl ImportField {
    pub const ALL: [ImportField; 8] = [
        ImportField::Identifier,
        ImportField::FullName,
        ImportField::Email,
        ImportField::Phone,
        ImportField::BirthDate,
        ImportField::Institution,
        ImportField::City,
        ImportField::Specialty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ImportField::Identifier => "identifier",
            ImportField::FullName => "full name",
            ImportField::Email => "email",
            ImportField::Phone => "phone",
            ImportField::BirthDate => "birth date",
            ImportField::Institution => "institution",
            ImportField::City => "city",
            ImportField::Specialty => "specialty",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            ImportField::Identifier
                | ImportField::FullName
                | ImportField::Email
                | ImportField::Institution
                | ImportField::City
        )
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// A column reference in the mapping file: header text or 0-based index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Header(String),
}

/// The mapping file as written by the operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingSpec {
    pub identifier: Option<ColumnRef>,
    pub full_name: Option<ColumnRef>,
    pub email: Option<ColumnRef>,
    pub phone: Option<ColumnRef>,
    pub birth_date: Option<ColumnRef>,
    pub institution: Option<ColumnRef>,
    pub city: Option<ColumnRef>,
    pub specialty: Option<ColumnRef>,
}

impl MappingSpec {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse mapping file: {}", path.display()))
    }

    fn column_ref(&self, field: ImportField) -> Option<&ColumnRef> {
        match field {
            ImportField::Identifier => self.identifier.as_ref(),
            ImportField::FullName => self.full_name.as_ref(),
            ImportField::Email => self.email.as_ref(),
            ImportField::Phone => self.phone.as_ref(),
            ImportField::BirthDate => self.birth_date.as_ref(),
            ImportField::Institution => self.institution.as_ref(),
            ImportField::City => self.city.as_ref(),
            ImportField::Specialty => self.specialty.as_ref(),
        }
    }

    /// Annotated template written by `import template`
    pub fn template() -> &'static str {
        r#"# Column mapping for padron-cli import.
# Reference columns by header text (case-insensitive) or 0-based index.
# identifier, full_name, email, institution and city are required;
# remove the other keys to leave their fields unmapped.

identifier = "Cédula"
full_name = "Nombres"
email = "Correo"
phone = "Teléfono"
birth_date = "Fecha de nacimiento"
institution = "Institución"
city = "Ciudad"
specialty = "Especialidad"
"#
    }
}

/// Errors resolving a mapping against the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A required field has no column reference in the mapping file
    MissingRequired { field: &'static str },
    /// A header reference matches no column in the sheet
    UnknownHeader { field: &'static str, header: String },
    /// An index reference points past the last column
    IndexOutOfBounds {
        field: &'static str,
        index: usize,
        columns: usize,
    },
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::MissingRequired { field } => {
                write!(f, "mapping for required field '{}' is missing", field)
            }
            MappingError::UnknownHeader { field, header } => {
                write!(
                    f,
                    "mapping for '{}' references header '{}' which is not in the sheet",
                    field, header
                )
            }
            MappingError::IndexOutOfBounds {
                field,
                index,
                columns,
            } => {
                write!(
                    f,
                    "mapping for '{}' references column {} but the sheet has {} columns",
                    field, index, columns
                )
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// A mapping resolved against a concrete header row
///
/// Invariant: every mapped slot holds an index inside the header's bounds.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    columns: [Option<usize>; 8],
}

impl ColumnMapping {
    /// Resolve the operator's mapping spec against the sheet headers
    pub fn resolve(spec: &MappingSpec, headers: &[ColumnHeader]) -> Result<Self, MappingError> {
        let mut columns = [None; 8];

        for field in ImportField::ALL {
            let column = match spec.column_ref(field) {
                Some(ColumnRef::Index(index)) => {
                    if *index >= headers.len() {
                        return Err(MappingError::IndexOutOfBounds {
                            field: field.label(),
                            index: *index,
                            columns: headers.len(),
                        });
                    }
                    Some(*index)
                }
                Some(ColumnRef::Header(header)) => {
                    let wanted = header.trim();
                    let found = headers
                        .iter()
                        .find(|h| h.display_name.trim().eq_ignore_ascii_case(wanted))
                        .map(|h| h.index);
                    match found {
                        Some(index) => Some(index),
                        None => {
                            return Err(MappingError::UnknownHeader {
                                field: field.label(),
                                header: header.clone(),
                            });
                        }
                    }
                }
                None => None,
            };

            if column.is_none() && field.is_required() {
                return Err(MappingError::MissingRequired {
                    field: field.label(),
                });
            }

            columns[field.slot()] = column;
        }

        Ok(Self { columns })
    }

    pub fn column(&self, field: ImportField) -> Option<usize> {
        self.columns[field.slot()]
    }

    /// The raw cell a field maps to in a row (Null when unmapped or absent)
    pub fn cell<'a>(&self, field: ImportField, row: &'a DataRow) -> &'a Value {
        static NULL_CELL: Value = Value::Null;
        self.column(field)
            .and_then(|index| row.cells.get(index))
            .unwrap_or(&NULL_CELL)
    }

    /// The field's cell rendered as trimmed text ("" when unmapped/absent)
    pub fn text(&self, field: ImportField, row: &DataRow) -> String {
        cell_to_string(self.cell(field, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<ColumnHeader> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| ColumnHeader {
                index,
                display_name: name.to_string(),
            })
            .collect()
    }

    fn full_spec() -> MappingSpec {
        MappingSpec {
            identifier: Some(ColumnRef::Header("Cédula".into())),
            full_name: Some(ColumnRef::Header("Nombres".into())),
            email: Some(ColumnRef::Header("Correo".into())),
            phone: None,
            birth_date: Some(ColumnRef::Index(3)),
            institution: Some(ColumnRef::Header("Institución".into())),
            city: Some(ColumnRef::Header("Ciudad".into())),
            specialty: None,
        }
    }

    const HEADERS: [&str; 6] = ["Cédula", "Nombres", "Correo", "Nacimiento", "Institución", "Ciudad"];

    #[test]
    fn test_resolve_by_header_and_index() {
        let mapping = ColumnMapping::resolve(&full_spec(), &headers(&HEADERS)).unwrap();
        assert_eq!(mapping.column(ImportField::Identifier), Some(0));
        assert_eq!(mapping.column(ImportField::BirthDate), Some(3));
        assert_eq!(mapping.column(ImportField::Phone), None);
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let mut spec = full_spec();
        spec.identifier = Some(ColumnRef::Header("  cédula ".into()));
        let mapping = ColumnMapping::resolve(&spec, &headers(&HEADERS)).unwrap();
        assert_eq!(mapping.column(ImportField::Identifier), Some(0));
    }

    #[test]
    fn test_missing_required_field() {
        let mut spec = full_spec();
        spec.email = None;
        let err = ColumnMapping::resolve(&spec, &headers(&HEADERS)).unwrap_err();
        assert_eq!(err, MappingError::MissingRequired { field: "email" });
    }

    #[test]
    fn test_unknown_header() {
        let mut spec = full_spec();
        spec.city = Some(ColumnRef::Header("Provincia".into()));
        let err = ColumnMapping::resolve(&spec, &headers(&HEADERS)).unwrap_err();
        assert!(matches!(err, MappingError::UnknownHeader { field: "city", .. }));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut spec = full_spec();
        spec.birth_date = Some(ColumnRef::Index(99));
        let err = ColumnMapping::resolve(&spec, &headers(&HEADERS)).unwrap_err();
        assert!(matches!(err, MappingError::IndexOutOfBounds { index: 99, .. }));
    }

    #[test]
    fn test_cell_and_text_extraction() {
        let mapping = ColumnMapping::resolve(&full_spec(), &headers(&HEADERS)).unwrap();
        let row = DataRow {
            row_number: 2,
            cells: vec![
                json!("1710034065"),
                json!("  Ana Pérez "),
                Value::Null,
            ],
        };

        assert_eq!(mapping.text(ImportField::Identifier, &row), "1710034065");
        assert_eq!(mapping.text(ImportField::FullName, &row), "Ana Pérez");
        // Mapped but absent in this short row.
        assert_eq!(mapping.text(ImportField::Email, &row), "");
        // Unmapped field.
        assert_eq!(mapping.text(ImportField::Phone, &row), "");
        assert_eq!(*mapping.cell(ImportField::BirthDate, &row), Value::Null);
    }

    #[test]
    fn test_template_parses() {
        let spec: MappingSpec = toml::from_str(MappingSpec::template()).unwrap();
        assert_eq!(spec.identifier, Some(ColumnRef::Header("Cédula".into())));
        assert_eq!(spec.specialty, Some(ColumnRef::Header("Especialidad".into())));
    }
}
