//! Spreadsheet ingestion
//!
//! Loads .xlsx (calamine) or .csv files into a uniform grid of JSON cell
//! values, then splits the grid into a header descriptor list and the
//! non-empty data rows. Cell types are preserved so numeric cells can later
//! be recognized as legacy serial dates.

use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx, open_workbook};
use serde_json::{Value, json};

/// Fatal ingestion failures that abort the import before any row validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// The sheet has no data rows below the header
    NoDataRows,
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::NoDataRows => {
                write!(f, "the sheet has no data rows below the header")
            }
        }
    }
}

impl std::error::Error for SheetError {}

/// One header cell of the uploaded sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub index: usize,
    pub display_name: String,
}

/// One non-empty data row, keyed by its physical spreadsheet line
///
/// Row numbers are 1-based and count the header as row 1, so the first data
/// row is row 2. Blank rows are dropped but the numbering of the surviving
/// rows is preserved.
#[derive(Debug, Clone)]
pub struct DataRow {
    pub row_number: u32,
    pub cells: Vec<Value>,
}

/// An ingested sheet: header descriptors plus the surviving data rows
#[derive(Debug, Clone)]
pub struct SheetData {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<DataRow>,
}

/// Split a raw grid into headers and non-empty data rows
///
/// Row 0 is the header; blank header cells synthesize "Column N" names.
/// Fails before any validation when the grid has fewer than two physical
/// rows.
pub fn ingest_grid(grid: Vec<Vec<Value>>) -> Result<SheetData, SheetError> {
    if grid.len() < 2 {
        return Err(SheetError::NoDataRows);
    }

    let headers = grid[0]
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let text = cell_to_string(cell);
            let display_name = if text.is_empty() {
                format!("Column {}", index + 1)
            } else {
                text
            };
            ColumnHeader {
                index,
                display_name,
            }
        })
        .collect();

    let rows: Vec<DataRow> = grid
        .into_iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cells)| !cells.iter().all(cell_is_empty))
        .map(|(grid_index, cells)| DataRow {
            row_number: (grid_index + 1) as u32,
            cells,
        })
        .collect();

    log::debug!("Ingested sheet: {} data rows", rows.len());

    Ok(SheetData { headers, rows })
}

fn cell_is_empty(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Render a cell as trimmed text ("" for absent cells)
///
/// Whole-number cells print without a trailing ".0" so identifiers and
/// phone numbers read back the way they were typed.
pub fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    format!("{}", f as i64)
                } else {
                    format!("{}", f)
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Convert a calamine cell to a JSON value
///
/// Date cells keep their serial number representation so the date
/// normalizer can apply the legacy epoch conversion.
fn excel_cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => json!(*i),
        Data::Float(f) => json!(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => json!(dt.as_f64()),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

/// Load a spreadsheet file into a raw grid, dispatching on the extension
pub fn load_grid<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Vec<Vec<Value>>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv_grid(path)
    } else {
        read_xlsx_grid(path, sheet)
    }
}

fn read_xlsx_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<Value>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|n| n == name) {
                bail!(
                    "Sheet '{}' not found in {} (available: {})",
                    name,
                    path.display(),
                    sheet_names.join(", ")
                );
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .with_context(|| format!("Workbook has no sheets: {}", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(excel_cell_to_value).collect())
        .collect())
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<Value>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read CSV row in {}", path.display()))?;
        let cells = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }

    Ok(grid)
}
