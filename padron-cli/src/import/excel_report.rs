//! Excel export of the import report
//!
//! Writes the final report to a workbook the operator can archive or send
//! back to the school: a summary sheet with the run totals, the accepted
//! rows with their assigned usernames, and the rejected rows with their
//! error messages.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use super::report::ImportReport;

pub fn export_report_to_excel(report: &ImportReport, file_path: &str) -> Result<()> {
    let mut workbook = Workbook::new();

    create_summary_sheet(&mut workbook, report)?;
    create_accepted_sheet(&mut workbook, report)?;
    create_rejected_sheet(&mut workbook, report)?;

    workbook
        .save(file_path)
        .with_context(|| format!("Failed to save Excel file: {}", file_path))?;

    log::info!("Import report exported to: {}", file_path);
    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
}

fn create_summary_sheet(workbook: &mut Workbook, report: &ImportReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;

    let title_format = Format::new().set_bold().set_font_size(16);
    let bold_format = Format::new().set_bold();

    sheet.write_string_with_format(0, 0, "Roster Import Report", &title_format)?;
    sheet.write_string(
        1,
        0,
        &format!(
            "Generated: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
    )?;

    sheet.write_string_with_format(3, 0, "Metric", &bold_format)?;
    sheet.write_string_with_format(3, 1, "Value", &bold_format)?;

    sheet.write_string(4, 0, "Rows processed")?;
    sheet.write_number(4, 1, report.total as f64)?;
    sheet.write_string(5, 0, "Accepted")?;
    sheet.write_number(5, 1, report.successes.len() as f64)?;
    sheet.write_string(6, 0, "Rejected")?;
    sheet.write_number(6, 1, report.failures.len() as f64)?;

    sheet.autofit();
    Ok(())
}

fn create_accepted_sheet(workbook: &mut Workbook, report: &ImportReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Accepted")?;

    write_headers(sheet, &["Row", "Identifier", "Name", "Username"])?;

    let mut row = 1u32;
    if report.successes.is_empty() {
        sheet.write_string(row, 0, "No rows were accepted")?;
    } else {
        for accepted in &report.successes {
            sheet.write_number(row, 0, accepted.row as f64)?;
            sheet.write_string(row, 1, &accepted.identifier)?;
            sheet.write_string(row, 2, &accepted.name)?;
            sheet.write_string(row, 3, &accepted.username)?;
            row += 1;
        }
    }

    sheet.autofit();
    Ok(())
}

fn create_rejected_sheet(workbook: &mut Workbook, report: &ImportReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rejected")?;

    write_headers(sheet, &["Row", "Identifier", "Name", "Error"])?;

    let mut row = 1u32;
    if report.failures.is_empty() {
        sheet.write_string(row, 0, "No rows were rejected")?;
    } else {
        for rejected in &report.failures {
            sheet.write_number(row, 0, rejected.row as f64)?;
            sheet.write_string(row, 1, &rejected.identifier)?;
            sheet.write_string(row, 2, &rejected.name)?;
            sheet.write_string(row, 3, &rejected.error)?;
            row += 1;
        }
    }

    sheet.autofit();
    Ok(())
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    Ok(())
}
