//! `.xlsx` writer for [`SpreadsheetDocument`]

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, info};

use super::document::{CellValue, Sheet, SpreadsheetDocument};
use super::{OutputError, OutputResult};

/// Write `document` to `path`, creating parent directories as needed
pub fn write_xlsx<P: AsRef<Path>>(document: &SpreadsheetDocument, path: P) -> OutputResult<()> {
    let path = path.as_ref();
    info!("Writing spreadsheet: path={}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
    }

    let mut workbook = to_workbook(document)?;
    workbook.save(path)?;

    debug!("Spreadsheet written: {} sheets", document.sheets.len());
    Ok(())
}

/// Encode `document` as `.xlsx` bytes
pub fn to_xlsx_bytes(document: &SpreadsheetDocument) -> OutputResult<Vec<u8>> {
    let mut workbook = to_workbook(document)?;
    Ok(workbook.save_to_buffer()?)
}

fn to_workbook(document: &SpreadsheetDocument) -> OutputResult<Workbook> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for sheet in &document.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &bold)?;
        worksheet.autofit();
    }

    Ok(workbook)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, bold: &Format) -> OutputResult<()> {
    for (row_index, row) in sheet.rows.iter().enumerate() {
        let r = u32::try_from(row_index).map_err(|_| OutputError::SheetTooLarge(sheet.name.clone()))?;
        let emphasized = sheet.is_emphasized(row_index);

        for (col_index, cell) in row.iter().enumerate() {
            let c = u16::try_from(col_index)
                .map_err(|_| OutputError::SheetTooLarge(sheet.name.clone()))?;

            match (cell, emphasized) {
                (CellValue::Text(text), true) => {
                    worksheet.write_string_with_format(r, c, text, bold)?;
                }
                (CellValue::Text(text), false) => {
                    worksheet.write_string(r, c, text)?;
                }
                (CellValue::Number(n), true) => {
                    worksheet.write_number_with_format(r, c, *n, bold)?;
                }
                (CellValue::Number(n), false) => {
                    worksheet.write_number(r, c, *n)?;
                }
                (CellValue::Empty, _) => {}
            }
        }
    }

    Ok(())
}
