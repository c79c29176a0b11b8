//! Cell enumeration for workbooks (`.xls`, `.xlsx`, `.ods`).

use crate::utils::error::{Result, ScanError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Every non-empty cell of every worksheet as text, sheet by sheet in
/// workbook order, row by row within a sheet. Error cells are skipped.
pub fn read_cells(bytes: &[u8]) -> Result<Vec<String>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(spreadsheet_error)?;

    let sheets = workbook.worksheets();
    if sheets.is_empty() {
        return Err(ScanError::SpreadsheetError {
            message: "workbook contains no worksheets".to_string(),
        });
    }

    let mut cells = Vec::new();
    for (name, range) in &sheets {
        let before = cells.len();
        for cell in range.rows().flatten() {
            if let Some(text) = cell_text(cell) {
                cells.push(text);
            }
        }
        tracing::debug!("Sheet '{}': {} cells", name, cells.len() - before);
    }

    tracing::debug!("Read {} cells from {} worksheets", cells.len(), sheets.len());
    Ok(cells)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn spreadsheet_error(e: calamine::Error) -> ScanError {
    ScanError::SpreadsheetError {
        message: e.to_string(),
    }
}
