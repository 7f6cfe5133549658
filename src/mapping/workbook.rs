//! Decoding uploaded spreadsheet bytes into rows of cells

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use std::io::Cursor;

use crate::domain::value_objects::CellValue;
use crate::ImportError;

/// Zero-based sheet position of the header row's first cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SheetOrigin {
    pub row: u32,
    pub col: usize,
}

impl SheetOrigin {
    /// 1-based sheet row of the header.
    pub fn header_row(&self) -> u32 { self.row + 1 }

    /// 1-based sheet row of the `n`th data row.
    pub fn data_row(&self, n: usize) -> u32 { self.row + n as u32 + 2 }
}

/// The first worksheet of a workbook. `rows[0]` is the header row and
/// `origin` places it on the sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub origin: SheetOrigin,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        self.rows.get(1..).unwrap_or_default()
    }
}

/// Reads the whole first worksheet (xlsx, xls, xlsb, ods) into memory.
/// The range starts at the first used cell, which becomes the origin.
pub fn read_first_sheet(bytes: &[u8]) -> crate::Result<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let name = workbook.sheet_names().first().cloned().ok_or(ImportError::NoWorksheet)?;
    let range = workbook.worksheet_range(&name)?;

    let origin = range
        .start()
        .map(|(row, col)| SheetOrigin { row, col: col as usize })
        .unwrap_or_default();
    let rows = range
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect::<Vec<Vec<CellValue>>>();

    tracing::debug!(sheet = %name, rows = rows.len(), ?origin, "worksheet decoded");
    Ok(Sheet { name, origin, rows })
}

pub fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => dt.as_datetime().map(CellValue::DateTime).unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .parse::<NaiveDateTime>()
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(to_cell(&Data::String("T恤".into())), CellValue::from("T恤"));
        assert_eq!(to_cell(&Data::Int(10)), CellValue::from(10.0));
        assert_eq!(to_cell(&Data::Float(99.5)), CellValue::from(99.5));
        assert_eq!(to_cell(&Data::Bool(true)), CellValue::from(true));
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(to_cell(&Data::DateTimeIso("2024-01-05T08:30:00".into())), CellValue::DateTime(expected));
        assert_eq!(to_cell(&Data::DateTimeIso("soon".into())), CellValue::from("soon"));
    }

    #[test]
    fn test_unreadable_bytes_are_rejected() {
        assert!(read_first_sheet(b"definitely not a workbook").is_err());
        assert!(read_first_sheet(&[]).is_err());
    }

    #[test]
    fn test_sheet_accessors() {
        let sheet = Sheet {
            name: "Sheet1".into(),
            origin: SheetOrigin::default(),
            rows: vec![
                vec![CellValue::from("商品名称"), CellValue::from("商品价格")],
                vec![CellValue::from("T恤"), CellValue::from(99.5)],
            ],
        };
        assert_eq!(sheet.headers(), vec!["商品名称", "商品价格"]);
        assert_eq!(sheet.data_rows().len(), 1);
        assert!(Sheet::default().data_rows().is_empty());
    }

    #[test]
    fn test_origin_row_numbers() {
        let origin = SheetOrigin { row: 2, col: 1 };
        assert_eq!(origin.header_row(), 3);
        assert_eq!(origin.data_row(0), 4);
        assert_eq!(SheetOrigin::default().data_row(0), 2);
    }

    #[test]
    fn test_read_offset_table() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "商品名称").unwrap();
        sheet.write_string(2, 2, "商品价格").unwrap();
        sheet.write_string(3, 1, "T恤").unwrap();
        sheet.write_number(3, 2, 99.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let sheet = read_first_sheet(&bytes).unwrap();
        assert_eq!(sheet.origin, SheetOrigin { row: 2, col: 1 });
        assert_eq!(sheet.headers(), vec!["商品名称", "商品价格"]);
        assert_eq!(sheet.data_rows(), &[vec![CellValue::from("T恤"), CellValue::from(99.5)]]);
    }
}
