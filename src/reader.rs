use calamine::{open_workbook_auto, Data, Reader as _};
use csv::Reader;
use csv::{ReaderBuilder, Trim};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::{fs::File, io, path::Path};

use crate::domain::{Cell, RawTable};
use crate::error::{AnalysisError, Result};

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

pub fn get_reader<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
    Ok(ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?)
}

/// Reads a header row and every record of a CSV into a raw table.
pub fn get_content<R>(rdr: &mut Reader<R>) -> Result<RawTable>
where
    R: io::Read,
{
    let headers = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| match i {
            0 => h.trim_start_matches('\u{feff}').to_owned(),
            _ => h.to_owned(),
        })
        .collect();

    let mut table = RawTable::new(headers);
    for result in rdr.records() {
        let record = result?;
        table.push_row(record.iter().map(Cell::text).collect());
    }
    Ok(table)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_f64(*f).map_or(Cell::Empty, Cell::Number),
        Data::String(s) => Cell::text(s),
        other => Cell::text(&other.to_string()),
    }
}

/// Reads the first worksheet of a spreadsheet. Its first row is the header.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AnalysisError::EmptyWorkbook(path.display().to_string()))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|h| h.to_string().trim().to_owned()).collect(),
        None => vec![],
    };

    let mut table = RawTable::new(headers);
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }
    Ok(table)
}

/// Loads a spreadsheet or CSV file depending on its extension.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let is_workbook = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| {
            WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str())
        });

    let table = if is_workbook {
        read_workbook(path)?
    } else {
        get_content(&mut get_reader(path)?)?
    };
    log::debug!("loaded {} row(s) from {}", table.len(), path.display());
    Ok(table)
}
