use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("missing required column(s): {}", .fields.join(", "))]
    MissingRequiredField { fields: Vec<String> },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook '{0}' has no worksheet")]
    EmptyWorkbook(String),

    #[error("spreadsheet export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("{0} exceeds the supported amount range")]
    AmountOverflow(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
