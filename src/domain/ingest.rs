use crate::error::{AnalysisError, Result};

use super::aggregate::{aggregate, CustomerTable, SalesRecord};
use super::table::{Cell, RawTable, Schema};

/// Data-quality notes gathered while ingesting one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub total_rows: usize,
    pub retained_rows: usize,
    /// Rows whose amount cell was blank or not a number.
    pub dropped_amount_rows: usize,
    /// Rows with a blank customer cell.
    pub dropped_customer_rows: usize,
    pub missing_optional: Vec<String>,
    /// Non-blank profit cells on retained rows that are not numbers. They
    /// count as zero.
    pub malformed_profit_cells: usize,
    /// The profit column was present but none of its non-blank cells could
    /// be read as a number.
    pub profit_dropped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub customers: CustomerTable,
    pub report: IngestReport,
}

/// Validates a raw table against `schema` and aggregates it per customer.
///
/// Missing required columns fail the whole call. Everything else is
/// recorded in the returned report.
pub fn ingest(table: &RawTable, schema: &Schema) -> Result<Ingested> {
    let customer_col = table.column_index(&schema.customer_id);
    let amount_col = table.column_index(&schema.order_amount);
    let (customer_col, amount_col) = match (customer_col, amount_col) {
        (Some(c), Some(a)) => (c, a),
        _ => {
            let fields = schema
                .required()
                .iter()
                .filter(|name| table.column_index(name).is_none())
                .map(|name| name.to_string())
                .collect();
            return Err(AnalysisError::MissingRequiredField { fields });
        }
    };
    let mut report = IngestReport {
        total_rows: table.len(),
        ..Default::default()
    };

    report.missing_optional = schema
        .optional()
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !report.missing_optional.is_empty() {
        log::warn!(
            "optional column(s) {} not found, running basic analysis only",
            report.missing_optional.join(", ")
        );
    }

    let handler_col = table.column_index(&schema.handler);
    let item_col = table.column_index(&schema.item_name);
    let mut profit_col = table.column_index(&schema.gross_profit);

    let mut kept: Vec<&[Cell]> = vec![];
    for row in table.rows() {
        if row[amount_col].to_decimal().is_none() {
            report.dropped_amount_rows += 1;
            continue;
        }
        if row[customer_col].to_key().is_none() {
            report.dropped_customer_rows += 1;
            continue;
        }
        kept.push(row);
    }

    if let Some(col) = profit_col {
        let (numeric, malformed) = kept
            .iter()
            .filter(|row| !row[col].is_blank())
            .fold((0, 0), |(n, m), row| match row[col].to_decimal() {
                Some(_) => (n + 1, m),
                None => (n, m + 1),
            });
        report.malformed_profit_cells = malformed;
        if malformed > 0 && numeric == 0 {
            log::warn!(
                "column '{}' has no numeric cell, profit analysis skipped",
                schema.gross_profit
            );
            report.profit_dropped = true;
            profit_col = None;
        } else if malformed > 0 {
            log::warn!(
                "column '{}' has {} non-numeric cell(s), counted as 0",
                schema.gross_profit,
                malformed
            );
        }
    }

    let records: Vec<SalesRecord> = kept
        .iter()
        .filter_map(|row| {
            Some(SalesRecord {
                customer_id: row[customer_col].to_key()?,
                order_amount: row[amount_col].to_decimal()?,
                handler: handler_col.and_then(|c| row[c].to_key()),
                item_name: item_col.and_then(|c| row[c].to_key()),
                gross_profit: profit_col.and_then(|c| row[c].to_decimal()),
            })
        })
        .collect();

    report.retained_rows = records.len();
    if report.dropped_amount_rows > 0 {
        log::warn!(
            "{} row(s) with a non-numeric '{}' were excluded",
            report.dropped_amount_rows,
            schema.order_amount
        );
    }
    if report.dropped_customer_rows > 0 {
        log::warn!(
            "{} row(s) without '{}' were excluded",
            report.dropped_customer_rows,
            schema.customer_id
        );
    }

    let customers = aggregate(&records, profit_col.is_some())?;
    log::info!(
        "ingested {} of {} row(s) into {} customer(s)",
        report.retained_rows,
        report.total_rows,
        customers.len()
    );

    Ok(Ingested { customers, report })
}
