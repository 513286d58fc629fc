pub mod domain;
pub mod error;
pub mod reader;
pub mod writer;

use std::{io, path::Path};

use domain::{filter, Comparison, FilterParams, Schema, Summary};
use error::Result;
use reader::load_table;
use writer::{export, ExportFormat};

/// Application runner
///
/// Loads the prior and current period files (CSV or spreadsheet), compares
/// their per-customer sales, writes the rows selected by `params` to `out`
/// in `format` and returns the totals of the whole comparison. `top` keeps
/// only the first rows of the selection.
///
/// ```
/// use sales_comparison::{domain::FilterParams, writer::ExportFormat};
///
/// let mut out = vec![];
/// let summary = sales_comparison::run(
///     "tests/prior.csv",
///     "tests/current.csv",
///     &FilterParams::default(),
///     None,
///     ExportFormat::Csv,
///     &mut out,
/// )
/// .unwrap();
/// assert!(summary.current_total > summary.prior_total);
/// ```
pub fn run<P, Q, W>(
    prior: P,
    current: Q,
    params: &FilterParams,
    top: Option<usize>,
    format: ExportFormat,
    out: W,
) -> Result<Summary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    W: io::Write,
{
    let prior = load_table(prior)?;
    let current = load_table(current)?;
    let comparison = Comparison::build(&prior, &current, &Schema::default())?;

    let view = filter(&comparison.table, params);
    let view = match top {
        Some(n) => view.top(n),
        None => view,
    };
    log::info!(
        "{} of {} customer(s) selected",
        view.len(),
        comparison.table.len()
    );

    export(out, &view, format)?;
    Ok(comparison.summary)
}
