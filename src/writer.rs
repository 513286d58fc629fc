use crate::domain::{DeltaRatio, FilteredView, ReconciledRow};
use crate::error::{AnalysisError, Result};
use csv::WriterBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use std::{io, path::Path};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "売上比較";

const HEADER: [&str; 5] = ["顧客名", "売上金額_前年", "売上金額_今年", "増減額", "増減率"];
const PROFIT_HEADER: [&str; 7] = [
    "顧客名",
    "売上金額_前年",
    "粗利益(B-L)_前年",
    "売上金額_今年",
    "粗利益(B-L)_今年",
    "増減額",
    "増減率",
];

fn header(has_profit: bool) -> &'static [&'static str] {
    if has_profit {
        &PROFIT_HEADER
    } else {
        &HEADER
    }
}

/// Output file format, picked from the target file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(e) if e.eq_ignore_ascii_case("xlsx") => ExportFormat::Xlsx,
            _ => ExportFormat::Csv,
        }
    }
}

#[derive(Debug, Serialize)]
struct ComparisonRow<'a> {
    customer: &'a str,
    prior: Decimal,
    current: Decimal,
    delta: Decimal,
    ratio: String,
}

#[derive(Debug, Serialize)]
struct ProfitComparisonRow<'a> {
    customer: &'a str,
    prior: Decimal,
    prior_profit: Decimal,
    current: Decimal,
    current_profit: Decimal,
    delta: Decimal,
    ratio: String,
}

impl<'a> From<&'a ReconciledRow> for ComparisonRow<'a> {
    fn from(r: &'a ReconciledRow) -> Self {
        Self {
            customer: &r.customer_id,
            prior: r.prior_amount,
            current: r.current_amount,
            delta: r.delta_amount,
            ratio: r.delta_ratio.to_string(),
        }
    }
}

impl<'a> From<&'a ReconciledRow> for ProfitComparisonRow<'a> {
    fn from(r: &'a ReconciledRow) -> Self {
        let profit = r.profit.unwrap_or_default();
        Self {
            customer: &r.customer_id,
            prior: r.prior_amount,
            prior_profit: profit.prior,
            current: r.current_amount,
            current_profit: profit.current,
            delta: r.delta_amount,
            ratio: r.delta_ratio.to_string(),
        }
    }
}

pub fn export<W: io::Write>(out: W, view: &FilteredView<'_>, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(out, view),
        ExportFormat::Xlsx => write_xlsx(out, view),
    }
}

/// Writes the view as CSV, prefixed with a UTF-8 byte order mark so that
/// spreadsheet software picks the right encoding.
///
/// Rows keep the order of the view. Profit columns are present only when
/// the view carries profit.
pub fn write_csv<W: io::Write>(mut out: W, view: &FilteredView<'_>) -> Result<()> {
    out.write_all(UTF8_BOM)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);

    wtr.write_record(header(view.has_profit()))?;
    for &r in view.rows() {
        if view.has_profit() {
            wtr.serialize(ProfitComparisonRow::from(r))?;
        } else {
            wtr.serialize(ComparisonRow::from(r))?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn to_number(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| AnalysisError::AmountOverflow(format!("exported value {}", value)))
}

fn write_row(
    sheet: &mut Worksheet,
    row: u32,
    r: &ReconciledRow,
    has_profit: bool,
    amount_format: &Format,
    ratio_format: &Format,
) -> Result<()> {
    let amounts = if has_profit {
        let profit = r.profit.unwrap_or_default();
        vec![
            r.prior_amount,
            profit.prior,
            r.current_amount,
            profit.current,
            r.delta_amount,
        ]
    } else {
        vec![r.prior_amount, r.current_amount, r.delta_amount]
    };

    sheet.write_string(row, 0, &r.customer_id)?;
    let mut col = 1;
    for amount in amounts {
        sheet.write_number_with_format(row, col, to_number(amount)?, amount_format)?;
        col += 1;
    }

    match r.delta_ratio {
        DeltaRatio::Percentage(p) => {
            sheet.write_number_with_format(row, col, to_number(p.round_dp(1))?, ratio_format)?;
        }
        DeltaRatio::NewOrLost => {
            sheet.write_string(row, col, r.delta_ratio.to_string())?;
        }
    }
    Ok(())
}

/// Writes the view as an xlsx workbook with one sheet.
///
/// Columns and row order match [`write_csv`]. Amounts and percentages are
/// numeric cells; the zero-base label is a text cell.
pub fn write_xlsx<W: io::Write>(mut out: W, view: &FilteredView<'_>) -> Result<()> {
    let bold = Format::new().set_bold();
    let amount_format = Format::new().set_num_format("#,##0");
    let ratio_format = Format::new().set_num_format("0.0");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(header(view.has_profit())) {
        sheet.write_string_with_format(0, col, *name, &bold)?;
    }
    for (row, &r) in (1u32..).zip(view.rows()) {
        write_row(
            sheet,
            row,
            r,
            view.has_profit(),
            &amount_format,
            &ratio_format,
        )?;
    }

    let buf = workbook.save_to_buffer()?;
    out.write_all(&buf)?;
    log::debug!("wrote {} row(s) to workbook", view.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::{aggregate, SalesRecord};
    use crate::domain::reconcile::{example, reconcile};
    use crate::domain::{filter, Cell, ChangeMode, FilterParams, ReconciledTable};
    use crate::reader::read_workbook;
    use rust_decimal_macros::dec;
    use std::fs;

    fn csv_text(view: &FilteredView<'_>) -> String {
        let mut buf = vec![];
        write_csv(&mut buf, view).unwrap();
        assert!(buf.starts_with(UTF8_BOM));
        String::from_utf8(buf[UTF8_BOM.len()..].to_vec()).unwrap()
    }

    fn profit_table() -> ReconciledTable {
        let record = |amount, profit| SalesRecord {
            customer_id: String::from("A社"),
            order_amount: amount,
            handler: None,
            item_name: None,
            gross_profit: Some(profit),
        };
        reconcile(
            &aggregate(&[record(dec!(1000), dec!(300))], true).unwrap(),
            &aggregate(&[record(dec!(1200), dec!(310))], true).unwrap(),
        )
    }

    #[test]
    fn test_write_view_in_order() {
        let t = example();
        let out = csv_text(&filter(&t, &FilterParams::default()));
        assert_eq!(
            out,
            "\
顧客名,売上金額_前年,売上金額_今年,増減額,増減率
A,100,150,50,50.0
C,0,50,50,新規/完全減少
B,200,0,-200,-100.0
"
        );
    }

    #[test]
    fn test_write_empty_view_keeps_header() {
        let t = example();
        let params = FilterParams {
            search: Some(String::from("nobody")),
            change: ChangeMode::All,
            ..Default::default()
        };
        let out = csv_text(&filter(&t, &params));
        assert_eq!(out, "顧客名,売上金額_前年,売上金額_今年,増減額,増減率\n");
    }

    #[test]
    fn test_write_profit_columns() {
        let t = profit_table();
        let out = csv_text(&filter(&t, &FilterParams::default()));
        assert_eq!(
            out,
            "\
顧客名,売上金額_前年,粗利益(B-L)_前年,売上金額_今年,粗利益(B-L)_今年,増減額,増減率
A社,1000,300,1200,310,200,20.0
"
        );
    }

    #[test]
    fn test_profit_columns_follow_the_view() {
        let t = profit_table();
        let mut bare = t.rows()[0].clone();
        bare.customer_id = String::from("B社");
        bare.profit = None;

        let view = FilteredView::from_rows(vec![&t.rows()[0], &bare], true);
        let out = csv_text(&view);
        let widths: Vec<usize> = out.lines().map(|l| l.split(',').count()).collect();
        assert_eq!(widths, vec![7, 7, 7]);
        assert!(out.ends_with("B社,1000,0,1200,0,200,20.0\n"));

        let view = FilteredView::from_rows(vec![&t.rows()[0]], false);
        assert_eq!(
            csv_text(&view),
            "顧客名,売上金額_前年,売上金額_今年,増減額,増減率\nA社,1000,1200,200,20.0\n"
        );
    }

    #[test]
    fn test_xlsx_reads_back() {
        let t = example();
        let mut buf = vec![];
        write_xlsx(&mut buf, &filter(&t, &FilterParams::default())).unwrap();

        let path = std::env::temp_dir().join(format!(
            "sales_comparison_{}_writer.xlsx",
            std::process::id()
        ));
        fs::write(&path, &buf).unwrap();
        let table = read_workbook(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(table.headers(), HEADER.map(String::from).as_slice());
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.rows()[0],
            vec![
                Cell::text("A"),
                Cell::Number(dec!(100)),
                Cell::Number(dec!(150)),
                Cell::Number(dec!(50)),
                Cell::Number(dec!(50)),
            ]
        );
        assert_eq!(table.rows()[1][0], Cell::text("C"));
        assert_eq!(table.rows()[1][4], Cell::text("新規/完全減少"));
        assert_eq!(table.rows()[2][3], Cell::Number(dec!(-200)));
        assert_eq!(table.rows()[2][4], Cell::Number(dec!(-100)));
    }

    #[test]
    fn test_xlsx_profit_columns() {
        let t = profit_table();
        let mut buf = vec![];
        export(&mut buf, &filter(&t, &FilterParams::default()), ExportFormat::Xlsx).unwrap();

        let path = std::env::temp_dir().join(format!(
            "sales_comparison_{}_profit.xlsx",
            std::process::id()
        ));
        fs::write(&path, &buf).unwrap();
        let table = read_workbook(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(table.headers(), PROFIT_HEADER.map(String::from).as_slice());
        assert_eq!(table.rows()[0][2], Cell::Number(dec!(300)));
        assert_eq!(table.rows()[0][4], Cell::Number(dec!(310)));
        assert_eq!(table.rows()[0][6], Cell::Number(dec!(20)));
    }

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(ExportFormat::from_path("out.xlsx"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path("OUT.XLSX"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path("out.csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path("out"), ExportFormat::Csv);
    }
}
