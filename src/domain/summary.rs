use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::reconcile::{DeltaRatio, ReconciledTable};
use crate::error::{AnalysisError, Result};

/// Grand totals over a whole comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub prior_total: Decimal,
    pub current_total: Decimal,
    pub total_delta: Decimal,
    pub total_delta_ratio: DeltaRatio,
}

fn checked_sum(total: Decimal, value: Decimal, what: &str) -> Result<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| AnalysisError::AmountOverflow(format!("{} total", what)))
}

/// Totals every reconciled row. Filters never apply here.
pub fn summarize(table: &ReconciledTable) -> Result<Summary> {
    let mut prior_total = dec!(0);
    let mut current_total = dec!(0);
    let mut total_delta = dec!(0);
    for row in table.rows() {
        prior_total = checked_sum(prior_total, row.prior_amount, "prior")?;
        current_total = checked_sum(current_total, row.current_amount, "current")?;
        total_delta = checked_sum(total_delta, row.delta_amount, "delta")?;
    }

    Ok(Summary {
        prior_total,
        current_total,
        total_delta,
        total_delta_ratio: DeltaRatio::compute(total_delta, prior_total),
    })
}

/// Whole units with thousands separators, e.g. `-1,234,567`.
pub fn format_amount(amount: Decimal) -> String {
    let units = amount.round().normalize().to_string();
    let (sign, digits) = match units.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", units.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::aggregate::{table, AMOUNT_LIMIT};
    use crate::domain::filter::{filter, ChangeMode, FilterParams};
    use crate::domain::reconcile::{example, reconcile};

    #[test]
    fn test_example_totals() {
        let s = summarize(&example()).unwrap();
        assert_eq!(s.prior_total, dec!(300));
        assert_eq!(s.current_total, dec!(200));
        assert_eq!(s.total_delta, dec!(-100));
        assert_eq!(s.total_delta_ratio.to_string(), "-33.3");
    }

    #[test]
    fn test_zero_prior_total_is_sentinel() {
        let t = reconcile(&table(&[]), &table(&[("A", dec!(10))]));
        let s = summarize(&t).unwrap();
        assert_eq!(s.total_delta, dec!(10));
        assert_eq!(s.total_delta_ratio, DeltaRatio::NewOrLost);

        let s = summarize(&ReconciledTable::default()).unwrap();
        assert_eq!(s.current_total, dec!(0));
        assert!(s.total_delta_ratio.is_new_or_lost());
    }

    #[test]
    fn test_summary_ignores_view() {
        let t = example();
        let params = FilterParams {
            change: ChangeMode::DecreaseOnly,
            ..Default::default()
        };
        let view = filter(&t, &params);
        assert_eq!(view.len(), 1);
        assert_eq!(summarize(&t).unwrap().current_total, dec!(200));
    }

    #[test]
    fn test_grand_total_out_of_range_is_an_error() {
        let big = table(&[("A", AMOUNT_LIMIT), ("B", AMOUNT_LIMIT), ("C", AMOUNT_LIMIT)]);
        let t = reconcile(&table(&[]), &big);
        assert_eq!(t.len(), 3);
        match summarize(&t) {
            Err(AnalysisError::AmountOverflow(what)) => assert_eq!(what, "current total"),
            other => panic!("overflow error expected, got {:?}", other),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "0");
        assert_eq!(format_amount(dec!(999)), "999");
        assert_eq!(format_amount(dec!(1000)), "1,000");
        assert_eq!(format_amount(dec!(1234567.4)), "1,234,567");
        assert_eq!(format_amount(dec!(-2500000)), "-2,500,000");
    }
}
