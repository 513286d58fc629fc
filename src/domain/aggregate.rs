use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AnalysisError, Result};

pub type CustomerID = String;

/// Largest magnitude a customer total may reach. Half of `Decimal::MAX`, so
/// the difference of two totals is always representable.
pub const AMOUNT_LIMIT: Decimal = dec!(39614081257132168796771975167);

/// A sales line that passed ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub customer_id: CustomerID,
    pub order_amount: Decimal,
    pub handler: Option<String>,
    pub item_name: Option<String>,
    pub gross_profit: Option<Decimal>,
}

/// Per-customer totals for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: CustomerID,
    pub total_amount: Decimal,
    pub total_profit: Option<Decimal>,
}

/// One period's aggregates, one row per customer, in customer key order.
///
/// `total_profit` is `Some` on every row when the table carries profit and
/// `None` on every row otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerTable {
    rows: Vec<CustomerAggregate>,
    has_profit: bool,
}

impl CustomerTable {
    pub fn rows(&self) -> &[CustomerAggregate] {
        &self.rows
    }

    pub fn has_profit(&self) -> bool {
        self.has_profit
    }

    pub fn get(&self, customer_id: &str) -> Option<&CustomerAggregate> {
        self.rows
            .binary_search_by(|r| r.customer_id.as_str().cmp(customer_id))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Default)]
struct Totals {
    amount: Decimal,
    profit: Decimal,
}

fn checked_total(total: Decimal, value: Decimal, customer_id: &str) -> Result<Decimal> {
    total
        .checked_add(value)
        .filter(|t| t.abs() <= AMOUNT_LIMIT)
        .ok_or_else(|| {
            AnalysisError::AmountOverflow(format!("total of customer '{}'", customer_id))
        })
}

/// Groups records by exact customer id and sums their amounts.
///
/// Profit is summed only when `with_profit` is set; a record without a
/// profit value contributes zero. Fails when a total leaves
/// `[-AMOUNT_LIMIT, AMOUNT_LIMIT]`.
pub fn aggregate(records: &[SalesRecord], with_profit: bool) -> Result<CustomerTable> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();

    for record in records {
        let customer_id = record.customer_id.as_str();
        let totals = groups.entry(customer_id).or_default();
        totals.amount = checked_total(totals.amount, record.order_amount, customer_id)?;
        if with_profit {
            let profit = record.gross_profit.unwrap_or(dec!(0));
            totals.profit = checked_total(totals.profit, profit, customer_id)?;
        }
    }

    let rows = groups
        .into_iter()
        .map(|(customer_id, totals)| CustomerAggregate {
            customer_id: customer_id.to_owned(),
            total_amount: totals.amount,
            total_profit: if with_profit {
                Some(totals.profit)
            } else {
                None
            },
        })
        .collect();

    Ok(CustomerTable {
        rows,
        has_profit: with_profit,
    })
}

#[cfg(test)]
pub(crate) fn table(rows: &[(&str, Decimal)]) -> CustomerTable {
    let records: Vec<SalesRecord> = rows
        .iter()
        .map(|(customer, amount)| SalesRecord {
            customer_id: customer.to_string(),
            order_amount: *amount,
            handler: None,
            item_name: None,
            gross_profit: None,
        })
        .collect();
    aggregate(&records, false).unwrap()
}
