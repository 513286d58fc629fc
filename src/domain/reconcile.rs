use std::{collections::BTreeSet, fmt};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::aggregate::{CustomerID, CustomerTable};

pub const NEW_OR_LOST_LABEL: &str = "新規/完全減少";

/// Relative change against the prior period.
///
/// A zero base has no meaningful percentage, so it gets its own variant
/// instead of an infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeltaRatio {
    Percentage(Decimal),
    NewOrLost,
}

impl DeltaRatio {
    /// `delta / base` in percent. A percentage beyond the `Decimal` range
    /// saturates at `Decimal::MAX` or `Decimal::MIN`.
    pub fn compute(delta: Decimal, base: Decimal) -> Self {
        if base.is_zero() {
            return DeltaRatio::NewOrLost;
        }
        match delta
            .checked_div(base)
            .and_then(|q| q.checked_mul(dec!(100)))
        {
            Some(p) => DeltaRatio::Percentage(p),
            None => {
                log::warn!("ratio of {} over {} is out of range, saturated", delta, base);
                if delta.is_sign_negative() == base.is_sign_negative() {
                    DeltaRatio::Percentage(Decimal::MAX)
                } else {
                    DeltaRatio::Percentage(Decimal::MIN)
                }
            }
        }
    }

    pub fn percentage(&self) -> Option<Decimal> {
        match self {
            DeltaRatio::Percentage(p) => Some(*p),
            DeltaRatio::NewOrLost => None,
        }
    }

    pub fn is_new_or_lost(&self) -> bool {
        matches!(self, DeltaRatio::NewOrLost)
    }
}

impl fmt::Display for DeltaRatio {
    /// One decimal place for percentages, the label for a zero base.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaRatio::Percentage(p) => {
                let mut p = p.round_dp(1).normalize();
                p.rescale(1);
                write!(f, "{}", p)
            }
            DeltaRatio::NewOrLost => f.write_str(NEW_OR_LOST_LABEL),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfitPair {
    pub prior: Decimal,
    pub current: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub customer_id: CustomerID,
    pub prior_amount: Decimal,
    pub current_amount: Decimal,
    pub delta_amount: Decimal,
    pub delta_ratio: DeltaRatio,
    /// Only set when both periods carried a profit column.
    pub profit: Option<ProfitPair>,
}

/// Both periods merged, ordered by current amount, largest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledTable {
    rows: Vec<ReconciledRow>,
    has_profit: bool,
}

impl ReconciledTable {
    pub fn rows(&self) -> &[ReconciledRow] {
        &self.rows
    }

    pub fn has_profit(&self) -> bool {
        self.has_profit
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, customer_id: &str) -> Option<&ReconciledRow> {
        self.rows.iter().find(|r| r.customer_id == customer_id)
    }
}

fn whole_units(value: Decimal) -> Decimal {
    value.round().normalize()
}

/// Full outer join of two periods on customer id.
///
/// Customers missing from one side count as zero there. Amounts and deltas
/// are rounded to whole units; the ratio is taken from the unrounded
/// amounts. Rows are joined in customer key order and then stably sorted by
/// current amount, descending.
pub fn reconcile(prior: &CustomerTable, current: &CustomerTable) -> ReconciledTable {
    let has_profit = prior.has_profit() && current.has_profit();

    let customers: BTreeSet<&str> = prior
        .rows()
        .iter()
        .chain(current.rows().iter())
        .map(|r| r.customer_id.as_str())
        .collect();

    let mut rows: Vec<ReconciledRow> = customers
        .into_iter()
        .map(|customer_id| {
            let before = prior.get(customer_id);
            let after = current.get(customer_id);

            let prior_amount = before.map_or(dec!(0), |r| r.total_amount);
            let current_amount = after.map_or(dec!(0), |r| r.total_amount);
            // both totals are within AMOUNT_LIMIT
            let delta_amount = current_amount - prior_amount;

            let profit = if has_profit {
                Some(ProfitPair {
                    prior: whole_units(before.and_then(|r| r.total_profit).unwrap_or(dec!(0))),
                    current: whole_units(after.and_then(|r| r.total_profit).unwrap_or(dec!(0))),
                })
            } else {
                None
            };

            ReconciledRow {
                customer_id: customer_id.to_owned(),
                prior_amount: whole_units(prior_amount),
                current_amount: whole_units(current_amount),
                delta_amount: whole_units(delta_amount),
                delta_ratio: DeltaRatio::compute(delta_amount, prior_amount),
                profit,
            }
        })
        .collect();

    // sort_by is stable: ties keep join order
    rows.sort_by(|a, b| b.current_amount.cmp(&a.current_amount));

    log::debug!(
        "reconciled {} prior and {} current customer(s) into {} row(s)",
        prior.len(),
        current.len(),
        rows.len()
    );

    ReconciledTable { rows, has_profit }
}

#[cfg(test)]
pub(crate) fn example() -> ReconciledTable {
    use super::aggregate::table;
    reconcile(
        &table(&[("A", dec!(100)), ("B", dec!(200))]),
        &table(&[("A", dec!(150)), ("C", dec!(50))]),
    )
}
