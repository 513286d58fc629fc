use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::reconcile::{ReconciledRow, ReconciledTable};
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeMode {
    #[default]
    All,
    IncreaseOnly,
    DecreaseOnly,
}

impl FromStr for ChangeMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ChangeMode::All),
            "increase" => Ok(ChangeMode::IncreaseOnly),
            "decrease" => Ok(ChangeMode::DecreaseOnly),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unknown change mode '{}', expected all, increase or decrease",
                other
            ))),
        }
    }
}

/// Parameters of the comparison view. The default selects every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    /// Inclusive bounds on the current-period amount.
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub change: ChangeMode,
    pub search: Option<String>,
}

impl FilterParams {
    fn matches(&self, row: &ReconciledRow, needle: Option<&str>) -> bool {
        if let Some(min) = self.min_amount {
            if row.current_amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if row.current_amount > max {
                return false;
            }
        }

        let change_ok = match self.change {
            ChangeMode::All => true,
            ChangeMode::IncreaseOnly => row.delta_amount > dec!(0),
            ChangeMode::DecreaseOnly => row.delta_amount < dec!(0),
        };
        if !change_ok {
            return false;
        }

        match needle {
            Some(needle) => row.customer_id.to_lowercase().contains(needle),
            None => true,
        }
    }
}

/// Read-only selection of reconciled rows, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a ReconciledRow>,
    has_profit: bool,
}

impl<'a> FilteredView<'a> {
    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<&'a ReconciledRow>, has_profit: bool) -> Self {
        Self { rows, has_profit }
    }

    pub fn rows(&self) -> &[&'a ReconciledRow] {
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

    /// The first `n` rows, i.e. the `n` largest current amounts in view.
    pub fn top(&self, n: usize) -> FilteredView<'a> {
        FilteredView {
            rows: self.rows.iter().take(n).copied().collect(),
            has_profit: self.has_profit,
        }
    }
}

pub fn filter<'a>(table: &'a ReconciledTable, params: &FilterParams) -> FilteredView<'a> {
    let needle = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    FilteredView {
        rows: table
            .rows()
            .iter()
            .filter(|row| params.matches(row, needle.as_deref()))
            .collect(),
        has_profit: table.has_profit(),
    }
}

/// Smallest and largest current amount, the widest useful range.
pub fn amount_bounds(table: &ReconciledTable) -> Option<(Decimal, Decimal)> {
    let mut amounts = table.rows().iter().map(|r| r.current_amount);
    let first = amounts.next()?;
    Some(amounts.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a))))
}
