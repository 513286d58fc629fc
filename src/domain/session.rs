use crate::error::Result;

use super::filter::{filter, FilterParams, FilteredView};
use super::ingest::{ingest, Ingested};
use super::reconcile::{reconcile, ReconciledTable};
use super::summary::{summarize, Summary};
use super::table::{RawTable, Schema};

/// One prior/current upload pair and its reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub prior: Ingested,
    pub current: Ingested,
    pub table: ReconciledTable,
    /// Totals over `table`, independent of any filter.
    pub summary: Summary,
}

impl Comparison {
    pub fn build(prior: &RawTable, current: &RawTable, schema: &Schema) -> Result<Self> {
        let prior = ingest(prior, schema)?;
        let current = ingest(current, schema)?;
        let table = reconcile(&prior.customers, &current.customers);
        let summary = summarize(&table)?;
        Ok(Self {
            prior,
            current,
            table,
            summary,
        })
    }
}

/// Holds the active comparison and view parameters for one user.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    schema: Schema,
    comparison: Option<Comparison>,
    params: FilterParams,
}

impl AnalysisSession {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            comparison: None,
            params: FilterParams::default(),
        }
    }

    /// Replaces the active comparison with a freshly built one.
    ///
    /// On error the previous comparison stays active.
    pub fn load(&mut self, prior: &RawTable, current: &RawTable) -> Result<&Comparison> {
        let comparison = Comparison::build(prior, current, &self.schema)?;
        if self.comparison.is_some() {
            log::info!("replacing active comparison");
        }
        self.params = FilterParams::default();
        Ok(self.comparison.insert(comparison))
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn set_filter(&mut self, params: FilterParams) {
        self.params = params;
    }

    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.comparison
            .as_ref()
            .map(|c| filter(&c.table, &self.params))
    }

    pub fn summary(&self) -> Option<Summary> {
        self.comparison.as_ref().map(|c| c.summary)
    }

    pub fn clear(&mut self) {
        self.comparison = None;
        self.params = FilterParams::default();
    }
}
