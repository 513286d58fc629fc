pub mod aggregate;
pub mod filter;
pub mod ingest;
pub mod reconcile;
pub mod session;
pub mod summary;
pub mod table;

pub use aggregate::{aggregate, CustomerAggregate, CustomerTable, SalesRecord};
pub use filter::{amount_bounds, filter, ChangeMode, FilterParams, FilteredView};
pub use ingest::{ingest, IngestReport, Ingested};
pub use reconcile::{reconcile, DeltaRatio, ProfitPair, ReconciledRow, ReconciledTable};
pub use session::{AnalysisSession, Comparison};
pub use summary::{format_amount, summarize, Summary};
pub use table::{Cell, RawTable, Schema};
