// Presentation adapters for the raw-data and dashboard pages
// Author: Gabriel Demetrios Lafis

//! Each page is a pure function of the loaded table and the current widget
//! state:
//!
//! ```text
//!   FuelTable ──┬── RawDataQuery ──► raw_data_view ──► FilteredResult ──► Download
//!               │
//!               └── DashboardQuery ─► dashboard_view ─► DashboardView ──► ChartRenderer
//! ```
//!
//! Nothing here holds state between calls; the caller keeps the table and
//! rebuilds the query on every interaction.

pub mod chart;
pub mod dashboard;
pub mod format;
pub mod raw_data;

pub use chart::{ChartKind, ChartRenderer, ChartSpec, JsonChartRenderer};
pub use dashboard::{dashboard_view, DashboardQuery, DashboardView, Metrics};
pub use format::{format_metric, format_number, NO_DATA};
pub use raw_data::{raw_data_view, Download, FilterOptions, FilteredResult, RawDataQuery, CSV_MIME};
