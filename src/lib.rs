// Fuel Emissions Explorer
// Author: Gabriel Demetrios Lafis

//! # Fuel Emissions Explorer
//!
//! Filtering and aggregation engine behind an interactive dashboard for
//! vehicle fuel-consumption and CO2-emission records.
//!
//! ## Features
//!
//! - CSV loading with per-column type inference
//! - Validated access to the required dataset columns
//! - Categorical and inclusive-range filters combined by conjunction
//! - Column projection and CSV download of the filtered view
//! - Mean, count, sum, min and max over numeric columns
//! - Dashboard metrics and chart descriptions for a charting layer
//!
//! ## Example
//!
//! ```rust
//! use fuel_emissions_explorer::{
//!     data::{load, FuelTable},
//!     processing::{aggregate, filter_rows, FilterSpec, StatsType},
//! };
//!
//! let csv = "MAKE,VEHICLECLASS,FUELTYPE,ENGINESIZE,CO2EMISSIONS,FUELCONSUMPTION_COMB\n\
//!            TOYOTA,COMPACT,Z,2.0,180,7.9\n\
//!            FORD,SUV,X,3.5,250,11.4\n";
//!
//! let fuel = FuelTable::new(load(csv.as_bytes()).unwrap()).unwrap();
//!
//! let specs = vec![
//!     FilterSpec::categorical("MAKE", ["TOYOTA"]),
//!     FilterSpec::range("ENGINESIZE", 1.0, 3.0).unwrap(),
//! ];
//! let filtered = filter_rows(&fuel, &specs).unwrap();
//!
//! assert_eq!(filtered.len(), 1);
//! assert_eq!(aggregate(&filtered, "CO2EMISSIONS", StatsType::Mean).unwrap(), 180.0);
//! ```

pub mod data;
pub mod processing;
pub mod utils;
pub mod views;

// Re-export main types
pub use data::{load, serialize_csv, DataType, Field, FuelTable, Row, Schema, Table, Value};
pub use processing::{aggregate, filter_rows, select_columns, FilterSpec, Pipeline, StatsType};
pub use utils::Config;
