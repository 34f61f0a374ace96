// Processing module for filtering, projection and statistics
// Author: Gabriel Demetrios Lafis

mod filter;
mod stats;
mod transform;

pub use filter::*;
pub use stats::*;
pub use transform::*;

use thiserror::Error;

use crate::data::{DataError, DataType, Table};

/// Represents a data processor that turns one table into another
pub trait DataProcessor {
    /// Process a table and return a new table
    fn process(&self, input: &Table) -> Result<Table, ProcessingError>;

    /// Get the processor name
    fn name(&self) -> &str;

    /// Get the processor type
    fn processor_type(&self) -> ProcessorType;
}

/// Represents a processor type
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorType {
    Transform,
    Filter,
    Stats,
    Custom(String),
}

/// Represents an error in the processing module
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Data error: {0}")]
    DataError(#[from] DataError),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("Invalid range for '{column}': lower bound {lower} exceeds upper bound {upper}")]
    InvalidRange {
        column: String,
        lower: f64,
        upper: f64,
    },
    #[error("Column '{column}' has type {found}, expected a numeric column")]
    TypeMismatch { column: String, found: DataType },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Look up a column, failing with [`ProcessingError::UnknownColumn`]
pub(crate) fn resolve_column(table: &Table, column: &str) -> Result<usize, ProcessingError> {
    table
        .column_index(column)
        .ok_or_else(|| ProcessingError::UnknownColumn(column.to_string()))
}

/// Look up a column that must hold numbers
pub(crate) fn resolve_numeric_column(table: &Table, column: &str) -> Result<usize, ProcessingError> {
    let index = resolve_column(table, column)?;
    let found = table.schema.fields[index].data_type;
    if !found.is_numeric() {
        return Err(ProcessingError::TypeMismatch {
            column: column.to_string(),
            found,
        });
    }
    Ok(index)
}

/// Pipeline for chaining multiple processors
pub struct Pipeline {
    name: String,
    processors: Vec<Box<dyn DataProcessor>>,
}

impl Pipeline {
    /// Create a new pipeline with the given name
    pub fn new(name: &str) -> Self {
        Pipeline {
            name: name.to_string(),
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline
    pub fn add<P: DataProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Execute the pipeline on a table
    pub fn execute(&self, input: &Table) -> Result<Table, ProcessingError> {
        let mut current = input.clone();

        for processor in &self.processors {
            current = processor.process(&current)?;
        }

        Ok(current)
    }
}

impl DataProcessor for Pipeline {
    fn process(&self, input: &Table) -> Result<Table, ProcessingError> {
        self.execute(input)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Custom("Pipeline".to_string())
    }
}
