// Transform operations for data processing
// Author: Gabriel Demetrios Lafis

use log::debug;

use crate::data::{Row, Schema, Table};
use super::{resolve_column, DataProcessor, ProcessingError, ProcessorType};

/// Select specific columns from a table
pub struct SelectTransform {
    columns: Vec<String>,
}

impl SelectTransform {
    /// Create a new select transform with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        SelectTransform { columns }
    }
}

impl DataProcessor for SelectTransform {
    fn process(&self, input: &Table) -> Result<Table, ProcessingError> {
        select_columns(input, &self.columns)
    }

    fn name(&self) -> &str {
        "select"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Transform
    }
}

/// Project `table` onto `names`, in the order given, keeping row order.
pub fn select_columns<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table, ProcessingError> {
    let indices = names
        .iter()
        .map(|name| resolve_column(table, name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let fields = indices
        .iter()
        .map(|&i| table.schema.fields[i].clone())
        .collect();

    let mut result = Table::new(Schema::new(fields));
    result.metadata = table.metadata.clone();

    for row in &table.data {
        let values = indices.iter().map(|&i| row.values[i].clone()).collect();
        result.add_row(Row::new(values))?;
    }

    debug!("Selected {} of {} columns", result.column_count(), table.column_count());

    Ok(result)
}
