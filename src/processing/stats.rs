// Statistical operations for data processing
// Author: Gabriel Demetrios Lafis

use std::collections::HashSet;

use crate::data::{DataType, Field, Row, Schema, Table, Value};
use super::filter::category_key;
use super::{resolve_column, resolve_numeric_column, DataProcessor, ProcessingError, ProcessorType};

/// Scalar summary computed over one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsType {
    Mean,
    Count,
    Sum,
    Min,
    Max,
}

impl StatsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsType::Mean => "mean",
            StatsType::Count => "count",
            StatsType::Sum => "sum",
            StatsType::Min => "min",
            StatsType::Max => "max",
        }
    }
}

/// Statistical processor for computing one statistic on one column
pub struct StatsProcessor {
    name: String,
    column: String,
    stats_type: StatsType,
}

impl StatsProcessor {
    /// Create a new stats processor
    pub fn new(column: &str, stats_type: StatsType) -> Self {
        StatsProcessor {
            name: format!("{}_{}", stats_type.as_str(), column),
            column: column.to_string(),
            stats_type,
        }
    }

    /// Create a mean processor
    pub fn mean(column: &str) -> Self {
        Self::new(column, StatsType::Mean)
    }

    /// Create a count processor
    pub fn count(column: &str) -> Self {
        Self::new(column, StatsType::Count)
    }

    /// Create a sum processor
    pub fn sum(column: &str) -> Self {
        Self::new(column, StatsType::Sum)
    }

    /// Create a min processor
    pub fn min(column: &str) -> Self {
        Self::new(column, StatsType::Min)
    }

    /// Create a max processor
    pub fn max(column: &str) -> Self {
        Self::new(column, StatsType::Max)
    }

    /// Compute the statistic over `input`
    pub fn compute(&self, input: &Table) -> Result<f64, ProcessingError> {
        aggregate(input, &self.column, self.stats_type)
    }
}

impl DataProcessor for StatsProcessor {
    /// One-row, one-column table named `<stat>_<column>`
    fn process(&self, input: &Table) -> Result<Table, ProcessingError> {
        let value = self.compute(input)?;
        let schema = Schema::new(vec![Field::new(self.name.clone(), DataType::Float, true)]);
        let mut result = Table::new(schema);
        result.add_row(Row::new(vec![Value::Float(value)]))?;
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Stats
    }
}

/// Compute a statistic over a column, skipping null cells.
///
/// `Count` works on any column and counts non-null cells. The other
/// statistics need a numeric column; with no values to summarise, `Mean`,
/// `Min` and `Max` return `NaN` and `Sum` returns `0.0`.
pub fn aggregate(table: &Table, column: &str, stats_type: StatsType) -> Result<f64, ProcessingError> {
    let index = match stats_type {
        StatsType::Count => resolve_column(table, column)?,
        _ => resolve_numeric_column(table, column)?,
    };
    let values = table.column_values(index).filter_map(Value::as_f64);

    let result = match stats_type {
        StatsType::Count => table.column_values(index).filter(|v| !v.is_null()).count() as f64,
        StatsType::Mean => {
            let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        }
        StatsType::Sum => values.sum::<f64>(),
        StatsType::Min => values.fold(f64::NAN, f64::min),
        StatsType::Max => values.fold(f64::NAN, f64::max),
    };

    Ok(result)
}

/// Observed `(min, max)` of a numeric column, `None` when it has no values
pub fn column_bounds(table: &Table, column: &str) -> Result<Option<(f64, f64)>, ProcessingError> {
    let min = aggregate(table, column, StatsType::Min)?;
    let max = aggregate(table, column, StatsType::Max)?;
    if min.is_nan() || max.is_nan() {
        Ok(None)
    } else {
        Ok(Some((min, max)))
    }
}

/// Distinct non-null category labels of a column, in order of first appearance
pub fn unique_values(table: &Table, column: &str) -> Result<Vec<String>, ProcessingError> {
    let index = resolve_column(table, column)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for key in table.column_values(index).filter_map(category_key) {
        if seen.insert(key.to_string()) {
            result.push(key.into_owned());
        }
    }

    Ok(result)
}
