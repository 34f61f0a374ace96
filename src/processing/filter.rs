// Filter operations for data processing
// Author: Gabriel Demetrios Lafis

use std::borrow::Cow;
use std::collections::BTreeSet;

use log::debug;

use crate::data::{Row, Table, Value};
use super::{resolve_column, resolve_numeric_column, DataProcessor, ProcessingError, ProcessorType};

/// Constraint applied by a single [`FilterSpec`]
#[derive(Debug, Clone, PartialEq)]
enum FilterKind {
    /// Keep rows whose value is one of the selected categories.
    /// An empty selection keeps every row.
    Categorical(BTreeSet<String>),
    /// Keep rows whose value lies in `[lower, upper]`
    Range { lower: f64, upper: f64 },
}

/// A row-selection constraint on one column.
///
/// Range specs can only be built through [`FilterSpec::range`], so a spec
/// with `lower > upper` never reaches [`filter_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    column: String,
    kind: FilterKind,
}

impl FilterSpec {
    /// Membership filter over the given categories
    pub fn categorical<I, S>(column: &str, selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec {
            column: column.to_string(),
            kind: FilterKind::Categorical(selected.into_iter().map(Into::into).collect()),
        }
    }

    /// Inclusive numeric range filter
    pub fn range(column: &str, lower: f64, upper: f64) -> Result<Self, ProcessingError> {
        // also rejects NaN bounds
        if !(lower <= upper) {
            return Err(ProcessingError::InvalidRange {
                column: column.to_string(),
                lower,
                upper,
            });
        }

        Ok(FilterSpec {
            column: column.to_string(),
            kind: FilterKind::Range { lower, upper },
        })
    }

    fn compile<'a>(&'a self, table: &Table) -> Result<Predicate<'a>, ProcessingError> {
        match &self.kind {
            FilterKind::Categorical(selected) => {
                let index = resolve_column(table, &self.column)?;
                if selected.is_empty() {
                    Ok(Predicate::Pass)
                } else {
                    Ok(Predicate::Member { index, selected })
                }
            }
            FilterKind::Range { lower, upper } => {
                let index = resolve_numeric_column(table, &self.column)?;
                Ok(Predicate::Between {
                    index,
                    lower: *lower,
                    upper: *upper,
                })
            }
        }
    }
}

/// A spec bound to a column position
enum Predicate<'a> {
    Pass,
    Member {
        index: usize,
        selected: &'a BTreeSet<String>,
    },
    Between {
        index: usize,
        lower: f64,
        upper: f64,
    },
}

impl Predicate<'_> {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Pass => true,
            Predicate::Member { index, selected } => row
                .get(*index)
                .and_then(category_key)
                .map_or(false, |key| selected.contains(key.as_ref())),
            Predicate::Between {
                index,
                lower,
                upper,
            } => row
                .get(*index)
                .and_then(Value::as_f64)
                .map_or(false, |v| *lower <= v && v <= *upper),
        }
    }
}

/// Category label of a cell, spelled as in its CSV cell; nulls have none
pub(crate) fn category_key(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_csv_field())),
    }
}

/// Keep the rows that satisfy every spec in a list
pub struct FilterProcessor {
    name: String,
    specs: Vec<FilterSpec>,
}

impl FilterProcessor {
    /// Create a new filter processor from a conjunction of specs
    pub fn new(name: &str, specs: Vec<FilterSpec>) -> Self {
        FilterProcessor {
            name: name.to_string(),
            specs,
        }
    }

    /// Filter on a single spec
    pub fn single(spec: FilterSpec) -> Self {
        Self::new(&format!("filter_{}", spec.column), vec![spec])
    }
}

impl DataProcessor for FilterProcessor {
    fn process(&self, input: &Table) -> Result<Table, ProcessingError> {
        filter_rows(input, &self.specs)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }
}

/// Keep the rows of `table` satisfying all `specs`, in their original order.
///
/// Every spec's column is resolved before any row is scanned, so an unknown
/// column fails the whole call without a partial result.
pub fn filter_rows(table: &Table, specs: &[FilterSpec]) -> Result<Table, ProcessingError> {
    let predicates = specs
        .iter()
        .map(|spec| spec.compile(table))
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = table.empty_like();
    for row in &table.data {
        if predicates.iter().all(|p| p.matches(row)) {
            result.add_row(row.clone())?;
        }
    }

    debug!(
        "Filtered {} of {} rows with {} specs",
        result.len(),
        table.len(),
        specs.len()
    );

    Ok(result)
}

/// Limit the number of rows in a table
pub struct LimitProcessor {
    limit: usize,
}

impl LimitProcessor {
    /// Create a new limit processor
    pub fn new(limit: usize) -> Self {
        LimitProcessor { limit }
    }
}

impl DataProcessor for LimitProcessor {
    fn process(&self, input: &Table) -> Result<Table, ProcessingError> {
        let mut result = input.empty_like();

        for row in input.data.iter().take(self.limit) {
            result.add_row(row.clone())?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "limit"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }
}
