// Data module for tables, values and formats
// Author: Gabriel Demetrios Lafis

mod csv;
mod schema;

pub use self::csv::*;
pub use schema::*;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Represents a generic data source
pub trait DataSource {
    /// Read a table from the source
    fn read(&self) -> Result<Table, DataError>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Represents a generic data sink
pub trait DataSink {
    /// Write a table to the sink
    fn write(&self, table: &Table) -> Result<(), DataError>;

    /// Get the sink name
    fn name(&self) -> &str;
}

/// An in-memory table: a schema of named, typed columns and aligned rows.
///
/// Tables are treated as immutable once loaded; every processing step
/// produces a new table instead of mutating its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub schema: Schema,
    pub data: Vec<Row>,
    pub metadata: Metadata,
}

impl Table {
    /// Create a new empty table
    pub fn new(schema: Schema) -> Self {
        Table {
            schema,
            data: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Create an empty table sharing this table's schema and metadata
    pub fn empty_like(&self) -> Self {
        Table {
            schema: self.schema.clone(),
            data: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Add a row to the table
    pub fn add_row(&mut self, row: Row) -> Result<(), DataError> {
        if row.values.len() != self.schema.fields.len() {
            return Err(DataError::SchemaMismatch {
                expected: self.schema.fields.len(),
                found: row.values.len(),
            });
        }

        self.data.push(row);
        Ok(())
    }

    /// Get the number of rows in the table
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of columns in the table
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.column_count())
    }

    /// Get the position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Iterate over the values of one column, in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.data.iter().filter_map(move |row| row.get(index))
    }
}

/// Represents a row in a table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    /// Create a new row with the given values
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Get a reference to a value by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Represents a single cell value
///
/// Serializes as a bare JSON scalar; nulls and non-finite floats become `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Numeric view of the value, `None` for nulls and strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text as it appears in a CSV cell.
    ///
    /// Floats always keep a fractional part (`2.0`, not `2`) so a re-parse
    /// infers the same column type.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format!("{:?}", f),
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Represents a schema for a table
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema with the given fields
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    /// Get the position of a field by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Represents a field in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    /// Create a new field
    pub fn new(name: String, data_type: DataType, nullable: bool) -> Self {
        Field {
            name,
            data_type,
            nullable,
        }
    }
}

/// Column type inferred at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    String,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
        }
    }
}

/// Represents metadata for a table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub properties: HashMap<String, String>,
}

impl Metadata {
    /// Create new empty metadata
    pub fn new() -> Self {
        Metadata {
            properties: HashMap::new(),
        }
    }

    /// Add a property to the metadata
    pub fn add(&mut self, key: String, value: String) {
        self.properties.insert(key, value);
    }
}

/// Errors raised while loading, validating or writing tables
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Empty input: no header row found")]
    EmptyInput,
    #[error("Schema mismatch: expected {expected} values, found {found}")]
    SchemaMismatch { expected: usize, found: usize },
    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: String,
        found: DataType,
    },
}
