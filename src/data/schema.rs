// Schema definition and validation
// Author: Gabriel Demetrios Lafis

use std::ops::Deref;

use super::{DataError, DataType, Field, Schema, Table};

pub const MAKE: &str = "MAKE";
pub const VEHICLE_CLASS: &str = "VEHICLECLASS";
pub const FUEL_TYPE: &str = "FUELTYPE";
pub const ENGINE_SIZE: &str = "ENGINESIZE";
pub const CO2_EMISSIONS: &str = "CO2EMISSIONS";
pub const FUEL_CONSUMPTION_COMB: &str = "FUELCONSUMPTION_COMB";

/// Schema validator for the columns a consumer depends on
pub struct SchemaValidator;

impl SchemaValidator {
    /// Require a column to exist, returning its index
    pub fn require_column(schema: &Schema, name: &str) -> Result<usize, DataError> {
        schema
            .index_of(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Require a column to exist and hold numbers
    pub fn require_numeric(schema: &Schema, name: &str) -> Result<usize, DataError> {
        let index = Self::require_column(schema, name)?;
        let data_type = schema.fields[index].data_type;
        if !data_type.is_numeric() {
            return Err(DataError::ColumnType {
                column: name.to_string(),
                expected: "numeric".to_string(),
                found: data_type,
            });
        }
        Ok(index)
    }
}

/// Schema builder for creating schemas
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Add a field to the schema
    pub fn add_field(mut self, name: &str, data_type: DataType, nullable: bool) -> Self {
        self.fields.push(Field::new(name.to_string(), data_type, nullable));
        self
    }

    /// Add an integer field
    pub fn add_integer(self, name: &str, nullable: bool) -> Self {
        self.add_field(name, DataType::Integer, nullable)
    }

    /// Add a float field
    pub fn add_float(self, name: &str, nullable: bool) -> Self {
        self.add_field(name, DataType::Float, nullable)
    }

    /// Add a string field
    pub fn add_string(self, name: &str, nullable: bool) -> Self {
        self.add_field(name, DataType::String, nullable)
    }

    /// Build the schema
    pub fn build(self) -> Schema {
        Schema::new(self.fields)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A table known to carry every column the dashboards reference.
///
/// Construction is the only place a missing or mistyped required column is
/// reported; views built on a `FuelTable` never fail on column lookup.
/// Categorical columns accept any type, numeric ones must be integer or float.
/// Extra columns pass through untouched.
#[derive(Debug, Clone)]
pub struct FuelTable {
    table: Table,
}

impl FuelTable {
    pub fn new(table: Table) -> Result<Self, DataError> {
        let schema = &table.schema;
        for column in [MAKE, VEHICLE_CLASS, FUEL_TYPE] {
            SchemaValidator::require_column(schema, column)?;
        }
        for column in [ENGINE_SIZE, CO2_EMISSIONS, FUEL_CONSUMPTION_COMB] {
            SchemaValidator::require_numeric(schema, column)?;
        }

        Ok(FuelTable { table })
    }
}

impl Deref for FuelTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.table
    }
}
