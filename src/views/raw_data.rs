// Raw-data view: filter, project and download the vehicle table
// Author: Gabriel Demetrios Lafis

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::data::{
    serialize_csv, DataError, FuelTable, Table, CO2_EMISSIONS, ENGINE_SIZE, FUEL_TYPE, MAKE,
    VEHICLE_CLASS,
};
use crate::processing::{
    aggregate, column_bounds, filter_rows, select_columns, unique_values, FilterSpec,
    ProcessingError, StatsType,
};

pub const CSV_MIME: &str = "text/csv";

/// Choices offered by the filter widgets, with everything selected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub columns: Vec<String>,
    pub makes: Vec<String>,
    pub vehicle_classes: Vec<String>,
    pub fuel_types: Vec<String>,
    pub engine_size: Option<(f64, f64)>,
    /// Whole-number bounds that still enclose every observed value
    pub co2_emissions: Option<(f64, f64)>,
}

impl FilterOptions {
    pub fn from_table(fuel: &FuelTable) -> Result<Self, ProcessingError> {
        Ok(FilterOptions {
            columns: fuel.column_names().into_iter().map(String::from).collect(),
            makes: unique_values(fuel, MAKE)?,
            vehicle_classes: unique_values(fuel, VEHICLE_CLASS)?,
            fuel_types: unique_values(fuel, FUEL_TYPE)?,
            engine_size: column_bounds(fuel, ENGINE_SIZE)?,
            co2_emissions: column_bounds(fuel, CO2_EMISSIONS)?
                .map(|(min, max)| (min.floor(), max.ceil())),
        })
    }
}

/// A widget selection holding every offered category restricts nothing,
/// so it becomes the empty selection. Rows with a missing category then
/// stay, as they do when nothing is picked.
pub(super) fn unless_everything<'a>(selected: &'a [String], offered: &[String]) -> &'a [String] {
    if !offered.is_empty() && offered.iter().all(|o| selected.contains(o)) {
        &[]
    } else {
        selected
    }
}

/// Widget state of the raw-data page.
///
/// Empty category lists and absent ranges leave that dimension
/// unrestricted; `columns: None` keeps every column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDataQuery {
    pub columns: Option<Vec<String>>,
    pub makes: Vec<String>,
    pub vehicle_classes: Vec<String>,
    pub fuel_types: Vec<String>,
    pub engine_size: Option<(f64, f64)>,
    pub co2_emissions: Option<(f64, f64)>,
}

impl RawDataQuery {
    /// Build the conjunction of filter specs this query describes against
    /// the options of the loaded table
    pub fn specs(&self, options: &FilterOptions) -> Result<Vec<FilterSpec>, ProcessingError> {
        let mut specs = vec![
            FilterSpec::categorical(MAKE, unless_everything(&self.makes, &options.makes)),
            FilterSpec::categorical(
                VEHICLE_CLASS,
                unless_everything(&self.vehicle_classes, &options.vehicle_classes),
            ),
            FilterSpec::categorical(
                FUEL_TYPE,
                unless_everything(&self.fuel_types, &options.fuel_types),
            ),
        ];

        if let Some((lower, upper)) = self.engine_size {
            specs.push(FilterSpec::range(ENGINE_SIZE, lower, upper)?);
        }
        if let Some((lower, upper)) = self.co2_emissions {
            specs.push(FilterSpec::range(CO2_EMISSIONS, lower, upper)?);
        }

        Ok(specs)
    }
}

/// A filtered, projected table with its shape and numeric means
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredResult {
    pub rows: usize,
    pub columns: usize,
    pub table: Table,
    /// Mean of each numeric column; `NaN` when the column has no values
    pub means: BTreeMap<String, f64>,
}

impl FilteredResult {
    pub fn new(table: Table) -> Result<Self, ProcessingError> {
        let mut means = BTreeMap::new();
        for field in table.schema.fields.iter().filter(|f| f.data_type.is_numeric()) {
            means.insert(field.name.clone(), aggregate(&table, &field.name, StatsType::Mean)?);
        }

        let (rows, columns) = table.shape();
        Ok(FilteredResult {
            rows,
            columns,
            table,
            means,
        })
    }

    /// Markdown line describing the table's shape
    pub fn summary(&self) -> String {
        format!(
            "The table has **{}** rows and **{}** columns",
            self.rows, self.columns
        )
    }

    /// Package the filtered table for download
    pub fn download(&self, file_name: &str) -> Result<Download, DataError> {
        Download::csv(&self.table, file_name)
    }
}

/// Apply the raw-data page's filters, then keep the selected columns
pub fn raw_data_view(fuel: &FuelTable, query: &RawDataQuery) -> Result<FilteredResult, ProcessingError> {
    let options = FilterOptions::from_table(fuel)?;
    let filtered = filter_rows(fuel, &query.specs(&options)?)?;
    let projected = match &query.columns {
        Some(columns) => select_columns(&filtered, columns)?,
        None => filtered,
    };

    if projected.is_empty() {
        warn!("No rows match the current filters");
    }
    debug!("Raw data view shape: {:?}", projected.shape());

    FilteredResult::new(projected)
}

/// CSV bytes offered for download under a file name
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn csv(table: &Table, file_name: &str) -> Result<Self, DataError> {
        let file_name = file_name.trim();
        // empty, `.` and `..` name no file
        if file_name.chars().all(|c| c == '.') || file_name.contains(['/', '\\']) {
            return Err(DataError::InvalidFileName(file_name.to_string()));
        }

        Ok(Download {
            file_name: file_name.to_string(),
            mime: CSV_MIME,
            bytes: serialize_csv(table)?,
        })
    }

    /// Write the bytes to `dir/file_name`
    pub fn save_to<P: AsRef<Path>>(&self, dir: P) -> Result<(), DataError> {
        let path = dir.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{load, Value};

    fn fuel() -> FuelTable {
        FuelTable::new(
            load(
                b"MAKE,MODEL,VEHICLECLASS,ENGINESIZE,FUELTYPE,FUELCONSUMPTION_COMB,CO2EMISSIONS\n\
                  TOYOTA,CAMRY,MID-SIZE,2.0,Z,7.6,180\n\
                  FORD,F150,PICKUP,3.5,X,12.8,250\n\
                  FORD,FOCUS,COMPACT,1.6,X,7.0,165\n",
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn options_list_everything() {
        let options = FilterOptions::from_table(&fuel()).unwrap();
        assert_eq!(options.makes, vec!["TOYOTA", "FORD"]);
        assert_eq!(options.fuel_types, vec!["Z", "X"]);
        assert_eq!(options.engine_size, Some((1.6, 3.5)));
        assert_eq!(options.co2_emissions, Some((165.0, 250.0)));
        assert_eq!(options.columns.len(), 7);
    }

    #[test]
    fn default_query_keeps_everything() {
        let fuel = fuel();
        let result = raw_data_view(&fuel, &RawDataQuery::default()).unwrap();
        assert_eq!((result.rows, result.columns), (3, 7));
        assert_eq!(result.table.data, fuel.data);
    }

    #[test]
    fn full_option_selection_matches_default() {
        let fuel = fuel();
        let options = FilterOptions::from_table(&fuel).unwrap();
        let query = RawDataQuery {
            columns: Some(options.columns.clone()),
            makes: options.makes.clone(),
            vehicle_classes: options.vehicle_classes.clone(),
            fuel_types: options.fuel_types.clone(),
            engine_size: options.engine_size,
            co2_emissions: options.co2_emissions,
        };
        let result = raw_data_view(&fuel, &query).unwrap();
        assert_eq!(result.table.data, fuel.data);
    }

    #[test]
    fn full_selection_keeps_rows_without_a_make() {
        let fuel = FuelTable::new(
            load(
                b"MAKE,VEHICLECLASS,ENGINESIZE,FUELTYPE,FUELCONSUMPTION_COMB,CO2EMISSIONS\n\
                  TOYOTA,MID-SIZE,2.0,Z,7.6,180\n\
                  FORD,PICKUP,3.5,X,12.8,250\n\
                  ,COMPACT,1.6,Z,7.0,165\n",
            )
            .unwrap(),
        )
        .unwrap();
        let options = FilterOptions::from_table(&fuel).unwrap();

        let everything = RawDataQuery {
            makes: options.makes.clone(),
            ..Default::default()
        };
        assert_eq!(raw_data_view(&fuel, &everything).unwrap().rows, 3);

        let toyota = RawDataQuery {
            makes: vec!["TOYOTA".to_string()],
            fuel_types: vec!["Z".to_string()],
            ..Default::default()
        };
        let result = raw_data_view(&fuel, &toyota).unwrap();
        assert_eq!(result.rows, 1);
        assert_eq!(result.means["CO2EMISSIONS"], 180.0);
    }

    #[test]
    fn filters_then_projects() {
        let query = RawDataQuery {
            columns: Some(vec!["MODEL".to_string(), "CO2EMISSIONS".to_string()]),
            makes: vec!["FORD".to_string()],
            co2_emissions: Some((200.0, 300.0)),
            ..Default::default()
        };
        let result = raw_data_view(&fuel(), &query).unwrap();
        assert_eq!((result.rows, result.columns), (1, 2));
        assert_eq!(result.table.data[0].values[0], Value::String("F150".to_string()));
        assert_eq!(result.means["CO2EMISSIONS"], 250.0);
        assert!(!result.means.contains_key("MODEL"));
        assert_eq!(result.summary(), "The table has **1** rows and **2** columns");
    }

    #[test]
    fn empty_result_has_nan_means() {
        let query = RawDataQuery {
            engine_size: Some((10.0, 12.0)),
            ..Default::default()
        };
        let result = raw_data_view(&fuel(), &query).unwrap();
        assert_eq!(result.rows, 0);
        assert!(result.means["ENGINESIZE"].is_nan());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let query = RawDataQuery {
            engine_size: Some((3.0, 2.0)),
            ..Default::default()
        };
        assert!(matches!(
            raw_data_view(&fuel(), &query),
            Err(ProcessingError::InvalidRange { .. })
        ));
    }

    #[test]
    fn unknown_projection_column_fails() {
        let query = RawDataQuery {
            columns: Some(vec!["YEAR".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            raw_data_view(&fuel(), &query),
            Err(ProcessingError::UnknownColumn(_))
        ));
    }

    #[test]
    fn download_is_csv_without_index() {
        let query = RawDataQuery {
            columns: Some(vec!["MAKE".to_string(), "ENGINESIZE".to_string()]),
            fuel_types: vec!["Z".to_string()],
            ..Default::default()
        };
        let download = raw_data_view(&fuel(), &query)
            .unwrap()
            .download(" toyota.csv ")
            .unwrap();

        assert_eq!(download.file_name, "toyota.csv");
        for bad in ["../escape.csv", "", "  ", ".", ".."] {
            assert!(matches!(
                Download::csv(&fuel(), bad),
                Err(DataError::InvalidFileName(_))
            ));
        }
        assert_eq!(download.mime, "text/csv");
        assert_eq!(download.bytes, b"MAKE,ENGINESIZE\nTOYOTA,2.0\n".to_vec());

        let dir = tempfile::tempdir().unwrap();
        download.save_to(dir.path()).unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("toyota.csv")).unwrap(),
            download.bytes
        );
    }
}
