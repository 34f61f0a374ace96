// Chart descriptions handed to the charting layer
// Author: Gabriel Demetrios Lafis

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::data::{Table, CO2_EMISSIONS, ENGINE_SIZE, FUEL_CONSUMPTION_COMB, FUEL_TYPE, VEHICLE_CLASS};
use crate::processing::ProcessingError;

pub const CO2_LABEL: &str = "CO₂ Emissions (g/km)";
pub const ENGINE_SIZE_LABEL: &str = "Engine Size (L)";
pub const FUEL_TYPE_LABEL: &str = "Fuel Type";
pub const VEHICLE_CLASS_LABEL: &str = "Vehicle Class";
pub const COMBINED_CONSUMPTION_LABEL: &str = "Combined Consumption (L/100km)";

/// Plot family and its layout knobs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Box,
    Histogram {
        bins: usize,
        bar_gap: f64,
        bar_group_gap: f64,
        y_title: String,
    },
}

/// Column bindings and labels for one chart.
///
/// A chart spec never transforms data; the renderer receives the filtered
/// table alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x: String,
    pub y: Option<String>,
    pub color: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl ChartSpec {
    /// Engine size against CO2 emissions, coloured by fuel type
    pub fn engine_size_vs_co2() -> Self {
        ChartSpec {
            title: "Engine Size vs CO₂ Emissions".to_string(),
            kind: ChartKind::Scatter,
            x: ENGINE_SIZE.to_string(),
            y: Some(CO2_EMISSIONS.to_string()),
            color: Some(FUEL_TYPE.to_string()),
            labels: labels(&[
                (ENGINE_SIZE, ENGINE_SIZE_LABEL),
                (CO2_EMISSIONS, CO2_LABEL),
                (FUEL_TYPE, FUEL_TYPE_LABEL),
            ]),
        }
    }

    /// Distribution of CO2 emissions per vehicle class
    pub fn co2_by_vehicle_class() -> Self {
        ChartSpec {
            title: "CO₂ Emissions by Vehicle Class".to_string(),
            kind: ChartKind::Box,
            x: VEHICLE_CLASS.to_string(),
            y: Some(CO2_EMISSIONS.to_string()),
            color: None,
            labels: labels(&[(VEHICLE_CLASS, VEHICLE_CLASS_LABEL), (CO2_EMISSIONS, CO2_LABEL)]),
        }
    }

    /// Histogram of combined fuel consumption
    pub fn combined_consumption(bins: usize) -> Self {
        ChartSpec {
            title: "Combined Fuel Consumption Distribution".to_string(),
            kind: ChartKind::Histogram {
                bins,
                bar_gap: 0.1,
                bar_group_gap: 0.05,
                y_title: "Vehicle Count".to_string(),
            },
            x: FUEL_CONSUMPTION_COMB.to_string(),
            y: None,
            color: None,
            labels: labels(&[(FUEL_CONSUMPTION_COMB, COMBINED_CONSUMPTION_LABEL)]),
        }
    }

    /// Every column the chart binds, x first
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.x.as_str())
            .chain(self.y.as_deref())
            .chain(self.color.as_deref())
            .collect()
    }

    /// Fail with `UnknownColumn` if `table` lacks a bound column
    pub fn check_columns(&self, table: &Table) -> Result<(), ProcessingError> {
        match self.columns().into_iter().find(|c| table.column_index(c).is_none()) {
            Some(missing) => Err(ProcessingError::UnknownColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Display label of a bound column, falling back to its name
    pub fn label<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map_or(column, String::as_str)
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(column, label)| (column.to_string(), label.to_string()))
        .collect()
}

/// The charting collaborator: turns a filtered table and a chart spec into
/// a figure description for the presentation layer to draw.
#[cfg_attr(test, mockall::automock)]
pub trait ChartRenderer {
    fn render(&self, table: &Table, spec: &ChartSpec) -> Result<JsonValue, ProcessingError>;
}

/// Renders a chart as a JSON figure: the spec plus the bound columns' values
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, table: &Table, spec: &ChartSpec) -> Result<JsonValue, ProcessingError> {
        spec.check_columns(table)?;

        let mut data = serde_json::Map::new();
        for column in spec.columns() {
            let values: Vec<JsonValue> = match table.column_index(column) {
                Some(index) => table
                    .column_values(index)
                    .map(|v| serde_json::to_value(v).unwrap_or(JsonValue::Null))
                    .collect(),
                None => Vec::new(),
            };
            data.insert(column.to_string(), JsonValue::Array(values));
        }

        Ok(json!({
            "spec": spec,
            "rows": table.len(),
            "axes": {
                "x": spec.label(&spec.x),
                "y": spec.y.as_deref().map(|y| spec.label(y)),
            },
            "data": data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    fn vehicles() -> Table {
        load(
            b"VEHICLECLASS,ENGINESIZE,FUELTYPE,CO2EMISSIONS,FUELCONSUMPTION_COMB\n\
              COMPACT,2.0,Z,196,8.5\n\
              SUV,3.5,X,,11.2\n",
        )
        .unwrap()
    }

    #[test]
    fn scatter_binds_three_columns() {
        let spec = ChartSpec::engine_size_vs_co2();
        assert_eq!(spec.columns(), vec![ENGINE_SIZE, CO2_EMISSIONS, FUEL_TYPE]);
        assert_eq!(spec.label(CO2_EMISSIONS), CO2_LABEL);
        assert_eq!(spec.label("MODEL"), "MODEL");
    }

    #[test]
    fn histogram_carries_layout() {
        let spec = ChartSpec::combined_consumption(30);
        assert_eq!(spec.columns(), vec![FUEL_CONSUMPTION_COMB]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"]["type"], "histogram");
        assert_eq!(json["kind"]["bins"], 30);
        assert_eq!(json["kind"]["bar_gap"], 0.1);
    }

    #[test]
    fn json_renderer_passes_values_through() {
        let table = vehicles();
        let figure = JsonChartRenderer
            .render(&table, &ChartSpec::co2_by_vehicle_class())
            .unwrap();

        assert_eq!(figure["rows"], 2);
        assert_eq!(figure["data"][VEHICLE_CLASS], json!(["COMPACT", "SUV"]));
        assert_eq!(figure["data"][CO2_EMISSIONS], json!([196, null]));
        assert_eq!(figure["spec"]["kind"]["type"], "box");
        assert_eq!(figure["axes"]["x"], VEHICLE_CLASS_LABEL);
        assert_eq!(figure["axes"]["y"], CO2_LABEL);
    }

    #[test]
    fn histogram_figure_has_no_y_axis_label() {
        let table = vehicles();
        let figure = JsonChartRenderer
            .render(&table, &ChartSpec::combined_consumption(30))
            .unwrap();
        assert_eq!(figure["axes"]["x"], COMBINED_CONSUMPTION_LABEL);
        assert!(figure["axes"]["y"].is_null());
    }

    #[test]
    fn missing_bound_column_is_reported() {
        let table = load(b"ENGINESIZE\n2.0\n").unwrap();
        let err = JsonChartRenderer
            .render(&table, &ChartSpec::engine_size_vs_co2())
            .unwrap_err();
        assert!(matches!(err, ProcessingError::UnknownColumn(ref c) if c == CO2_EMISSIONS));
    }
}
