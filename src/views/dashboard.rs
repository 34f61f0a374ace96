// Dashboard view: headline metrics and charts over the filtered table
// Author: Gabriel Demetrios Lafis

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::{
    FuelTable, Table, CO2_EMISSIONS, ENGINE_SIZE, FUEL_CONSUMPTION_COMB, FUEL_TYPE, MAKE,
    VEHICLE_CLASS,
};
use crate::processing::{aggregate, filter_rows, FilterSpec, ProcessingError, StatsType};
use super::chart::{ChartRenderer, ChartSpec};
use super::format::format_metric;
use super::raw_data::{unless_everything, FilterOptions};

/// Sidebar selections of the dashboard page; empty lists leave a
/// dimension unrestricted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub makes: Vec<String>,
    pub fuel_types: Vec<String>,
    pub vehicle_classes: Vec<String>,
}

impl DashboardQuery {
    pub fn specs(&self, options: &FilterOptions) -> Vec<FilterSpec> {
        vec![
            FilterSpec::categorical(MAKE, unless_everything(&self.makes, &options.makes)),
            FilterSpec::categorical(
                FUEL_TYPE,
                unless_everything(&self.fuel_types, &options.fuel_types),
            ),
            FilterSpec::categorical(
                VEHICLE_CLASS,
                unless_everything(&self.vehicle_classes, &options.vehicle_classes),
            ),
        ]
    }
}

/// Headline means; each is `NaN` when no rows survive the filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mean_co2_emissions: f64,
    pub mean_fuel_consumption_comb: f64,
    pub mean_engine_size: f64,
}

impl Metrics {
    pub fn compute(table: &Table) -> Result<Self, ProcessingError> {
        Ok(Metrics {
            mean_co2_emissions: aggregate(table, CO2_EMISSIONS, StatsType::Mean)?,
            mean_fuel_consumption_comb: aggregate(table, FUEL_CONSUMPTION_COMB, StatsType::Mean)?,
            mean_engine_size: aggregate(table, ENGINE_SIZE, StatsType::Mean)?,
        })
    }

    /// `(label, formatted value)` pairs in display order
    pub fn formatted(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Mean CO₂", format_metric(self.mean_co2_emissions, "g/km")),
            (
                "Mean combined consumption",
                format_metric(self.mean_fuel_consumption_comb, "L/100km"),
            ),
            ("Mean engine size", format_metric(self.mean_engine_size, "L")),
        ]
    }
}

/// Everything the dashboard page shows for one set of selections
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub table: Table,
    pub metrics: Metrics,
    pub charts: Vec<ChartSpec>,
}

impl DashboardView {
    /// Hand each chart and the filtered table to the charting layer
    pub fn render<R: ChartRenderer + ?Sized>(&self, renderer: &R) -> Result<Vec<JsonValue>, ProcessingError> {
        self.charts
            .iter()
            .map(|spec| renderer.render(&self.table, spec))
            .collect()
    }
}

/// Filter the table by the dashboard selections and summarise it
pub fn dashboard_view(
    fuel: &FuelTable,
    query: &DashboardQuery,
    histogram_bins: usize,
) -> Result<DashboardView, ProcessingError> {
    if histogram_bins == 0 {
        return Err(ProcessingError::InvalidArgument(
            "histogram bin count must be positive".to_string(),
        ));
    }

    let options = FilterOptions::from_table(fuel)?;
    let table = filter_rows(fuel, &query.specs(&options))?;
    if table.is_empty() {
        warn!("Dashboard filters matched no rows");
    }

    let metrics = Metrics::compute(&table)?;
    debug!("Dashboard metrics over {} rows: {:?}", table.len(), metrics);

    Ok(DashboardView {
        table,
        metrics,
        charts: vec![
            ChartSpec::engine_size_vs_co2(),
            ChartSpec::co2_by_vehicle_class(),
            ChartSpec::combined_consumption(histogram_bins),
        ],
    })
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use serde_json::json;

    use super::*;
    use crate::data::load;
    use crate::views::chart::{ChartKind, MockChartRenderer};
    use crate::views::format::NO_DATA;

    fn fuel() -> FuelTable {
        FuelTable::new(
            load(
                b"MAKE,VEHICLECLASS,ENGINESIZE,FUELTYPE,FUELCONSUMPTION_COMB,CO2EMISSIONS\n\
                  TOYOTA,MID-SIZE,2.0,Z,7.6,180\n\
                  FORD,PICKUP,3.5,X,12.8,250\n\
                  FORD,COMPACT,1.5,X,7.0,160\n",
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn unfiltered_metrics() {
        let view = dashboard_view(&fuel(), &DashboardQuery::default(), 30).unwrap();
        assert_eq!(view.table.len(), 3);
        assert!((view.metrics.mean_co2_emissions - 590.0 / 3.0).abs() < 1e-9);
        assert!((view.metrics.mean_engine_size - 7.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn make_filter_narrows_metrics() {
        let query = DashboardQuery {
            makes: vec!["TOYOTA".to_string()],
            ..Default::default()
        };
        let view = dashboard_view(&fuel(), &query, 30).unwrap();
        assert_eq!(view.metrics.mean_co2_emissions, 180.0);
        assert_eq!(view.metrics.formatted()[0].1, "180.0 g/km");
    }

    #[test]
    fn every_class_selected_keeps_unclassified_rows() {
        let fuel = FuelTable::new(
            load(
                b"MAKE,VEHICLECLASS,ENGINESIZE,FUELTYPE,FUELCONSUMPTION_COMB,CO2EMISSIONS\n\
                  TOYOTA,MID-SIZE,2.0,Z,7.6,180\n\
                  FORD,,3.5,X,12.8,250\n",
            )
            .unwrap(),
        )
        .unwrap();
        let query = DashboardQuery {
            vehicle_classes: vec!["MID-SIZE".to_string()],
            ..Default::default()
        };
        assert_eq!(dashboard_view(&fuel, &query, 30).unwrap().table.len(), 2);

        let query = DashboardQuery {
            vehicle_classes: vec!["MID-SIZE".to_string()],
            fuel_types: vec!["X".to_string()],
            ..Default::default()
        };
        let view = dashboard_view(&fuel, &query, 30).unwrap();
        assert_eq!(view.table.len(), 1);
        assert_eq!(view.metrics.mean_co2_emissions, 250.0);
    }

    #[test]
    fn disjoint_filters_show_no_data() {
        let query = DashboardQuery {
            makes: vec!["TOYOTA".to_string()],
            fuel_types: vec!["X".to_string()],
            ..Default::default()
        };
        let view = dashboard_view(&fuel(), &query, 30).unwrap();
        assert!(view.table.is_empty());
        assert!(view.metrics.mean_co2_emissions.is_nan());
        assert!(view.metrics.formatted().iter().all(|(_, v)| v == NO_DATA));
    }

    #[test]
    fn charts_use_configured_bins() {
        let view = dashboard_view(&fuel(), &DashboardQuery::default(), 12).unwrap();
        assert_eq!(view.charts.len(), 3);
        assert!(matches!(view.charts[2].kind, ChartKind::Histogram { bins: 12, .. }));
        assert!(dashboard_view(&fuel(), &DashboardQuery::default(), 0).is_err());
    }

    #[test]
    fn render_hands_filtered_table_to_renderer() {
        let query = DashboardQuery {
            vehicle_classes: vec!["PICKUP".to_string(), "COMPACT".to_string()],
            ..Default::default()
        };
        let view = dashboard_view(&fuel(), &query, 30).unwrap();

        let mut renderer = MockChartRenderer::new();
        renderer
            .expect_render()
            .with(always(), always())
            .times(3)
            .returning(|table, spec| Ok(json!({ "rows": table.len(), "x": spec.x })));

        let figures = view.render(&renderer).unwrap();
        assert_eq!(figures.len(), 3);
        assert_eq!(figures[0], json!({ "rows": 2, "x": "ENGINESIZE" }));
        assert_eq!(figures[2]["x"], "FUELCONSUMPTION_COMB");
    }

    #[test]
    fn renderer_errors_propagate() {
        let view = dashboard_view(&fuel(), &DashboardQuery::default(), 30).unwrap();

        let mut renderer = MockChartRenderer::new();
        renderer
            .expect_render()
            .returning(|_, _| Err(ProcessingError::UnknownColumn("FUELTYPE".to_string())));

        assert!(matches!(
            view.render(&renderer),
            Err(ProcessingError::UnknownColumn(_))
        ));
    }
}
