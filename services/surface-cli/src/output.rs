//! JSON reports written by the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use aq_common::AqiCategory;
use serde::Serialize;
use surface::{QueryResult, Surface};

/// One answered point query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub lon: f64,
    pub lat: f64,
    pub value: Option<f64>,
    pub extrapolated: bool,
    pub category: Option<AqiCategory>,
    pub label: Option<&'static str>,
}

impl QueryReport {
    pub fn new(lon: f64, lat: f64, result: QueryResult) -> Self {
        let category = result.value.map(AqiCategory::from_index);
        Self {
            lon,
            lat,
            value: result.value,
            extrapolated: result.extrapolated,
            category,
            label: category.map(|c| c.label()),
        }
    }
}

/// Output of the `query` subcommand.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub crs: String,
    pub method: String,
    pub results: Vec<QueryReport>,
}

impl QueryResponse {
    pub fn from_surface(surface: &Surface, points: &[(f64, f64)]) -> Self {
        Self {
            crs: surface.crs().to_string(),
            method: surface.strategy().to_string(),
            results: points
                .iter()
                .map(|&(lon, lat)| QueryReport::new(lon, lat, surface.query(lon, lat)))
                .collect(),
        }
    }
}

/// Serialize `value` as pretty JSON to `path`, or stdout when `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
