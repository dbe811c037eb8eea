//! CSV ingest and normalization.
//!
//! This module turns a sales CSV into typed `SalesRecord`s.
//!
//! Design goals:
//! - **Strict schema**: `Date`, `Product`, `Quantity` must be present (exact names)
//! - **Strict rows**: any unparseable date or quantity fails the whole load
//! - **Deterministic behavior**: file order is preserved; products are listed in
//!   order of first appearance
//! - **Separation of concerns**: no fitting logic here

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{ProductDataset, SalesRecord};
use crate::error::AppError;

pub const COL_DATE: &str = "Date";
pub const COL_PRODUCT: &str = "Product";
pub const COL_QUANTITY: &str = "Quantity";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// The full sales file, in file order.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    pub records: Vec<SalesRecord>,
}

impl SalesDataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product identifiers in order of first appearance.
    pub fn products(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for r in &self.records {
            if seen.insert(r.product.as_str()) {
                out.push(r.product.clone());
            }
        }
        out
    }

    /// All rows for `product`, stably sorted by date. Empty if the product is absent.
    pub fn product_slice(&self, product: &str) -> ProductDataset {
        let mut records: Vec<SalesRecord> = self
            .records
            .iter()
            .filter(|r| r.product == product)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        ProductDataset {
            product: product.to_string(),
            records,
        }
    }

    /// Earliest and latest date across all products.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Load a sales CSV from disk.
pub fn load_sales(path: &Path) -> Result<SalesDataset, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data(format!("Failed to open sales CSV '{}': {e}", path.display()))
    })?;
    read_sales(file)
}

/// Parse a sales CSV from any reader.
pub fn read_sales<R: Read>(reader: R) -> Result<SalesDataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = required_column(&header_map, COL_DATE)?;
    let product_idx = required_column(&header_map, COL_PRODUCT)?;
    let quantity_idx = required_column(&header_map, COL_QUANTITY)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("CSV parse error on line {line}: {e}")))?;

        let raw_date = field(&record, date_idx);
        let date = parse_date(raw_date)
            .ok_or_else(|| AppError::data(format!("Unparseable date '{raw_date}' on line {line}.")))?;

        let product = field(&record, product_idx);
        if product.is_empty() {
            return Err(AppError::data(format!("Empty product on line {line}.")));
        }

        let raw_qty = field(&record, quantity_idx);
        let quantity: f64 = raw_qty
            .parse()
            .map_err(|_| AppError::data(format!("Unparseable quantity '{raw_qty}' on line {line}.")))?;
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(AppError::data(format!(
                "Quantity must be a non-negative number (got {raw_qty}) on line {line}."
            )));
        }

        records.push(SalesRecord {
            date,
            product: product.to_string(),
            quantity,
        });
    }

    Ok(SalesDataset { records })
}

/// Parse a calendar date, accepting a handful of common layouts.
///
/// Timestamps are truncated to their date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Write records as a sales CSV (`Date,Product,Quantity`, ISO dates).
pub fn write_sales<W: Write>(writer: W, records: &[SalesRecord]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([COL_DATE, COL_PRODUCT, COL_QUANTITY])
        .map_err(|e| AppError::io(format!("Failed to write sales CSV header: {e}")))?;
    for r in records {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.product.clone(),
            r.quantity.to_string(),
        ])
        .map_err(|e| AppError::io(format!("Failed to write sales CSV row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush sales CSV: {e}")))?;
    Ok(())
}

/// Write a sales CSV to disk, creating parent directories.
pub fn write_sales_csv(path: &Path, records: &[SalesRecord]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create sales CSV '{}': {e}", path.display())))?;
    write_sales(file, records)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn required_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map.get(name).copied().ok_or_else(|| {
        let mut found: Vec<&str> = header_map.keys().map(String::as_str).collect();
        found.sort();
        AppError::data(format!(
            "Missing required column '{name}' (found: {}).",
            found.join(", ")
        ))
    })
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}
