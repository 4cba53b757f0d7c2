//! Catalog loading and chunk rendering.
//!
//! The catalog is a CSV file with the ten columns listed in
//! [`REQUIRED_COLUMNS`](crate::types::REQUIRED_COLUMNS), in any order. Rows
//! that lack a value for any required column are skipped with a warning;
//! a catalog with no usable rows is an error.
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::*;

#[derive(Debug, Default, Clone, Copy)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    /// Load the catalog and render one chunk per surviving row, in row order.
    pub fn process_catalog(&self, path: &Path) -> Result<Vec<Chunk>> {
        let records = self.load_catalog(path)?;
        let chunks: Vec<Chunk> = records.into_iter().map(build_chunk).collect();
        info!(chunks = chunks.len(), "created text chunks");
        Ok(chunks)
    }

    pub fn load_catalog(&self, path: &Path) -> Result<Vec<ProductRecord>> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("catalog file {}", path.display())));
        }
        let file = File::open(path)?;
        self.load_catalog_from_reader(file, &path.display().to_string())
    }

    /// Parse catalog rows from any reader; `source` only labels log lines and errors.
    pub fn load_catalog_from_reader<R: Read>(&self, reader: R, source: &str) -> Result<Vec<ProductRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        let absent: Vec<&str> = REQUIRED_COLUMNS.iter().copied().filter(|c| !columns.contains_key(*c)).collect();
        if !absent.is_empty() {
            warn!(source, missing = ?absent, "catalog header lacks required columns; affected rows will be skipped");
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (row_index, result) in reader.records().enumerate() {
            // +2: one for the header line, one for 1-based numbering.
            let line = row_index + 2;
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(source, line, error = %e, "skipping malformed catalog row");
                    skipped += 1;
                    continue;
                }
            };
            match record_from_row(&row, &columns) {
                Ok(record) => records.push(record),
                Err(column) => {
                    warn!(source, line, column, "skipping catalog row missing required column");
                    skipped += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(Error::EmptyCatalog(format!("no usable rows in {} ({} skipped)", source, skipped)));
        }
        info!(source, products = records.len(), skipped, "loaded catalog");
        Ok(records)
    }
}

fn record_from_row(row: &csv::StringRecord, columns: &HashMap<String, usize>) -> std::result::Result<ProductRecord, &'static str> {
    let field = |name: &'static str| -> std::result::Result<String, &'static str> {
        columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(name)
    };
    Ok(ProductRecord {
        product_name: field(COL_PRODUCT_NAME)?,
        category: field(COL_CATEGORY)?,
        animal_materials: field(COL_ANIMAL_MATERIALS)?,
        cruelty_flag: field(COL_CRUELTY_FLAG)?,
        cruelty_note: field(COL_CRUELTY_NOTE)?,
        estimated_price: field(COL_ESTIMATED_PRICE)?,
        vegan_alternative: field(COL_VEGAN_ALTERNATIVE)?,
        vegan_material: field(COL_VEGAN_MATERIAL)?,
        vegan_price: field(COL_VEGAN_PRICE)?,
        why_vegan: field(COL_WHY_VEGAN)?,
    })
}

/// Render a record into its chunk. The line order is part of what the
/// generator sees and must not change between builds of the same index.
pub fn build_chunk(record: ProductRecord) -> Chunk {
    let text = format!(
        "Product: {} ({})\n\
         Materials from animals: {}\n\
         Animal cruelty flag: {}\n\
         Cruelty Note: {}\n\
         Price: ${}\n\
         Vegan Alternative: {}\n\
         Vegan Material: {}\n\
         Vegan Price: ${}\n\
         Why choose vegan: {}\n",
        record.product_name,
        record.category,
        record.animal_materials,
        record.cruelty_flag,
        record.cruelty_note,
        without_dollar(&record.estimated_price),
        record.vegan_alternative,
        record.vegan_material,
        without_dollar(&record.vegan_price),
        record.why_vegan,
    );
    Chunk { text, metadata: record }
}

// The template supplies the `$`; avoid "$$1,200" when the catalog already has one.
fn without_dollar(price: &str) -> &str {
    price.trim().trim_start_matches('$').trim_start()
}
