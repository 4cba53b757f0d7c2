//! Domain types shared by the loader, the vector index and the engine.

use serde::{Deserialize, Serialize};

/// Catalog column names, in the order the chunk template renders them.
pub const COL_PRODUCT_NAME: &str = "Product Name";
pub const COL_CATEGORY: &str = "Category";
pub const COL_ANIMAL_MATERIALS: &str = "Animal Materials Used";
pub const COL_CRUELTY_FLAG: &str = "Animal Cruelty Flag";
pub const COL_CRUELTY_NOTE: &str = "Cruelty Note";
pub const COL_ESTIMATED_PRICE: &str = "Estimated Price";
pub const COL_VEGAN_ALTERNATIVE: &str = "Vegan Alternative";
pub const COL_VEGAN_MATERIAL: &str = "Material";
pub const COL_VEGAN_PRICE: &str = "Price";
pub const COL_WHY_VEGAN: &str = "Why Choose Vegan";

pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_PRODUCT_NAME,
    COL_CATEGORY,
    COL_ANIMAL_MATERIALS,
    COL_CRUELTY_FLAG,
    COL_CRUELTY_NOTE,
    COL_ESTIMATED_PRICE,
    COL_VEGAN_ALTERNATIVE,
    COL_VEGAN_MATERIAL,
    COL_VEGAN_PRICE,
    COL_WHY_VEGAN,
];

/// One catalog row: an animal-derived product and its vegan alternative.
///
/// Prices are kept exactly as they appear in the catalog (they may carry
/// currency symbols or thousands separators); use [`parse_price`] when a
/// number is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_name: String,
    pub category: String,
    pub animal_materials: String,
    pub cruelty_flag: String,
    pub cruelty_note: String,
    pub estimated_price: String,
    pub vegan_alternative: String,
    pub vegan_material: String,
    pub vegan_price: String,
    pub why_vegan: String,
}

/// A retrievable unit: rendered text plus the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ProductRecord,
}

/// A catalog entry surfaced by metadata filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSuggestion {
    pub product_name: String,
    pub category: String,
    pub animal_materials: String,
    pub cruelty_flag: String,
    pub vegan_alternative: String,
    pub vegan_material: String,
    pub vegan_price: String,
    pub why_vegan: String,
}

impl From<&ProductRecord> for ProductSuggestion {
    fn from(r: &ProductRecord) -> Self {
        Self {
            product_name: r.product_name.clone(),
            category: r.category.clone(),
            animal_materials: r.animal_materials.clone(),
            cruelty_flag: r.cruelty_flag.clone(),
            vegan_alternative: r.vegan_alternative.clone(),
            vegan_material: r.vegan_material.clone(),
            vegan_price: r.vegan_price.clone(),
            why_vegan: r.why_vegan.clone(),
        }
    }
}

/// Parse a free-form currency string such as `"$1,250.00"` or `"€ 300"`.
///
/// Currency symbols, thousands separators and whitespace are dropped; `None`
/// is returned when what remains is not a finite number.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    if cleaned.is_empty() || !raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // Letters other than an exponent marker mean this was prose, not a price.
    if raw.chars().any(|c| c.is_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
