use shoprag_core::error::{Error, Result};
use shoprag_core::types::{parse_price, Chunk, ProductSuggestion};

/// Maximum number of suggestions returned by one filter call.
pub const PAGE_SIZE: usize = 10;

/// Metadata-only product filter. `category` must match exactly; a blank
/// category means no category filter. With `max_price`, products whose vegan
/// price is above it or cannot be read as a number are left out.
pub fn filter_suggestions(chunks: &[Chunk], category: Option<&str>, max_price: Option<f64>) -> Result<Vec<ProductSuggestion>> {
    if let Some(limit) = max_price {
        if !limit.is_finite() || limit < 0.0 {
            return Err(Error::InvalidArgument(format!("max_price must be a non-negative number, got {}", limit)));
        }
    }
    let category = category.filter(|c| !c.trim().is_empty());

    Ok(chunks
        .iter()
        .map(|c| &c.metadata)
        .filter(|r| category.map_or(true, |want| r.category == want))
        .filter(|r| match max_price {
            None => true,
            Some(limit) => parse_price(&r.vegan_price).is_some_and(|p| p <= limit),
        })
        .take(PAGE_SIZE)
        .map(ProductSuggestion::from)
        .collect())
}
