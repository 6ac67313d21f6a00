use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product as the pipeline reads it. Prices are integer cents.
/// Empty `colors`/`sizes` mean the axis is unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price_cents: i64,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// First image, used for order-item snapshots and cart rows.
    pub fn cover_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }

    /// A submitted size is acceptable when the product declares no sizes,
    /// when none was submitted, or when it is one of the declared sizes.
    pub fn allows_size(&self, size: Option<&str>) -> bool {
        match size {
            Some(s) => self.sizes.is_empty() || self.sizes.iter().any(|v| v == s),
            None => true,
        }
    }

    pub fn allows_color(&self, color: Option<&str>) -> bool {
        match color {
            Some(c) => self.colors.is_empty() || self.colors.iter().any(|v| v == c),
            None => true,
        }
    }
}
