use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of the shopper's in-progress selection. Identity for merge and
/// update purposes is the (product_id, size, color) triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLine {
    fn matches(&self, product_id: Uuid, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id
            && self.size.as_deref() == size
            && self.color.as_deref() == color
    }
}

/// Client-side cart aggregate. Ordered; never holds two lines with the same
/// (product_id, size, color) triple.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `qty` of a variant, merging into an existing line when the
    /// triple already exists. A zero qty still counts as one.
    pub fn add_line(
        &mut self,
        product_id: Uuid,
        qty: u32,
        size: Option<String>,
        color: Option<String>,
    ) {
        let qty = qty.max(1);
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, size.as_deref(), color.as_deref()))
        {
            line.quantity += qty;
            return;
        }
        self.lines.push(CartLine {
            product_id,
            quantity: qty,
            size,
            color,
        });
    }

    /// Removes the one line matching the triple exactly. No partial match.
    pub fn remove_line(&mut self, product_id: Uuid, size: Option<&str>, color: Option<&str>) {
        self.lines.retain(|l| !l.matches(product_id, size, color));
    }

    /// Sets the matching line's quantity to `max(1, qty)`. Quantities never
    /// fall below one through this path; removal stays explicit.
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        qty: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, size, color))
        {
            line.quantity = qty.max(1);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines.
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct product ids, in first-seen order. Input to the enrichment
    /// batch lookup.
    pub fn distinct_product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        for l in &self.lines {
            if !ids.contains(&l.product_id) {
                ids.push(l.product_id);
            }
        }
        ids
    }
}
