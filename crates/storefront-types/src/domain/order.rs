use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a persisted order. `Shipped` and `Cancelled` are terminal
/// in the intended progression, but no transition table is enforced: admins
/// may set any status at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    /// Total number of steps in the fulfillment progress indicator.
    pub const PROGRESS_STEPS: u8 = 3;

    /// Display-only progress step out of [`Self::PROGRESS_STEPS`].
    /// `Cancelled` renders as a failure with zero progress regardless of
    /// whatever step preceded it.
    pub fn progress_step(&self) -> u8 {
        match self {
            OrderStatus::Pending => 1,
            OrderStatus::Paid => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Cancelled => 0,
        }
    }
}

/// Postal address attached to an order. Every field is optional; the
/// storefront collects whatever the shopper fills in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Snapshot of one purchased line, captured from the catalog at creation
/// time. Later catalog edits never alter it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image: String,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn subtotal_of(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::line_total_cents).sum()
}

impl Order {
    pub fn new(
        user_id: Uuid,
        items: Vec<OrderItem>,
        shipping_address: Address,
        billing_address: Address,
        note: String,
    ) -> anyhow::Result<Self> {
        if items.is_empty() {
            anyhow::bail!("order must contain at least one item");
        }
        for it in &items {
            if it.quantity == 0 {
                anyhow::bail!("item quantity must be > 0");
            }
            if it.unit_price_cents < 0 {
                anyhow::bail!("item unit price must not be negative");
            }
        }
        let subtotal_cents = subtotal_of(&items);
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            subtotal_cents,
            status: OrderStatus::Pending,
            shipping_address,
            billing_address,
            note,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Full item-list replacement. The subtotal is always recomputed from
    /// the new items; a caller-supplied subtotal is never accepted.
    pub fn replace_items(&mut self, items: Vec<OrderItem>) -> anyhow::Result<()> {
        if items.is_empty() {
            anyhow::bail!("order must contain at least one item");
        }
        self.subtotal_cents = subtotal_of(&items);
        self.items = items;
        self.updated_at = Utc::now();
        Ok(())
    }
}
