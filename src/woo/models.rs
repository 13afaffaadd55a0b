//! Store records
//!
//! Typed views of the WooCommerce v3 order, customer and product resources.
//! Only the fields the dashboard reads are typed; everything else the store
//! sends is kept in `extra` and passed through untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record type served by one paginated endpoint.
pub trait Record: DeserializeOwned + Serialize + Send {
    /// Path segment under `wp-json/wc/v3/`
    const ENDPOINT: &'static str;
    /// Field the store sorts pages by; must be stable across pages
    const ORDER_BY: &'static str;

    /// Upstream-assigned id
    fn id(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub currency: String,
    /// Decimal string, e.g. `"49.90"`
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub customer_id: u64,
    /// Store-local time, `YYYY-MM-DDTHH:MM:SS`
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Order {
    const ENDPOINT: &'static str = "orders";
    const ORDER_BY: &'static str = "date";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Customer {
    const ENDPOINT: &'static str = "customers";
    const ORDER_BY: &'static str = "registered_date";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub manage_stock: bool,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Product {
    const ENDPOINT: &'static str = "products";
    const ORDER_BY: &'static str = "date";

    fn id(&self) -> u64 {
        self.id
    }
}
