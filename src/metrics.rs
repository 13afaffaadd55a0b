//! Dashboard metrics
//!
//! Derives the metric cards and chart series shown on the dashboard from
//! already-fetched record lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::woo::{Customer, Order, Product};

/// Order statuses whose totals count as revenue.
pub const REVENUE_STATUSES: &[&str] = &["completed", "processing", "on-hold"];

/// Managed stock at or below this is reported as low.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub order_count: usize,
    pub average_order_value: f64,
    pub customer_count: usize,
    pub product_count: usize,
    pub low_stock_products: Vec<LowStockProduct>,
    pub orders_by_status: BTreeMap<String, usize>,
    /// `YYYY-MM-DD` → revenue
    pub revenue_by_day: BTreeMap<String, f64>,
    /// Any of the underlying lists hit the page ceiling
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: u64,
    pub name: String,
    pub stock_quantity: i64,
}

pub fn summarize(orders: &[Order], customers: &[Customer], products: &[Product]) -> DashboardSummary {
    let mut orders_by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut revenue_by_day: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_revenue = 0.0;
    let mut revenue_orders = 0usize;

    for order in orders {
        *orders_by_status.entry(order.status.clone()).or_default() += 1;

        if !REVENUE_STATUSES.contains(&order.status.as_str()) {
            continue;
        }
        let amount = parse_amount(&order.total);
        total_revenue += amount;
        revenue_orders += 1;

        if let Some(day) = order.date_created.as_deref().and_then(day_of) {
            *revenue_by_day.entry(day.to_string()).or_default() += amount;
        }
    }

    let average_order_value = if revenue_orders == 0 {
        0.0
    } else {
        round_cents(total_revenue / revenue_orders as f64)
    };

    let low_stock_products = products
        .iter()
        .filter(|p| p.manage_stock)
        .filter_map(|p| {
            p.stock_quantity
                .filter(|qty| *qty <= LOW_STOCK_THRESHOLD)
                .map(|qty| LowStockProduct {
                    id: p.id,
                    name: p.name.clone(),
                    stock_quantity: qty,
                })
        })
        .collect();

    for revenue in revenue_by_day.values_mut() {
        *revenue = round_cents(*revenue);
    }

    DashboardSummary {
        total_revenue: round_cents(total_revenue),
        order_count: orders.len(),
        average_order_value,
        customer_count: customers.len(),
        product_count: products.len(),
        low_stock_products,
        orders_by_status,
        revenue_by_day,
        truncated: false,
    }
}

/// Store decimal strings; anything unparsable counts as zero.
fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn day_of(timestamp: &str) -> Option<&str> {
    let day = timestamp.get(..10)?;
    chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    Some(day)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
