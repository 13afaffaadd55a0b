//! Paginated fetchers
//!
//! Walks a page-oriented list endpoint until a short page, an empty page or
//! the page ceiling, accumulating records in upstream order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::woo::client::{PageRequest, PageSource};
use crate::woo::{Customer, FetchParams, Order, Product, Record};

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Hard ceiling on pages per fetch (5,000 records).
pub const MAX_PAGES: u32 = 50;

/// Result of one complete paginated fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome<T> {
    pub items: Vec<T>,
    /// Pages requested, including a final empty one
    pub pages: u32,
    /// The ceiling was hit on a full page, so more records may exist
    pub truncated: bool,
}

/// Fetches every page of `R` matching `filters`.
///
/// Pages are requested strictly in order. Any upstream error aborts the
/// whole fetch; records from earlier pages are discarded with it.
pub async fn fetch_all<R, S>(source: &S, filters: &[(&'static str, String)]) -> Result<FetchOutcome<R>>
where
    R: Record,
    S: PageSource + ?Sized,
{
    let mut items: Vec<R> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut page = 1;
    let mut truncated = false;

    loop {
        let request = PageRequest {
            endpoint: R::ENDPOINT,
            page,
            per_page: PAGE_SIZE,
            orderby: R::ORDER_BY,
            order: "desc",
            filters,
        };
        let records = source.fetch_page(&request).await?;
        debug!(endpoint = R::ENDPOINT, page, count = records.len(), "page received");

        if records.is_empty() {
            break;
        }

        let full_page = records.len() >= PAGE_SIZE as usize;
        for raw in records {
            let record: R = serde_json::from_value(raw).map_err(|e| {
                AppError::Upstream(format!("malformed {} record: {}", R::ENDPOINT, e))
            })?;
            // Records shift between pages when the store changes mid-walk
            if seen.insert(record.id()) {
                items.push(record);
            }
        }

        if !full_page {
            break;
        }
        if page >= MAX_PAGES {
            truncated = true;
            warn!(
                endpoint = R::ENDPOINT,
                records = items.len(),
                "page ceiling reached, result set may be incomplete"
            );
            break;
        }
        page += 1;
    }

    Ok(FetchOutcome {
        items,
        pages: page,
        truncated,
    })
}

pub async fn fetch_orders<S>(source: &S, params: &FetchParams) -> Result<FetchOutcome<Order>>
where
    S: PageSource + ?Sized,
{
    fetch_all(source, &params.pairs()).await
}

/// Customers of every role, not only the `customer` role the store
/// defaults to.
pub async fn fetch_customers<S>(source: &S, params: &FetchParams) -> Result<FetchOutcome<Customer>>
where
    S: PageSource + ?Sized,
{
    let mut filters = params.without_status().pairs();
    filters.push(("role", "all".to_string()));
    fetch_all(source, &filters).await
}

pub async fn fetch_products<S>(source: &S, params: &FetchParams) -> Result<FetchOutcome<Product>>
where
    S: PageSource + ?Sized,
{
    fetch_all(source, &params.without_status().pairs()).await
}
