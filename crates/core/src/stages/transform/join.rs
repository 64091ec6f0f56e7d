//! Left join of sales onto the product catalogue

use std::collections::HashMap;

use super::typed::{ProductRecord, SaleRecord};
use crate::dataset::CuratedRow;

/// A joined row before the sale identifier check
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub sale_id: Option<i64>,
    pub row: CuratedRow,
}

impl JoinedRow {
    /// The curated row, if it has a sale identifier
    pub fn into_curated(self) -> Option<CuratedRow> {
        let sale_id = self.sale_id?;
        Some(CuratedRow { sale_id, ..self.row })
    }
}

/// Keep every sale; attach product fields where the identifier matches
///
/// `products` must already be unique by identifier, so each sale yields
/// exactly one output row.
pub fn left_join(sales: Vec<SaleRecord>, products: &[ProductRecord]) -> Vec<JoinedRow> {
    let catalogue: HashMap<&str, &ProductRecord> = products
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();

    sales
        .into_iter()
        .map(|sale| {
            let product = sale
                .product_id
                .as_deref()
                .and_then(|id| catalogue.get(id).copied());
            let mut row = CuratedRow {
                sale_id: sale.sale_id.unwrap_or_default(),
                product_id: sale.product_id,
                sale_date: sale.sale_date,
                quantity: sale.quantity,
                sales_price: sale.sales_price,
                ingestion_timestamp: sale.ingestion_timestamp,
                product_name: product.and_then(|p| p.product_name.clone()),
                category: product.and_then(|p| p.category.clone()),
                product_price: product.and_then(|p| p.product_price),
                total_amount: None,
            };
            row.total_amount = row.expected_total();
            JoinedRow {
                sale_id: sale.sale_id,
                row,
            }
        })
        .collect()
}
