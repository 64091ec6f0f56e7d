//! Synthetic raw extracts for exercising the pipeline
//!
//! Writes one sales extract and one product catalogue per call into the
//! ingestion input directory, using the same naming the ingestion stage
//! discovers (`sales_data_<stamp>.json`, `product_data_<stamp>.json`).

use std::path::PathBuf;

use chrono::TimeDelta;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::config::{GeneratorConfig, MAX_GENERATED_ROWS};
use crate::context::RunContext;
use crate::dataset::{Record, Table};
use crate::error::PipelineResult;
use crate::files::ensure_dirs;

/// Fixed product catalogue: (id, name, category, price)
pub const CATALOGUE: [(&str, &str, &str, f64); 3] = [
    ("A12", "Widget A", "Widgets", 15.5),
    ("B23", "Widget B", "Widgets", 25.0),
    ("C34", "Gadget C", "Gadgets", 45.0),
];

/// Files written by one generator call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFiles {
    pub sales: PathBuf,
    pub products: PathBuf,
    pub sales_rows: usize,
}

/// Generate an extract pair with the thread-local RNG
pub fn generate(config: &GeneratorConfig, ctx: &RunContext) -> PipelineResult<GeneratedFiles> {
    generate_with(config, ctx, &mut rand::rng())
}

/// Generate an extract pair with the given RNG
pub fn generate_with<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    ctx: &RunContext,
    rng: &mut R,
) -> PipelineResult<GeneratedFiles> {
    config.validate()?;
    ensure_dirs(&[config.output_dir.as_path()])?;

    let stamp = ctx.file_stamp();
    let sales = Table::new(sales_records(config, ctx, rng));
    let sales_path = config.output_dir.join(format!("sales_data_{stamp}.json"));
    sales.write_json(&sales_path)?;
    info!(path = %sales_path.display(), rows = sales.len(), "Sales data written");

    let products = Table::new(product_records());
    let products_path = config.output_dir.join(format!("product_data_{stamp}.json"));
    products.write_json(&products_path)?;
    info!(path = %products_path.display(), rows = products.len(), "Product data written");

    Ok(GeneratedFiles {
        sales: sales_path,
        products: products_path,
        sales_rows: sales.len(),
    })
}

fn sales_records<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    ctx: &RunContext,
    rng: &mut R,
) -> Vec<Record> {
    let today = ctx.started_at.date_naive();
    let ids: Vec<&str> = CATALOGUE.iter().map(|(id, ..)| *id).collect();
    let base = first_sale_id(ctx);

    (0..config.sales_rows)
        .map(|n| {
            let sale_id = base + n as i64;
            let product_id = if rng.random_bool(config.missing_product_rate) {
                Value::Null
            } else {
                ids.choose(rng).map_or(Value::Null, |id| json!(id))
            };
            let sale_date = if rng.random_bool(config.missing_date_rate) {
                Value::Null
            } else {
                let date = today - TimeDelta::days(rng.random_range(0..=365));
                json!(date.format("%Y-%m-%d").to_string())
            };
            let price = (rng.random_range(10.0..50.0_f64) * 100.0).round() / 100.0;

            record(json!({
                "sale_id": sale_id,
                "product_id": product_id,
                "sale_date": sale_date,
                "quantity": rng.random_range(1..=10),
                "price": price,
            }))
        })
        .collect()
}

/// First sale identifier of an extract, derived from the run start second
///
/// Extracts from different runs never share identifiers, so several
/// extracts waiting for the same pipeline tick pass the uniqueness check.
pub fn first_sale_id(ctx: &RunContext) -> i64 {
    ctx.started_at.timestamp() * MAX_GENERATED_ROWS as i64 + 1
}

fn product_records() -> Vec<Record> {
    CATALOGUE
        .iter()
        .map(|(id, name, category, price)| {
            record(json!({
                "product_id": id,
                "product_name": name,
                "category": category,
                "price": price,
            }))
        })
        .collect()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
