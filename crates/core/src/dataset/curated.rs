//! Curated (silver) rows and their Parquet encoding

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use super::columns;
use crate::error::{PipelineError, PipelineResult};

/// A sale joined to its product, with the derived amount
///
/// `total_amount` is `quantity * product_price` and is null exactly when either
/// factor is null (unmatched product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedRow {
    pub sale_id: i64,
    pub product_id: Option<String>,
    /// ISO date (`YYYY-MM-DD`)
    pub sale_date: String,
    pub quantity: Option<i64>,
    pub sales_price: Option<f64>,
    pub ingestion_timestamp: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub product_price: Option<f64>,
    pub total_amount: Option<f64>,
}

impl CuratedRow {
    /// Derived amount for the row's own quantity and product price
    pub fn expected_total(&self) -> Option<f64> {
        match (self.quantity, self.product_price) {
            (Some(q), Some(p)) => Some(q as f64 * p),
            _ => None,
        }
    }

    /// Whether the stored amount agrees with quantity × product price
    pub fn total_is_consistent(&self) -> bool {
        self.total_amount == self.expected_total()
    }
}

/// Arrow schema of curated files
pub fn curated_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::SALE_ID, DataType::Int64, false),
        Field::new(columns::PRODUCT_ID, DataType::Utf8, true),
        Field::new(columns::SALE_DATE, DataType::Utf8, false),
        Field::new(columns::QUANTITY, DataType::Int64, true),
        Field::new(columns::SALES_PRICE, DataType::Float64, true),
        Field::new(columns::INGESTION_TIMESTAMP, DataType::Utf8, true),
        Field::new(columns::PRODUCT_NAME, DataType::Utf8, true),
        Field::new(columns::CATEGORY, DataType::Utf8, true),
        Field::new(columns::PRODUCT_PRICE, DataType::Float64, true),
        Field::new(columns::TOTAL_AMOUNT, DataType::Float64, true),
    ]))
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

fn string_column<'a>(
    rows: &'a [CuratedRow],
    f: impl Fn(&'a CuratedRow) -> Option<&'a str>,
) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
}

fn float_column(rows: &[CuratedRow], f: impl Fn(&CuratedRow) -> Option<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
}

fn to_record_batch(rows: &[CuratedRow]) -> PipelineResult<RecordBatch> {
    let sale_ids: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|r| r.sale_id).collect::<Vec<_>>(),
    ));
    let sale_dates: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|r| r.sale_date.as_str()).collect::<Vec<_>>(),
    ));
    let quantities: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|r| r.quantity).collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(
        curated_schema(),
        vec![
            sale_ids,
            string_column(rows, |r| r.product_id.as_deref()),
            sale_dates,
            quantities,
            float_column(rows, |r| r.sales_price),
            string_column(rows, |r| r.ingestion_timestamp.as_deref()),
            string_column(rows, |r| r.product_name.as_deref()),
            string_column(rows, |r| r.category.as_deref()),
            float_column(rows, |r| r.product_price),
            float_column(rows, |r| r.total_amount),
        ],
    )?;
    Ok(batch)
}

/// Write curated rows to a Parquet file
pub fn write_curated(path: &Path, rows: &[CuratedRow]) -> PipelineResult<()> {
    let batch = to_record_batch(rows)?;
    let file = File::create(path)
        .map_err(|e| PipelineError::io_with_path(path, "creating curated file", e))?;
    let mut writer = ArrowWriter::try_new(file, curated_schema(), Some(writer_properties()))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn column<'a, T: 'static>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> PipelineResult<&'a T> {
    let idx = batch.schema().index_of(name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| PipelineError::InvalidData {
            path: path.to_path_buf(),
            reason: format!("column '{name}' has type {}", batch.column(idx).data_type()),
        })
}

fn opt_str(array: &StringArray, i: usize) -> Option<String> {
    (!array.is_null(i)).then(|| array.value(i).to_string())
}

fn opt_i64(array: &Int64Array, i: usize) -> Option<i64> {
    (!array.is_null(i)).then(|| array.value(i))
}

fn opt_f64(array: &Float64Array, i: usize) -> Option<f64> {
    (!array.is_null(i)).then(|| array.value(i))
}

/// Read curated rows from a Parquet file
pub fn read_curated(path: &Path) -> PipelineResult<Vec<CuratedRow>> {
    let file = File::open(path)
        .map_err(|e| PipelineError::io_with_path(path, "opening curated file", e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let sale_id = column::<Int64Array>(&batch, columns::SALE_ID, path)?;
        let product_id = column::<StringArray>(&batch, columns::PRODUCT_ID, path)?;
        let sale_date = column::<StringArray>(&batch, columns::SALE_DATE, path)?;
        let quantity = column::<Int64Array>(&batch, columns::QUANTITY, path)?;
        let sales_price = column::<Float64Array>(&batch, columns::SALES_PRICE, path)?;
        let ingestion_ts = column::<StringArray>(&batch, columns::INGESTION_TIMESTAMP, path)?;
        let product_name = column::<StringArray>(&batch, columns::PRODUCT_NAME, path)?;
        let category = column::<StringArray>(&batch, columns::CATEGORY, path)?;
        let product_price = column::<Float64Array>(&batch, columns::PRODUCT_PRICE, path)?;
        let total_amount = column::<Float64Array>(&batch, columns::TOTAL_AMOUNT, path)?;

        for i in 0..batch.num_rows() {
            if sale_id.is_null(i) || sale_date.is_null(i) {
                return Err(PipelineError::InvalidData {
                    path: path.to_path_buf(),
                    reason: format!("row {i} has a null sale_id or sale_date"),
                });
            }
            rows.push(CuratedRow {
                sale_id: sale_id.value(i),
                product_id: opt_str(product_id, i),
                sale_date: sale_date.value(i).to_string(),
                quantity: opt_i64(quantity, i),
                sales_price: opt_f64(sales_price, i),
                ingestion_timestamp: opt_str(ingestion_ts, i),
                product_name: opt_str(product_name, i),
                category: opt_str(category, i),
                product_price: opt_f64(product_price, i),
                total_amount: opt_f64(total_amount, i),
            });
        }
    }
    Ok(rows)
}
