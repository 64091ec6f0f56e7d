//! Embedded analytical store

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use duckdb::{AccessMode, Config, Connection, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::naming::{PartitionKey, validate_identifier, view_name};
use super::schema::{self, MANIFEST_TABLE, PARTITIONS_TABLE};
use crate::config::PartitionPolicy;
use crate::dataset::CuratedRow;
use crate::error::{PipelineError, PipelineResult};

/// A registered partition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub table_name: String,
    pub year: i32,
    pub month: u32,
    pub created_at: String,
}

/// A curated file already persisted in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub file_name: String,
    pub content_hash: String,
    pub run_id: String,
    pub loaded_at: String,
    pub first_id: Option<i64>,
    pub last_id: Option<i64>,
    pub row_count: i64,
}

/// What partition maintenance did for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PartitionAction {
    Created { table: String, rows: usize },
    Appended { table: String, rows: usize },
    UpToDate { table: String },
    Skipped { table: String },
}

impl PartitionAction {
    pub fn table(&self) -> &str {
        match self {
            PartitionAction::Created { table, .. }
            | PartitionAction::Appended { table, .. }
            | PartitionAction::UpToDate { table }
            | PartitionAction::Skipped { table } => table,
        }
    }
}

/// Result of rebuilding a reporting view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewOutcome {
    Rebuilt {
        view: String,
        partitions: Vec<String>,
        rows: i64,
    },
    /// No partitions for the year; any previous view was left in place
    NoPartitions { view: String },
}

/// Kind of store object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreObject {
    pub name: String,
    pub kind: String,
}

fn table_exists(conn: &Connection, name: &str) -> PipelineResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'main' AND table_name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn max_id(conn: &Connection, table: &str) -> PipelineResult<i64> {
    let table = validate_identifier(table)?;
    if !table_exists(conn, table)? {
        return Ok(0);
    }
    let id: i64 = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) FROM {table}"),
        [],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn count_rows(conn: &Connection, name: &str) -> PipelineResult<i64> {
    let name = validate_identifier(name)?;
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

fn duck_to_json(value: duckdb::types::Value) -> Value {
    use duckdb::types::Value as Duck;
    match value {
        Duck::Null => Value::Null,
        Duck::Boolean(b) => Value::Bool(b),
        Duck::TinyInt(n) => Value::Number(n.into()),
        Duck::SmallInt(n) => Value::Number(n.into()),
        Duck::Int(n) => Value::Number(n.into()),
        Duck::BigInt(n) => Value::Number(n.into()),
        Duck::UBigInt(n) => Value::Number(n.into()),
        Duck::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Duck::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Duck::Text(s) => Value::String(s),
        Duck::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        other => Value::String(format!("{other:?}")),
    }
}

/// Analytical store: staging table, monthly partitions, reporting views and
/// the bookkeeping tables that make loads idempotent
pub struct Warehouse {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Warehouse {
    /// Open or create a store file for reading and writing
    ///
    /// A second writer on the same file fails with [`PipelineError::StoreBusy`].
    pub fn open(path: &Path) -> PipelineResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PipelineError::io_with_path(parent, "creating store directory", e))?;
        }
        let conn = Connection::open(path)?;
        let warehouse = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        warehouse.init()?;
        Ok(warehouse)
    }

    /// Open an in-memory store (for testing)
    pub fn memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory()?;
        let warehouse = Self { conn, path: None };
        warehouse.init()?;
        Ok(warehouse)
    }

    /// Open an existing store without taking the write lock
    pub fn open_read_only(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::missing_files(
                path.parent().unwrap_or(path),
                format!("store {} does not exist", path.display()),
            ));
        }
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    fn init(&self) -> PipelineResult<()> {
        self.conn.execute_batch(schema::registry_ddl())?;
        Ok(())
    }

    /// Store file path (if not in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether a table or view exists
    pub fn table_exists(&self, name: &str) -> PipelineResult<bool> {
        table_exists(&self.conn, name)
    }

    /// Current maximum identifier in `table`, 0 if the table is absent
    pub fn max_id(&self, table: &str) -> PipelineResult<i64> {
        max_id(&self.conn, table)
    }

    /// Row count of a table or view
    pub fn count_rows(&self, name: &str) -> PipelineResult<i64> {
        count_rows(&self.conn, name)
    }

    /// Manifest entry for a content hash
    pub fn manifest_entry(&self, content_hash: &str) -> PipelineResult<Option<ManifestRecord>> {
        Ok(self
            .manifest()?
            .into_iter()
            .find(|m| m.content_hash == content_hash))
    }

    /// Every manifest entry, oldest first
    pub fn manifest(&self) -> PipelineResult<Vec<ManifestRecord>> {
        if !table_exists(&self.conn, MANIFEST_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT file_name, content_hash, run_id, loaded_at, first_id, last_id, row_count
             FROM lakehouse_load_manifest ORDER BY loaded_at, first_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ManifestRecord {
                file_name: row.get(0)?,
                content_hash: row.get(1)?,
                run_id: row.get(2)?,
                loaded_at: row.get(3)?,
                first_id: row.get(4)?,
                last_id: row.get(5)?,
                row_count: row.get(6)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Registered partitions, ordered by month
    pub fn partitions(&self) -> PipelineResult<Vec<PartitionRecord>> {
        if !table_exists(&self.conn, PARTITIONS_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT table_name, year, month, created_at FROM lakehouse_partitions
             ORDER BY year, month, table_name",
        )?;
        let rows = stmt.query_map([], |row| {
            let month: i32 = row.get(2)?;
            Ok(PartitionRecord {
                table_name: row.get(0)?,
                year: row.get(1)?,
                month: month.max(0) as u32,
                created_at: row.get(3)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Replace the reporting view for `year` with the union of its partitions
    ///
    /// Partitions come from the registry. With none registered the previous
    /// view (if any) is left untouched.
    pub fn rebuild_view(&self, view_prefix: &str, year: i32) -> PipelineResult<ViewOutcome> {
        let view = view_name(view_prefix, year)?;
        let mut tables = Vec::new();
        for partition in self.partitions()?.into_iter().filter(|p| p.year == year) {
            let table = validate_identifier(&partition.table_name)?.to_string();
            if table_exists(&self.conn, &table)? {
                tables.push(table);
            } else {
                tracing::warn!(table = %table, "Registered partition table is missing");
            }
        }

        if tables.is_empty() {
            tracing::warn!(view = %view, year, "No partitions for reporting year; view left unchanged");
            return Ok(ViewOutcome::NoPartitions { view });
        }

        let union = tables
            .iter()
            .map(|t| format!("SELECT * FROM {t}"))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        self.conn
            .execute_batch(&format!("CREATE OR REPLACE VIEW {view} AS {union};"))?;
        let rows = count_rows(&self.conn, &view)?;
        tracing::info!(view = %view, partitions = tables.len(), rows, "Rebuilt reporting view");

        Ok(ViewOutcome::Rebuilt {
            view,
            partitions: tables,
            rows,
        })
    }

    /// Tables and views in the store
    pub fn list_objects(&self) -> PipelineResult<Vec<StoreObject>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name, table_type FROM information_schema.tables
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(1)?;
            Ok(StoreObject {
                name: row.get(0)?,
                kind: if kind == "VIEW" { "view" } else { "table" }.to_string(),
            })
        })?;
        let mut objects = Vec::new();
        for row in rows {
            objects.push(row?);
        }
        Ok(objects)
    }

    /// First `limit` rows of a table or view
    pub fn head(&self, name: &str, limit: usize) -> PipelineResult<Vec<Value>> {
        let name = validate_identifier(name)?;
        self.query(&format!("SELECT * FROM {name} LIMIT {limit}"))
    }

    /// Execute a query and return results as JSON
    pub fn query(&self, sql: &str) -> PipelineResult<Vec<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let column_names: Vec<String> = (0..column_count)
            .map(|i| {
                rows.as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value: duckdb::types::Value = row.get(i)?;
                obj.insert(name.clone(), duck_to_json(value));
            }
            results.push(Value::Object(obj));
        }
        Ok(results)
    }

    /// Start the all-or-nothing part of a load
    pub fn begin(&mut self) -> PipelineResult<LoadTransaction<'_>> {
        Ok(LoadTransaction {
            tx: self.conn.transaction()?,
        })
    }
}

/// Staging append, manifest, type normalization and partition maintenance
///
/// Dropping the transaction without [`LoadTransaction::commit`] rolls every
/// change back.
pub struct LoadTransaction<'a> {
    tx: duckdb::Transaction<'a>,
}

impl LoadTransaction<'_> {
    /// Current maximum identifier in `table`, 0 if the table is absent
    pub fn max_id(&self, table: &str) -> PipelineResult<i64> {
        max_id(&self.tx, table)
    }

    /// Create the staging table if absent; an existing table is never altered
    pub fn ensure_staging(&self, table: &str) -> PipelineResult<()> {
        let table = validate_identifier(table)?;
        self.tx.execute_batch(&schema::staging_ddl(table))?;
        Ok(())
    }

    /// Append rows with identifiers `first_id..` in order
    pub fn append_rows(
        &self,
        table: &str,
        first_id: i64,
        rows: &[CuratedRow],
        source_file: &str,
    ) -> PipelineResult<usize> {
        let table = validate_identifier(table)?;
        let mut stmt = self.tx.prepare(&schema::staging_insert(table))?;
        for (offset, row) in rows.iter().enumerate() {
            stmt.execute(params![
                first_id + offset as i64,
                row.sale_id,
                row.product_id,
                row.sale_date,
                row.quantity,
                row.sales_price,
                row.ingestion_timestamp,
                row.product_name,
                row.category,
                row.product_price,
                row.total_amount,
                source_file,
            ])?;
        }
        Ok(rows.len())
    }

    /// Record a persisted curated file
    pub fn record_manifest(&self, record: &ManifestRecord) -> PipelineResult<()> {
        self.tx.execute(
            "INSERT INTO lakehouse_load_manifest
             (content_hash, file_name, run_id, loaded_at, first_id, last_id, row_count)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.content_hash,
                record.file_name,
                record.run_id,
                record.loaded_at,
                record.first_id,
                record.last_id,
                record.row_count,
            ],
        )?;
        Ok(())
    }

    /// Coerce `column` to DATE unless it already is one
    ///
    /// Returns whether a conversion happened.
    pub fn normalize_date_column(&self, table: &str, column: &str) -> PipelineResult<bool> {
        let table = validate_identifier(table)?;
        let column = validate_identifier(column)?;
        let data_type: String = self.tx.query_row(
            "SELECT data_type FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ? AND column_name = ?",
            [table, column],
            |row| row.get(0),
        )?;
        if data_type.eq_ignore_ascii_case("DATE") {
            return Ok(false);
        }
        tracing::info!(table, column, from = %data_type, "Converting column to DATE");
        self.tx.execute_batch(&format!(
            "ALTER TABLE {table} ALTER COLUMN {column} SET DATA TYPE DATE USING CAST({column} AS DATE);"
        ))?;
        Ok(true)
    }

    /// Distinct (year, month) pairs in the staging table
    pub fn partition_keys(&self, table: &str, date_column: &str) -> PipelineResult<Vec<PartitionKey>> {
        let table = validate_identifier(table)?;
        let column = validate_identifier(date_column)?;
        let mut stmt = self.tx.prepare(&format!(
            "SELECT DISTINCT CAST(year({column}) AS INTEGER), CAST(month({column}) AS INTEGER)
             FROM {table} WHERE {column} IS NOT NULL ORDER BY 1, 2"
        ))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, i32>(1)?)))?;
        let mut keys = Vec::new();
        for row in rows {
            let (year, month) = row?;
            keys.push(PartitionKey::new(year, month.max(0) as u32)?);
        }
        Ok(keys)
    }

    /// Make the partition for `key` reflect the staging table per `policy`
    pub fn ensure_partition(
        &self,
        staging: &str,
        date_column: &str,
        prefix: &str,
        key: PartitionKey,
        policy: PartitionPolicy,
        created_at: &str,
    ) -> PipelineResult<PartitionAction> {
        let staging = validate_identifier(staging)?;
        let column = validate_identifier(date_column)?;
        let table = key.table_name(prefix)?;
        let filter = format!(
            "year({column}) = {} AND month({column}) = {}",
            key.year, key.month
        );

        let action = if !table_exists(&self.tx, &table)? {
            self.tx.execute_batch(&format!(
                "CREATE TABLE {table} AS SELECT * FROM {staging} WHERE {filter} ORDER BY id;"
            ))?;
            let rows = count_rows(&self.tx, &table)? as usize;
            tracing::info!(partition = %key, table = %table, rows, "Created partition");
            PartitionAction::Created { table, rows }
        } else {
            match policy {
                PartitionPolicy::Skip => {
                    tracing::info!(partition = %key, table = %table, "Partition exists; skipping");
                    PartitionAction::Skipped { table }
                }
                PartitionPolicy::AppendMissing => {
                    let rows = self.tx.execute(
                        &format!(
                            "INSERT INTO {table} SELECT s.* FROM {staging} s WHERE {filter} \
                             AND NOT EXISTS (SELECT 1 FROM {table} p WHERE p.id = s.id) ORDER BY s.id"
                        ),
                        [],
                    )?;
                    if rows == 0 {
                        tracing::debug!(partition = %key, table = %table, "Partition up to date");
                        PartitionAction::UpToDate { table }
                    } else {
                        tracing::info!(partition = %key, table = %table, rows, "Appended to partition");
                        PartitionAction::Appended { table, rows }
                    }
                }
            }
        };

        self.tx.execute(
            "INSERT OR IGNORE INTO lakehouse_partitions (table_name, year, month, created_at)
             VALUES (?, ?, ?, ?)",
            params![action.table(), key.year, key.month as i32, created_at],
        )?;
        Ok(action)
    }

    /// Make every change visible
    pub fn commit(self) -> PipelineResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sale_id: i64, sale_date: &str) -> CuratedRow {
        CuratedRow {
            sale_id,
            product_id: Some("A12".to_string()),
            sale_date: sale_date.to_string(),
            quantity: Some(2),
            sales_price: Some(12.0),
            ingestion_timestamp: Some("2024-03-01 10:00:00".to_string()),
            product_name: Some("Widget A".to_string()),
            category: Some("Widgets".to_string()),
            product_price: Some(15.5),
            total_amount: Some(31.0),
        }
    }

    fn load(wh: &mut Warehouse, rows: &[CuratedRow], policy: PartitionPolicy) -> Vec<PartitionAction> {
        let tx = wh.begin().unwrap();
        tx.ensure_staging("stg").unwrap();
        let first = tx.max_id("stg").unwrap() + 1;
        tx.append_rows("stg", first, rows, "f.parquet").unwrap();
        tx.normalize_date_column("stg", "sale_date").unwrap();
        let mut actions = Vec::new();
        for key in tx.partition_keys("stg", "sale_date").unwrap() {
            actions.push(tx.ensure_partition("stg", "sale_date", "sales", key, policy, "now").unwrap());
        }
        tx.commit().unwrap();
        actions
    }

    #[test]
    fn test_memory_store_initialises_registry() {
        let wh = Warehouse::memory().unwrap();
        assert!(wh.table_exists(PARTITIONS_TABLE).unwrap());
        assert!(wh.table_exists(MANIFEST_TABLE).unwrap());
        assert_eq!(wh.max_id("stg").unwrap(), 0);
        assert!(wh.path().is_none());
    }

    #[test]
    fn test_partitions_created_per_month() {
        let mut wh = Warehouse::memory().unwrap();
        let actions = load(
            &mut wh,
            &[row(1, "2024-03-02"), row(2, "2024-03-20"), row(3, "2024-04-01")],
            PartitionPolicy::AppendMissing,
        );
        assert_eq!(
            actions,
            vec![
                PartitionAction::Created { table: "sales_2024_03".to_string(), rows: 2 },
                PartitionAction::Created { table: "sales_2024_04".to_string(), rows: 1 },
            ]
        );
        assert_eq!(wh.max_id("stg").unwrap(), 3);
        assert_eq!(wh.partitions().unwrap().len(), 2);
    }

    #[test]
    fn test_append_missing_and_skip_policies() {
        let mut wh = Warehouse::memory().unwrap();
        load(&mut wh, &[row(1, "2024-03-02")], PartitionPolicy::AppendMissing);

        let actions = load(&mut wh, &[row(2, "2024-03-05")], PartitionPolicy::Skip);
        assert_eq!(actions, vec![PartitionAction::Skipped { table: "sales_2024_03".to_string() }]);
        assert_eq!(wh.count_rows("sales_2024_03").unwrap(), 1);

        let actions = load(&mut wh, &[row(3, "2024-03-09")], PartitionPolicy::AppendMissing);
        assert_eq!(
            actions,
            vec![PartitionAction::Appended { table: "sales_2024_03".to_string(), rows: 2 }]
        );
        assert_eq!(wh.count_rows("sales_2024_03").unwrap(), 3);
    }

    #[test]
    fn test_rollback_on_drop() {
        let mut wh = Warehouse::memory().unwrap();
        {
            let tx = wh.begin().unwrap();
            tx.ensure_staging("stg").unwrap();
            tx.append_rows("stg", 1, &[row(1, "2024-03-02")], "f.parquet").unwrap();
        }
        assert!(!wh.table_exists("stg").unwrap());
    }

    #[test]
    fn test_normalize_text_date_column() {
        let mut wh = Warehouse::memory().unwrap();
        wh.conn
            .execute_batch("CREATE TABLE legacy (id BIGINT, sale_date VARCHAR); INSERT INTO legacy VALUES (1, '2024-05-06');")
            .unwrap();
        let tx = wh.begin().unwrap();
        assert!(tx.normalize_date_column("legacy", "sale_date").unwrap());
        assert!(!tx.normalize_date_column("legacy", "sale_date").unwrap());
        tx.commit().unwrap();
    }

    #[test]
    fn test_partition_filters_on_given_date_column() {
        let mut wh = Warehouse::memory().unwrap();
        wh.conn
            .execute_batch(
                "CREATE TABLE orders (id BIGINT, order_date VARCHAR);
                 INSERT INTO orders VALUES (1, '2024-05-06'), (2, '2024-06-01');",
            )
            .unwrap();
        let tx = wh.begin().unwrap();
        tx.normalize_date_column("orders", "order_date").unwrap();
        let keys = tx.partition_keys("orders", "order_date").unwrap();
        assert_eq!(keys.len(), 2);
        let action = tx
            .ensure_partition("orders", "order_date", "orders", keys[0], PartitionPolicy::Skip, "now")
            .unwrap();
        assert_eq!(
            action,
            PartitionAction::Created {
                table: "orders_2024_05".to_string(),
                rows: 1
            }
        );
        let bad_column = "order_date; DROP TABLE orders";
        assert!(
            tx.ensure_partition("orders", bad_column, "orders", keys[1], PartitionPolicy::Skip, "now")
                .is_err()
        );
        tx.commit().unwrap();
    }

    #[test]
    fn test_view_rebuild() {
        let mut wh = Warehouse::memory().unwrap();
        assert_eq!(
            wh.rebuild_view("vw_sales", 2024).unwrap(),
            ViewOutcome::NoPartitions { view: "vw_sales_2024".to_string() }
        );

        load(
            &mut wh,
            &[row(1, "2024-03-02"), row(2, "2024-04-01"), row(3, "2023-12-31")],
            PartitionPolicy::AppendMissing,
        );
        match wh.rebuild_view("vw_sales", 2024).unwrap() {
            ViewOutcome::Rebuilt { view, partitions, rows } => {
                assert_eq!(view, "vw_sales_2024");
                assert_eq!(partitions, vec!["sales_2024_03", "sales_2024_04"]);
                assert_eq!(rows, 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let head = wh.head("vw_sales_2024", 10).unwrap();
        assert_eq!(head.len(), 2);
        assert!(head.iter().any(|r| r["sale_date"] == serde_json::json!("2024-03-02")));
    }

    #[test]
    fn test_manifest_round_trip() {
        let mut wh = Warehouse::memory().unwrap();
        let record = ManifestRecord {
            file_name: "t.parquet".to_string(),
            content_hash: "abc".to_string(),
            run_id: "run".to_string(),
            loaded_at: "2024-03-01 10:00:00".to_string(),
            first_id: Some(1),
            last_id: Some(3),
            row_count: 3,
        };
        let tx = wh.begin().unwrap();
        tx.record_manifest(&record).unwrap();
        tx.commit().unwrap();

        assert_eq!(wh.manifest_entry("abc").unwrap(), Some(record));
        assert!(wh.manifest_entry("def").unwrap().is_none());
    }

    #[test]
    fn test_list_objects() {
        let wh = Warehouse::memory().unwrap();
        let names: Vec<String> = wh.list_objects().unwrap().into_iter().map(|o| o.name).collect();
        assert!(names.contains(&"lakehouse_partitions".to_string()));
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let wh = Warehouse::memory().unwrap();
        assert!(matches!(
            wh.head("x; DROP TABLE y", 1),
            Err(PipelineError::InvalidIdentifier(_))
        ));
    }
}
