//! Store DDL

/// Registry of partition tables
pub const PARTITIONS_TABLE: &str = "lakehouse_partitions";

/// Curated files already persisted, keyed by content hash
pub const MANIFEST_TABLE: &str = "lakehouse_load_manifest";

/// Bookkeeping tables created on open
pub fn registry_ddl() -> &'static str {
    r#"
CREATE TABLE IF NOT EXISTS lakehouse_partitions (
    table_name VARCHAR PRIMARY KEY,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    created_at VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS lakehouse_load_manifest (
    content_hash VARCHAR PRIMARY KEY,
    file_name VARCHAR NOT NULL,
    run_id VARCHAR NOT NULL,
    loaded_at VARCHAR NOT NULL,
    first_id BIGINT,
    last_id BIGINT,
    row_count BIGINT NOT NULL
);
"#
}

/// Staging table holding identified curated rows
///
/// `table` must already be a validated identifier.
pub fn staging_ddl(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id BIGINT NOT NULL,
    sale_id BIGINT NOT NULL,
    product_id VARCHAR,
    sale_date DATE,
    quantity BIGINT,
    sales_price DOUBLE,
    ingestion_timestamp VARCHAR,
    product_name VARCHAR,
    category VARCHAR,
    product_price DOUBLE,
    total_amount DOUBLE,
    source_file VARCHAR
);
"#
    )
}

/// Parameterised insert into the staging table
pub fn staging_insert(table: &str) -> String {
    format!(
        "INSERT INTO {table} (id, sale_id, product_id, sale_date, quantity, sales_price, \
         ingestion_timestamp, product_name, category, product_price, total_amount, source_file) \
         VALUES (?, ?, ?, CAST(? AS DATE), ?, ?, ?, ?, ?, ?, ?, ?)"
    )
}
