//! ETL Service - Loads the retail sales warehouse from periodic CSV exports
//!
//! Responsibilities:
//! - Read the sales export (latin1 encoding, delimiter auto-detected)
//! - Derive the star schema: dim_clientes, dim_productos, dim_tiempo, fact_ventas
//! - Resolve natural keys to database surrogate keys
//! - Append the derived tables to the warehouse
//!
//! The pipeline is linear and append-only: every run derives the tables from
//! scratch and appends them. Re-running against overlapping data produces
//! duplicate rows; there is no dedup against previous runs.
//!
//! Usage:
//!   cargo run --bin etl
//!   cargo run --bin etl -- --input data/datafact_ventas.csv
//!   cargo run --bin etl -- --dry-run

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tokio::fs;

#[derive(Parser, Debug)]
#[command(name = "etl", about = "Loads the retail sales warehouse from a CSV export")]
struct Args {
    /// Path to the sales export
    #[arg(long, default_value = "datafact_ventas.csv")]
    input: String,

    /// Dry run - transform only, don't load into the warehouse
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Debug, Clone)]
struct Config {
    db_url: String,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Self {
            db_url: std::env::var("DB_URL").context("DB_URL env var missing")?,
        })
    }
}

// =============================================================================
// Source table
// =============================================================================

/// Columns dim_clientes selects from the source (natural key first)
const DIM_CLIENTES_COLUMNS: &[&str] = &[
    "cliente_id_origen",
    "nombre_cliente",
    "ciudad",
    "pais",
    "segmento_cliente",
    "fecha_registro",
];

/// Columns dim_productos selects from the source (natural key first)
const DIM_PRODUCTOS_COLUMNS: &[&str] = &[
    "producto_id_origen",
    "nombre_producto",
    "categoria",
    "subcategoria",
    "proveedor",
];

/// Columns fact_ventas needs from the source (join keys first)
const FACT_VENTAS_COLUMNS: &[&str] = &[
    "cliente_id_origen",
    "producto_id_origen",
    "fecha_venta",
    "cantidad_vendida",
    "precio_unitario",
    "monto_total_venta",
];

/// In-memory view of the parsed export: one entry per successfully read row,
/// columns named exactly as in the header.
#[derive(Debug, Clone)]
struct SourceTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SourceTable {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Resolve the expected columns to their indices, failing with a message that
/// names both the missing and the available columns.
fn require_columns(table: &SourceTable, expected: &[&str], target: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(expected.len());
    let mut missing = Vec::new();
    for col in expected {
        match table.column_index(col) {
            Some(idx) => indices.push(idx),
            None => missing.push(*col),
        }
    }
    if !missing.is_empty() {
        anyhow::bail!(
            "Missing columns for {}: {:?}. Available columns: {:?}",
            target,
            missing,
            table.columns
        );
    }
    Ok(indices)
}

// =============================================================================
// Quality reporting
// =============================================================================

/// Data-quality findings from a transform. Transforms return these instead of
/// printing directly, so the caller decides what to do with them and tests
/// can assert on them.
#[derive(Debug, Default)]
struct QualityReport {
    warnings: Vec<QualityWarning>,
}

#[derive(Debug)]
struct QualityWarning {
    message: String,
    affected: usize,
    samples: Vec<String>,
}

impl QualityReport {
    /// Record a warning; no-op when nothing was affected.
    fn warn(&mut self, message: impl Into<String>, affected: usize, samples: Vec<String>) {
        if affected > 0 {
            self.warnings.push(QualityWarning {
                message: message.into(),
                affected,
                samples,
            });
        }
    }

    fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn print(&self) {
        if self.is_clean() {
            return;
        }
        for warning in &self.warnings {
            println!("⚠ {} ({} rows). Sample:", warning.message, warning.affected);
            for sample in warning.samples.iter().take(5) {
                println!("    {}", sample);
            }
            if warning.samples.len() > 5 {
                println!("    ... and {} more", warning.samples.len() - 5);
            }
        }
    }
}

// =============================================================================
// EXTRACT
// =============================================================================

/// Pick the delimiter with the most occurrences in the header line.
/// Comma wins ties and the no-match case.
fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = header_line.matches(',').count();
    for delim in [b';', b'\t', b'|'] {
        let count = header_line.matches(delim as char).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }
    best
}

/// Parse delimited text into a SourceTable. Rows with the wrong field count
/// are skipped and reported, not fatal.
fn parse_delimited(content: &str, delimiter: u8) -> Result<(SourceTable, QualityReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    // A single-column header means the sniffed delimiter was wrong; let the
    // caller fall back to a plain comma.
    if columns.len() == 1 && delimiter != b',' {
        anyhow::bail!(
            "Header parsed to a single column with delimiter '{}'",
            delimiter as char
        );
    }

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    let mut samples = Vec::new();

    for (line_idx, result) in reader.records().enumerate() {
        let line_num = line_idx + 2; // 1-indexed, after the header
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                malformed += 1;
                if samples.len() < 5 {
                    samples.push(format!("line {}: {}", line_num, e));
                }
                continue;
            }
        };
        if record.len() != columns.len() {
            malformed += 1;
            if samples.len() < 5 {
                samples.push(format!(
                    "line {}: expected {} fields, found {}",
                    line_num,
                    columns.len(),
                    record.len()
                ));
            }
            continue;
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    let mut report = QualityReport::default();
    report.warn("malformed rows skipped", malformed, samples);

    Ok((SourceTable { columns, rows }, report))
}

/// Read the sales export into memory. Fails if the path is missing; decodes
/// latin1; auto-detects the delimiter and retries with a comma if that parse
/// fails. Prints the detected columns and a preview of the first rows.
async fn extract_ventas(path: &Path) -> Result<(SourceTable, QualityReport)> {
    if !path.exists() {
        anyhow::bail!("Source file not found: {} (check path and name)", path.display());
    }

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // decode() sniffs a UTF-8 BOM first, so BOM-prefixed exports still work
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
    let content = text.into_owned();

    let header_line = content.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header_line);
    println!("Detected delimiter: '{}'", delimiter as char);

    let (table, report) = match parse_delimited(&content, delimiter) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("⚠ Parse with detected delimiter failed ({}), retrying with ','", e);
            parse_delimited(&content, b',')?
        }
    };

    println!("=== Source file loaded ===");
    println!("Columns detected: {:?}", table.columns);
    println!("Rows read: {}", table.rows.len());
    println!("First rows:");
    for row in table.rows.iter().take(5) {
        println!("  {}", row.join(" | "));
    }

    Ok((table, report))
}

// =============================================================================
// TRANSFORM - dates
// =============================================================================

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Coerce a raw field to a date. Returns None for anything unparseable,
/// including the empty string.
fn parse_fecha(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Dense integer date key in YYYYMMDD form, derived purely from the date.
fn fecha_key(fecha: NaiveDate) -> i32 {
    fecha.year() * 10000 + fecha.month() as i32 * 100 + fecha.day() as i32
}

// =============================================================================
// TRANSFORM - dimensions
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct DimTiempoRow {
    fecha_key: i32,
    fecha_completa: NaiveDate,
    anio: i32,
    mes: i32,
    dia: i32,
    dia_semana: String,
    trimestre: i32,
    es_fin_de_semana: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct DimClienteRow {
    cliente_id_origen: String,
    nombre_cliente: String,
    ciudad: String,
    pais: String,
    segmento_cliente: String,
    fecha_registro: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
struct DimProductoRow {
    producto_id_origen: String,
    nombre_producto: String,
    categoria: String,
    subcategoria: String,
    proveedor: String,
}

/// One row per distinct valid sale date, ascending. Rows whose date fails to
/// coerce are reported and excluded.
fn build_dim_tiempo(table: &SourceTable) -> Result<(Vec<DimTiempoRow>, QualityReport)> {
    let indices = require_columns(table, &["fecha_venta"], "dim_tiempo")?;
    let fecha_idx = indices[0];

    let mut fechas: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut invalid = 0usize;
    let mut samples = Vec::new();

    for row in &table.rows {
        let raw = row.get(fecha_idx).map(String::as_str).unwrap_or("");
        match parse_fecha(raw) {
            Some(fecha) => {
                fechas.insert(fecha);
            }
            None => {
                invalid += 1;
                if samples.len() < 10 {
                    samples.push(row.join(" | "));
                }
            }
        }
    }

    let mut report = QualityReport::default();
    report.warn("rows with invalid fecha_venta", invalid, samples);

    let rows = fechas
        .into_iter()
        .map(|fecha| DimTiempoRow {
            fecha_key: fecha_key(fecha),
            fecha_completa: fecha,
            anio: fecha.year(),
            mes: fecha.month() as i32,
            dia: fecha.day() as i32,
            dia_semana: fecha.format("%A").to_string(),
            trimestre: (fecha.month() as i32 - 1) / 3 + 1,
            es_fin_de_semana: matches!(fecha.weekday(), Weekday::Sat | Weekday::Sun),
        })
        .collect();

    Ok((rows, report))
}

/// Customer dimension: fixed attribute set, deduplicated by natural key
/// (first occurrence wins). fecha_registro coercion failures become null.
fn build_dim_clientes(table: &SourceTable) -> Result<(Vec<DimClienteRow>, QualityReport)> {
    let idx = require_columns(table, DIM_CLIENTES_COLUMNS, "dim_clientes")?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();
    let mut invalid_registro = 0usize;
    let mut samples = Vec::new();

    for row in &table.rows {
        let field = |i: usize| row.get(idx[i]).map(String::as_str).unwrap_or("");
        let cliente_id = field(0).to_string();
        if !seen.insert(cliente_id.clone()) {
            continue;
        }

        let raw_registro = field(5);
        let fecha_registro = parse_fecha(raw_registro);
        if fecha_registro.is_none() && !raw_registro.trim().is_empty() {
            invalid_registro += 1;
            if samples.len() < 5 {
                samples.push(format!("{}: fecha_registro={:?}", cliente_id, raw_registro));
            }
        }

        rows.push(DimClienteRow {
            cliente_id_origen: cliente_id,
            nombre_cliente: field(1).to_string(),
            ciudad: field(2).to_string(),
            pais: field(3).to_string(),
            segmento_cliente: field(4).to_string(),
            fecha_registro,
        });
    }

    let mut report = QualityReport::default();
    report.warn("clientes with invalid fecha_registro (set to null)", invalid_registro, samples);

    Ok((rows, report))
}

/// Product dimension: fixed attribute set, deduplicated by natural key
/// (first occurrence wins).
fn build_dim_productos(table: &SourceTable) -> Result<(Vec<DimProductoRow>, QualityReport)> {
    let idx = require_columns(table, DIM_PRODUCTOS_COLUMNS, "dim_productos")?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();

    for row in &table.rows {
        let field = |i: usize| row.get(idx[i]).map(String::as_str).unwrap_or("");
        let producto_id = field(0).to_string();
        if !seen.insert(producto_id.clone()) {
            continue;
        }
        rows.push(DimProductoRow {
            producto_id_origen: producto_id,
            nombre_producto: field(1).to_string(),
            categoria: field(2).to_string(),
            subcategoria: field(3).to_string(),
            proveedor: field(4).to_string(),
        });
    }

    Ok((rows, QualityReport::default()))
}

// =============================================================================
// TRANSFORM - facts
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct FactVentaRow {
    fecha_key: i32,
    cliente_key: Option<i32>,
    producto_key: Option<i32>,
    cantidad_vendida: i64,
    precio_unitario: f64,
    monto_total_venta: f64,
}

fn parse_cantidad(raw: &str) -> Option<i64> {
    let value = raw.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f as i64))
}

fn parse_importe(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// One fact row per source row with a parseable sale date. Natural keys are
/// left-joined against the already-loaded dimensions: unmatched rows keep a
/// null surrogate key and are reported, not rejected. Unparseable measures
/// are coerced to zero; unparseable dates drop the row.
fn build_fact_ventas(
    table: &SourceTable,
    cliente_keys: &HashMap<String, i32>,
    producto_keys: &HashMap<String, i32>,
) -> Result<(Vec<FactVentaRow>, QualityReport)> {
    let idx = require_columns(table, FACT_VENTAS_COLUMNS, "fact_ventas")?;

    let mut facts = Vec::new();
    let mut sin_cliente = 0usize;
    let mut cliente_samples = Vec::new();
    let mut sin_producto = 0usize;
    let mut producto_samples = Vec::new();
    let mut fechas_invalidas = 0usize;
    let mut fecha_samples = Vec::new();
    let mut medidas_invalidas = 0usize;
    let mut medida_samples = Vec::new();

    for row in &table.rows {
        let field = |i: usize| row.get(idx[i]).map(String::as_str).unwrap_or("");

        let cliente_key = cliente_keys.get(field(0)).copied();
        if cliente_key.is_none() {
            sin_cliente += 1;
            if cliente_samples.len() < 5 {
                cliente_samples.push(row.join(" | "));
            }
        }
        let producto_key = producto_keys.get(field(1)).copied();
        if producto_key.is_none() {
            sin_producto += 1;
            if producto_samples.len() < 5 {
                producto_samples.push(row.join(" | "));
            }
        }

        // Hard filter: a fact without a date key has no place in the schema
        let fecha = match parse_fecha(field(2)) {
            Some(f) => f,
            None => {
                fechas_invalidas += 1;
                if fecha_samples.len() < 5 {
                    fecha_samples.push(row.join(" | "));
                }
                continue;
            }
        };

        let mut medida_fallida = |name: &str, raw: &str| {
            medidas_invalidas += 1;
            if medida_samples.len() < 5 {
                medida_samples.push(format!("{}={:?}", name, raw));
            }
        };
        let cantidad_vendida = parse_cantidad(field(3)).unwrap_or_else(|| {
            medida_fallida("cantidad_vendida", field(3));
            0
        });
        let precio_unitario = parse_importe(field(4)).unwrap_or_else(|| {
            medida_fallida("precio_unitario", field(4));
            0.0
        });
        let monto_total_venta = parse_importe(field(5)).unwrap_or_else(|| {
            medida_fallida("monto_total_venta", field(5));
            0.0
        });

        facts.push(FactVentaRow {
            fecha_key: fecha_key(fecha),
            cliente_key,
            producto_key,
            cantidad_vendida,
            precio_unitario,
            monto_total_venta,
        });
    }

    let mut report = QualityReport::default();
    report.warn("rows with no matching cliente_key", sin_cliente, cliente_samples);
    report.warn("rows with no matching producto_key", sin_producto, producto_samples);
    report.warn("rows dropped for invalid fecha_venta", fechas_invalidas, fecha_samples);
    report.warn("measures coerced to zero", medidas_invalidas, medida_samples);

    Ok((facts, report))
}

// =============================================================================
// Surrogate key resolution
// =============================================================================

/// Fetch the cliente natural-key -> surrogate-key map in one query.
async fn fetch_cliente_keys(conn: &mut PgConnection) -> Result<HashMap<String, i32>> {
    let rows: Vec<(i32, String)> =
        sqlx::query_as("SELECT cliente_key, cliente_id_origen FROM dim_clientes")
            .fetch_all(&mut *conn)
            .await
            .context("Failed to fetch cliente keys from dim_clientes")?;
    Ok(rows.into_iter().map(|(key, id)| (id, key)).collect())
}

/// Fetch the producto natural-key -> surrogate-key map in one query.
async fn fetch_producto_keys(conn: &mut PgConnection) -> Result<HashMap<String, i32>> {
    let rows: Vec<(i32, String)> =
        sqlx::query_as("SELECT producto_key, producto_id_origen FROM dim_productos")
            .fetch_all(&mut *conn)
            .await
            .context("Failed to fetch producto keys from dim_productos")?;
    Ok(rows.into_iter().map(|(key, id)| (id, key)).collect())
}

// =============================================================================
// LOAD
// =============================================================================

/// Append customer rows to dim_clientes. Database surrogate keys are
/// assigned on insert.
async fn load_dim_clientes(pool: &PgPool, rows: &[DimClienteRow]) -> Result<u64> {
    let mut inserted = 0u64;
    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO dim_clientes
            (cliente_id_origen, nombre_cliente, ciudad, pais, segmento_cliente, fecha_registro)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&row.cliente_id_origen)
        .bind(&row.nombre_cliente)
        .bind(&row.ciudad)
        .bind(&row.pais)
        .bind(&row.segmento_cliente)
        .bind(row.fecha_registro)
        .execute(pool)
        .await;

        if let Err(e) = result {
            eprintln!("✗ Error loading dim_clientes: {}", e);
            return Err(e).context("Failed to load dim_clientes");
        }
        inserted += 1;
    }
    println!("✓ Loaded {} rows into dim_clientes", inserted);
    Ok(inserted)
}

/// Append product rows to dim_productos.
async fn load_dim_productos(pool: &PgPool, rows: &[DimProductoRow]) -> Result<u64> {
    let mut inserted = 0u64;
    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO dim_productos
            (producto_id_origen, nombre_producto, categoria, subcategoria, proveedor)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&row.producto_id_origen)
        .bind(&row.nombre_producto)
        .bind(&row.categoria)
        .bind(&row.subcategoria)
        .bind(&row.proveedor)
        .execute(pool)
        .await;

        if let Err(e) = result {
            eprintln!("✗ Error loading dim_productos: {}", e);
            return Err(e).context("Failed to load dim_productos");
        }
        inserted += 1;
    }
    println!("✓ Loaded {} rows into dim_productos", inserted);
    Ok(inserted)
}

/// Append date rows to dim_tiempo.
async fn load_dim_tiempo(pool: &PgPool, rows: &[DimTiempoRow]) -> Result<u64> {
    let mut inserted = 0u64;
    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO dim_tiempo
            (fecha_key, fecha_completa, anio, mes, dia, dia_semana, trimestre, es_fin_de_semana)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.fecha_key)
        .bind(row.fecha_completa)
        .bind(row.anio)
        .bind(row.mes)
        .bind(row.dia)
        .bind(&row.dia_semana)
        .bind(row.trimestre)
        .bind(row.es_fin_de_semana)
        .execute(pool)
        .await;

        if let Err(e) = result {
            eprintln!("✗ Error loading dim_tiempo: {}", e);
            return Err(e).context("Failed to load dim_tiempo");
        }
        inserted += 1;
    }
    println!("✓ Loaded {} rows into dim_tiempo", inserted);
    Ok(inserted)
}

/// Append fact rows to fact_ventas. Null surrogate keys are stored as null.
async fn load_fact_ventas(pool: &PgPool, rows: &[FactVentaRow]) -> Result<u64> {
    let mut inserted = 0u64;
    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO fact_ventas
            (fecha_key, cliente_key, producto_key, cantidad_vendida, precio_unitario, monto_total_venta)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.fecha_key)
        .bind(row.cliente_key)
        .bind(row.producto_key)
        .bind(row.cantidad_vendida)
        .bind(row.precio_unitario)
        .bind(row.monto_total_venta)
        .execute(pool)
        .await;

        if let Err(e) = result {
            eprintln!("✗ Error loading fact_ventas: {}", e);
            return Err(e).context("Failed to load fact_ventas");
        }
        inserted += 1;
    }
    println!("✓ Loaded {} rows into fact_ventas", inserted);
    Ok(inserted)
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run the full pipeline: extract, build and load the dimensions, then build
/// the facts against the freshly loaded dimension keys and load them.
/// The first unhandled error aborts the remaining steps; already-loaded
/// tables stay committed (no rollback, no retry).
async fn run_etl(pool: &PgPool, input: &Path, dry_run: bool) -> Result<()> {
    let (ventas, extract_report) = extract_ventas(input).await?;
    extract_report.print();

    println!("\n=== Transform: dimensions ===");
    let (dim_clientes, clientes_report) = build_dim_clientes(&ventas)?;
    clientes_report.print();
    let (dim_productos, productos_report) = build_dim_productos(&ventas)?;
    productos_report.print();
    let (dim_tiempo, tiempo_report) = build_dim_tiempo(&ventas)?;
    tiempo_report.print();

    println!("dim_clientes: {} rows", dim_clientes.len());
    println!("dim_productos: {} rows", dim_productos.len());
    println!("dim_tiempo: {} rows", dim_tiempo.len());

    if dry_run {
        println!("\nDry run - dimensions transformed, nothing loaded.");
        println!("(fact_ventas needs the dimension keys from the database, skipped)");
        return Ok(());
    }

    println!("\n=== Load: dimensions ===");
    load_dim_clientes(pool, &dim_clientes).await?;
    load_dim_productos(pool, &dim_productos).await?;
    load_dim_tiempo(pool, &dim_tiempo).await?;

    println!("\n=== Transform: facts ===");
    // Key lookups run on a connection scoped to the fact phase
    let fact_ventas = {
        let mut conn = pool
            .acquire()
            .await
            .context("Failed to acquire a database connection for key resolution")?;
        let cliente_keys = fetch_cliente_keys(&mut conn).await?;
        let producto_keys = fetch_producto_keys(&mut conn).await?;
        println!(
            "Resolved {} cliente keys, {} producto keys",
            cliente_keys.len(),
            producto_keys.len()
        );

        let (facts, fact_report) = build_fact_ventas(&ventas, &cliente_keys, &producto_keys)?;
        fact_report.print();
        facts
    };
    println!("fact_ventas: {} rows", fact_ventas.len());

    println!("\n=== Load: facts ===");
    load_fact_ventas(pool, &fact_ventas).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env()?;

    println!("=== Retail Warehouse ETL ===");
    println!("Input: {}", args.input);
    println!("Mode: {}", if args.dry_run { "dry-run" } else { "live" });

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .context("Failed to connect to database")?;

    run_etl(&pool, Path::new(&args.input), args.dry_run).await?;

    println!("\n=== ETL Complete ===");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
