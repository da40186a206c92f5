//! Tests for output module

use super::*;
use crate::error::Error;
use crate::schema::{CellValue, ColumnSpec, ColumnType, NormalizedRow, RecordSchema};
use crate::types::Compression;
use arrow::array::{Array, DictionaryArray, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Int32Type, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use std::fs::File;
use tempfile::tempdir;

fn schema() -> RecordSchema {
    RecordSchema::new(vec![
        ColumnSpec::new("meterId", ColumnType::Utf8)
            .named("meter_id")
            .required(),
        ColumnSpec::new("retailPrice", ColumnType::Float64).named("retail_price"),
        ColumnSpec::new("type", ColumnType::Category).named("price_type"),
        ColumnSpec::new("effectiveStartDate", ColumnType::Timestamp)
            .named("effective_start_date"),
    ])
    .unwrap()
}

fn row(meter: &str, price: Option<f64>, kind: &str, start: i64) -> NormalizedRow {
    NormalizedRow(vec![
        CellValue::Utf8(meter.into()),
        price.map_or(CellValue::Null, CellValue::Float64),
        CellValue::Category(kind.into()),
        CellValue::Timestamp(start),
    ])
}

fn sample_table() -> ResultTable {
    let mut assembler = TableAssembler::new(schema());
    assembler
        .append_page(
            0,
            vec![
                row("m1", Some(0.5), "Consumption", 1_596_240_000_000_000),
                row("m2", None, "Reservation", 1_596_240_000_000_000),
            ],
        )
        .unwrap();
    assembler
        .append_page(1, vec![row("m3", Some(2.0), "Consumption", 0)])
        .unwrap();
    assembler.finalize().unwrap()
}

fn meter_ids(table: &ResultTable) -> Vec<String> {
    table
        .column("meter_id")
        .unwrap()
        .into_iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Assembler Tests
// ============================================================================

#[test]
fn test_assembler_keeps_page_order() {
    let table = sample_table();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.num_pages(), 2);
    assert_eq!(table.page_row_counts(), &[2, 1]);
    assert_eq!(meter_ids(&table), vec!["m1", "m2", "m3"]);
}

#[test]
fn test_assembler_rejects_gap() {
    let mut assembler = TableAssembler::new(schema());
    assembler.append_page(0, vec![]).unwrap();

    let err = assembler
        .append_page(2, vec![row("m", None, "x", 0)])
        .unwrap_err();
    assert!(matches!(err, Error::Table { .. }));
    assert!(err.to_string().contains("expected page 1"));
    assert_eq!(assembler.progress().pages_committed, 1);
    assert_eq!(assembler.progress().rows_committed, 0);
}

#[test]
fn test_assembler_rejects_append_after_seal() {
    let mut assembler = TableAssembler::new(schema());
    assembler.append_page(0, vec![row("m", None, "x", 0)]).unwrap();
    let table = assembler.finalize().unwrap();
    assert!(assembler.is_sealed());

    let err = assembler.append_page(1, vec![]).unwrap_err();
    assert!(err.to_string().contains("sealed"));
    assert!(assembler.finalize().is_err());
    assert_eq!(table.num_rows(), 1);
}

#[test]
fn test_assembler_rejects_wrong_width() {
    let mut assembler = TableAssembler::new(schema());
    let err = assembler
        .append_page(0, vec![NormalizedRow(vec![CellValue::Null])])
        .unwrap_err();
    assert!(err.to_string().contains("schema has 4 columns"));
    assert_eq!(assembler.next_index(), 0);
}

#[test]
fn test_empty_table() {
    let mut assembler = TableAssembler::new(schema());
    let table = assembler.finalize().unwrap();
    assert!(table.is_empty());
    assert_eq!(table.to_record_batch().unwrap().num_rows(), 0);
}

// ============================================================================
// Arrow Conversion Tests
// ============================================================================

#[test]
fn test_arrow_schema_types() {
    let arrow_schema = to_arrow_schema(&schema());

    let meter = arrow_schema.field_with_name("meter_id").unwrap();
    assert_eq!(meter.data_type(), &DataType::Utf8);
    assert!(!meter.is_nullable());

    let kind = arrow_schema.field_with_name("price_type").unwrap();
    assert_eq!(
        kind.data_type(),
        &DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
    );
    assert!(kind.is_nullable());

    let start = arrow_schema.field_with_name("effective_start_date").unwrap();
    assert_eq!(
        start.data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
    );
}

#[test]
fn test_to_record_batch_values() {
    let batch = sample_table().to_record_batch().unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 4);

    let meters = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(meters.value(2), "m3");

    let prices = batch
        .column(1)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(prices.value(0), 0.5);
    assert!(prices.is_null(1));

    let kinds = batch
        .column(2)
        .as_any()
        .downcast_ref::<DictionaryArray<Int32Type>>()
        .unwrap();
    assert_eq!(kinds.values().len(), 2);
    assert_eq!(kinds.keys().value(0), kinds.keys().value(2));

    let starts = batch
        .column(3)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(starts.value(0), 1_596_240_000_000_000);
}

#[test]
fn test_to_record_batch_rejects_mismatched_cell() {
    let table = ResultTable::from_parts(
        schema(),
        vec![NormalizedRow(vec![
            CellValue::Utf8("m".into()),
            CellValue::Utf8("not a float".into()),
            CellValue::Null,
            CellValue::Null,
        ])],
        vec![1],
    );
    let err = table.to_record_batch().unwrap_err();
    assert!(err.to_string().contains("column 'retail_price' expects float64"));
}

// ============================================================================
// Parquet Persistence Tests
// ============================================================================

#[test]
fn test_persist_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.parquet");
    let table = sample_table();

    let rows = persist(&table, &path, &ParquetWriterConfig::default()).unwrap();
    assert_eq!(rows, 3);

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.collect::<std::result::Result<_, _>>().unwrap();
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(total, 3);
    assert_eq!(batches[0].schema().field(0).name(), "meter_id");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_persist_is_byte_identical() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.parquet");
    let second = dir.path().join("b.parquet");
    let table = sample_table();
    let config = ParquetWriterConfig::from(Compression::Zstd);

    persist(&table, &first, &config).unwrap();
    persist(&table, &second, &config).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_persist_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.parquet");
    std::fs::write(&path, b"stale").unwrap();

    persist(&sample_table(), &path, &ParquetWriterConfig::default()).unwrap();
    assert_eq!(&std::fs::read(&path).unwrap()[..4], b"PAR1");
}

#[cfg(unix)]
#[test]
fn test_persist_file_mode_matches_file_create() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.parquet");
    let reference = dir.path().join("reference");
    File::create(&reference).unwrap();

    persist(&sample_table(), &path, &ParquetWriterConfig::default()).unwrap();

    let mode = |p: &std::path::Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&path), mode(&reference));
}

#[test]
fn test_persist_unwritable_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("prices.parquet");

    let err = persist(&sample_table(), &path, &ParquetWriterConfig::default()).unwrap_err();
    match err {
        Error::Persistence { path: p, .. } => assert!(p.ends_with("prices.parquet")),
        other => panic!("Expected Persistence, got {other:?}"),
    }
}

#[test]
fn test_persist_rejects_no_columns() {
    let dir = tempdir().unwrap();
    let empty = RecordSchema {
        columns: vec![],
        defaults: vec![],
    };
    let table = ResultTable::from_parts(empty, vec![], vec![]);

    let err = persist(&table, dir.path().join("x.parquet"), &ParquetWriterConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("table has no columns"));
}

#[test]
fn test_persist_rejects_duplicate_columns() {
    let dir = tempdir().unwrap();
    let duplicated = RecordSchema {
        columns: vec![
            ColumnSpec::new("a", ColumnType::Utf8).named("x"),
            ColumnSpec::new("b", ColumnType::Utf8).named("x"),
        ],
        defaults: vec![CellValue::Null, CellValue::Null],
    };
    let table = ResultTable::from_parts(duplicated, vec![], vec![]);

    let err = persist(&table, dir.path().join("x.parquet"), &ParquetWriterConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert!(err.to_string().contains("duplicate column name 'x'"));
}

#[test]
fn test_writer_config_codecs() {
    use parquet::basic::Compression as Codec;

    assert_eq!(
        ParquetWriterConfig::from(Compression::None).compression(),
        Codec::UNCOMPRESSED
    );
    assert_eq!(
        ParquetWriterConfig::from(Compression::Snappy).compression(),
        Codec::SNAPPY
    );
    assert!(matches!(
        ParquetWriterConfig::from(Compression::Gzip).compression(),
        Codec::GZIP(_)
    ));

    let config = ParquetWriterConfig::new()
        .with_row_group_size(10)
        .with_dictionary(false)
        .with_statistics(false);
    assert_eq!(config.row_group_size(), 10);
    assert!(!config.is_dictionary_enabled());
    assert!(!config.is_statistics_enabled());
}
