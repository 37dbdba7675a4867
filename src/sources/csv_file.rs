use crate::lake::{LakeClient, StorageLocation};
use crate::utils::error::{QuanterraError, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Rows read when previewing a file for validation. Brokerage exports put
/// their real header a few rows in, so this has to cover the deepest one.
pub const DEFAULT_PREVIEW_ROWS: usize = 15;

pub fn is_csv_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Decodes a CSV field as UTF-8, falling back to Latin-1 for the brokerage
/// exports that still ship ISO-8859-1 (the £ sign, mostly).
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Reads the first `preview_rows` raw rows, header included. Rows may be
/// ragged; export files open with free-text preamble lines.
pub fn preview_from_bytes(data: &[u8], preview_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.byte_records().take(preview_rows) {
        let record = record?;
        rows.push(record.iter().map(decode_field).collect());
    }
    Ok(rows)
}

/// Checks that row `header_row` of a preview carries every column in
/// `required`. The header row index varies by export type; anything the
/// export puts above it is preamble.
pub fn check_required_columns(
    rows: &[Vec<String>],
    header_row: usize,
    required: &[&str],
) -> Result<()> {
    let Some(header) = rows.get(header_row) else {
        return Err(QuanterraError::ValidationError {
            message: "No data provided".to_string(),
        });
    };

    let actual: HashSet<&str> = header.iter().map(|cell| cell.as_str()).collect();
    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !actual.contains(column))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(QuanterraError::ValidationError {
            message: format!("Missing required columns: {}", missing.join(", ")),
        });
    }

    Ok(())
}

/// Preview reader for a local CSV export file.
#[derive(Debug, Clone)]
pub struct CsvFileClient {
    source_path: PathBuf,
    preview_rows: usize,
}

impl CsvFileClient {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn validate_file_type(&self) -> bool {
        is_csv_file(&self.source_path.to_string_lossy())
    }

    pub async fn preview_file(&self) -> Result<Vec<Vec<String>>> {
        let data = tokio::fs::read(&self.source_path).await?;
        preview_from_bytes(&data, self.preview_rows)
    }
}

/// Where a brokerage export lives before ingestion. Scheduled runs read
/// local files; the transaction upload CLI stages files in the lake first
/// and hands over the object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSource {
    File(PathBuf),
    LakeObject(String),
}

impl TransactionSource {
    /// Interprets a path argument: an existing local file is read directly,
    /// anything else is treated as an object already in the lake bucket.
    pub fn from_arg(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_file() {
            TransactionSource::File(path.to_path_buf())
        } else {
            TransactionSource::LakeObject(arg.to_string())
        }
    }

    pub fn validate_file_type(&self) -> bool {
        match self {
            TransactionSource::File(path) => is_csv_file(&path.to_string_lossy()),
            TransactionSource::LakeObject(path) => is_csv_file(path),
        }
    }

    /// Reads the first preview rows of the export for validation.
    pub async fn preview(&self, lake: &LakeClient) -> Result<Vec<Vec<String>>> {
        match self {
            TransactionSource::File(path) => CsvFileClient::new(path).preview_file().await,
            TransactionSource::LakeObject(path) => {
                let bytes = lake.fetch(path).await?;
                preview_from_bytes(&bytes, DEFAULT_PREVIEW_ROWS)
            }
        }
    }

    /// Archives the export at `path` in the lake, gzip-compressed.
    pub async fn store(&self, lake: &LakeClient, path: &str) -> Result<StorageLocation> {
        match self {
            TransactionSource::File(source) => lake.store_csv_file(source, path, true).await,
            TransactionSource::LakeObject(source) => lake.copy_csv_object(source, path).await,
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionSource::File(path) => write!(f, "{}", path.display()),
            TransactionSource::LakeObject(path) => f.write_str(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_csv_file() {
        assert!(is_csv_file("transactions.csv"));
        assert!(is_csv_file("exports/Transactions.CSV"));
        assert!(!is_csv_file("transactions.xlsx"));
        assert!(!is_csv_file("transactions"));
    }

    #[test]
    fn test_preview_ragged_rows() {
        let data = b"Some export preamble\nDate,Symbol,Quantity\n01/08/2026,VOD,10\n";
        let rows = preview_from_bytes(data, 15).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Some export preamble"]);
        assert_eq!(rows[1], vec!["Date", "Symbol", "Quantity"]);
        assert_eq!(rows[2], vec!["01/08/2026", "VOD", "10"]);
    }

    #[test]
    fn test_preview_limits_rows() {
        let data = b"a\nb\nc\nd\n";
        let rows = preview_from_bytes(data, 2).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_latin1_pound_sign_decoded() {
        // "Value (£)" in ISO-8859-1: the pound sign is a bare 0xA3 byte.
        let data = b"Stock,Value (\xA3)\nVOD,1024.50\n";
        let rows = preview_from_bytes(data, 15).unwrap();
        assert_eq!(rows[0][1], "Value (£)");
    }

    #[test]
    fn test_utf8_pound_sign_decoded() {
        let data = "Stock,Value (£)\nVOD,1024.50\n".as_bytes();
        let rows = preview_from_bytes(data, 15).unwrap();
        assert_eq!(rows[0][1], "Value (£)");
    }

    #[test]
    fn test_check_required_columns_passes() {
        let rows = vec![
            vec!["preamble".to_string()],
            vec!["Date".to_string(), "Symbol".to_string()],
        ];
        assert!(check_required_columns(&rows, 1, &["Date", "Symbol"]).is_ok());
    }

    #[test]
    fn test_check_required_columns_reports_missing_sorted() {
        let rows = vec![vec!["Date".to_string()]];
        let err = check_required_columns(&rows, 0, &["Symbol", "Date", "Credit"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required columns: Credit, Symbol"
        );
    }

    #[test]
    fn test_check_required_columns_empty_preview() {
        let err = check_required_columns(&[], 0, &["Date"]).unwrap_err();
        assert!(err.to_string().contains("No data provided"));

        // A header row past the end of a short preview reads as no data too.
        let rows = vec![vec!["preamble".to_string()]];
        let err = check_required_columns(&rows, 5, &["Date"]).unwrap_err();
        assert!(err.to_string().contains("No data provided"));
    }

    #[tokio::test]
    async fn test_client_preview_and_file_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        std::fs::write(&path, "Date,Symbol\n01/08/2026,VOD\n").unwrap();

        let client = CsvFileClient::new(&path);
        assert!(client.validate_file_type());
        assert_eq!(client.preview_file().await.unwrap().len(), 2);

        let not_csv = CsvFileClient::new(dir.path().join("transactions.xlsx"));
        assert!(!not_csv.validate_file_type());
    }

    #[test]
    fn test_transaction_source_from_arg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        std::fs::write(&path, "Date\n").unwrap();

        let local = TransactionSource::from_arg(&path.to_string_lossy());
        assert_eq!(local, TransactionSource::File(path));

        let remote = TransactionSource::from_arg("temp_uploads/2026-08-25/transactions.csv");
        assert_eq!(
            remote,
            TransactionSource::LakeObject("temp_uploads/2026-08-25/transactions.csv".to_string())
        );
    }

    #[test]
    fn test_transaction_source_validates_extension() {
        assert!(TransactionSource::LakeObject("temp_uploads/t.csv".to_string())
            .validate_file_type());
        assert!(!TransactionSource::LakeObject("temp_uploads/t.xlsx".to_string())
            .validate_file_type());
        assert!(TransactionSource::File(PathBuf::from("exports/t.csv")).validate_file_type());
    }

    #[tokio::test]
    async fn test_transaction_source_previews_lake_object() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("transactions.csv");
        std::fs::write(&source, "Date,Symbol\n01/08/2026,VOD\n").unwrap();

        let lake = LakeClient::in_memory("datalake-dev-bronze");
        lake.store_csv_file(&source, "temp_uploads/t.csv", false)
            .await
            .unwrap();

        let rows = TransactionSource::LakeObject("temp_uploads/t.csv".to_string())
            .preview(&lake)
            .await
            .unwrap();
        assert_eq!(rows[1], vec!["01/08/2026", "VOD"]);
    }
}
