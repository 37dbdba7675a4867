use std::io::Read;

use flate2::read::GzDecoder;
use tempfile::TempDir;

use quanterra::config::{Environment, Settings};
use quanterra::flows::hargreaves_lansdown::{self, Exports};
use quanterra::flows::interactive_investor;
use quanterra::lake::LakeClient;
use quanterra::sources::csv_file::TransactionSource;

const II_EXPORT: &str = "Date,Settlement Date,Symbol,Sedol,Quantity,Price,Description,\
                         Reference,Debit,Credit,Running Balance\n\
                         01/08/2026,03/08/2026,VOD,BH4HKS3,10,74.50,VODAFONE GROUP,\
                         AB1234,745.00,,1255.00\n";

const HL_PREAMBLE_5: &str = "Client name:,A Client\n\
                             Client number:,123456\n\
                             Account:,ISA\n\
                             ,\n\
                             ,\n";

fn hl_transactions_export() -> String {
    format!(
        "{HL_PREAMBLE_5}Trade date,Settle date,Reference,Description,Unit cost (p),\
         Quantity,Value (\u{a3})\n\
         01/08/2026,03/08/2026,B12345,VODAFONE GROUP,74.50,10,745.00\n"
    )
}

fn hl_closed_positions_export() -> String {
    format!("{HL_PREAMBLE_5}Code,Stock,Disposal type,Disposal date\nVOD,VODAFONE GROUP,Sale,01/08/2026\n")
}

fn hl_positions_export() -> String {
    let mut preamble = String::new();
    for i in 0..10 {
        preamble.push_str(&format!("preamble {i},\n"));
    }
    format!(
        "{preamble}Stock,Units held,Price (pence),Value (\u{a3}),Cost (\u{a3}),\
         Gain/loss (\u{a3}),Gain/loss (%),Code\n\
         VODAFONE GROUP,10,74.50,7.45,7.00,0.45,6.4,VOD\n"
    )
}

fn minimal_settings() -> Settings {
    Settings::from_toml_str(
        "[lake]\nbucket = \"datalake-dev-bronze\"\nurl = \"memory:///\"\n",
        Environment::Dev,
    )
    .unwrap()
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_interactive_investor_flow_archives_local_export() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("transactions.csv");
    std::fs::write(&export, II_EXPORT).unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let context = interactive_investor::run(
        &settings,
        &lake,
        TransactionSource::File(export),
        "isa",
    )
    .await
    .unwrap();

    assert!(context.all_succeeded());
    assert!(context
        .pipeline_id
        .starts_with("interactive_investor_transactions-"));

    let date = chrono::Utc::now().format("%Y%m%d");
    let path = format!("transactions/interactive_investor/isa/{date}/transactions.csv.gz");
    let stored = lake.fetch(&path).await.unwrap();
    assert_eq!(gunzip(&stored), II_EXPORT.as_bytes());
}

#[tokio::test]
async fn test_interactive_investor_flow_from_staged_upload() {
    // The CLI stages the file uncompressed, then the flow copies it into the
    // archive path, compressing on the way.
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("transactions.csv");
    std::fs::write(&export, II_EXPORT).unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");
    lake.store_csv_file(&export, "temp_uploads/2026-08-25T09:00:00/transactions.csv", false)
        .await
        .unwrap();

    let context = interactive_investor::run(
        &settings,
        &lake,
        TransactionSource::LakeObject(
            "temp_uploads/2026-08-25T09:00:00/transactions.csv".to_string(),
        ),
        "sipp",
    )
    .await
    .unwrap();
    assert!(context.all_succeeded());

    let date = chrono::Utc::now().format("%Y%m%d");
    let path = format!("transactions/interactive_investor/sipp/{date}/transactions.csv.gz");
    let stored = lake.fetch(&path).await.unwrap();
    assert_eq!(&stored[..2], &[0x1f, 0x8b]);
    assert_eq!(gunzip(&stored), II_EXPORT.as_bytes());
}

#[tokio::test]
async fn test_interactive_investor_flow_rejects_missing_columns() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("transactions.csv");
    std::fs::write(&export, "Date,Symbol\n01/08/2026,VOD\n").unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let err = interactive_investor::run(
        &settings,
        &lake,
        TransactionSource::File(export),
        "isa",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("interactive_investor"));

    // Nothing was archived.
    let date = chrono::Utc::now().format("%Y%m%d");
    let path = format!("transactions/interactive_investor/isa/{date}/transactions.csv.gz");
    assert!(lake.fetch(&path).await.is_err());
}

#[tokio::test]
async fn test_hargreaves_lansdown_flow_archives_all_exports() {
    let dir = TempDir::new().unwrap();
    let transactions = dir.path().join("transactions.csv");
    let positions = dir.path().join("positions.csv");
    let closed = dir.path().join("closed_positions.csv");
    std::fs::write(&transactions, hl_transactions_export()).unwrap();
    std::fs::write(&positions, hl_positions_export()).unwrap();
    std::fs::write(&closed, hl_closed_positions_export()).unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let exports = Exports {
        transactions: Some(TransactionSource::File(transactions)),
        positions: Some(TransactionSource::File(positions)),
        closed_positions: Some(TransactionSource::File(closed)),
    };
    let context = hargreaves_lansdown::run(&settings, &lake, exports, "isa")
        .await
        .unwrap();

    assert!(context.all_succeeded());
    assert_eq!(context.total_records_processed(), 3);

    let date = chrono::Utc::now().format("%Y%m%d");
    for file in ["transactions", "positions", "closed_positions"] {
        let path = format!("transactions/hargreaves_lansdown/isa/{date}/{file}.csv.gz");
        let stored = lake.fetch(&path).await.unwrap();
        assert_eq!(&stored[..2], &[0x1f, 0x8b]);
    }
}

#[tokio::test]
async fn test_hargreaves_lansdown_flow_accepts_subset() {
    let dir = TempDir::new().unwrap();
    let positions = dir.path().join("positions.csv");
    std::fs::write(&positions, hl_positions_export()).unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let exports = Exports {
        positions: Some(TransactionSource::File(positions)),
        ..Exports::default()
    };
    let context = hargreaves_lansdown::run(&settings, &lake, exports, "sipp")
        .await
        .unwrap();

    assert_eq!(context.total_records_processed(), 1);
    let date = chrono::Utc::now().format("%Y%m%d");
    let path = format!("transactions/hargreaves_lansdown/sipp/{date}/positions.csv.gz");
    assert!(lake.fetch(&path).await.is_ok());
}

#[tokio::test]
async fn test_hargreaves_lansdown_flow_rejects_empty_exports() {
    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let err = hargreaves_lansdown::run(&settings, &lake, Exports::default(), "isa")
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("No Hargreaves Lansdown export files provided"));
}

#[tokio::test]
async fn test_hargreaves_lansdown_flow_rejects_wrong_preamble_depth() {
    let dir = TempDir::new().unwrap();
    let positions = dir.path().join("positions.csv");
    // Positions export with the 5 row preamble of a transactions export:
    // the header is not on the row the positions validator reads.
    std::fs::write(&positions, hl_transactions_export()).unwrap();

    let settings = minimal_settings();
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let exports = Exports {
        positions: Some(TransactionSource::File(positions)),
        ..Exports::default()
    };
    let err = hargreaves_lansdown::run(&settings, &lake, exports, "isa")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("hargreaves_lansdown"));
}
