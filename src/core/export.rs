use crate::domain::model::{DetailRow, DocumentFailure, StateSummary, TransformResult};
use crate::utils::error::{EtlError, Result};
use serde::{Serialize, Serializer};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const SUMMARY_SHEET: &str = "resumo.csv";
pub const DETAIL_SHEET: &str = "detalhes.csv";
pub const FAILURES_SHEET: &str = "falhas.csv";
pub const MANIFEST: &str = "manifest.json";

// 彙總金額以兩位小數輸出，明細保留原始數值
fn money<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

#[derive(Serialize)]
struct DetailCsvRow<'a> {
    #[serde(rename = "NFe")]
    invoice_number: &'a str,
    #[serde(rename = "UF_Destino")]
    destination_state: &'a str,
    #[serde(rename = "IE_Substituto")]
    taxpayer_registration: &'a str,
    #[serde(rename = "Produto")]
    product_description: &'a str,
    #[serde(rename = "vBCST")]
    bc_st: f64,
    #[serde(rename = "vICMSST")]
    icms_st: f64,
    #[serde(rename = "vBCUFDest")]
    bc_uf_dest: f64,
    #[serde(rename = "vICMSUFDest")]
    icms_uf_dest: f64,
    #[serde(rename = "vFCPUFDest")]
    fcp_uf_dest: f64,
    #[serde(rename = "vFCPST")]
    fcp_st: f64,
    #[serde(rename = "Total_FECP")]
    total_fcp: f64,
}

impl<'a> From<&'a DetailRow> for DetailCsvRow<'a> {
    fn from(row: &'a DetailRow) -> Self {
        let record = &row.record;
        Self {
            invoice_number: &record.invoice_number,
            destination_state: &record.destination_state,
            taxpayer_registration: &record.taxpayer_registration,
            product_description: &record.product_description,
            bc_st: record.amounts.bc_st,
            icms_st: record.amounts.icms_st,
            bc_uf_dest: record.amounts.bc_uf_dest,
            icms_uf_dest: record.amounts.icms_uf_dest,
            fcp_uf_dest: record.amounts.fcp_uf_dest,
            fcp_st: record.amounts.fcp_st,
            total_fcp: row.total_fcp,
        }
    }
}

#[derive(Serialize)]
struct SummaryCsvRow<'a> {
    #[serde(rename = "Estado")]
    state: &'a str,
    #[serde(rename = "IE Substituto")]
    registration: &'a str,
    #[serde(rename = "Total ST", serialize_with = "money")]
    icms_st: f64,
    #[serde(rename = "Total DIFAL", serialize_with = "money")]
    icms_uf_dest: f64,
    #[serde(rename = "Total FECP", serialize_with = "money")]
    total_fcp: f64,
}

impl<'a> From<&'a StateSummary> for SummaryCsvRow<'a> {
    fn from(row: &'a StateSummary) -> Self {
        Self {
            state: &row.state,
            registration: &row.registration,
            icms_st: row.icms_st,
            icms_uf_dest: row.icms_uf_dest,
            total_fcp: row.total_fcp,
        }
    }
}

#[derive(Serialize)]
struct FailureCsvRow<'a> {
    #[serde(rename = "Documento")]
    document: &'a str,
    #[serde(rename = "Erro")]
    reason: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub generated_at: String,
    pub documents_parsed: usize,
    pub documents_failed: usize,
    pub line_items: usize,
    pub summary_rows: usize,
}

impl Manifest {
    pub fn for_result(result: &TransformResult) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            documents_parsed: result.documents_parsed,
            documents_failed: result.failures.len(),
            line_items: result.detail.len(),
            summary_rows: result.summary.len(),
        }
    }
}

fn write_sheet<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Detail sheet. The header is written even when there are no rows.
pub fn detail_csv(detail: &[DetailRow]) -> Result<Vec<u8>> {
    if detail.is_empty() {
        return header_only(&[
            "NFe",
            "UF_Destino",
            "IE_Substituto",
            "Produto",
            "vBCST",
            "vICMSST",
            "vBCUFDest",
            "vICMSUFDest",
            "vFCPUFDest",
            "vFCPST",
            "Total_FECP",
        ]);
    }
    write_sheet(detail.iter().map(DetailCsvRow::from))
}

pub fn summary_csv(summary: &[StateSummary]) -> Result<Vec<u8>> {
    if summary.is_empty() {
        return header_only(&["Estado", "IE Substituto", "Total ST", "Total DIFAL", "Total FECP"]);
    }
    write_sheet(summary.iter().map(SummaryCsvRow::from))
}

pub fn failures_csv(failures: &[DocumentFailure]) -> Result<Vec<u8>> {
    if failures.is_empty() {
        return header_only(&["Documento", "Erro"]);
    }
    write_sheet(failures.iter().map(|failure| FailureCsvRow {
        document: &failure.document,
        reason: &failure.reason,
    }))
}

fn header_only(columns: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Multi-sheet container: summary, detail, failures (when any) and a
/// JSON manifest with the run counters.
pub fn zip_report(result: &TransformResult) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(SUMMARY_SHEET, FileOptions::default())?;
    zip.write_all(&summary_csv(&result.summary)?)?;

    zip.start_file::<_, ()>(DETAIL_SHEET, FileOptions::default())?;
    zip.write_all(&detail_csv(&result.detail)?)?;

    if !result.failures.is_empty() {
        zip.start_file::<_, ()>(FAILURES_SHEET, FileOptions::default())?;
        zip.write_all(&failures_csv(&result.failures)?)?;
    }

    zip.start_file::<_, ()>(MANIFEST, FileOptions::default())?;
    let manifest = serde_json::to_string_pretty(&Manifest::for_result(result))?;
    zip.write_all(manifest.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::aggregate;
    use crate::domain::model::{LineItemRecord, TaxAmounts};
    use std::io::Read;

    fn result() -> TransformResult {
        let records = vec![LineItemRecord {
            invoice_number: "123".to_string(),
            destination_state: "SP".to_string(),
            taxpayer_registration: "456".to_string(),
            product_description: "Tinta, acrílica".to_string(),
            amounts: TaxAmounts {
                icms_st: 10.0,
                fcp_st: 1.0,
                ..TaxAmounts::default()
            },
        }];
        let (detail, summary) = aggregate(records);
        TransformResult {
            detail,
            summary,
            failures: vec![DocumentFailure {
                document: "ruim.xml".to_string(),
                reason: "unexpected end of document".to_string(),
            }],
            documents_parsed: 1,
        }
    }

    #[test]
    fn test_detail_csv_columns_and_quoting() {
        let csv = String::from_utf8(detail_csv(&result().detail).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "NFe,UF_Destino,IE_Substituto,Produto,vBCST,vICMSST,vBCUFDest,vICMSUFDest,vFCPUFDest,vFCPST,Total_FECP"
        );
        assert_eq!(
            lines[1],
            "123,SP,456,\"Tinta, acrílica\",0.0,10.0,0.0,0.0,0.0,1.0,1.0"
        );
    }

    #[test]
    fn test_detail_csv_keeps_source_precision() {
        let (detail, summary) = aggregate(vec![LineItemRecord {
            invoice_number: "9".to_string(),
            destination_state: "MG".to_string(),
            taxpayer_registration: "1".to_string(),
            product_description: "A".to_string(),
            amounts: TaxAmounts {
                bc_st: 100.125,
                icms_st: 12.3456,
                ..TaxAmounts::default()
            },
        }]);

        let detail = String::from_utf8(detail_csv(&detail).unwrap()).unwrap();
        assert_eq!(
            detail.lines().nth(1),
            Some("9,MG,1,A,100.125,12.3456,0.0,0.0,0.0,0.0,0.0")
        );

        let summary = String::from_utf8(summary_csv(&summary).unwrap()).unwrap();
        assert_eq!(summary.lines().nth(1), Some("MG,1,12.35,0.00,0.00"));
    }

    #[test]
    fn test_summary_csv() {
        let csv = String::from_utf8(summary_csv(&result().summary).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Estado,IE Substituto,Total ST,Total DIFAL,Total FECP");
        assert_eq!(lines[1], "SP,456,10.00,0.00,1.00");
    }

    #[test]
    fn test_empty_sheets_keep_headers() {
        let csv = String::from_utf8(detail_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("NFe,"));
    }

    #[test]
    fn test_zip_report_contains_every_sheet() {
        let bytes = zip_report(&result()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec![SUMMARY_SHEET, DETAIL_SHEET, FAILURES_SHEET, MANIFEST]);

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["documents_parsed"], 1);
        assert_eq!(manifest["documents_failed"], 1);
        assert_eq!(manifest["line_items"], 1);
    }
}
