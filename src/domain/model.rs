use serde::{Deserialize, Serialize};

/// The six NF-e monetary fields read from a line item's `imposto` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxAmounts {
    /// `vBCST`
    pub bc_st: f64,
    /// `vICMSST`
    pub icms_st: f64,
    /// `vBCUFDest`
    pub bc_uf_dest: f64,
    /// `vICMSUFDest`
    pub icms_uf_dest: f64,
    /// `vFCPUFDest`
    pub fcp_uf_dest: f64,
    /// `vFCPST`
    pub fcp_st: f64,
}

impl TaxAmounts {
    pub fn total_fcp(&self) -> f64 {
        self.fcp_st + self.fcp_uf_dest
    }
}

/// One invoice line item (`det`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub invoice_number: String,
    pub destination_state: String,
    pub taxpayer_registration: String,
    pub product_description: String,
    pub amounts: TaxAmounts,
}

/// A line item together with its derived FCP total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub record: LineItemRecord,
    pub total_fcp: f64,
}

impl From<LineItemRecord> for DetailRow {
    fn from(record: LineItemRecord) -> Self {
        let total_fcp = record.amounts.total_fcp();
        Self { record, total_fcp }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub state: String,
    pub registration: String,
    pub icms_st: f64,
    pub icms_uf_dest: f64,
    pub total_fcp: f64,
}

impl StateSummary {
    pub fn empty(state: impl Into<String>, registration: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            registration: registration.into(),
            icms_st: 0.0,
            icms_uf_dest: 0.0,
            total_fcp: 0.0,
        }
    }

    pub fn add(&mut self, row: &DetailRow) {
        self.icms_st += row.record.amounts.icms_st;
        self.icms_uf_dest += row.record.amounts.icms_uf_dest;
        self.total_fcp += row.total_fcp;
    }

    pub fn absorb(&mut self, other: &StateSummary) {
        self.icms_st += other.icms_st;
        self.icms_uf_dest += other.icms_uf_dest;
        self.total_fcp += other.total_fcp;
    }
}

/// Sentinels substituted for information missing from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPolicy {
    pub missing_invoice_number: String,
    pub missing_state: String,
    pub missing_registration: String,
    pub missing_product: String,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            missing_invoice_number: "S/N".to_string(),
            missing_state: "N/A".to_string(),
            missing_registration: "ISENTO".to_string(),
            missing_product: "Produto s/ Nome".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub document: String,
    pub reason: String,
}

/// Output of the extract step: every record from the documents that parsed,
/// plus one failure per document that did not.
#[derive(Debug, Clone, Default)]
pub struct ExtractionBatch {
    pub records: Vec<LineItemRecord>,
    pub failures: Vec<DocumentFailure>,
    pub documents_parsed: usize,
}

impl ExtractionBatch {
    pub fn documents_seen(&self) -> usize {
        self.documents_parsed + self.failures.len()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub detail: Vec<DetailRow>,
    pub summary: Vec<StateSummary>,
    pub failures: Vec<DocumentFailure>,
    pub documents_parsed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    #[default]
    Zip,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Zip => "zip",
        }
    }
}

/// What a finished run hands back to the caller for presentation.
#[derive(Debug, Clone)]
pub struct EtlReport {
    pub outputs: Vec<String>,
    pub summary: Vec<StateSummary>,
    pub failures: Vec<DocumentFailure>,
    pub documents_parsed: usize,
    pub line_items: usize,
}
