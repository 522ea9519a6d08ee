use crate::domain::model::{DocumentFailure, EtlReport, StateSummary};
use crate::utils::error::{ErrorSeverity, EtlError};

fn brl(value: f64) -> String {
    format!("R$ {:.2}", value)
}

/// Summary table as plain text, one row per (state, registration).
pub fn render_summary(summary: &[StateSummary]) -> String {
    let registration_width = summary
        .iter()
        .map(|row| row.registration.chars().count())
        .chain(std::iter::once("IE Substituto".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<6} {:<rw$} {:>16} {:>16} {:>16}\n",
        "Estado",
        "IE Substituto",
        "Total ST",
        "Total DIFAL",
        "Total FECP",
        rw = registration_width
    );
    for row in summary {
        out.push_str(&format!(
            "{:<6} {:<rw$} {:>16} {:>16} {:>16}\n",
            row.state,
            row.registration,
            brl(row.icms_st),
            brl(row.icms_uf_dest),
            brl(row.total_fcp),
            rw = registration_width
        ));
    }
    out
}

/// One line per document that could not be read.
pub fn render_failures(failures: &[DocumentFailure]) -> String {
    let mut out = format!("⚠️ {} document(s) could not be read:\n", failures.len());
    for failure in failures {
        out.push_str(&format!("  Erro no XML {}: {}\n", failure.document, failure.reason));
    }
    out
}

pub fn print_report(report: &EtlReport) {
    println!("✅ Processed {} document(s), {} line item(s)", report.documents_parsed, report.line_items);
    println!();
    println!("📊 Resumo por Estado (UF) e IE");
    print!("{}", render_summary(&report.summary));

    if !report.failures.is_empty() {
        println!();
        print!("{}", render_failures(&report.failures));
    }

    println!();
    for output in &report.outputs {
        println!("📁 Output saved to: {}", output);
    }
}

/// Log and print a failed run; returns the process exit code to use.
pub fn report_error(e: &EtlError) -> i32 {
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    if let EtlError::NoValidData { failures, .. } = e {
        if !failures.is_empty() {
            eprint!("{}", render_failures(failures));
        }
    }
    eprintln!("💡 {}", e.recovery_suggestion());

    exit_code(e.severity())
}

pub fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summary_formats_currency() {
        let summary = vec![StateSummary {
            state: "SP".to_string(),
            registration: "456".to_string(),
            icms_st: 10.0,
            icms_uf_dest: 20.0,
            total_fcp: 3.0,
        }];

        let table = render_summary(&summary);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Estado"));
        assert!(lines[1].starts_with("SP"));
        assert!(lines[1].contains("R$ 10.00"));
        assert!(lines[1].contains("R$ 20.00"));
        assert!(lines[1].trim_end().ends_with("R$ 3.00"));
    }

    #[test]
    fn test_render_failures_names_each_document() {
        let failures = vec![
            DocumentFailure {
                document: "a.xml".to_string(),
                reason: "unexpected end of document".to_string(),
            },
            DocumentFailure {
                document: "b.xml".to_string(),
                reason: "invalid name '1det'".to_string(),
            },
        ];

        let text = render_failures(&failures);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("2 document(s)"));
        assert_eq!(lines[1], "  Erro no XML a.xml: unexpected end of document");
        assert_eq!(lines[2], "  Erro no XML b.xml: invalid name '1det'");
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(exit_code(ErrorSeverity::Low), 0);
        assert_eq!(exit_code(ErrorSeverity::Medium), 2);
        assert_eq!(exit_code(ErrorSeverity::High), 1);
        assert_eq!(exit_code(ErrorSeverity::Critical), 3);
    }
}
