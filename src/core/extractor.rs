//! Line-item extraction from a single NF-e document.
//!
//! Optional blocks (`ide`, `dest`, `imposto`, `ICMSUFDest`) are read into
//! explicit `Option` views first; [`ExtractionPolicy`] supplies the sentinel
//! for anything that is missing. Only an unparsable document is an error.

use crate::core::xml::{self, Element};
use crate::domain::model::{ExtractionPolicy, LineItemRecord, TaxAmounts};
use crate::utils::error::{EtlError, Result};

/// Locale-tolerant decimal coercion: `,` and `.` are both accepted as the
/// decimal separator. Anything missing, non-numeric or non-finite is `0.0`.
pub fn parse_decimal(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// `ide` block.
#[derive(Debug, Default)]
struct Identification<'a> {
    number: Option<&'a str>,
}

impl<'a> Identification<'a> {
    fn from_block(ide: &'a Element) -> Self {
        Self {
            number: ide.child_text("nNF"),
        }
    }
}

/// `dest` block.
#[derive(Debug, Default)]
struct Destination<'a> {
    state: Option<&'a str>,
    registration: Option<&'a str>,
}

impl<'a> Destination<'a> {
    fn from_block(dest: &'a Element) -> Self {
        // UF 通常在 enderDest 內，部分發行端直接放在 dest 下
        let state = dest.descendant_text("UF");
        let registration = dest.child_text("ISUF").or_else(|| dest.child_text("IE"));
        Self {
            state,
            registration,
        }
    }
}

/// Values shared by every line item of one invoice.
struct InvoiceContext {
    invoice_number: String,
    destination_state: String,
    taxpayer_registration: String,
}

impl InvoiceContext {
    fn resolve(
        identification: Option<Identification<'_>>,
        destination: Option<Destination<'_>>,
        policy: &ExtractionPolicy,
    ) -> Self {
        let identification = identification.unwrap_or_default();
        let destination = destination.unwrap_or_default();

        Self {
            invoice_number: identification
                .number
                .unwrap_or(policy.missing_invoice_number.as_str())
                .to_string(),
            destination_state: destination
                .state
                .unwrap_or(policy.missing_state.as_str())
                .to_string(),
            taxpayer_registration: destination
                .registration
                .unwrap_or(policy.missing_registration.as_str())
                .to_string(),
        }
    }
}

fn extract_amounts(imposto: Option<&Element>) -> TaxAmounts {
    let Some(imposto) = imposto else {
        return TaxAmounts::default();
    };

    // ST 欄位可能出現在任一 ICMSxx 群組，取第一個
    let mut amounts = TaxAmounts {
        bc_st: parse_decimal(imposto.descendant_text("vBCST")),
        icms_st: parse_decimal(imposto.descendant_text("vICMSST")),
        fcp_st: parse_decimal(imposto.descendant_text("vFCPST")),
        ..TaxAmounts::default()
    };

    if let Some(difal) = imposto.descendant("ICMSUFDest") {
        amounts.bc_uf_dest = parse_decimal(difal.child_text("vBCUFDest"));
        amounts.icms_uf_dest = parse_decimal(difal.child_text("vICMSUFDest"));
        amounts.fcp_uf_dest = parse_decimal(difal.child_text("vFCPUFDest"));
    }

    amounts
}

/// Extract one record per `det` element of an already parsed document.
pub fn extract_records(root: &Element, policy: &ExtractionPolicy) -> Vec<LineItemRecord> {
    let context = InvoiceContext::resolve(
        root.descendant("ide").map(Identification::from_block),
        root.descendant("dest").map(Destination::from_block),
        policy,
    );

    root.descendants("det")
        .map(|det| {
            let product_description = det
                .child("prod")
                .and_then(|prod| prod.child_text("xProd"))
                .unwrap_or(policy.missing_product.as_str())
                .to_string();

            LineItemRecord {
                invoice_number: context.invoice_number.clone(),
                destination_state: context.destination_state.clone(),
                taxpayer_registration: context.taxpayer_registration.clone(),
                product_description,
                amounts: extract_amounts(det.child("imposto")),
            }
        })
        .collect()
}

/// Parse the raw bytes of one document and extract its line items.
///
/// `document` only labels the error; a failure here concerns this document
/// alone and callers are expected to carry on with the rest of the batch.
pub fn parse_nfe(document: &str, data: &[u8], policy: &ExtractionPolicy) -> Result<Vec<LineItemRecord>> {
    let text = std::str::from_utf8(data).map_err(|e| EtlError::parse(document, e))?;
    let root = xml::parse_document(text.trim()).map_err(|e| EtlError::parse(document, e))?;

    let records = extract_records(&root, policy);
    tracing::debug!(
        "Extracted {} line item(s) from {} (root <{}>)",
        records.len(),
        document,
        root.name
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35000000000000000000550010000001231000001230" versao="4.00">
      <ide><cUF>35</cUF><nNF>123</nNF></ide>
      <dest>
        <xNome>Cliente</xNome>
        <enderDest><xMun>Campinas</xMun><UF>SP</UF></enderDest>
        <IE>456</IE>
      </dest>
      <det nItem="1">
        <prod><xProd>Item ST</xProd></prod>
        <imposto>
          <ICMS><ICMS10><vBCST>100.00</vBCST><vICMSST>10.00</vICMSST><vFCPST>1.00</vFCPST></ICMS10></ICMS>
        </imposto>
      </det>
      <det nItem="2">
        <prod><xProd>Item DIFAL</xProd></prod>
        <imposto>
          <ICMSUFDest><vBCUFDest>200.00</vBCUFDest><vFCPUFDest>2.00</vFCPUFDest><vICMSUFDest>20.00</vICMSUFDest></ICMSUFDest>
        </imposto>
      </det>
    </infNFe>
  </NFe>
</nfeProc>"#;

    fn extract(xml: &str) -> Vec<LineItemRecord> {
        parse_nfe("test.xml", xml.as_bytes(), &ExtractionPolicy::default()).unwrap()
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(Some("10.50")), 10.5);
        assert_eq!(parse_decimal(Some("10,50")), 10.5);
        assert_eq!(parse_decimal(Some(" 3,0 ")), 3.0);
        assert_eq!(parse_decimal(Some("abc")), 0.0);
        assert_eq!(parse_decimal(Some("")), 0.0);
        assert_eq!(parse_decimal(Some("1.234,56")), 0.0);
        assert_eq!(parse_decimal(Some("inf")), 0.0);
        assert_eq!(parse_decimal(None), 0.0);
    }

    #[test]
    fn test_comma_and_dot_separators_agree() {
        for text in ["0,01", "12,34", "999999,99", "7,5"] {
            let dotted = text.replace(',', ".");
            assert_eq!(parse_decimal(Some(text)), dotted.parse::<f64>().unwrap());
        }
    }

    #[test]
    fn test_scenario_document() {
        let records = extract(SCENARIO);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.invoice_number, "123");
        assert_eq!(first.destination_state, "SP");
        assert_eq!(first.taxpayer_registration, "456");
        assert_eq!(first.product_description, "Item ST");
        assert_eq!(first.amounts.bc_st, 100.0);
        assert_eq!(first.amounts.icms_st, 10.0);
        assert_eq!(first.amounts.fcp_st, 1.0);
        assert_eq!(first.amounts.icms_uf_dest, 0.0);

        let second = &records[1];
        assert_eq!(second.product_description, "Item DIFAL");
        assert_eq!(second.amounts.bc_uf_dest, 200.0);
        assert_eq!(second.amounts.icms_uf_dest, 20.0);
        assert_eq!(second.amounts.fcp_uf_dest, 2.0);
        assert_eq!(second.amounts.icms_st, 0.0);
    }

    #[test]
    fn test_line_items_keep_source_order() {
        let items: String = (1..=7)
            .map(|i| format!("<det><prod><xProd>P{}</xProd></prod></det>", i))
            .collect();
        let xml = format!("<NFe><infNFe>{}</infNFe></NFe>", items);

        let names: Vec<String> = extract(&xml)
            .into_iter()
            .map(|r| r.product_description)
            .collect();
        assert_eq!(names, vec!["P1", "P2", "P3", "P4", "P5", "P6", "P7"]);
    }

    #[test]
    fn test_missing_context_blocks_use_sentinels() {
        let xml = "<NFe><infNFe><det><imposto/></det></infNFe></NFe>";
        let records = extract(xml);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].invoice_number, "S/N");
        assert_eq!(records[0].destination_state, "N/A");
        assert_eq!(records[0].taxpayer_registration, "ISENTO");
        assert_eq!(records[0].product_description, "Produto s/ Nome");
        assert_eq!(records[0].amounts, TaxAmounts::default());
    }

    #[test]
    fn test_substitute_registration_wins() {
        let xml = "<NFe><dest><UF>AM</UF><IE>111</IE><ISUF>222</ISUF></dest><det/></NFe>";
        let records = extract(xml);
        assert_eq!(records[0].destination_state, "AM");
        assert_eq!(records[0].taxpayer_registration, "222");
    }

    #[test]
    fn test_blank_registrations_fall_back_to_sentinel() {
        let xml = "<NFe><dest><UF>MG</UF><IE></IE><ISUF> </ISUF></dest><det/></NFe>";
        let records = extract(xml);
        assert_eq!(records[0].taxpayer_registration, "ISENTO");
    }

    #[test]
    fn test_custom_policy_sentinels() {
        let policy = ExtractionPolicy {
            missing_registration: "Isento/Nulo".to_string(),
            ..ExtractionPolicy::default()
        };
        let records = parse_nfe("p.xml", b"<NFe><det/></NFe>", &policy).unwrap();
        assert_eq!(records[0].taxpayer_registration, "Isento/Nulo");
    }

    #[test]
    fn test_unparsable_amounts_become_zero() {
        let xml = "<NFe><det><imposto><ICMS><ICMS10><vICMSST>n/a</vICMSST><vFCPST>2,5</vFCPST></ICMS10></ICMS></imposto></det></NFe>";
        let records = extract(xml);
        assert_eq!(records[0].amounts.icms_st, 0.0);
        assert_eq!(records[0].amounts.fcp_st, 2.5);
    }

    #[test]
    fn test_document_without_items_is_empty() {
        let records = extract("<NFe><infNFe><ide><nNF>9</nNF></ide></infNFe></NFe>");
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_document_names_the_file() {
        let err = parse_nfe("quebrada.xml", b"<NFe><det></NFe>", &ExtractionPolicy::default())
            .unwrap_err();
        match err {
            EtlError::DocumentParseError { document, .. } => assert_eq!(document, "quebrada.xml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ill_formed_markup_fails_the_document() {
        let policy = ExtractionPolicy::default();
        for xml in [
            "<NFe><det nItem=1><imposto><vICMSST>1</vICMSST></imposto></det></NFe>",
            r#"<NFe><det a="1" a="2"/></NFe>"#,
            "<nfe:NFe><nfe:det/></nfe:NFe>",
            "<NFe><1det/></NFe>",
        ] {
            let err = parse_nfe("x.xml", xml.as_bytes(), &policy).unwrap_err();
            assert!(
                matches!(err, EtlError::DocumentParseError { .. }),
                "accepted: {xml}"
            );
        }
    }

    #[test]
    fn test_latin1_bytes_are_rejected() {
        // "Peça" encoded as ISO-8859-1
        let mut data = br#"<?xml version="1.0" encoding="ISO-8859-1"?><NFe><det><prod><xProd>Pe"#.to_vec();
        data.push(0xE7);
        data.extend_from_slice(b"a</xProd></prod></det></NFe>");

        let err = parse_nfe("latin1.xml", &data, &ExtractionPolicy::default()).unwrap_err();
        assert!(matches!(err, EtlError::DocumentParseError { .. }));
    }
}
