use crate::error::AnalysisResult;
use crate::types::{BillingRecord, CostRecord, Row, Schema};
use crate::util::coerce_f64;
use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;
use std::path::Path;
use tracing::{debug, warn};

const BOM: char = '\u{feff}';

// Bytes windows-1252 leaves unassigned.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8d, 0x8f, 0x90, 0x9d];

/// Rows of a CSV document plus its header line.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedCsv {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header names, lower-cased, in file order.
    pub fn lowercase_headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_lowercase()).collect()
    }

    /// Billing schema needs both `revenue` and `cost`; anything else is
    /// treated as a cost-only export.
    pub fn schema(&self) -> Schema {
        let lower = self.lowercase_headers();
        let has = |name: &str| lower.iter().any(|h| h == name);
        if has("revenue") && has("cost") {
            Schema::Billing
        } else {
            Schema::CostOnly
        }
    }

    pub fn billing_records(&self) -> Vec<BillingRecord> {
        self.rows.iter().map(billing_record).collect()
    }

    pub fn cost_records(&self) -> Vec<CostRecord> {
        self.rows.iter().map(cost_record).collect()
    }
}

/// Split CSV text into header-keyed rows. No value typing happens here.
///
/// Short rows simply lack the trailing keys; extra cells past the header
/// width are ignored. An input with a header line but no data yields an
/// empty `rows` vector, which callers treat as "no data".
pub fn parse_rows(text: &str) -> AnalysisResult<ParsedCsv> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    debug!(rows = rows.len(), columns = headers.len(), "parsed csv");
    Ok(ParsedCsv { headers, rows })
}

/// Look up a cell by column name. Exact match wins, otherwise the first
/// header that matches ignoring ASCII case.
pub fn get_field<'a>(row: &'a Row, name: &str) -> Option<&'a str> {
    if let Some(v) = row.get(name) {
        return Some(v.as_str());
    }
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn first_non_blank<'a>(row: &'a Row, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|n| get_field(row, n))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

pub fn billing_record(row: &Row) -> BillingRecord {
    let client = first_non_blank(row, &["client", "name"])
        .unwrap_or("Unknown")
        .to_string();
    BillingRecord {
        client,
        revenue: coerce_f64(get_field(row, "revenue")),
        cost: coerce_f64(get_field(row, "cost")),
        licenses_used: coerce_f64(get_field(row, "licenses_used")),
        licenses_purchased: coerce_f64(get_field(row, "licenses_purchased")),
    }
}

pub fn cost_record(row: &Row) -> CostRecord {
    let label = first_non_blank(row, &["Service", "UsageType"])
        .unwrap_or("Unknown")
        .to_string();
    CostRecord {
        label,
        cost: coerce_f64(get_field(row, "Cost")),
    }
}

/// Turn uploaded bytes into text.
///
/// Tried in order: UTF-8 (a leading BOM is dropped and reported as
/// `utf-8-sig`), windows-1252 (`cp1252`), then Latin-1 for input that
/// contains bytes cp1252 does not assign. Line endings are normalised
/// to `\n`.
pub fn decode_csv_bytes(bytes: &[u8]) -> (String, &'static str) {
    let (text, encoding) = match std::str::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix(BOM) {
            Some(rest) => (rest.to_string(), "utf-8-sig"),
            None => (s.to_string(), "utf-8"),
        },
        Err(e) if !bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) => {
            warn!(error = %e, "input is not valid UTF-8, decoding as cp1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), "cp1252")
        }
        Err(e) => {
            warn!(error = %e, "input is neither UTF-8 nor cp1252, decoding as latin-1");
            (bytes.iter().map(|&b| b as char).collect(), "latin-1")
        }
    };
    (text.replace("\r\n", "\n").replace('\r', "\n"), encoding)
}

/// Read a CSV file from disk and decode it.
pub fn read_csv_file(path: impl AsRef<Path>) -> AnalysisResult<(String, &'static str)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let (text, encoding) = decode_csv_bytes(&bytes);
    debug!(path = %path.display(), encoding, bytes = bytes.len(), "read csv file");
    Ok((text, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_keyed_by_header() {
        let parsed = parse_rows("client,revenue,cost\nA,100,80\nB,50,\n").unwrap();
        assert_eq!(parsed.headers, vec!["client", "revenue", "cost"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0]["client"], "A");
        assert_eq!(parsed.rows[1]["cost"], "");
    }

    #[test]
    fn short_rows_lack_trailing_keys() {
        let parsed = parse_rows("client,revenue,cost\nA,100\n").unwrap();
        assert!(!parsed.rows[0].contains_key("cost"));
    }

    #[test]
    fn header_only_input_has_no_rows() {
        let parsed = parse_rows("client,revenue,cost\n").unwrap();
        assert!(parsed.is_empty());
        assert!(parse_rows("").unwrap().is_empty());
    }

    #[test]
    fn schema_detection_is_case_insensitive() {
        let billing = parse_rows("Client,Revenue,COST\nA,1,1\n").unwrap();
        assert_eq!(billing.schema(), Schema::Billing);
        let cost_only = parse_rows("Cost,Service\n10,EC2\n").unwrap();
        assert_eq!(cost_only.schema(), Schema::CostOnly);
        let revenue_only = parse_rows("client,revenue\nA,1\n").unwrap();
        assert_eq!(revenue_only.schema(), Schema::CostOnly);
    }

    #[test]
    fn billing_record_resolves_aliases() {
        let parsed = parse_rows("name,Revenue,cost\n  Acme ,\"1,000\",x\n").unwrap();
        let rec = billing_record(&parsed.rows[0]);
        assert_eq!(rec.client, "Acme");
        assert_eq!(rec.revenue, 1000.0);
        assert_eq!(rec.cost, 0.0);
        assert_eq!(rec.licenses_purchased, 0.0);
    }

    #[test]
    fn blank_client_falls_back_to_unknown() {
        let parsed = parse_rows("client,revenue,cost\n ,1,1\n").unwrap();
        assert_eq!(billing_record(&parsed.rows[0]).client, "Unknown");
    }

    #[test]
    fn cost_record_prefers_service_then_usage_type() {
        let parsed = parse_rows("Cost,Service,UsageType\n5,,BoxUsage\n7,,\n").unwrap();
        let recs = parsed.cost_records();
        assert_eq!(recs[0].label, "BoxUsage");
        assert_eq!(recs[1].label, "Unknown");
        assert_eq!(recs[1].cost, 7.0);
    }

    #[test]
    fn decode_strips_bom() {
        let (text, enc) = decode_csv_bytes(b"\xef\xbb\xbfclient\r\nA\r\n");
        assert_eq!(enc, "utf-8-sig");
        assert_eq!(text, "client\nA\n");

        let (text, enc) = decode_csv_bytes("client\nCaf\u{e9}\n".as_bytes());
        assert_eq!(enc, "utf-8");
        assert_eq!(text, "client\nCaf\u{e9}\n");
    }

    #[test]
    fn decode_falls_back_to_cp1252() {
        let (text, enc) = decode_csv_bytes(b"client\nO\x92Brien \x80Corp\n");
        assert_eq!(enc, "cp1252");
        assert_eq!(text, "client\nO\u{2019}Brien \u{20ac}Corp\n");

        let (text, enc) = decode_csv_bytes(b"client\r\nCaf\xe9\r\n");
        assert_eq!(enc, "cp1252");
        assert_eq!(text, "client\nCaf\u{e9}\n");
    }

    #[test]
    fn decode_uses_latin1_for_bytes_cp1252_leaves_undefined() {
        let (text, enc) = decode_csv_bytes(b"client\nA\x81\x92\n");
        assert_eq!(enc, "latin-1");
        assert_eq!(text, "client\nA\u{81}\u{92}\n");
    }
}
