//! Decoding of quote-service response bodies.
//!
//! The service answers either with a single record or with an array of
//! records, each `{ code, data?, error? }`. Both shapes are decoded into
//! [`WireResponse`] and normalized in one step into [`CodeResult`]s.

use serde::Deserialize;
use serde_json::Value;

use crate::{InstrumentCode, Quote, QuoteError};

/// Raw response body shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireResponse {
    /// Array of records.
    Many(Vec<WireRecord>),
    /// A single record.
    Single(WireRecord),
}

/// One record as sent by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRecord {
    /// Code the record belongs to; may be missing.
    #[serde(default)]
    pub code: Option<String>,
    /// Quote payload, absent when the service could not resolve the code.
    #[serde(default)]
    pub data: Option<WireQuoteData>,
    /// Service-side error description (string or structured).
    #[serde(default)]
    pub error: Option<Value>,
}

/// Quote payload fields. Values may arrive as strings or bare numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireQuoteData {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    price_change: Option<Value>,
    #[serde(default)]
    price_change_rate: Option<Value>,
    #[serde(default)]
    update_time: Option<Value>,
}

/// Normalized record: a code plus either quote data or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeResult {
    /// Resolved code of the record.
    pub code: InstrumentCode,
    /// Quote built from the record's data, if any.
    pub quote: Option<Quote>,
    /// Service-side error text, if any.
    pub error: Option<String>,
}

fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl WireResponse {
    /// Normalize into a uniform list.
    ///
    /// A record without a usable `code` takes the code inside `data`, and
    /// failing that the `requested` code.
    #[must_use]
    pub fn normalize(self, requested: &InstrumentCode) -> Vec<CodeResult> {
        let records = match self {
            Self::Many(v) => v,
            Self::Single(r) => vec![r],
        };
        records
            .into_iter()
            .map(|r| r.normalize(requested))
            .collect()
    }
}

impl WireRecord {
    fn normalize(self, requested: &InstrumentCode) -> CodeResult {
        let code = self
            .code
            .filter(|c| !c.is_empty())
            .or_else(|| self.data.as_ref().and_then(|d| text(d.code.as_ref())))
            .map_or_else(|| requested.clone(), InstrumentCode::from);
        let error = match self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };
        let quote = self.data.map(|d| Quote {
            code: code.clone(),
            name: text(d.name.as_ref()),
            price: text(d.price.as_ref()).unwrap_or_else(|| "0".to_string()),
            price_change: text(d.price_change.as_ref()).unwrap_or_else(|| "0".to_string()),
            price_change_rate: text(d.price_change_rate.as_ref())
                .unwrap_or_else(|| "0.00".to_string()),
            update_time: text(d.update_time.as_ref()),
        });
        CodeResult { code, quote, error }
    }
}

/// Decode a response body for `requested` into its quotes.
///
/// # Errors
/// `MalformedResponse` when the body is not one of the accepted shapes;
/// `NotFound` when it is well-formed but no record carries quote data.
pub fn decode_quotes(requested: &InstrumentCode, body: &[u8]) -> Result<Vec<Quote>, QuoteError> {
    let parsed: WireResponse =
        serde_json::from_slice(body).map_err(|e| QuoteError::malformed(e.to_string()))?;
    let results = parsed.normalize(requested);

    let mut reasons: Vec<String> = Vec::new();
    let mut quotes: Vec<Quote> = Vec::with_capacity(results.len());
    for r in results {
        match r.quote {
            Some(q) => quotes.push(q),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(code = %r.code, error = ?r.error, "skipping record without quote data");
                if let Some(e) = r.error {
                    reasons.push(e);
                }
            }
        }
    }

    if quotes.is_empty() {
        let reason = if reasons.is_empty() {
            "response carried no quote data".to_string()
        } else {
            reasons.join("; ")
        };
        return Err(QuoteError::not_found(requested.as_str(), reason));
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> InstrumentCode {
        InstrumentCode::from(s)
    }

    #[test]
    fn single_object_is_accepted() {
        let body = br#"{"code":"^DJI","data":{"name":"Dow","price":"39,000.10","price_change":"-120.5","price_change_rate":"-0.31","update_time":"16:00"}}"#;
        let quotes = decode_quotes(&code("^DJI"), body).unwrap();
        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.code.as_str(), "^DJI");
        assert_eq!(q.name.as_deref(), Some("Dow"));
        assert_eq!(q.price, "39,000.10");
        assert_eq!(q.update_time.as_deref(), Some("16:00"));
    }

    #[test]
    fn array_is_flattened() {
        let body = br#"[{"code":"A","data":{"price":"1"}},{"code":"B","data":{"price":2.5}}]"#;
        let quotes = decode_quotes(&code("A"), body).unwrap();
        let codes: Vec<&str> = quotes.iter().map(|q| q.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(quotes[1].price, "2.5");
    }

    #[test]
    fn missing_fields_use_neutral_defaults() {
        let body = br#"{"code":"X","data":{}}"#;
        let q = decode_quotes(&code("X"), body).unwrap().remove(0);
        assert_eq!(q.price, "0");
        assert_eq!(q.price_change, "0");
        assert_eq!(q.price_change_rate, "0.00");
        assert!(q.name.is_none());
    }

    #[test]
    fn record_without_code_inherits_requested_code() {
        let body = br#"{"data":{"price":"10"}}"#;
        let q = decode_quotes(&code("7203.T"), body).unwrap().remove(0);
        assert_eq!(q.code.as_str(), "7203.T");
    }

    #[test]
    fn error_only_record_is_not_found() {
        let body = br#"{"code":"NOPE","error":"unknown symbol"}"#;
        let err = decode_quotes(&code("NOPE"), body).unwrap_err();
        assert_eq!(err, QuoteError::not_found("NOPE", "unknown symbol"));
        assert!(err.is_retryable());
    }

    #[test]
    fn non_json_is_malformed() {
        let err = decode_quotes(&code("X"), b"<html>").unwrap_err();
        assert!(matches!(err, QuoteError::MalformedResponse(_)));
        let err = decode_quotes(&code("X"), b"42").unwrap_err();
        assert!(matches!(err, QuoteError::MalformedResponse(_)));
    }
}
