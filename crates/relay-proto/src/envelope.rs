//! Envelope type and per-transport tuple codecs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::{DecodeError, Result};

/// Correlation id matching a reply to the pending call that produced it.
///
/// Assigned by the sending side of a transport that has no host-provided
/// request/response primitive (page and legacy event wires). Opaque to the
/// receiving side, which echoes it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Wrap a raw correlation value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw correlation value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A decoded cross-context remote call.
///
/// The name is kept raw (not pre-split) because direct listeners match on
/// the literal name, which need not contain the namespace separator.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Present on wires that correlate replies themselves; absent where the
    /// host runtime owns correlation.
    pub correlation: Option<CorrelationId>,
    /// The raw message name, usually `Namespace#Action`.
    pub name: String,
    /// Ordered argument payload.
    pub args: Vec<Value>,
}

impl Envelope {
    /// Build an envelope from a name and argument sequence.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self { correlation: None, name: name.into(), args }
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationId) -> Self {
        self.correlation = Some(correlation);
        self
    }
}

/// Coerce an argument payload to an ordered sequence.
///
/// Hosts sometimes deliver a single bare value where a sequence is
/// expected; handlers always see a sequence.
fn coerce_args(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn as_tuple(value: &Value, expected: usize) -> Result<&[Value]> {
    let items = value.as_array().ok_or(DecodeError::NotAnArray)?;
    if items.len() != expected {
        return Err(DecodeError::WrongArity { expected, got: items.len() });
    }
    Ok(items)
}

fn decode_name(value: &Value) -> Result<String> {
    value.as_str().map(str::to_owned).ok_or(DecodeError::BadName)
}

fn decode_correlation(value: &Value) -> Result<Option<CorrelationId>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(CorrelationId::new).map(Some).ok_or(DecodeError::BadCorrelation),
        _ => Err(DecodeError::BadCorrelation),
    }
}

fn correlation_value(correlation: Option<CorrelationId>) -> Value {
    match correlation {
        Some(id) => json!(id),
        None => Value::Null,
    }
}

/// Encode a page-transport message: `[correlationId, name, args]`.
pub fn encode_page(correlation: Option<CorrelationId>, name: &str, args: &[Value]) -> Value {
    json!([correlation_value(correlation), name, args])
}

/// Encode a page-transport message to its text form.
///
/// Used when the frame boundary is not known to preserve structured values.
pub fn encode_page_text(correlation: Option<CorrelationId>, name: &str, args: &[Value]) -> String {
    encode_page(correlation, name, args).to_string()
}

/// Decode a page-transport message.
pub fn decode_page(value: &Value) -> Result<Envelope> {
    let items = as_tuple(value, 3)?;
    Ok(Envelope {
        correlation: decode_correlation(&items[0])?,
        name: decode_name(&items[1])?,
        args: coerce_args(items[2].clone()),
    })
}

/// Decode a page-transport message from its text form.
pub fn decode_page_text(text: &str) -> Result<Envelope> {
    decode_page(&serde_json::from_str(text)?)
}

/// Encode a native-runtime message: `[name, args]`.
///
/// No correlation id; the host runtime's request/response primitive pairs
/// the reply with the call.
pub fn encode_runtime(name: &str, args: &[Value]) -> Value {
    json!([name, args])
}

/// Decode a native-runtime message.
pub fn decode_runtime(value: &Value) -> Result<Envelope> {
    let items = as_tuple(value, 2)?;
    Ok(Envelope {
        correlation: None,
        name: decode_name(&items[0])?,
        args: coerce_args(items[1].clone()),
    })
}

/// Encode a legacy event payload: `[correlationId, args]`.
///
/// The message name travels as the event name, not in the payload.
pub fn encode_event_payload(correlation: CorrelationId, args: &[Value]) -> Value {
    json!([correlation, args])
}

/// Decode a legacy event payload.
pub fn decode_event_payload(value: &Value) -> Result<(CorrelationId, Vec<Value>)> {
    let items = as_tuple(value, 2)?;
    let correlation = decode_correlation(&items[0])?.ok_or(DecodeError::BadCorrelation)?;
    Ok((correlation, coerce_args(items[1].clone())))
}

/// Encode a legacy response payload: `[correlationId, data]`.
pub fn encode_event_response(correlation: CorrelationId, data: Value) -> Value {
    json!([correlation, data])
}

/// Decode a legacy response payload.
pub fn decode_event_response(value: &Value) -> Result<(CorrelationId, Value)> {
    let items = as_tuple(value, 2)?;
    let correlation = decode_correlation(&items[0])?.ok_or(DecodeError::BadCorrelation)?;
    Ok((correlation, items[1].clone()))
}
