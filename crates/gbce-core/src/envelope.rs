use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{ErrorKind, ExchangeError, UtcDateTime};

/// Schema version stamped on every envelope.
pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Per-request identifier, used for tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Standard response envelope for every GBCE response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn success(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            meta,
            data,
            errors: Vec::new(),
        }
    }
}

impl Envelope<Value> {
    /// A failed response: no data and one or more errors.
    pub fn failure(meta: EnvelopeMeta, errors: Vec<EnvelopeError>) -> Self {
        Self {
            meta,
            data: Value::Null,
            errors,
        }
    }
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub transaction_id: TransactionId,
    pub schema_version: String,
    pub generated_at: UtcDateTime,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(transaction_id: TransactionId, latency_ms: u64) -> Self {
        Self {
            transaction_id,
            schema_version: SCHEMA_VERSION.to_owned(),
            generated_at: UtcDateTime::now(),
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&ExchangeError> for EnvelopeError {
    fn from(error: &ExchangeError) -> Self {
        Self::new(error.kind().code(), error.to_string())
    }
}

/// Operation results that can be placed in an envelope.
///
/// `warnings` lets a result flag values that are technically valid but
/// worth a caller's attention, such as an undefined P/E ratio.
pub trait Payload: Serialize {
    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The outcome of one handled exchange operation.
#[derive(Debug)]
pub struct Handled<T> {
    pub transaction_id: TransactionId,
    pub latency_ms: u64,
    pub outcome: Result<T, ExchangeError>,
}

impl<T> Handled<T> {
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(ExchangeError::kind)
    }
}

impl<T: Payload> Handled<T> {
    /// Render as a JSON envelope. Failures carry `data: null` and one error.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized.
    pub fn into_envelope(self) -> Result<Envelope<Value>, serde_json::Error> {
        let mut meta = EnvelopeMeta::new(self.transaction_id, self.latency_ms);

        match self.outcome {
            Ok(payload) => {
                for warning in payload.warnings() {
                    meta.push_warning(warning);
                }
                Ok(Envelope::success(meta, serde_json::to_value(&payload)?))
            }
            Err(error) => Ok(Envelope::failure(meta, vec![EnvelopeError::from(&error)])),
        }
    }
}
