//! Result handles and the tagged outcome they are unwrapped into.
//!
//! A [`ResultHandle`] is the loose, per-call record the operation module
//! fills in. [`ResultHandle::into_outcome`] is the only way to read it and
//! rejects handles that break the success/failure exclusivity rule.

use serde::{Deserialize, Deserializer, Serialize};

use crate::value::Value;

/// Failure reported by the operation module, carried verbatim.
///
/// `kind` identifies the remote failure category (e.g. the remote exception
/// type name) so callers can branch on it without parsing `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: String,
    pub message: String,
    pub trace: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        trace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: trace.into(),
        }
    }
}

/// Ways a result handle can break its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("result handle carries both a result and an error kind")]
    BothResultAndError,
    #[error("result handle carries neither a result nor an error kind")]
    Empty,
    #[error("result handle carries error details without an error kind")]
    DetailsWithoutKind,
    #[error("result handle carries an error kind without message and trace")]
    KindWithoutDetails,
}

/// Outcome of a single remote invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The operation ran. Operations that return nothing report `Value::Null`.
    Success(Value),
    /// The operation ran and failed.
    Failure(RemoteError),
}

/// Per-call result record produced by the operation module.
///
/// `result: Some(Value::Null)` (a present null) is a successful void
/// operation; `result: None` means the field was never set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultHandle {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_trace: Option<String>,
}

/// Deserializes a field whose presence matters even when its value is null.
///
/// Without this, serde collapses a present `null` into `None`, losing the
/// distinction between "successful void result" and "result never set".
#[allow(clippy::unnecessary_wraps)]
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Value::deserialize(deserializer)?))
}

impl ResultHandle {
    /// A handle reporting success with `value`.
    #[must_use]
    pub fn success(value: Value) -> Self {
        Self {
            result: Some(value),
            ..Self::default()
        }
    }

    /// A handle reporting `error`.
    #[must_use]
    pub fn failure(error: RemoteError) -> Self {
        Self {
            result: None,
            error_kind: Some(error.kind),
            error_message: Some(error.message),
            error_trace: Some(error.trace),
        }
    }

    /// Unwraps the handle into an [`Outcome`].
    ///
    /// # Errors
    ///
    /// Returns a [`ContractViolation`] if the handle does not hold exactly one
    /// of a result or an error kind, or if error details and error kind are
    /// not present together.
    pub fn into_outcome(self) -> Result<Outcome, ContractViolation> {
        match (self.result, self.error_kind, self.error_message, self.error_trace) {
            (Some(_), Some(_), _, _) => Err(ContractViolation::BothResultAndError),
            (Some(_), None, Some(_), _) | (Some(_), None, _, Some(_)) => {
                Err(ContractViolation::DetailsWithoutKind)
            }
            (Some(value), None, None, None) => Ok(Outcome::Success(value)),
            (None, Some(kind), Some(message), Some(trace)) => {
                Ok(Outcome::Failure(RemoteError { kind, message, trace }))
            }
            (None, Some(_), _, _) => Err(ContractViolation::KindWithoutDetails),
            (None, None, None, None) => Err(ContractViolation::Empty),
            (None, None, _, _) => Err(ContractViolation::DetailsWithoutKind),
        }
    }
}

impl From<Outcome> for ResultHandle {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(value) => ResultHandle::success(value),
            Outcome::Failure(error) => ResultHandle::failure(error),
        }
    }
}
