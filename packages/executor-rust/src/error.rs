use opbridge_core::{ContractViolation, RemoteError};

use crate::transport::TransportError;

/// Errors returned by [`OperationExecutor`](crate::OperationExecutor) methods.
///
/// Each call fails with at most one of these; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The operation ran inside the operation module and failed. Kind,
    /// message and trace are exactly what the module reported.
    #[error("operation failed: {0}")]
    Remote(#[from] RemoteError),
    /// The operation module could not be reached. Propagated as produced by
    /// the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transport produced a result handle that breaks its contract.
    #[error("{operation}: {violation}")]
    ContractViolation {
        operation: &'static str,
        violation: ContractViolation,
    },
    /// The success payload does not have the operation's declared shape.
    #[error("{operation} returned {found}, expected {expected}")]
    ResultShape {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

impl ExecutorError {
    /// The remote failure, if this error wraps one.
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ExecutorError::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// The remote failure kind, if this error wraps one.
    #[must_use]
    pub fn remote_kind(&self) -> Option<&str> {
        self.remote().map(|err| err.kind.as_str())
    }
}
