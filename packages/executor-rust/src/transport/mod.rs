//! Transports: the pluggable mechanism that delivers an operation to the
//! operation module and brings back its result handle.
//!
//! - [`in_process`]: dispatches on the caller's thread through a `HandlerRouter`
//! - [`process`]: talks to a child process over length-delimited `MsgPack` frames

pub mod in_process;
pub mod process;

use opbridge_core::{ArgumentBag, CodecError, DispatchError, ExecutionContext, ResultHandle};

pub use in_process::InProcessTransport;
pub use process::ProcessTransport;

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Delivers operations to an operation module.
///
/// Every method blocks until the module has answered. Implementations may
/// use threads or child processes internally. The executor calls `attach`
/// once before the first `invoke`, and `release` exactly once at the end.
pub trait Transport {
    /// Hand the execution context to the operation module.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the module cannot be reached.
    fn attach(&mut self, _context: &ExecutionContext) -> Result<(), TransportError> {
        Ok(())
    }

    /// Run `operation` with `args` inside the operation module.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the module cannot be reached or does not
    /// answer. Failures of the operation itself come back inside the handle.
    fn invoke(
        &mut self,
        operation: &str,
        args: &ArgumentBag,
    ) -> Result<ResultHandle, TransportError>;

    /// Release the module handle.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if teardown fails.
    fn release(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn attach(&mut self, context: &ExecutionContext) -> Result<(), TransportError> {
        (**self).attach(context)
    }

    fn invoke(
        &mut self,
        operation: &str,
        args: &ArgumentBag,
    ) -> Result<ResultHandle, TransportError> {
        (**self).invoke(operation, args)
    }

    fn release(&mut self) -> Result<(), TransportError> {
        (**self).release()
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failures reaching or talking to the operation module.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to start operation module `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("operation module closed the connection")]
    Closed,
    #[error("unexpected `{received}` frame while waiting for `{expected}`")]
    UnexpectedFrame {
        expected: &'static str,
        received: &'static str,
    },
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
    #[error("operation module used before the execution context was attached")]
    NotAttached,
    #[error("operation module has already been released")]
    Released,
}

impl From<DispatchError> for TransportError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownOperation { name } => TransportError::UnknownOperation { name },
        }
    }
}
