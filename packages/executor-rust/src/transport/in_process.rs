//! Same-thread transport for operation modules linked into the host.

use opbridge_core::{ArgumentBag, ExecutionContext, HandlerRouter, ResultHandle};
use tracing::debug;

use super::{Transport, TransportError};

/// Runs operations synchronously on the caller's thread.
///
/// The operation module is represented by a [`HandlerRouter`]; the
/// execution context received in `attach` is passed to every handler.
pub struct InProcessTransport {
    router: HandlerRouter,
    context: Option<ExecutionContext>,
    released: bool,
}

impl InProcessTransport {
    #[must_use]
    pub fn new(router: HandlerRouter) -> Self {
        Self {
            router,
            context: None,
            released: false,
        }
    }

    /// The context handed over by the executor, once attached.
    #[must_use]
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }
}

impl Transport for InProcessTransport {
    fn attach(&mut self, context: &ExecutionContext) -> Result<(), TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        self.context = Some(context.clone());
        Ok(())
    }

    fn invoke(
        &mut self,
        operation: &str,
        args: &ArgumentBag,
    ) -> Result<ResultHandle, TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        let ctx = self.context.as_ref().ok_or(TransportError::NotAttached)?;
        debug!(operation, "dispatching in-process");
        Ok(self.router.dispatch(ctx, operation, args)?)
    }

    fn release(&mut self) -> Result<(), TransportError> {
        self.released = true;
        self.context = None;
        Ok(())
    }
}
