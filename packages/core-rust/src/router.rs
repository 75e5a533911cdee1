//! Module-side dispatch: routes an operation name to its registered handler.

use std::collections::HashMap;

use tracing::debug;

use crate::bag::ArgumentBag;
use crate::catalog::OperationKind;
use crate::context::ExecutionContext;
use crate::outcome::{Outcome, RemoteError, ResultHandle};
use crate::value::Value;

// ---------------------------------------------------------------------------
// OperationHandler trait
// ---------------------------------------------------------------------------

/// Implementation of one catalog operation inside the operation module.
///
/// Returning `Err` reports a remote failure; it is delivered to the host as
/// a failed result handle, not as a dispatch error.
pub trait OperationHandler: Send {
    fn handle(&mut self, ctx: &ExecutionContext, args: &ArgumentBag) -> Result<Value, RemoteError>;
}

impl<F> OperationHandler for F
where
    F: FnMut(&ExecutionContext, &ArgumentBag) -> Result<Value, RemoteError> + Send,
{
    fn handle(&mut self, ctx: &ExecutionContext, args: &ArgumentBag) -> Result<Value, RemoteError> {
        self(ctx, args)
    }
}

/// Errors from routing an operation name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
}

// ---------------------------------------------------------------------------
// HandlerRouter
// ---------------------------------------------------------------------------

/// Routes operation names to handlers keyed by [`OperationKind`].
///
/// Names outside the catalog and catalog operations without a registered
/// handler both yield `DispatchError::UnknownOperation`.
#[derive(Default)]
pub struct HandlerRouter {
    handlers: HashMap<OperationKind, Box<dyn OperationHandler>>,
}

impl HandlerRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `kind`, replacing any previous one.
    pub fn register<H>(&mut self, kind: OperationKind, handler: H)
    where
        H: OperationHandler + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Register a closure as the handler for `kind`.
    pub fn register_fn<F>(&mut self, kind: OperationKind, handler: F)
    where
        F: FnMut(&ExecutionContext, &ArgumentBag) -> Result<Value, RemoteError> + Send + 'static,
    {
        self.register(kind, handler);
    }

    #[must_use]
    pub fn is_registered(&self, kind: OperationKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler registered for `operation` and record its outcome.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownOperation` if `operation` is not a
    /// catalog name or has no registered handler.
    pub fn dispatch(
        &mut self,
        ctx: &ExecutionContext,
        operation: &str,
        args: &ArgumentBag,
    ) -> Result<ResultHandle, DispatchError> {
        let unknown = || DispatchError::UnknownOperation {
            name: operation.to_string(),
        };
        let kind: OperationKind = operation.parse().map_err(|_| unknown())?;
        let handler = self.handlers.get_mut(&kind).ok_or_else(unknown)?;

        let outcome = match handler.handle(ctx, args) {
            Ok(value) => Outcome::Success(value),
            Err(error) => {
                debug!(operation, kind = %error.kind, "operation handler failed");
                Outcome::Failure(error)
            }
        };
        Ok(outcome.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::catalog::keys;

    fn make_ctx() -> ExecutionContext {
        ExecutionContext {
            target_name: "Blog".to_string(),
            startup_target_name: "Blog".to_string(),
            app_base_path: PathBuf::from("/app"),
            working_dir: PathBuf::from("/app"),
            project_dir: PathBuf::from("/app"),
            root_namespace: "Blog".to_string(),
            language: None,
        }
    }

    struct CountingHandler {
        calls: u32,
    }

    impl OperationHandler for CountingHandler {
        fn handle(
            &mut self,
            _ctx: &ExecutionContext,
            _args: &ArgumentBag,
        ) -> Result<Value, RemoteError> {
            self.calls += 1;
            Ok(Value::Int(i64::from(self.calls)))
        }
    }

    #[test]
    fn routes_to_registered_handler() {
        let mut router = HandlerRouter::new();
        router.register_fn(OperationKind::ScriptDbContext, |ctx, args| {
            let context = args.get_str(keys::CONTEXT_TYPE).unwrap_or("default");
            Ok(Value::String(format!("-- {} / {context}", ctx.target_name)))
        });

        let args = ArgumentBag::new().with(keys::CONTEXT_TYPE, "BlogContext");
        let handle = router
            .dispatch(&make_ctx(), "ScriptDbContext", &args)
            .unwrap();
        assert_eq!(
            handle.into_outcome().unwrap(),
            Outcome::Success(Value::from("-- Blog / BlogContext"))
        );
    }

    #[test]
    fn handler_error_becomes_failed_handle() {
        let mut router = HandlerRouter::new();
        router.register_fn(OperationKind::DropDatabase, |_, _| {
            Err(RemoteError::new("DbException", "cannot drop", "at drop"))
        });

        let handle = router
            .dispatch(&make_ctx(), "DropDatabase", &ArgumentBag::new())
            .unwrap();
        assert_eq!(handle.error_kind.as_deref(), Some("DbException"));
        assert!(handle.result.is_none());
    }

    #[test]
    fn stateful_handler_keeps_state_between_calls() {
        let mut router = HandlerRouter::new();
        router.register(OperationKind::GetContextTypes, CountingHandler { calls: 0 });

        let ctx = make_ctx();
        let bag = ArgumentBag::new();
        router.dispatch(&ctx, "GetContextTypes", &bag).unwrap();
        let second = router.dispatch(&ctx, "GetContextTypes", &bag).unwrap();
        assert_eq!(second.result, Some(Value::Int(2)));
    }

    #[test]
    fn name_outside_catalog_is_unknown() {
        let mut router = HandlerRouter::new();
        let err = router
            .dispatch(&make_ctx(), "Frobnicate", &ArgumentBag::new())
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownOperation {
                name: "Frobnicate".to_string()
            }
        );
    }

    #[test]
    fn unregistered_catalog_operation_is_unknown() {
        let mut router = HandlerRouter::new();
        assert!(!router.is_registered(OperationKind::AddMigration));
        let err = router
            .dispatch(&make_ctx(), "AddMigration", &ArgumentBag::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownOperation { name } if name == "AddMigration"));
    }
}
