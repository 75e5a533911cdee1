//! The operation executor: one typed method per catalog operation.
//!
//! Every method follows the same path:
//!
//! 1. **Bag**: typed parameters -> `ArgumentBag` with the catalog's keys
//! 2. **Invoke**: one blocking `Transport::invoke` call
//! 3. **Unwrap**: `ResultHandle` -> `Outcome`, failing fast on contract violations
//! 4. **Coerce**: success payload -> the operation's declared return shape

use std::time::Instant;

use opbridge_core::params::{
    AddMigration, DropDatabase, GetContextInfo, GetContextTypes, GetMigrations, RemoveMigration,
    ScaffoldContext, ScriptDbContext, ScriptMigration, UpdateDatabase,
};
use opbridge_core::{
    ArgumentBag, ExecutionContext, Mapping, OperationKind, OperationParams, Outcome, ReturnShape,
    Value,
};
use tracing::{debug, error, info, info_span, warn};

use crate::config::ExecutorOptions;
use crate::context::resolve_context;
use crate::error::ExecutorError;
use crate::transport::{Transport, TransportError};

// ---------------------------------------------------------------------------
// OperationExecutor
// ---------------------------------------------------------------------------

/// Typed facade over an operation module reached through a [`Transport`].
///
/// Owns the transport exclusively and releases it exactly once: on
/// [`close`](Self::close), or on drop if `close` was never called. Methods
/// take `&mut self`, so one executor runs one operation at a time.
pub struct OperationExecutor<T: Transport> {
    transport: T,
    context: ExecutionContext,
    released: bool,
}

impl<T: Transport> OperationExecutor<T> {
    /// Resolve the execution context and attach it to `transport`.
    ///
    /// If construction fails the transport is released before returning.
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::WorkingDirectory` if the working directory
    /// cannot be determined, or `ExecutorError::Transport` if the operation
    /// module rejects the context.
    pub fn new(mut transport: T, options: &ExecutorOptions) -> Result<Self, ExecutorError> {
        let context = match resolve_context(options) {
            Ok(context) => context,
            Err(err) => {
                release_after_failed_construction(&mut transport);
                return Err(err);
            }
        };

        debug!(
            target_name = %context.target_name,
            startup_target_name = %context.startup_target_name,
            "using operation modules"
        );
        debug!(app_base_path = %context.app_base_path.display(), "using application base");
        debug!(working_dir = %context.working_dir.display(), "using working directory");
        debug!(root_namespace = %context.root_namespace, "using root namespace");
        debug!(project_dir = %context.project_dir.display(), "using project directory");

        if let Err(err) = transport.attach(&context) {
            release_after_failed_construction(&mut transport);
            return Err(err.into());
        }

        Ok(Self {
            transport,
            context,
            released: false,
        })
    }

    /// The context resolved at construction.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport now, reporting teardown failures.
    ///
    /// # Errors
    ///
    /// Returns the transport's release error.
    pub fn close(mut self) -> Result<(), TransportError> {
        self.release_once()
    }

    fn release_once(&mut self) -> Result<(), TransportError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        debug!(target_name = %self.context.target_name, "releasing operation module");
        self.transport.release()
    }

    // -----------------------------------------------------------------------
    // Catalog operations
    // -----------------------------------------------------------------------

    /// Adds a new migration. Returns the files written.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn add_migration(&mut self, params: &AddMigration) -> Result<Mapping, ExecutorError> {
        let value = self.execute(params)?;
        into_mapping(AddMigration::KIND, value)
    }

    /// Removes the last migration. Returns the files removed.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn remove_migration(&mut self, params: &RemoveMigration) -> Result<Mapping, ExecutorError> {
        let value = self.execute(params)?;
        into_mapping(RemoveMigration::KIND, value)
    }

    /// Lists migrations. Elements are coerced lazily while iterating.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn get_migrations(&mut self, params: &GetMigrations) -> Result<Mappings, ExecutorError> {
        let value = self.execute(params)?;
        Mappings::from_value(GetMigrations::KIND, value)
    }

    /// Drops the database.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn drop_database(&mut self, params: &DropDatabase) -> Result<(), ExecutorError> {
        self.execute(params)?;
        Ok(())
    }

    /// Describes the context: provider, database, data source, options.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn get_context_info(&mut self, params: &GetContextInfo) -> Result<Mapping, ExecutorError> {
        let value = self.execute(params)?;
        into_mapping(GetContextInfo::KIND, value)
    }

    /// Updates the database to the target migration (latest by default).
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn update_database(&mut self, params: &UpdateDatabase) -> Result<(), ExecutorError> {
        self.execute(params)?;
        Ok(())
    }

    /// Lists the context types the target module defines.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn get_context_types(&mut self) -> Result<Mappings, ExecutorError> {
        let value = self.execute(&GetContextTypes)?;
        Mappings::from_value(GetContextTypes::KIND, value)
    }

    /// Scaffolds a context and entity types for an existing database.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn scaffold_context(&mut self, params: &ScaffoldContext) -> Result<Mapping, ExecutorError> {
        let value = self.execute(params)?;
        into_mapping(ScaffoldContext::KIND, value)
    }

    /// Generates a script between two migrations.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn script_migration(&mut self, params: &ScriptMigration) -> Result<String, ExecutorError> {
        let value = self.execute(params)?;
        into_text(ScriptMigration::KIND, value)
    }

    /// Generates the creation script for the whole context.
    ///
    /// # Errors
    ///
    /// See [`ExecutorError`].
    pub fn script_db_context(&mut self, params: &ScriptDbContext) -> Result<String, ExecutorError> {
        let value = self.execute(params)?;
        into_text(ScriptDbContext::KIND, value)
    }

    // -----------------------------------------------------------------------
    // Invoke + unwrap
    // -----------------------------------------------------------------------

    /// Run any catalog operation and return its raw success payload.
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::Remote` when the operation failed remotely,
    /// `ExecutorError::Transport` when the module could not be reached, and
    /// `ExecutorError::ContractViolation` when the result handle is malformed.
    pub fn execute<P: OperationParams>(&mut self, params: &P) -> Result<Value, ExecutorError> {
        let args = params.to_bag();
        self.invoke(P::KIND, &args)
    }

    fn invoke(&mut self, kind: OperationKind, args: &ArgumentBag) -> Result<Value, ExecutorError> {
        let operation = kind.as_str();
        let span = info_span!(
            "operation",
            operation = operation,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let _entered = span.enter();

        let start = Instant::now();
        let result = self
            .transport
            .invoke(operation, args)
            .map_err(ExecutorError::from)
            .and_then(|handle| {
                handle
                    .into_outcome()
                    .map_err(|violation| ExecutorError::ContractViolation {
                        operation,
                        violation,
                    })
            })
            .and_then(|outcome| match outcome {
                Outcome::Success(value) => Ok(value),
                Outcome::Failure(remote) => Err(ExecutorError::Remote(remote)),
            });

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(ExecutorError::Remote(_)) => "remote_error",
            Err(ExecutorError::ContractViolation { violation, .. }) => {
                error!(operation, %violation, "transport broke the result handle contract");
                "contract_violation"
            }
            Err(_) => "transport_error",
        };
        span.record("duration_ms", duration_ms);
        span.record("outcome", outcome);

        info!(
            operation = operation,
            duration_ms = duration_ms,
            outcome = outcome,
            "operation complete"
        );

        result
    }
}

impl<T: Transport> Drop for OperationExecutor<T> {
    fn drop(&mut self) {
        if let Err(err) = self.release_once() {
            warn!(error = %err, "failed to release operation module");
        }
    }
}

fn release_after_failed_construction<T: Transport>(transport: &mut T) {
    if let Err(err) = transport.release() {
        warn!(error = %err, "release after failed construction also failed");
    }
}

// ---------------------------------------------------------------------------
// Return-shape coercion
// ---------------------------------------------------------------------------

fn into_mapping(kind: OperationKind, value: Value) -> Result<Mapping, ExecutorError> {
    match value {
        Value::Map(mapping) => Ok(mapping),
        other => Err(shape_error(kind, ReturnShape::Mapping, &other)),
    }
}

fn into_text(kind: OperationKind, value: Value) -> Result<String, ExecutorError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(shape_error(kind, ReturnShape::Text, &other)),
    }
}

fn shape_error(kind: OperationKind, expected: ReturnShape, found: &Value) -> ExecutorError {
    ExecutorError::ResultShape {
        operation: kind.as_str(),
        expected: expected.as_str(),
        found: found.kind_name(),
    }
}

/// Sequence of mappings returned by listing operations.
///
/// Each element is checked when it is yielded, so one malformed element
/// does not hide the ones before it.
#[derive(Debug)]
pub struct Mappings {
    kind: OperationKind,
    items: std::vec::IntoIter<Value>,
}

impl Mappings {
    fn from_value(kind: OperationKind, value: Value) -> Result<Self, ExecutorError> {
        match value {
            Value::Array(items) => Ok(Self {
                kind,
                items: items.into_iter(),
            }),
            other => Err(shape_error(kind, ReturnShape::Mappings, &other)),
        }
    }
}

impl Iterator for Mappings {
    type Item = Result<Mapping, ExecutorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.kind;
        self.items.next().map(|value| into_mapping(kind, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for Mappings {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
