//! Demonstration operation module.
//!
//! Serves every catalog operation over stdin/stdout with deterministic,
//! in-memory results. Logs go to stderr.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use opbridge_core::{
    keys, ArgumentBag, ExecutionContext, HandlerRouter, Mapping, OperationKind, RemoteError, Value,
};
use opbridge_executor::{init_tracing, serve, LogFormat};
use parking_lot::Mutex;
use tracing::info;

#[derive(Parser)]
#[command(name = "stub-module")]
#[command(about = "In-memory operation module for exercising opbridge transports")]
#[command(version)]
struct Cli {
    /// Log filter directives (e.g. `info`, `opbridge_executor=debug`)
    #[arg(long, env = "OPBRIDGE_LOG", default_value = "info")]
    log: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Name of a context type whose database refuses to be dropped
    #[arg(long, default_value = "Locked")]
    locked_context: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log, cli.log_format)?;

    let state = Arc::new(Mutex::new(StubState::new(cli.locked_context)));
    info!("stub operation module starting");
    serve(router(&state), tokio::io::stdin(), tokio::io::stdout()).await?;
    info!("stub operation module stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Migrations known to the module and how many of them are applied.
struct StubState {
    migrations: Vec<String>,
    applied: usize,
    next_id: u64,
    locked_context: String,
}

impl StubState {
    fn new(locked_context: String) -> Self {
        Self {
            migrations: Vec::new(),
            applied: 0,
            next_id: 1,
            locked_context,
        }
    }
}

fn fail(kind: &str, message: impl Into<String>, operation: OperationKind) -> RemoteError {
    RemoteError::new(kind, message, format!("   at stub_module::{operation}"))
}

fn context_type(args: &ArgumentBag) -> &str {
    args.get_str(keys::CONTEXT_TYPE).unwrap_or("StubContext")
}

fn map<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    Value::Map(
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<Mapping>(),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn router(state: &Arc<Mutex<StubState>>) -> HandlerRouter {
    let mut router = HandlerRouter::new();

    let shared = Arc::clone(state);
    router.register_fn(OperationKind::AddMigration, move |_, args| {
        let name = args
            .get_str(keys::NAME)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                fail(
                    "ArgumentException",
                    "a migration name is required",
                    OperationKind::AddMigration,
                )
            })?;
        let dir = args.get_str(keys::OUTPUT_DIR).unwrap_or("Migrations");

        let mut state = shared.lock();
        let id = format!("{:014}_{name}", state.next_id);
        state.next_id += 1;
        state.migrations.push(id.clone());

        Ok(map([
            ("migrationFile", Value::from(format!("{dir}/{id}.ext"))),
            ("metadataFile", Value::from(format!("{dir}/{id}.Designer.ext"))),
            ("snapshotFile", Value::from(format!("{dir}/{}Snapshot.ext", context_type(args)))),
        ]))
    });

    let shared = Arc::clone(state);
    router.register_fn(OperationKind::RemoveMigration, move |_, args| {
        let mut state = shared.lock();
        let force = args.get_bool(keys::FORCE).unwrap_or(false);
        if state.migrations.len() <= state.applied && state.applied > 0 && !force {
            return Err(fail(
                "OperationException",
                "the last migration has been applied; revert it or use force",
                OperationKind::RemoveMigration,
            ));
        }
        let id = state.migrations.pop().ok_or_else(|| {
            fail("OperationException", "no migrations to remove", OperationKind::RemoveMigration)
        })?;
        state.applied = state.applied.min(state.migrations.len());

        Ok(map([("migrationFile", Value::from(format!("Migrations/{id}.ext")))]))
    });

    let shared = Arc::clone(state);
    router.register_fn(OperationKind::GetMigrations, move |_, _| {
        let state = shared.lock();
        let items = state
            .migrations
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let name = id.split_once('_').map_or(id.as_str(), |(_, name)| name);
                map([
                    ("id", Value::from(id.as_str())),
                    ("name", Value::from(name)),
                    ("safeName", Value::from(name)),
                    ("applied", Value::Bool(index < state.applied)),
                ])
            })
            .collect::<Vec<_>>();
        Ok(Value::Array(items))
    });

    let shared = Arc::clone(state);
    router.register_fn(OperationKind::DropDatabase, move |_, args| {
        let mut state = shared.lock();
        if context_type(args) == state.locked_context {
            return Err(fail("DbException", "cannot drop", OperationKind::DropDatabase));
        }
        state.applied = 0;
        Ok(Value::Null)
    });

    router.register_fn(OperationKind::GetContextInfo, |ctx: &ExecutionContext, args| {
        Ok(map([
            ("type", Value::from(context_type(args))),
            ("providerName", Value::from("Stub.InMemory")),
            ("databaseName", Value::from(ctx.target_name.as_str())),
            ("dataSource", Value::from("memory")),
            ("options", Value::from("None")),
        ]))
    });

    let shared = Arc::clone(state);
    router.register_fn(OperationKind::UpdateDatabase, move |_, args| {
        let mut state = shared.lock();
        let applied = match args.get_str(keys::TARGET_MIGRATION) {
            None => state.migrations.len(),
            Some("0") => 0,
            Some(target) => {
                let index = state
                    .migrations
                    .iter()
                    .position(|id| id == target || id.ends_with(&format!("_{target}")))
                    .ok_or_else(|| {
                        fail(
                            "OperationException",
                            format!("the migration '{target}' was not found"),
                            OperationKind::UpdateDatabase,
                        )
                    })?;
                index + 1
            }
        };
        state.applied = applied;
        Ok(Value::Null)
    });

    router.register_fn(OperationKind::GetContextTypes, |ctx: &ExecutionContext, _| {
        Ok(Value::Array(vec![map([
            ("name", Value::from("StubContext")),
            ("fullName", Value::from(format!("{}.StubContext", ctx.root_namespace))),
            (
                "assemblyQualifiedName",
                Value::from(format!("{}.StubContext, {}", ctx.root_namespace, ctx.target_name)),
            ),
        ])]))
    });

    router.register_fn(OperationKind::ScaffoldContext, |_, args| {
        let provider = args.get_str(keys::PROVIDER).unwrap_or_default();
        if provider.is_empty() {
            return Err(fail(
                "ArgumentException",
                "a provider is required",
                OperationKind::ScaffoldContext,
            ));
        }
        let dir = args
            .get_str(keys::OUTPUT_DB_CONTEXT_DIR)
            .or_else(|| args.get_str(keys::OUTPUT_DIR))
            .unwrap_or(".");
        let class = args.get_str(keys::DB_CONTEXT_CLASS_NAME).unwrap_or("ScaffoldedContext");
        let entities = args
            .get_strings(keys::TABLE_FILTERS)
            .unwrap_or_default()
            .iter()
            .map(|table| Value::from(format!("{dir}/{table}.ext")))
            .collect::<Vec<_>>();

        Ok(map([
            ("contextFile", Value::from(format!("{dir}/{class}.ext"))),
            ("entityTypeFiles", Value::Array(entities)),
        ]))
    });

    router.register_fn(OperationKind::ScriptMigration, |_, args| {
        let from = args.get_str(keys::FROM_MIGRATION).unwrap_or("0");
        let to = args.get_str(keys::TO_MIGRATION).unwrap_or("latest");
        let mut script = format!("-- migrate from {from} to {to}\n");
        if args.get_bool(keys::IDEMPOTENT).unwrap_or(false) {
            script.push_str("-- idempotent\n");
        }
        Ok(Value::String(script))
    });

    router.register_fn(OperationKind::ScriptDbContext, |ctx: &ExecutionContext, args| {
        Ok(Value::String(format!(
            "-- {} ({})\nCREATE SCHEMA \"{}\";\n",
            context_type(args),
            ctx.root_namespace,
            ctx.target_name
        )))
    });

    router
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use opbridge_core::ResultHandle;

    use super::*;

    fn make_ctx() -> ExecutionContext {
        ExecutionContext {
            target_name: "Blog".to_string(),
            startup_target_name: "Blog".to_string(),
            app_base_path: PathBuf::from("/blog"),
            working_dir: PathBuf::from("/blog"),
            project_dir: PathBuf::from("/blog"),
            root_namespace: "Blog".to_string(),
            language: None,
        }
    }

    fn stub() -> HandlerRouter {
        router(&Arc::new(Mutex::new(StubState::new("Locked".to_string()))))
    }

    #[test]
    fn every_operation_is_registered() {
        let router = stub();
        for kind in OperationKind::ALL {
            assert!(router.is_registered(kind), "{kind}");
        }
    }

    #[test]
    fn add_then_list_migrations() {
        let mut router = stub();
        let ctx = make_ctx();
        let args = ArgumentBag::new().with(keys::NAME, "Init");
        router.dispatch(&ctx, "AddMigration", &args).unwrap();

        let handle = router.dispatch(&ctx, "GetMigrations", &ArgumentBag::new()).unwrap();
        let items = handle.result.unwrap();
        let first = items.as_array().unwrap()[0].as_map().unwrap().clone();
        assert_eq!(first["id"], Value::from("00000000000001_Init"));
        assert_eq!(first["applied"], Value::Bool(false));
    }

    #[test]
    fn locked_context_cannot_be_dropped() {
        let mut router = stub();
        let args = ArgumentBag::new().with(keys::CONTEXT_TYPE, "Locked");
        let handle = router.dispatch(&make_ctx(), "DropDatabase", &args).unwrap();
        assert_eq!(handle.error_kind.as_deref(), Some("DbException"));
        assert_eq!(handle.error_message.as_deref(), Some("cannot drop"));
    }

    #[test]
    fn drop_returns_null() {
        let mut router = stub();
        let handle = router
            .dispatch(&make_ctx(), "DropDatabase", &ArgumentBag::new())
            .unwrap();
        assert_eq!(handle, ResultHandle::success(Value::Null));
    }
}
