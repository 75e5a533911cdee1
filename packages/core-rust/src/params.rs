//! Typed per-operation parameters and their translation into argument bags.
//!
//! Callers build one of these structs; the bag is produced only at the
//! transport boundary, with the catalog's literal key names. Unset optional
//! strings are sent as explicit nulls.

use crate::bag::ArgumentBag;
use crate::catalog::keys;
use crate::catalog::OperationKind;

/// Parameters of one catalog operation.
pub trait OperationParams {
    /// The operation these parameters belong to.
    const KIND: OperationKind;

    /// Builds the argument bag. The key set always equals
    /// `Self::KIND.argument_keys()`.
    fn to_bag(&self) -> ArgumentBag;
}

/// Parameters for `AddMigration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddMigration {
    pub name: String,
    pub output_dir: Option<String>,
    pub context_type: Option<String>,
    pub namespace: Option<String>,
    pub app_args: Vec<String>,
}

impl AddMigration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl OperationParams for AddMigration {
    const KIND: OperationKind = OperationKind::AddMigration;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
            .with(keys::NAME, self.name.clone())
            .with(keys::OUTPUT_DIR, self.output_dir.clone())
            .with(keys::CONTEXT_TYPE, self.context_type.clone())
            .with(keys::NAMESPACE, self.namespace.clone())
            .with(keys::APP_ARGS, self.app_args.clone())
    }
}

/// Parameters for `RemoveMigration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveMigration {
    pub context_type: Option<String>,
    /// Revert the migration from the database even if it was applied.
    pub force: bool,
    pub app_args: Vec<String>,
}

impl OperationParams for RemoveMigration {
    const KIND: OperationKind = OperationKind::RemoveMigration;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
            .with(keys::CONTEXT_TYPE, self.context_type.clone())
            .with(keys::FORCE, self.force)
            .with(keys::APP_ARGS, self.app_args.clone())
    }
}

/// Parameters for `UpdateDatabase`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDatabase {
    /// Migration to update to. `None` means the latest migration.
    pub target_migration: Option<String>,
    /// Overrides the connection string configured in the context.
    pub connection_string: Option<String>,
    pub context_type: Option<String>,
    pub app_args: Vec<String>,
}

impl OperationParams for UpdateDatabase {
    const KIND: OperationKind = OperationKind::UpdateDatabase;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
            .with(keys::TARGET_MIGRATION, self.target_migration.clone())
            .with(keys::CONNECTION_STRING, self.connection_string.clone())
            .with(keys::CONTEXT_TYPE, self.context_type.clone())
            .with(keys::APP_ARGS, self.app_args.clone())
    }
}

/// Parameters for `GetContextTypes`. The operation takes no arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetContextTypes;

impl OperationParams for GetContextTypes {
    const KIND: OperationKind = OperationKind::GetContextTypes;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
    }
}

/// Parameters for `ScaffoldContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldContext {
    pub provider: String,
    pub connection_string: String,
    pub output_dir: Option<String>,
    pub output_db_context_dir: Option<String>,
    pub db_context_class_name: Option<String>,
    pub schema_filters: Vec<String>,
    pub table_filters: Vec<String>,
    pub use_data_annotations: bool,
    pub overwrite_files: bool,
    pub use_database_names: bool,
    pub model_namespace: Option<String>,
    pub context_namespace: Option<String>,
    pub app_args: Vec<String>,
}

impl ScaffoldContext {
    #[must_use]
    pub fn new(provider: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }
}

impl OperationParams for ScaffoldContext {
    const KIND: OperationKind = OperationKind::ScaffoldContext;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
            .with(keys::PROVIDER, self.provider.clone())
            .with(keys::CONNECTION_STRING, self.connection_string.clone())
            .with(keys::OUTPUT_DIR, self.output_dir.clone())
            .with(keys::OUTPUT_DB_CONTEXT_DIR, self.output_db_context_dir.clone())
            .with(keys::DB_CONTEXT_CLASS_NAME, self.db_context_class_name.clone())
            .with(keys::SCHEMA_FILTERS, self.schema_filters.clone())
            .with(keys::TABLE_FILTERS, self.table_filters.clone())
            .with(keys::USE_DATA_ANNOTATIONS, self.use_data_annotations)
            .with(keys::OVERWRITE_FILES, self.overwrite_files)
            .with(keys::USE_DATABASE_NAMES, self.use_database_names)
            .with(keys::MODEL_NAMESPACE, self.model_namespace.clone())
            .with(keys::CONTEXT_NAMESPACE, self.context_namespace.clone())
            .with(keys::APP_ARGS, self.app_args.clone())
    }
}

/// Parameters for `ScriptMigration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptMigration {
    /// Starting migration. `None` scripts from an empty database.
    pub from_migration: Option<String>,
    /// Ending migration. `None` scripts up to the latest migration.
    pub to_migration: Option<String>,
    pub idempotent: bool,
    pub context_type: Option<String>,
    pub app_args: Vec<String>,
}

impl OperationParams for ScriptMigration {
    const KIND: OperationKind = OperationKind::ScriptMigration;

    fn to_bag(&self) -> ArgumentBag {
        ArgumentBag::new()
            .with(keys::FROM_MIGRATION, self.from_migration.clone())
            .with(keys::TO_MIGRATION, self.to_migration.clone())
            .with(keys::IDEMPOTENT, self.idempotent)
            .with(keys::CONTEXT_TYPE, self.context_type.clone())
            .with(keys::APP_ARGS, self.app_args.clone())
    }
}

// ---------------------------------------------------------------------------
// Operations scoped only by context type
// ---------------------------------------------------------------------------

/// Generate a parameter struct carrying just `contextType` and `appArgs`.
macro_rules! context_scoped_params {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub context_type: Option<String>,
            pub app_args: Vec<String>,
        }

        impl $name {
            #[must_use]
            pub fn for_context(context_type: impl Into<String>) -> Self {
                Self {
                    context_type: Some(context_type.into()),
                    app_args: Vec::new(),
                }
            }
        }

        impl OperationParams for $name {
            const KIND: OperationKind = $kind;

            fn to_bag(&self) -> ArgumentBag {
                ArgumentBag::new()
                    .with(keys::CONTEXT_TYPE, self.context_type.clone())
                    .with(keys::APP_ARGS, self.app_args.clone())
            }
        }
    };
}

context_scoped_params!(
    /// Parameters for `GetMigrations`.
    GetMigrations, OperationKind::GetMigrations
);

context_scoped_params!(
    /// Parameters for `DropDatabase`.
    DropDatabase, OperationKind::DropDatabase
);

context_scoped_params!(
    /// Parameters for `GetContextInfo`.
    GetContextInfo, OperationKind::GetContextInfo
);

context_scoped_params!(
    /// Parameters for `ScriptDbContext`.
    ScriptDbContext, OperationKind::ScriptDbContext
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::bag::ArgValue;

    fn key_set(bag: &ArgumentBag) -> BTreeSet<&str> {
        bag.keys().collect()
    }

    fn declared<P: OperationParams>() -> BTreeSet<&'static str> {
        P::KIND.argument_keys().iter().copied().collect()
    }

    fn assert_keys<P: OperationParams>(params: &P) {
        let bag = params.to_bag();
        assert_eq!(key_set(&bag), declared::<P>(), "{}", P::KIND);
    }

    #[test]
    fn default_params_produce_declared_keys() {
        assert_keys(&AddMigration::new("Init"));
        assert_keys(&RemoveMigration::default());
        assert_keys(&GetMigrations::default());
        assert_keys(&DropDatabase::default());
        assert_keys(&GetContextInfo::default());
        assert_keys(&UpdateDatabase::default());
        assert_keys(&GetContextTypes);
        assert_keys(&ScaffoldContext::new("Npgsql", "Host=db"));
        assert_keys(&ScriptMigration::default());
        assert_keys(&ScriptDbContext::default());
    }

    #[test]
    fn add_migration_bag_values() {
        let params = AddMigration {
            name: "InitialCreate".to_string(),
            output_dir: Some("Migrations".to_string()),
            context_type: None,
            namespace: None,
            app_args: vec!["--seed".to_string()],
        };
        let bag = params.to_bag();
        assert_eq!(bag.get_str(keys::NAME), Some("InitialCreate"));
        assert_eq!(bag.get_str(keys::OUTPUT_DIR), Some("Migrations"));
        assert_eq!(bag.get(keys::CONTEXT_TYPE), Some(&ArgValue::Null));
        assert_eq!(bag.get_strings(keys::APP_ARGS), Some(&["--seed".to_string()][..]));
    }

    #[test]
    fn scaffold_flags_are_booleans() {
        let params = ScaffoldContext {
            use_data_annotations: true,
            overwrite_files: false,
            use_database_names: true,
            ..ScaffoldContext::new("Sqlite", "Data Source=app.db")
        };
        let bag = params.to_bag();
        assert_eq!(bag.get_bool(keys::USE_DATA_ANNOTATIONS), Some(true));
        assert_eq!(bag.get_bool(keys::OVERWRITE_FILES), Some(false));
        assert_eq!(bag.get_bool(keys::USE_DATABASE_NAMES), Some(true));
        assert_eq!(bag.get_strings(keys::SCHEMA_FILTERS), Some(&[][..]));
    }

    #[test]
    fn for_context_sets_context_type() {
        let bag = DropDatabase::for_context("BloggingContext").to_bag();
        assert_eq!(bag.get_str(keys::CONTEXT_TYPE), Some("BloggingContext"));
    }

    fn opt_string() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[A-Za-z0-9_.]{0,12}")
    }

    fn strings() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-z-]{0,8}", 0..4)
    }

    proptest! {
        #[test]
        fn add_migration_keys_are_exact(
            name in "[A-Za-z]{1,12}",
            output_dir in opt_string(),
            context_type in opt_string(),
            namespace in opt_string(),
            app_args in strings(),
        ) {
            let params = AddMigration { name, output_dir, context_type, namespace, app_args };
            let bag = params.to_bag();
            prop_assert_eq!(key_set(&bag), declared::<AddMigration>());
        }

        #[test]
        fn update_database_keys_are_exact(
            target_migration in opt_string(),
            connection_string in opt_string(),
            context_type in opt_string(),
            app_args in strings(),
        ) {
            let params = UpdateDatabase {
                target_migration,
                connection_string,
                context_type,
                app_args,
            };
            let bag = params.to_bag();
            prop_assert_eq!(key_set(&bag), declared::<UpdateDatabase>());
        }

        #[test]
        fn script_migration_keys_are_exact(
            from_migration in opt_string(),
            to_migration in opt_string(),
            idempotent in any::<bool>(),
            context_type in opt_string(),
            app_args in strings(),
        ) {
            let params = ScriptMigration {
                from_migration,
                to_migration,
                idempotent,
                context_type,
                app_args,
            };
            let bag = params.to_bag();
            prop_assert_eq!(key_set(&bag), declared::<ScriptMigration>());
        }

        #[test]
        fn scaffold_context_keys_are_exact(
            output_dir in opt_string(),
            db_context_class_name in opt_string(),
            schema_filters in strings(),
            table_filters in strings(),
            flags in any::<(bool, bool, bool)>(),
            model_namespace in opt_string(),
            app_args in strings(),
        ) {
            let params = ScaffoldContext {
                output_dir,
                db_context_class_name,
                schema_filters,
                table_filters,
                use_data_annotations: flags.0,
                overwrite_files: flags.1,
                use_database_names: flags.2,
                model_namespace,
                app_args,
                ..ScaffoldContext::new("Npgsql", "Host=localhost")
            };
            let bag = params.to_bag();
            prop_assert_eq!(key_set(&bag), declared::<ScaffoldContext>());
        }

        #[test]
        fn app_args_forwarded_unchanged(app_args in strings()) {
            let params = GetMigrations { context_type: None, app_args: app_args.clone() };
            let bag = params.to_bag();
            prop_assert_eq!(bag.get_strings(keys::APP_ARGS), Some(&app_args[..]));
        }
    }
}
