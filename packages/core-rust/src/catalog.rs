//! The fixed operation catalog: operation names, argument keys, return shapes.
//!
//! Both sides of the bridge match on these literals, so they never change
//! independently of the operation module.

use std::fmt;
use std::str::FromStr;

/// Argument key literals, shared by the host and the operation module.
pub mod keys {
    pub const NAME: &str = "name";
    pub const OUTPUT_DIR: &str = "outputDir";
    pub const CONTEXT_TYPE: &str = "contextType";
    pub const NAMESPACE: &str = "namespace";
    pub const APP_ARGS: &str = "appArgs";
    pub const FORCE: &str = "force";
    pub const TARGET_MIGRATION: &str = "targetMigration";
    pub const CONNECTION_STRING: &str = "connectionString";
    pub const PROVIDER: &str = "provider";
    pub const OUTPUT_DB_CONTEXT_DIR: &str = "outputDbContextDir";
    pub const DB_CONTEXT_CLASS_NAME: &str = "dbContextClassName";
    pub const SCHEMA_FILTERS: &str = "schemaFilters";
    pub const TABLE_FILTERS: &str = "tableFilters";
    pub const USE_DATA_ANNOTATIONS: &str = "useDataAnnotations";
    pub const OVERWRITE_FILES: &str = "overwriteFiles";
    pub const USE_DATABASE_NAMES: &str = "useDatabaseNames";
    pub const MODEL_NAMESPACE: &str = "modelNamespace";
    pub const CONTEXT_NAMESPACE: &str = "contextNamespace";
    pub const FROM_MIGRATION: &str = "fromMigration";
    pub const TO_MIGRATION: &str = "toMigration";
    pub const IDEMPOTENT: &str = "idempotent";
}

/// Shape the success payload of an operation is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// The payload is ignored.
    Nothing,
    /// A single string.
    Text,
    /// A string-keyed map.
    Mapping,
    /// A sequence whose elements are string-keyed maps.
    Mappings,
}

impl ReturnShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnShape::Nothing => "nothing",
            ReturnShape::Text => "string",
            ReturnShape::Mapping => "mapping",
            ReturnShape::Mappings => "sequence of mappings",
        }
    }
}

/// Every operation the operation module implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    AddMigration,
    RemoveMigration,
    GetMigrations,
    DropDatabase,
    GetContextInfo,
    UpdateDatabase,
    GetContextTypes,
    ScaffoldContext,
    ScriptMigration,
    ScriptDbContext,
}

impl OperationKind {
    /// All catalog operations, in catalog order.
    pub const ALL: [OperationKind; 10] = [
        OperationKind::AddMigration,
        OperationKind::RemoveMigration,
        OperationKind::GetMigrations,
        OperationKind::DropDatabase,
        OperationKind::GetContextInfo,
        OperationKind::UpdateDatabase,
        OperationKind::GetContextTypes,
        OperationKind::ScaffoldContext,
        OperationKind::ScriptMigration,
        OperationKind::ScriptDbContext,
    ];

    /// The literal operation name sent across the transport.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::AddMigration => "AddMigration",
            OperationKind::RemoveMigration => "RemoveMigration",
            OperationKind::GetMigrations => "GetMigrations",
            OperationKind::DropDatabase => "DropDatabase",
            OperationKind::GetContextInfo => "GetContextInfo",
            OperationKind::UpdateDatabase => "UpdateDatabase",
            OperationKind::GetContextTypes => "GetContextTypes",
            OperationKind::ScaffoldContext => "ScaffoldContext",
            OperationKind::ScriptMigration => "ScriptMigration",
            OperationKind::ScriptDbContext => "ScriptDbContext",
        }
    }

    /// The exact key set of this operation's argument bag.
    #[must_use]
    pub fn argument_keys(self) -> &'static [&'static str] {
        use keys::{
            APP_ARGS, CONNECTION_STRING, CONTEXT_NAMESPACE, CONTEXT_TYPE, DB_CONTEXT_CLASS_NAME,
            FORCE, FROM_MIGRATION, IDEMPOTENT, MODEL_NAMESPACE, NAME, NAMESPACE,
            OUTPUT_DB_CONTEXT_DIR, OUTPUT_DIR, OVERWRITE_FILES, PROVIDER, SCHEMA_FILTERS,
            TABLE_FILTERS, TARGET_MIGRATION, TO_MIGRATION, USE_DATABASE_NAMES,
            USE_DATA_ANNOTATIONS,
        };

        match self {
            OperationKind::AddMigration => &[NAME, OUTPUT_DIR, CONTEXT_TYPE, NAMESPACE, APP_ARGS],
            OperationKind::RemoveMigration => &[CONTEXT_TYPE, FORCE, APP_ARGS],
            OperationKind::GetMigrations
            | OperationKind::DropDatabase
            | OperationKind::GetContextInfo
            | OperationKind::ScriptDbContext => &[CONTEXT_TYPE, APP_ARGS],
            OperationKind::UpdateDatabase => {
                &[TARGET_MIGRATION, CONNECTION_STRING, CONTEXT_TYPE, APP_ARGS]
            }
            OperationKind::GetContextTypes => &[],
            OperationKind::ScaffoldContext => &[
                PROVIDER,
                CONNECTION_STRING,
                OUTPUT_DIR,
                OUTPUT_DB_CONTEXT_DIR,
                DB_CONTEXT_CLASS_NAME,
                SCHEMA_FILTERS,
                TABLE_FILTERS,
                USE_DATA_ANNOTATIONS,
                OVERWRITE_FILES,
                USE_DATABASE_NAMES,
                MODEL_NAMESPACE,
                CONTEXT_NAMESPACE,
                APP_ARGS,
            ],
            OperationKind::ScriptMigration => {
                &[FROM_MIGRATION, TO_MIGRATION, IDEMPOTENT, CONTEXT_TYPE, APP_ARGS]
            }
        }
    }

    #[must_use]
    pub fn return_shape(self) -> ReturnShape {
        match self {
            OperationKind::AddMigration
            | OperationKind::RemoveMigration
            | OperationKind::GetContextInfo
            | OperationKind::ScaffoldContext => ReturnShape::Mapping,
            OperationKind::GetMigrations | OperationKind::GetContextTypes => ReturnShape::Mappings,
            OperationKind::DropDatabase | OperationKind::UpdateDatabase => ReturnShape::Nothing,
            OperationKind::ScriptMigration | OperationKind::ScriptDbContext => ReturnShape::Text,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a name that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a catalog operation: {0}")]
pub struct UnknownOperationName(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownOperationName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "DropEverything".parse::<OperationKind>().unwrap_err();
        assert_eq!(err, UnknownOperationName("DropEverything".to_string()));
    }

    #[test]
    fn argument_keys_are_unique_per_operation() {
        for kind in OperationKind::ALL {
            let keys = kind.argument_keys();
            let unique: HashSet<_> = keys.iter().collect();
            assert_eq!(unique.len(), keys.len(), "duplicate key in {kind}");
        }
    }

    #[test]
    fn every_operation_but_context_types_forwards_app_args() {
        for kind in OperationKind::ALL {
            let has_app_args = kind.argument_keys().contains(&keys::APP_ARGS);
            assert_eq!(has_app_args, kind != OperationKind::GetContextTypes, "{kind}");
        }
    }

    #[test]
    fn return_shapes_match_catalog() {
        assert_eq!(OperationKind::AddMigration.return_shape(), ReturnShape::Mapping);
        assert_eq!(OperationKind::GetMigrations.return_shape(), ReturnShape::Mappings);
        assert_eq!(OperationKind::DropDatabase.return_shape(), ReturnShape::Nothing);
        assert_eq!(OperationKind::ScriptDbContext.return_shape(), ReturnShape::Text);
    }
}
