//! Resolution of an [`ExecutionContext`] from [`ExecutorOptions`].

use std::path::Path;

use opbridge_core::ExecutionContext;

use crate::config::ExecutorOptions;
use crate::error::ExecutorError;

/// Resolve the execution context, filling every default.
///
/// - module identities are the file stems of the module paths
/// - the startup module defaults to the target module
/// - the base path is the directory holding the startup module, resolved
///   against the working directory
/// - the project directory defaults to the working directory
/// - the root namespace defaults to the target module identity
///
/// # Errors
///
/// Returns `ExecutorError::WorkingDirectory` if no working directory was
/// given and the process current directory cannot be read.
pub fn resolve_context(options: &ExecutorOptions) -> Result<ExecutionContext, ExecutorError> {
    let working_dir = match &options.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(ExecutorError::WorkingDirectory)?,
    };

    let target_name = module_identity(&options.target_module);
    let startup_module = options
        .startup_module
        .as_deref()
        .unwrap_or(&options.target_module);
    let startup_target_name = module_identity(startup_module);

    let app_base_path = working_dir
        .join(startup_module)
        .parent()
        .map_or_else(|| working_dir.clone(), Path::to_path_buf);

    let project_dir = options
        .project_dir
        .clone()
        .unwrap_or_else(|| working_dir.clone());
    let root_namespace = options
        .root_namespace
        .clone()
        .unwrap_or_else(|| target_name.clone());

    Ok(ExecutionContext {
        target_name,
        startup_target_name,
        app_base_path,
        working_dir,
        project_dir,
        root_namespace,
        language: options.language.clone(),
    })
}

/// Identity of a module: its file name without extension.
fn module_identity(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.to_string_lossy(), |stem| stem.to_string_lossy())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn target_only_defaults() {
        let options = ExecutorOptions::new("Foo").working_dir("/home/dev/app");
        let ctx = resolve_context(&options).unwrap();
        assert_eq!(ctx.target_name, "Foo");
        assert_eq!(ctx.startup_target_name, "Foo");
        assert_eq!(ctx.project_dir, PathBuf::from("/home/dev/app"));
        assert_eq!(ctx.root_namespace, "Foo");
        assert_eq!(ctx.app_base_path, PathBuf::from("/home/dev/app"));
        assert!(ctx.language.is_none());
    }

    #[test]
    fn working_dir_defaults_to_current_dir() {
        let ctx = resolve_context(&ExecutorOptions::new("Foo")).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(ctx.working_dir, cwd);
        assert_eq!(ctx.project_dir, cwd);
    }

    #[test]
    fn identities_strip_directories_and_extensions() {
        let options = ExecutorOptions::new("bin/Debug/Shop.Data.dll")
            .startup_module("/srv/shop/bin/Shop.Web.dll")
            .working_dir("/srv/shop");
        let ctx = resolve_context(&options).unwrap();
        assert_eq!(ctx.target_name, "Shop.Data");
        assert_eq!(ctx.startup_target_name, "Shop.Web");
        assert_eq!(ctx.app_base_path, PathBuf::from("/srv/shop/bin"));
        assert_eq!(ctx.root_namespace, "Shop.Data");
    }

    #[test]
    fn relative_startup_module_resolves_against_working_dir() {
        let options = ExecutorOptions::new("out/Blog.dll").working_dir("/repo");
        let ctx = resolve_context(&options).unwrap();
        assert_eq!(ctx.app_base_path, PathBuf::from("/repo/out"));
    }

    #[test]
    fn explicit_values_win() {
        let options = ExecutorOptions::new("Foo")
            .working_dir("/w")
            .project_dir("/w/src/Foo")
            .root_namespace("Acme.Foo")
            .language("rust");
        let ctx = resolve_context(&options).unwrap();
        assert_eq!(ctx.project_dir, PathBuf::from("/w/src/Foo"));
        assert_eq!(ctx.root_namespace, "Acme.Foo");
        assert_eq!(ctx.language.as_deref(), Some("rust"));
    }

    proptest! {
        #[test]
        fn defaults_follow_target_identity(
            name in "[A-Za-z][A-Za-z0-9]{0,15}",
            ext in "(dll|so|wasm)",
        ) {
            let options = ExecutorOptions::new(format!("lib/{name}.{ext}")).working_dir("/w");
            let ctx = resolve_context(&options).unwrap();
            prop_assert_eq!(&ctx.target_name, &name);
            prop_assert_eq!(&ctx.startup_target_name, &name);
            prop_assert_eq!(&ctx.root_namespace, &name);
            prop_assert_eq!(ctx.app_base_path, PathBuf::from("/w/lib"));
            prop_assert_eq!(ctx.project_dir, PathBuf::from("/w"));
        }
    }
}
