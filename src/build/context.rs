//! Staging area handed to the image builder.
//!
//! The framework tree, the user's model directory and the rendered build
//! file are laid out side by side in a temporary directory:
//!
//! ```text
//! <tmp>/<framework>/...
//! <tmp>/<model>/...
//! <tmp>/Dockerfile.kubelaunch
//! ```
//!
//! The directory is removed when the [`BuildContext`] is dropped, which covers
//! the error paths and a cancelled launch as well as normal completion.

use super::instruction::BuildFile;
use super::template::dir_name;
use crate::error::{LaunchError, LaunchResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const BUILD_FILE_NAME: &str = "Dockerfile.kubelaunch";

/// Check that `model_def` is an existing directory and return its canonical path.
///
/// Single-file model definitions are rejected.
pub fn validate_model_def(model_def: &Path) -> LaunchResult<PathBuf> {
    let metadata = fs::metadata(model_def)
        .map_err(|e| LaunchError::model_def(model_def.display(), e.to_string()))?;
    if !metadata.is_dir() {
        return Err(LaunchError::model_def(
            model_def.display(),
            "expected a directory containing the model code",
        ));
    }
    let canonical = model_def
        .canonicalize()
        .map_err(|e| LaunchError::model_def(model_def.display(), e.to_string()))?;
    if dir_name(&canonical).is_none() {
        return Err(LaunchError::model_def(
            model_def.display(),
            "path has no usable directory name",
        ));
    }
    Ok(canonical)
}

/// Check that the framework tree exists and return its canonical path.
pub fn validate_framework_dir(framework_dir: Option<&Path>) -> LaunchResult<PathBuf> {
    let dir = framework_dir.ok_or_else(|| {
        LaunchError::framework_tree("<unset>", "set image.framework_dir in the configuration")
    })?;
    if !dir.is_dir() {
        return Err(LaunchError::framework_tree(
            dir.display(),
            "not an existing directory",
        ));
    }
    let canonical = dir
        .canonicalize()
        .map_err(|e| LaunchError::framework_tree(dir.display(), e.to_string()))?;
    if dir_name(&canonical).is_none() {
        return Err(LaunchError::framework_tree(
            dir.display(),
            "path has no usable directory name",
        ));
    }
    Ok(canonical)
}

#[derive(Debug)]
pub struct BuildContext {
    dir: TempDir,
    build_file: PathBuf,
}

impl BuildContext {
    /// Stage the framework and model trees plus the build file in a fresh
    /// temporary directory.
    pub fn assemble(
        model_dir: &Path,
        framework_dir: &Path,
        build_file: &BuildFile,
    ) -> LaunchResult<Self> {
        Self::assemble_in(&std::env::temp_dir(), model_dir, framework_dir, build_file)
    }

    /// Like [`BuildContext::assemble`], placing the staging directory under `parent`.
    pub fn assemble_in(
        parent: &Path,
        model_dir: &Path,
        framework_dir: &Path,
        build_file: &BuildFile,
    ) -> LaunchResult<Self> {
        let model = dir_name(model_dir).ok_or_else(|| {
            LaunchError::model_def(model_dir.display(), "path has no usable directory name")
        })?;
        let framework = dir_name(framework_dir).ok_or_else(|| {
            LaunchError::framework_tree(framework_dir.display(), "path has no usable directory name")
        })?;
        if model == framework || model == BUILD_FILE_NAME {
            return Err(LaunchError::model_def(
                model_dir.display(),
                format!("directory name '{model}' is reserved in the build context"),
            ));
        }

        let dir = tempfile::Builder::new()
            .prefix("kubelaunch-ctx-")
            .tempdir_in(parent)?;
        tracing::debug!(path = %dir.path().display(), "Staging build context");

        copy_tree(framework_dir, &dir.path().join(framework))?;
        copy_tree(model_dir, &dir.path().join(model))?;

        let build_file_path = dir.path().join(BUILD_FILE_NAME);
        fs::write(&build_file_path, build_file.render())?;

        Ok(Self {
            dir,
            build_file: build_file_path,
        })
    }

    /// Runs [`BuildContext::assemble_in`] on the blocking pool. If the
    /// returned future is dropped, the staged directory is removed once
    /// copying finishes.
    pub async fn stage_in(
        parent: PathBuf,
        model_dir: PathBuf,
        framework_dir: PathBuf,
        build_file: BuildFile,
    ) -> LaunchResult<Self> {
        tokio::task::spawn_blocking(move || {
            Self::assemble_in(&parent, &model_dir, &framework_dir, &build_file)
        })
        .await
        .map_err(|e| LaunchError::Io(io::Error::other(e)))?
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn build_file(&self) -> &Path {
        &self.build_file
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::instruction::Instruction;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        model: PathBuf,
        framework: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let model = root.path().join("mymodel");
        fs::create_dir_all(model.join("nested")).unwrap();
        fs::write(model.join("model.py"), "def model(): pass\n").unwrap();
        fs::write(model.join("nested").join("data.txt"), "1,2,3\n").unwrap();

        let framework = root.path().join("framework");
        fs::create_dir_all(&framework).unwrap();
        fs::write(framework.join("requirements.txt"), "numpy\n").unwrap();

        Fixture {
            root,
            model,
            framework,
        }
    }

    fn build_file() -> BuildFile {
        [Instruction::From {
            image: "scratch".to_string(),
            alias: None,
        }]
        .into_iter()
        .collect()
    }

    #[test]
    fn validate_accepts_directories_only() {
        let fx = fixture();
        assert_eq!(
            validate_model_def(&fx.model).unwrap(),
            fx.model.canonicalize().unwrap()
        );

        let file = fx.model.join("model.py");
        let err = validate_model_def(&file).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidModelDef { .. }));

        let missing = fx.root.path().join("missing");
        assert!(matches!(
            validate_model_def(&missing),
            Err(LaunchError::InvalidModelDef { .. })
        ));
    }

    #[test]
    fn validate_framework_requires_existing_dir() {
        let fx = fixture();
        assert!(validate_framework_dir(Some(&fx.framework)).is_ok());
        assert!(matches!(
            validate_framework_dir(None),
            Err(LaunchError::InvalidFrameworkTree { .. })
        ));
        assert!(matches!(
            validate_framework_dir(Some(&fx.root.path().join("nope"))),
            Err(LaunchError::InvalidFrameworkTree { .. })
        ));
    }

    #[test]
    fn stages_both_trees_and_build_file() {
        let fx = fixture();
        let staging = TempDir::new().unwrap();
        let ctx = BuildContext::assemble_in(staging.path(), &fx.model, &fx.framework, &build_file())
            .unwrap();

        assert!(ctx.path().join("mymodel/model.py").is_file());
        assert!(ctx.path().join("mymodel/nested/data.txt").is_file());
        assert!(ctx.path().join("framework/requirements.txt").is_file());
        assert_eq!(
            fs::read_to_string(ctx.build_file()).unwrap(),
            "FROM scratch\n"
        );
        assert_eq!(ctx.build_file().parent(), Some(ctx.path()));
    }

    #[tokio::test]
    async fn staging_on_the_blocking_pool_matches_direct_staging() {
        let fx = fixture();
        let staging = TempDir::new().unwrap();
        let ctx = BuildContext::stage_in(
            staging.path().to_path_buf(),
            fx.model.clone(),
            fx.framework.clone(),
            build_file(),
        )
        .await
        .unwrap();

        assert!(ctx.path().starts_with(staging.path()));
        assert!(ctx.path().join("mymodel/nested/data.txt").is_file());
        assert!(ctx.path().join("framework/requirements.txt").is_file());

        let err = BuildContext::stage_in(
            staging.path().to_path_buf(),
            fx.framework.clone(),
            fx.framework.clone(),
            build_file(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LaunchError::InvalidModelDef { .. }));
    }

    #[test]
    fn staging_directory_is_removed_on_drop() {
        let fx = fixture();
        let staging = TempDir::new().unwrap();
        let ctx = BuildContext::assemble_in(staging.path(), &fx.model, &fx.framework, &build_file())
            .unwrap();
        let path = ctx.path().to_path_buf();
        assert!(path.exists());

        drop(ctx);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejects_model_named_like_framework() {
        let fx = fixture();
        let clash = fx.root.path().join("other").join("framework");
        fs::create_dir_all(&clash).unwrap();

        let staging = TempDir::new().unwrap();
        let err = BuildContext::assemble_in(staging.path(), &clash, &fx.framework, &build_file())
            .unwrap_err();
        assert!(matches!(err, LaunchError::InvalidModelDef { .. }));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }
}
