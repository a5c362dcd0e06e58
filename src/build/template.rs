//! Chooses the build-file layout for a workload.
//!
//! Two layouts exist. With a custom base image the user's code is copied on
//! top of it. Otherwise the default framework image is used, the framework
//! tree is installed and built, and then the user's code and its optional
//! `requirements.txt` are added.
//!
//! In both layouts the user's directory lands at
//! `model_root + "/" + basename(source_dir)`. The master computes model paths
//! with the same rule, see [`model_path_in_image`].

use super::instruction::{BuildFile, Instruction};
use crate::config::ImageConfig;
use crate::error::{LaunchError, LaunchResult};
use std::path::{Path, PathBuf};

const BASE_STAGE: &str = "base";
const REQUIREMENTS_FILE: &str = "requirements.txt";

/// What the image needs, independent of build-file syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Custom base image; `None` selects the default framework image
    pub base_image: Option<String>,
    /// Host directory holding the user's model code
    pub source_dir: PathBuf,
    /// Host directory holding the framework tree
    pub framework_dir: PathBuf,
    /// Root of user code inside the image
    pub model_root: String,
    pub extra_pypi_index: Option<String>,
}

/// Last path component as UTF-8, ignoring trailing separators.
pub fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn join_image_path(root: &str, name: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), name)
}

/// Location of the user's model directory inside the built image.
pub fn model_path_in_image(model_root: &str, source_dir: &Path) -> LaunchResult<String> {
    let name = dir_name(source_dir).ok_or_else(|| {
        LaunchError::model_def(source_dir.display(), "path has no usable directory name")
    })?;
    Ok(join_image_path(model_root, name))
}

impl BuildSpec {
    fn framework_name(&self) -> LaunchResult<&str> {
        dir_name(&self.framework_dir).ok_or_else(|| {
            LaunchError::framework_tree(
                self.framework_dir.display(),
                "path has no usable directory name",
            )
        })
    }

    fn model_name(&self) -> LaunchResult<&str> {
        dir_name(&self.source_dir).ok_or_else(|| {
            LaunchError::model_def(self.source_dir.display(), "path has no usable directory name")
        })
    }
}

/// Turn a [`BuildSpec`] into build-file instructions.
pub fn plan_build_file(spec: &BuildSpec, image: &ImageConfig) -> LaunchResult<BuildFile> {
    let framework = spec.framework_name()?;
    let model = spec.model_name()?;
    let framework_path = join_image_path("", framework);
    let model_path = join_image_path(&spec.model_root, model);

    let search_path = Instruction::Env {
        key: image.search_path_var.clone(),
        value: format!("{framework_path}:{}", spec.model_root),
    };
    let copy_model = Instruction::Copy {
        src: model.to_string(),
        dest: model_path.clone(),
    };

    let mut file = BuildFile::new();
    match &spec.base_image {
        Some(base) => {
            file.push(Instruction::From {
                image: base.clone(),
                alias: Some(BASE_STAGE.to_string()),
            })
            .push(copy_model)
            .push(search_path);
        }
        None => {
            let install = install_command(image, spec.extra_pypi_index.as_deref());
            file.push(Instruction::From {
                image: image.default_base.clone(),
                alias: Some(BASE_STAGE.to_string()),
            })
            .push(Instruction::Copy {
                src: framework.to_string(),
                dest: framework_path.clone(),
            })
            .push(Instruction::Run(format!(
                "{install} -r {framework_path}/{REQUIREMENTS_FILE}"
            )));

            if let Some(build) = image
                .framework_build
                .as_deref()
                .filter(|cmd| !cmd.trim().is_empty())
            {
                file.push(Instruction::Run(build.replace("{framework}", &framework_path)));
            }

            let requirements = format!("{model_path}/{REQUIREMENTS_FILE}");
            file.push(copy_model)
                .push(search_path)
                .push(Instruction::RunIfExists {
                    then: format!("{install} -r {requirements}"),
                    otherwise: format!("echo no {requirements} found"),
                    path: requirements,
                });
        }
    }

    Ok(file)
}

fn install_command(image: &ImageConfig, extra_index: Option<&str>) -> String {
    match extra_index.filter(|index| !index.trim().is_empty()) {
        Some(index) => format!(
            "{} {} {}",
            image.install_command, image.extra_index_flag, index
        ),
        None => image.install_command.clone(),
    }
}
