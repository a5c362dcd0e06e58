use crate::resource::ResourceSpec;
use clap::ValueEnum;
use std::path::PathBuf;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum ImagePullPolicy {
    #[default]
    Always,
    IfNotPresent,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum RestartPolicy {
    Always,
    OnFailure,
    #[default]
    Never,
}

/// Validated options of a `train` invocation.
///
/// Resource strings are parsed already; volume pairing is checked when the
/// launch request is built.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Directory holding the model code
    pub model_def: PathBuf,
    pub image_name: String,
    pub job_name: String,
    pub push_image: bool,
    pub image_base: Option<String>,
    pub master_resource_request: ResourceSpec,
    /// Defaults to the master request
    pub master_resource_limit: Option<ResourceSpec>,
    pub worker_resource_request: ResourceSpec,
    /// Defaults to the worker request
    pub worker_resource_limit: Option<ResourceSpec>,
    /// Priority class of the master pod
    pub master_pod_priority: Option<String>,
    pub volume_name: Option<String>,
    pub mount_path: Option<String>,
    pub image_pull_policy: ImagePullPolicy,
    pub restart_policy: RestartPolicy,
    pub extra_pypi_index: Option<String>,
    pub namespace: String,
    pub tensorboard_log_dir: String,
    /// Arguments appended verbatim to the master's command line
    pub master_args: Vec<String>,
}

impl TrainOptions {
    /// Options with the documented defaults for everything but the required fields.
    pub fn new(
        model_def: impl Into<PathBuf>,
        image_name: impl Into<String>,
        job_name: impl Into<String>,
        master_resource_request: ResourceSpec,
        worker_resource_request: ResourceSpec,
    ) -> Self {
        Self {
            model_def: model_def.into(),
            image_name: image_name.into(),
            job_name: job_name.into(),
            push_image: false,
            image_base: None,
            master_resource_request,
            master_resource_limit: None,
            worker_resource_request,
            worker_resource_limit: None,
            master_pod_priority: None,
            volume_name: None,
            mount_path: None,
            image_pull_policy: ImagePullPolicy::default(),
            restart_policy: RestartPolicy::default(),
            extra_pypi_index: None,
            namespace: "default".to_string(),
            tensorboard_log_dir: String::new(),
            master_args: Vec::new(),
        }
    }
}
