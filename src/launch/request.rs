//! Translation of [`TrainOptions`] into what the cluster receives.

use super::options::{ImagePullPolicy, RestartPolicy, TrainOptions};
use crate::build::model_path_in_image;
use crate::config::ImageConfig;
use crate::error::{LaunchError, LaunchResult};
use crate::resource::ResourceSpec;

/// A request/limit pair. The limit falls back to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBounds {
    pub request: ResourceSpec,
    pub limit: ResourceSpec,
}

impl ResourceBounds {
    pub fn new(request: ResourceSpec, limit: Option<ResourceSpec>) -> Self {
        let limit = limit.unwrap_or_else(|| request.clone());
        Self { request, limit }
    }
}

/// A persistent volume claim mounted into the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub volume_name: String,
    pub mount_path: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Pair `volume_name` and `mount_path`: both or neither. Blank values count
/// as absent.
pub fn pair_volume(
    volume_name: Option<&str>,
    mount_path: Option<&str>,
) -> LaunchResult<Option<VolumeBinding>> {
    match (non_blank(volume_name), non_blank(mount_path)) {
        (Some(volume_name), Some(mount_path)) => Ok(Some(VolumeBinding {
            volume_name: volume_name.to_string(),
            mount_path: mount_path.to_string(),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(LaunchError::IncompleteVolumeSpec {
            present: "volume_name",
        }),
        (None, Some(_)) => Err(LaunchError::IncompleteVolumeSpec {
            present: "mount_path",
        }),
    }
}

/// Command-line flags of the master process, in launch order, followed by
/// the caller's passthrough arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagerArgs {
    named: Vec<(&'static str, String)>,
    passthrough: Vec<String>,
}

impl ManagerArgs {
    fn push(&mut self, flag: &'static str, value: impl Into<String>) {
        self.named.push((flag, value.into()));
    }

    /// Argument values without their flags, in launch order.
    pub fn values(&self) -> Vec<&str> {
        self.named
            .iter()
            .map(|(_, value)| value.as_str())
            .chain(self.passthrough.iter().map(String::as_str))
            .collect()
    }

    /// Value given for `flag`, if any.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(name, _)| *name == flag)
            .map(|(_, value)| value.as_str())
    }

    /// `--flag value` pairs followed by the passthrough arguments.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.named.len() * 2 + self.passthrough.len());
        for (flag, value) in &self.named {
            argv.push(format!("--{flag}"));
            argv.push(value.clone());
        }
        argv.extend(self.passthrough.iter().cloned());
        argv
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub job_name: String,
    pub image_name: String,
    pub namespace: String,
    /// Location of the model code inside the image
    pub model_path: String,
    pub master: ResourceBounds,
    pub worker: ResourceBounds,
    pub pod_priority: Option<String>,
    pub volume: Option<VolumeBinding>,
    pub image_pull_policy: ImagePullPolicy,
    pub restart_policy: RestartPolicy,
    pub tensorboard_log_dir: String,
    pub args: ManagerArgs,
}

/// Everything the cluster needs to create the master pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateManagerRequest {
    pub job_name: String,
    pub image_name: String,
    pub namespace: String,
    pub resource_requests: ResourceSpec,
    pub resource_limits: ResourceSpec,
    pub pod_priority: Option<String>,
    pub image_pull_policy: ImagePullPolicy,
    pub volume: Option<VolumeBinding>,
    pub restart_policy: RestartPolicy,
    pub args: ManagerArgs,
}

impl LaunchRequest {
    pub fn build(options: &TrainOptions, image: &ImageConfig) -> LaunchResult<Self> {
        let master = ResourceBounds::new(
            options.master_resource_request.clone(),
            options.master_resource_limit.clone(),
        );
        let worker = ResourceBounds::new(
            options.worker_resource_request.clone(),
            options.worker_resource_limit.clone(),
        );
        let volume = pair_volume(
            options.volume_name.as_deref(),
            options.mount_path.as_deref(),
        )?;
        let model_path = model_path_in_image(&image.model_root, &options.model_def)?;

        let mut args = ManagerArgs::default();
        args.push("job_name", &options.job_name);
        args.push("worker_image", &options.image_name);
        args.push("model_def", &model_path);
        args.push("worker_resource_request", worker.request.to_string());
        args.push("worker_resource_limit", worker.limit.to_string());
        args.push("namespace", &options.namespace);
        args.push("tensorboard_log_dir", &options.tensorboard_log_dir);
        args.push("image_pull_policy", options.image_pull_policy.to_string());
        args.push("restart_policy", options.restart_policy.to_string());
        if let Some(volume) = &volume {
            args.push("mount_path", &volume.mount_path);
            args.push("volume_name", &volume.volume_name);
        }
        args.passthrough = options.master_args.clone();

        Ok(Self {
            job_name: options.job_name.clone(),
            image_name: options.image_name.clone(),
            namespace: options.namespace.clone(),
            model_path,
            master,
            worker,
            pod_priority: options.master_pod_priority.clone(),
            volume,
            image_pull_policy: options.image_pull_policy,
            restart_policy: options.restart_policy,
            tensorboard_log_dir: options.tensorboard_log_dir.clone(),
            args,
        })
    }

    pub fn create_request(&self) -> CreateManagerRequest {
        CreateManagerRequest {
            job_name: self.job_name.clone(),
            image_name: self.image_name.clone(),
            namespace: self.namespace.clone(),
            resource_requests: self.master.request.clone(),
            resource_limits: self.master.limit.clone(),
            pod_priority: self.pod_priority.clone(),
            image_pull_policy: self.image_pull_policy,
            volume: self.volume.clone(),
            restart_policy: self.restart_policy,
            args: self.args.clone(),
        }
    }
}
