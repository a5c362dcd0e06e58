//! End-to-end `train` flow: validate, stage, build, push, submit.
//!
//! [`plan`] performs every check that needs no side effect, so a bad resource
//! string or a lone `volume_name` fails before anything is built.
//! [`Launcher::launch`] then runs the stages strictly in sequence. Staging
//! runs on the blocking pool so the caller can still react to signals. The
//! staged build context is dropped as soon as the build finishes, and also
//! when the launch future itself is dropped mid-build.

use crate::build::{
    build_image, plan_build_file, push_image, validate_framework_dir, validate_model_def,
    BuildContext, BuildFile, BuildSpec, ImageBackend,
};
use crate::cluster::{ClusterClient, SubmissionReceipt};
use crate::config::Config;
use crate::error::{LaunchError, LaunchResult};
use crate::launch::{LaunchRequest, TrainOptions};
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::PathBuf;

/// Everything decided before the first side effect.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Canonical host path of the model directory
    pub model_dir: PathBuf,
    pub framework_dir: PathBuf,
    pub build_file: BuildFile,
    pub request: LaunchRequest,
    pub push_image: bool,
}

pub fn plan(config: &Config, options: &TrainOptions) -> LaunchResult<LaunchPlan> {
    let model_dir = validate_model_def(&options.model_def)?;
    let options = TrainOptions {
        model_def: model_dir.clone(),
        ..options.clone()
    };
    let request = LaunchRequest::build(&options, &config.image)?;

    let framework_dir = validate_framework_dir(config.image.framework_dir().as_deref())?;
    let spec = BuildSpec {
        base_image: options.image_base.clone(),
        source_dir: model_dir.clone(),
        framework_dir: framework_dir.clone(),
        model_root: config.image.model_root.clone(),
        extra_pypi_index: options.extra_pypi_index.clone(),
    };
    let build_file = plan_build_file(&spec, &config.image)?;

    tracing::debug!(
        job_name = %request.job_name,
        model_path = %request.model_path,
        "Launch planned"
    );
    Ok(LaunchPlan {
        model_dir,
        framework_dir,
        build_file,
        request,
        push_image: options.push_image,
    })
}

fn banner<W: Write>(out: &mut W, title: &str) -> LaunchResult<()> {
    writeln!(out, "{}", format!("===== {title} =====").bold()).map_err(LaunchError::Output)
}

pub struct Launcher<'a, B: ?Sized, C: ?Sized> {
    images: &'a B,
    cluster: &'a C,
    staging_parent: PathBuf,
}

impl<'a, B, C> Launcher<'a, B, C>
where
    B: ImageBackend + ?Sized,
    C: ClusterClient + ?Sized,
{
    pub fn new(images: &'a B, cluster: &'a C) -> Self {
        Self {
            images,
            cluster,
            staging_parent: std::env::temp_dir(),
        }
    }

    /// Stage build contexts under `dir` instead of the system temp directory.
    pub fn with_staging_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_parent = dir.into();
        self
    }

    pub async fn launch<W: Write>(
        &self,
        plan: &LaunchPlan,
        out: &mut W,
    ) -> LaunchResult<SubmissionReceipt> {
        let image = plan.request.image_name.as_str();

        banner(out, "Building Docker Image")?;
        {
            let context = BuildContext::stage_in(
                self.staging_parent.clone(),
                plan.model_dir.clone(),
                plan.framework_dir.clone(),
                plan.build_file.clone(),
            )
            .await?;
            build_image(self.images, &context, image, out).await?;
        }

        if plan.push_image {
            banner(out, "Pushing Docker Image")?;
            if let Err(err) = push_image(self.images, image, out).await {
                tracing::warn!(image, "{err}");
                writeln!(out, "{} {err}", "warning:".yellow().bold())
                    .map_err(LaunchError::Output)?;
            }
        }

        let request = plan.request.create_request();
        tracing::info!(
            job_name = %request.job_name,
            namespace = %request.namespace,
            "Submitting master"
        );
        let receipt = self.cluster.create_manager(&request).await?;
        Ok(receipt)
    }
}

/// Plan and launch a `train` invocation in one call.
pub async fn train<B, C, W>(
    config: &Config,
    options: &TrainOptions,
    images: &B,
    cluster: &C,
    out: &mut W,
) -> LaunchResult<SubmissionReceipt>
where
    B: ImageBackend + ?Sized,
    C: ClusterClient + ?Sized,
    W: Write,
{
    let plan = plan(config, options)?;
    Launcher::new(images, cluster).launch(&plan, out).await
}
