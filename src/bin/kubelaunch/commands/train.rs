use crate::cli::TrainArgs;
use anyhow::{Context, Result};
use kubelaunch::build::docker::DockerBackend;
use kubelaunch::cluster::kube::{manager_pod, KubeCluster};
use kubelaunch::config::{Config, ResourceDefaults};
use kubelaunch::launch::TrainOptions;
use kubelaunch::pipeline::{plan, LaunchPlan, Launcher};
use kubelaunch::resource::ResourceSpec;
use kubelaunch::shutdown::{until_shutdown, ShutdownListener};
use kubelaunch::utils::shell_join;
use kubelaunch::LaunchError;
use owo_colors::OwoColorize;

fn parse_resource(flag: &str, value: &str) -> Result<ResourceSpec> {
    ResourceSpec::parse(value).with_context(|| format!("--{flag}"))
}

/// Resolve command-line arguments against the configured resource defaults.
pub(crate) fn train_options(args: TrainArgs, defaults: &ResourceDefaults) -> Result<TrainOptions> {
    let master_request = args
        .master_resource_request
        .as_deref()
        .unwrap_or(&defaults.master_resource_request);
    let worker_request = args
        .worker_resource_request
        .as_deref()
        .unwrap_or(&defaults.worker_resource_request);
    let worker_limit = args
        .worker_resource_limit
        .as_deref()
        .unwrap_or(&defaults.worker_resource_limit);

    let mut options = TrainOptions::new(
        args.model_def,
        args.image_name,
        args.job_name,
        parse_resource("master_resource_request", master_request)?,
        parse_resource("worker_resource_request", worker_request)?,
    );
    options.master_resource_limit =
        ResourceSpec::parse_optional(args.master_resource_limit.as_deref())
            .context("--master_resource_limit")?;
    options.worker_resource_limit = ResourceSpec::parse_optional(Some(worker_limit))
        .context("--worker_resource_limit")?;
    options.push_image = args.push_image;
    options.image_base = args.image_base.filter(|base| !base.trim().is_empty());
    options.master_pod_priority = args.master_pod_priority;
    options.volume_name = args.volume_name;
    options.mount_path = args.mount_path;
    options.image_pull_policy = args.image_pull_policy;
    options.restart_policy = args.restart_policy;
    options.extra_pypi_index = args.extra_pypi_index;
    options.namespace = args.namespace;
    options.tensorboard_log_dir = args.tensorboard_log_dir;
    options.master_args = args.master_args;
    Ok(options)
}

/// The build file, the master pod and its command line, as `--dry_run` prints them.
pub(crate) fn render_dry_run(config: &Config, plan: &LaunchPlan) -> Result<String> {
    let pod = manager_pod(&plan.request.create_request(), &config.manager);
    let pod_yaml = serde_yaml::to_string(&pod).context("Failed to render the master pod")?;
    let command = shell_join(
        config
            .manager
            .command
            .iter()
            .cloned()
            .chain(plan.request.args.to_argv()),
    );

    Ok(format!(
        "# Build file\n{}\n# Master pod\n{}\n# Master command\n{}\n",
        plan.build_file.render(),
        pod_yaml,
        command
    ))
}

pub(crate) async fn handle_train(config: &Config, args: TrainArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let options = train_options(args, &config.defaults)?;
    let plan = plan(config, &options)?;

    if dry_run {
        print!("{}", render_dry_run(config, &plan)?);
        return Ok(());
    }

    let images = DockerBackend::connect()?;
    let cluster = KubeCluster::connect(config.manager.clone())
        .await
        .map_err(LaunchError::from)?;
    let launcher = Launcher::new(&images, &cluster);
    let mut out = std::io::stdout();
    let mut shutdown =
        ShutdownListener::install().context("Failed to install signal handlers")?;

    let receipt = match until_shutdown(&mut shutdown, launcher.launch(&plan, &mut out)).await {
        Ok(result) => result?,
        Err(signal) => {
            tracing::warn!(%signal, job_name = %plan.request.job_name, "Launch interrupted");
            return Err(LaunchError::Interrupted("launching the job").into());
        }
    };

    println!(
        "{} master pod {} in namespace {}",
        "Submitted".green().bold(),
        receipt.pod_name,
        receipt.namespace
    );
    if let Some(uid) = receipt.uid {
        tracing::info!(%uid, "Master pod created");
    }
    Ok(())
}
