use crate::help::{COMPLETIONS_HELP, TRAIN_AFTER_HELP};
use clap::{Parser, ValueEnum};
use clap_complete::Shell as CompleteShell;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use kubelaunch::core::version;
use kubelaunch::launch::{ImagePullPolicy, RestartPolicy};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "kubelaunch",
    author,
    version = version(),
    about = "Packages a model into an image and launches its training master on Kubernetes."
)]
#[command(styles = kubelaunch::utils::STYLES)]
pub struct KubeLaunch {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Path to the config file")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Debug, Parser)]
pub enum Commands {
    /// Build the model image and submit a training job
    #[command(after_help = TRAIN_AFTER_HELP)]
    Train(TrainArgs),
    /// Submit an evaluation job (not implemented yet)
    Evaluate(EvaluateArgs),
    /// Generate tab-completion scripts for your shell
    #[command(
        after_help = COMPLETIONS_HELP,
        arg_required_else_help = true
    )]
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Directory holding the model definition
    #[arg(long = "model_def", value_name = "DIR")]
    pub model_def: PathBuf,

    /// Name (and tag) of the image to build
    #[arg(long = "image_name", value_name = "IMAGE")]
    pub image_name: String,

    /// Name of the training job
    #[arg(long = "job_name")]
    pub job_name: String,

    /// Push the image to its registry after building it
    #[arg(long = "push_image")]
    pub push_image: bool,

    /// Base image; when omitted the framework image is built from scratch
    #[arg(long = "image_base", value_name = "IMAGE")]
    pub image_base: Option<String>,

    /// Master resources, e.g. "cpu=0.1,memory=1024Mi"
    #[arg(long = "master_resource_request", value_name = "SPEC")]
    pub master_resource_request: Option<String>,

    /// Master resource limit; defaults to the request
    #[arg(long = "master_resource_limit", value_name = "SPEC")]
    pub master_resource_limit: Option<String>,

    /// Worker resources, e.g. "cpu=1,memory=4096Mi"
    #[arg(long = "worker_resource_request", value_name = "SPEC")]
    pub worker_resource_request: Option<String>,

    /// Worker resource limit; defaults to the request
    #[arg(long = "worker_resource_limit", value_name = "SPEC")]
    pub worker_resource_limit: Option<String>,

    /// Priority class of the master pod
    #[arg(long = "master_pod_priority")]
    pub master_pod_priority: Option<String>,

    /// Persistent volume claim to mount into the master
    #[arg(long = "volume_name")]
    pub volume_name: Option<String>,

    /// Where the volume is mounted; given together with --volume_name
    #[arg(long = "mount_path")]
    pub mount_path: Option<String>,

    #[arg(long = "image_pull_policy", value_enum, default_value_t = ImagePullPolicy::Always)]
    pub image_pull_policy: ImagePullPolicy,

    #[arg(long = "restart_policy", value_enum, default_value_t = RestartPolicy::Never)]
    pub restart_policy: RestartPolicy,

    /// Additional package index used while installing requirements
    #[arg(long = "extra_pypi_index", value_name = "URL")]
    pub extra_pypi_index: Option<String>,

    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Directory the master writes TensorBoard events to
    #[arg(long = "tensorboard_log_dir", default_value = "")]
    pub tensorboard_log_dir: String,

    /// Print the build file and the master pod instead of launching
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Extra arguments forwarded to the master
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "MASTER_ARGS")]
    pub master_args: Vec<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct EvaluateArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// The shell to generate the completions for
    pub shell: Shell,
}

impl From<Shell> for CompleteShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompleteShell::Bash,
            Shell::Elvish => CompleteShell::Elvish,
            Shell::Fish => CompleteShell::Fish,
            Shell::Powershell => CompleteShell::PowerShell,
            Shell::Zsh => CompleteShell::Zsh,
        }
    }
}
