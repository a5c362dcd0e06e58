use crate::cli::EvaluateArgs;
use anyhow::Result;
use kubelaunch::LaunchError;

pub(crate) fn handle_evaluate(args: EvaluateArgs) -> Result<()> {
    tracing::debug!(args = ?args.args, "Evaluate requested");
    Err(LaunchError::NotImplemented("evaluate").into())
}
