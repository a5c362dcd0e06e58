use std::fmt;
use thiserror::Error;

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

/// Failures of the launch pipeline, one variant per stage.
///
/// Validation variants are raised before any image is built; build and
/// submission failures abort the remaining steps. `PushFailed` is the only
/// one the pipeline reports without stopping.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid resource spec '{spec}': {reason}")]
    InvalidResourceSpec { spec: String, reason: String },

    #[error("invalid model definition '{path}': {reason}")]
    InvalidModelDef { path: String, reason: String },

    #[error("invalid framework tree '{path}': {reason}")]
    InvalidFrameworkTree { path: String, reason: String },

    #[error("both volume_name and mount_path must be given, got only {present}")]
    IncompleteVolumeSpec { present: &'static str },

    #[error("image build failed: {0}")]
    BuildFailed(String),

    #[error("image push failed: {0}")]
    PushFailed(String),

    #[error("submission failed: {0}")]
    SubmissionFailed(#[from] SubmissionFailure),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("interrupted while {0}")]
    Interrupted(&'static str),

    #[error("failed to stage build context: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write progress output: {0}")]
    Output(#[source] std::io::Error),
}

impl LaunchError {
    pub fn resource_spec(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    pub fn model_def(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidModelDef {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn framework_tree(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidFrameworkTree {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Category of a rejected create request, as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FailureKind {
    #[strum(to_string = "unauthorized")]
    Auth,
    #[strum(to_string = "quota exceeded")]
    Quota,
    #[strum(to_string = "name collision")]
    NameCollision,
    #[strum(to_string = "invalid request")]
    Invalid,
    #[strum(to_string = "transient network error")]
    TransientNetwork,
    #[strum(to_string = "error")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmissionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_stage() {
        let err = LaunchError::BuildFailed("COPY failed".to_string());
        assert_eq!(err.to_string(), "image build failed: COPY failed");

        let err = LaunchError::resource_spec("cpu", "missing '='");
        assert_eq!(err.to_string(), "invalid resource spec 'cpu': missing '='");

        let err = LaunchError::IncompleteVolumeSpec {
            present: "volume_name",
        };
        assert!(err.to_string().contains("only volume_name"));
    }

    #[test]
    fn submission_failure_keeps_cluster_message_verbatim() {
        let failure = SubmissionFailure::new(
            FailureKind::NameCollision,
            "pods \"kubelaunch-job1-master\" already exists",
        );
        let err: LaunchError = failure.into();
        assert_eq!(
            err.to_string(),
            "submission failed: name collision: pods \"kubelaunch-job1-master\" already exists"
        );
    }

    #[test]
    fn staging_and_output_io_errors_are_told_apart() {
        let staging: LaunchError = std::io::Error::other("disk full").into();
        assert_eq!(staging.to_string(), "failed to stage build context: disk full");

        let output = LaunchError::Output(std::io::ErrorKind::BrokenPipe.into());
        assert!(output.to_string().starts_with("failed to write progress output"));
    }

    #[test]
    fn evaluate_reports_not_implemented() {
        let err = LaunchError::NotImplemented("evaluate");
        assert_eq!(err.to_string(), "evaluate is not implemented");
    }
}
