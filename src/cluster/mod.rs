//! Submission of the managing process to a cluster.

pub mod kube;

use crate::error::SubmissionFailure;
use crate::launch::CreateManagerRequest;
use async_trait::async_trait;

/// What the cluster reports back for an accepted master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub pod_name: String,
    pub namespace: String,
    pub uid: Option<String>,
}

/// The single operation the pipeline needs from a cluster.
///
/// Any failure is terminal; the pipeline reports it without retrying.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_manager(
        &self,
        request: &CreateManagerRequest,
    ) -> Result<SubmissionReceipt, SubmissionFailure>;
}
