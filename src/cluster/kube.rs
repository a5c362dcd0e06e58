//! Kubernetes backend for [`ClusterClient`]: the master runs as a bare pod.

use super::{ClusterClient, SubmissionReceipt};
use crate::config::ManagerConfig;
use crate::error::{FailureKind, SubmissionFailure};
use crate::launch::CreateManagerRequest;
use crate::resource::{ResourceKind, ResourceSpec};
use crate::tls::ensure_rustls_provider_installed;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaimVolumeSource, Pod, PodSpec, ResourceRequirements, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};
use kube::Client;
use std::collections::BTreeMap;

const MASTER_CONTAINER: &str = "master";
const DATA_VOLUME: &str = "data";

pub struct KubeCluster {
    client: Client,
    manager: ManagerConfig,
}

impl KubeCluster {
    /// Connect using the in-cluster service account or the local kubeconfig.
    pub async fn connect(manager: ManagerConfig) -> Result<Self, SubmissionFailure> {
        ensure_rustls_provider_installed();
        let client = Client::try_default().await.map_err(|e| {
            SubmissionFailure::new(
                FailureKind::Other,
                format!("cannot load cluster configuration: {e}"),
            )
        })?;
        Ok(Self { client, manager })
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn create_manager(
        &self,
        request: &CreateManagerRequest,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        let pod = manager_pod(request, &self.manager);
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &request.namespace);
        tracing::debug!(
            namespace = %request.namespace,
            pod = ?pod.metadata.name,
            "Creating master pod"
        );

        let created = pods
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|e| classify(&e))?;

        Ok(SubmissionReceipt {
            pod_name: created
                .metadata
                .name
                .unwrap_or_else(|| master_pod_name(&self.manager.pod_name_prefix, &request.job_name)),
            namespace: created
                .metadata
                .namespace
                .unwrap_or_else(|| request.namespace.clone()),
            uid: created.metadata.uid,
        })
    }
}

pub fn master_pod_name(prefix: &str, job_name: &str) -> String {
    format!("{prefix}-{job_name}-master")
}

fn resource_name(kind: ResourceKind, manager: &ManagerConfig) -> String {
    match kind {
        ResourceKind::Cpu => "cpu".to_string(),
        ResourceKind::Memory => "memory".to_string(),
        ResourceKind::Disk => "ephemeral-storage".to_string(),
        ResourceKind::Accelerator => manager.accelerator_resource.clone(),
    }
}

fn quantities(spec: &ResourceSpec, manager: &ManagerConfig) -> Option<BTreeMap<String, Quantity>> {
    if spec.is_empty() {
        return None;
    }
    Some(
        spec.iter()
            .map(|(kind, value)| (resource_name(kind, manager), Quantity(value.to_string())))
            .collect(),
    )
}

/// The pod that runs the managing process for `request`.
pub fn manager_pod(request: &CreateManagerRequest, manager: &ManagerConfig) -> Pod {
    let prefix = &manager.pod_name_prefix;
    let labels = BTreeMap::from([
        ("app".to_string(), prefix.clone()),
        (format!("{prefix}-job-name"), request.job_name.clone()),
        (format!("{prefix}-replica-type"), "master".to_string()),
    ]);

    let (volumes, volume_mounts) = match &request.volume {
        Some(binding) => (
            Some(vec![Volume {
                name: DATA_VOLUME.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: binding.volume_name.clone(),
                    read_only: None,
                }),
                ..Default::default()
            }]),
            Some(vec![VolumeMount {
                name: DATA_VOLUME.to_string(),
                mount_path: binding.mount_path.clone(),
                ..Default::default()
            }]),
        ),
        None => (None, None),
    };

    let container = Container {
        name: MASTER_CONTAINER.to_string(),
        image: Some(request.image_name.clone()),
        command: Some(manager.command.clone()),
        args: Some(request.args.to_argv()),
        image_pull_policy: Some(request.image_pull_policy.to_string()),
        resources: Some(ResourceRequirements {
            claims: None,
            requests: quantities(&request.resource_requests, manager),
            limits: quantities(&request.resource_limits, manager),
        }),
        volume_mounts,
        ..Default::default()
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(master_pod_name(prefix, &request.job_name)),
            namespace: Some(request.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            restart_policy: Some(request.restart_policy.to_string()),
            priority_class_name: request.pod_priority.clone(),
            volumes,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Map an API status to a failure category.
fn classify_status(code: u16, message: &str) -> FailureKind {
    match code {
        403 if message.contains("exceeded quota") => FailureKind::Quota,
        401 | 403 => FailureKind::Auth,
        409 => FailureKind::NameCollision,
        400 | 422 => FailureKind::Invalid,
        429 | 500..=599 => FailureKind::TransientNetwork,
        _ => FailureKind::Other,
    }
}

fn classify(err: &kube::Error) -> SubmissionFailure {
    let kind = match err {
        kube::Error::Api(response) => classify_status(response.code, &response.message),
        kube::Error::HyperError(_) | kube::Error::Service(_) => FailureKind::TransientNetwork,
        _ => FailureKind::Other,
    };
    let message = match err {
        kube::Error::Api(response) => response.message.clone(),
        other => other.to_string(),
    };
    SubmissionFailure::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::launch::{LaunchRequest, RestartPolicy, TrainOptions};

    fn request(configure: impl FnOnce(&mut TrainOptions)) -> CreateManagerRequest {
        let mut options = TrainOptions::new(
            "/tmp/mymodel",
            "foo:v1",
            "job1",
            ResourceSpec::parse("cpu=0.1,memory=1024Mi").unwrap(),
            ResourceSpec::parse("cpu=1,memory=4096Mi").unwrap(),
        );
        configure(&mut options);
        LaunchRequest::build(&options, &ImageConfig::default())
            .unwrap()
            .create_request()
    }

    fn container(pod: &Pod) -> &Container {
        &pod.spec.as_ref().unwrap().containers[0]
    }

    #[test]
    fn pod_is_named_and_labelled_after_the_job() {
        let pod = manager_pod(&request(|_| {}), &ManagerConfig::default());

        assert_eq!(pod.metadata.name.as_deref(), Some("kubelaunch-job1-master"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("default"));
        let labels = pod.metadata.labels.as_ref().unwrap();
        assert_eq!(labels["app"], "kubelaunch");
        assert_eq!(labels["kubelaunch-job-name"], "job1");
        assert_eq!(labels["kubelaunch-replica-type"], "master");
    }

    #[test]
    fn container_runs_manager_command_with_rendered_flags() {
        let request = request(|o| o.master_args = vec!["--epochs=3".to_string()]);
        let pod = manager_pod(&request, &ManagerConfig::default());
        let container = container(&pod);

        assert_eq!(container.name, "master");
        assert_eq!(container.image.as_deref(), Some("foo:v1"));
        assert_eq!(
            container.command.as_deref(),
            Some(&["python".to_string(), "-m".to_string(), "master.main".to_string()][..])
        );
        let args = container.args.as_ref().unwrap();
        assert_eq!(args[..2], ["--job_name", "job1"]);
        assert_eq!(args.last().map(String::as_str), Some("--epochs=3"));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
        assert_eq!(
            pod.spec.as_ref().unwrap().restart_policy.as_deref(),
            Some("Never")
        );
    }

    #[test]
    fn resources_map_to_kubernetes_names() {
        let request = request(|o| {
            o.master_resource_request =
                ResourceSpec::parse("cpu=1,memory=2Gi,disk=10Gi,accelerator=2").unwrap();
        });
        let pod = manager_pod(&request, &ManagerConfig::default());
        let resources = container(&pod).resources.as_ref().unwrap();
        let requests = resources.requests.as_ref().unwrap();

        assert_eq!(requests["cpu"], Quantity("1".to_string()));
        assert_eq!(requests["memory"], Quantity("2Gi".to_string()));
        assert_eq!(requests["ephemeral-storage"], Quantity("10Gi".to_string()));
        assert_eq!(requests["nvidia.com/gpu"], Quantity("2".to_string()));
        assert_eq!(resources.limits, resources.requests);
    }

    #[test]
    fn volume_priority_and_policies_reach_the_pod() {
        let request = request(|o| {
            o.volume_name = Some("nfs1".to_string());
            o.mount_path = Some("/data".to_string());
            o.master_pod_priority = Some("high".to_string());
            o.restart_policy = RestartPolicy::OnFailure;
        });
        let pod = manager_pod(&request, &ManagerConfig::default());
        let spec = pod.spec.as_ref().unwrap();

        let volume = &spec.volumes.as_ref().unwrap()[0];
        let claim = volume.persistent_volume_claim.as_ref().unwrap();
        assert_eq!(claim.claim_name, "nfs1");
        let mount = &container(&pod).volume_mounts.as_ref().unwrap()[0];
        assert_eq!(mount.mount_path, "/data");
        assert_eq!(mount.name, volume.name);
        assert_eq!(spec.priority_class_name.as_deref(), Some("high"));
        assert_eq!(spec.restart_policy.as_deref(), Some("OnFailure"));
    }

    #[test]
    fn no_volume_means_no_mounts() {
        let pod = manager_pod(&request(|_| {}), &ManagerConfig::default());
        assert!(pod.spec.as_ref().unwrap().volumes.is_none());
        assert!(container(&pod).volume_mounts.is_none());
        assert!(pod.spec.as_ref().unwrap().priority_class_name.is_none());
    }

    #[test]
    fn custom_prefix_and_accelerator_resource() {
        let manager = ManagerConfig {
            pod_name_prefix: "ml".to_string(),
            accelerator_resource: "amd.com/gpu".to_string(),
            ..ManagerConfig::default()
        };
        let request = request(|o| {
            o.master_resource_request = ResourceSpec::parse("cpu=1,accelerator=1").unwrap();
        });
        let pod = manager_pod(&request, &manager);

        assert_eq!(pod.metadata.name.as_deref(), Some("ml-job1-master"));
        let requests = container(&pod)
            .resources
            .as_ref()
            .unwrap()
            .requests
            .as_ref()
            .unwrap();
        assert!(requests.contains_key("amd.com/gpu"));
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(classify_status(401, "Unauthorized"), FailureKind::Auth);
        assert_eq!(classify_status(403, "forbidden"), FailureKind::Auth);
        assert_eq!(
            classify_status(403, "pods \"x\" is forbidden: exceeded quota: compute"),
            FailureKind::Quota
        );
        assert_eq!(classify_status(409, "already exists"), FailureKind::NameCollision);
        assert_eq!(classify_status(422, "invalid"), FailureKind::Invalid);
        assert_eq!(classify_status(503, "unavailable"), FailureKind::TransientNetwork);
        assert_eq!(classify_status(404, "namespace not found"), FailureKind::Other);
    }
}
