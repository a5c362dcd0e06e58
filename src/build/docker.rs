//! Docker Engine backend for [`ImageBackend`], using bollard.

use super::image::{BuildEvent, ImageBackend, PushEvent};
use crate::error::{LaunchError, LaunchResult};
use bollard::query_parameters::{BuildImageOptionsBuilder, PushImageOptionsBuilder};
use bollard::Docker;
use futures::stream::{self, BoxStream};
use futures::{future, StreamExt};
use std::io;
use std::path::Path;

#[derive(Clone)]
pub struct DockerBackend {
    client: Docker,
}

impl DockerBackend {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    pub fn connect() -> LaunchResult<Self> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| LaunchError::BuildFailed(format!("cannot connect to Docker: {e}")))?;
        Ok(Self { client })
    }
}

/// Pack the build context into an uncompressed tar archive.
fn archive_context(context_dir: &Path) -> io::Result<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());
    archive.follow_symlinks(true);
    archive.append_dir_all(".", context_dir)?;
    archive.into_inner()
}

/// Split `repo[:tag]` into repository and tag. A colon inside a registry
/// host (`host:5000/repo`) is not a tag separator.
fn split_tag(image: &str) -> (&str, Option<&str>) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, Some(tag)),
        _ => (image, None),
    }
}

impl ImageBackend for DockerBackend {
    fn build<'a>(
        &'a self,
        context_dir: &'a Path,
        build_file: &'a Path,
        tag: &'a str,
    ) -> BoxStream<'a, BuildEvent> {
        let dockerfile = build_file
            .strip_prefix(context_dir)
            .unwrap_or(build_file)
            .to_string_lossy()
            .into_owned();
        let context_dir = context_dir.to_path_buf();
        let archived = async move {
            tokio::task::spawn_blocking(move || archive_context(&context_dir))
                .await
                .unwrap_or_else(|e| Err(io::Error::other(e)))
        };

        stream::once(archived)
            .flat_map(move |archive| match archive {
                Ok(archive) => {
                    tracing::debug!(%dockerfile, bytes = archive.len(), "Sending build context to Docker");
                    let options = BuildImageOptionsBuilder::default()
                        .dockerfile(&dockerfile)
                        .t(tag)
                        .rm(true)
                        .build();
                    self.client
                        .build_image(options, None, Some(bollard::body_full(archive.into())))
                        .filter_map(|item| {
                            future::ready(match item {
                                Ok(info) => match (info.error, info.stream) {
                                    (Some(error), _) => Some(BuildEvent::Error(error)),
                                    (None, Some(text)) => Some(BuildEvent::Log(text)),
                                    (None, None) => None,
                                },
                                Err(e) => Some(BuildEvent::Error(e.to_string())),
                            })
                        })
                        .boxed()
                }
                Err(e) => {
                    let message = format!("failed to archive build context: {e}");
                    stream::once(future::ready(BuildEvent::Error(message))).boxed()
                }
            })
            .boxed()
    }

    fn push<'a>(&'a self, tag: &'a str) -> BoxStream<'a, PushEvent> {
        let (repo, image_tag) = split_tag(tag);
        let mut options = PushImageOptionsBuilder::default();
        if let Some(image_tag) = image_tag {
            options = options.tag(image_tag);
        }

        self.client
            .push_image(repo, Some(options.build()), None)
            .filter_map(|item| {
                future::ready(match item {
                    Ok(info) => match (info.error, info.status) {
                        (Some(error), _) => Some(PushEvent::Error(error)),
                        (None, Some(status)) => Some(PushEvent::Status(status)),
                        (None, None) => None,
                    },
                    Err(e) => Some(PushEvent::Error(e.to_string())),
                })
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn splits_repository_and_tag() {
        assert_eq!(split_tag("foo:v1"), ("foo", Some("v1")));
        assert_eq!(split_tag("foo"), ("foo", None));
        assert_eq!(
            split_tag("registry.local:5000/team/foo:v2"),
            ("registry.local:5000/team/foo", Some("v2"))
        );
        assert_eq!(
            split_tag("registry.local:5000/team/foo"),
            ("registry.local:5000/team/foo", None)
        );
    }

    #[test]
    fn archive_contains_context_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("mymodel")).unwrap();
        fs::write(dir.path().join("mymodel/model.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("Dockerfile.kubelaunch"), "FROM scratch\n").unwrap();

        let bytes = archive_context(dir.path()).unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();

        assert!(names.iter().any(|n| n.ends_with("mymodel/model.py")));
        assert!(names.iter().any(|n| n.ends_with("Dockerfile.kubelaunch")));
    }
}
