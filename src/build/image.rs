//! Image build and push, driven through an [`ImageBackend`].
//!
//! Backends report progress as a finite stream of events. Build output is
//! forwarded line by line as it arrives. The first error event ends the
//! build: the stream is dropped without pulling further events.

use super::context::BuildContext;
use crate::error::{LaunchError, LaunchResult};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Log(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Status(String),
    Error(String),
}

pub trait ImageBackend: Send + Sync {
    /// Build `tag` from `context_dir`. `build_file` lies inside `context_dir`.
    fn build<'a>(
        &'a self,
        context_dir: &'a Path,
        build_file: &'a Path,
        tag: &'a str,
    ) -> BoxStream<'a, BuildEvent>;

    fn push<'a>(&'a self, tag: &'a str) -> BoxStream<'a, PushEvent>;
}

/// Build `tag` from `context`, writing build output to `out` as it streams in.
pub async fn build_image<B, W>(
    backend: &B,
    context: &BuildContext,
    tag: &str,
    out: &mut W,
) -> LaunchResult<()>
where
    B: ImageBackend + ?Sized,
    W: Write,
{
    tracing::info!(tag, context = %context.path().display(), "Building image");
    let mut events = backend.build(context.path(), context.build_file(), tag);

    while let Some(event) = events.next().await {
        match event {
            BuildEvent::Log(text) => {
                out.write_all(text.as_bytes())
                    .and_then(|()| out.flush())
                    .map_err(LaunchError::Output)?;
            }
            BuildEvent::Error(message) => {
                tracing::debug!(tag, "Build stream reported an error, aborting");
                return Err(LaunchError::BuildFailed(message));
            }
        }
    }

    tracing::info!(tag, "Image built");
    Ok(())
}

/// Push `tag`, writing each status update to `out`.
pub async fn push_image<B, W>(backend: &B, tag: &str, out: &mut W) -> LaunchResult<()>
where
    B: ImageBackend + ?Sized,
    W: Write,
{
    tracing::info!(tag, "Pushing image");
    let mut events = backend.push(tag);

    while let Some(event) = events.next().await {
        match event {
            PushEvent::Status(status) => {
                writeln!(out, "{status}")
                    .and_then(|()| out.flush())
                    .map_err(LaunchError::Output)?;
            }
            PushEvent::Error(message) => return Err(LaunchError::PushFailed(message)),
        }
    }

    tracing::info!(tag, "Image pushed");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::stream;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned events and records what it was asked to do.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        pub build_events: Vec<BuildEvent>,
        pub push_events: Vec<PushEvent>,
        pub built: Mutex<Vec<(PathBuf, String, String)>>,
        pub context_existed: Mutex<Vec<bool>>,
        pub pushed: Mutex<Vec<String>>,
        pub build_events_pulled: AtomicUsize,
    }

    impl ScriptedBackend {
        pub(crate) fn new(build_events: Vec<BuildEvent>, push_events: Vec<PushEvent>) -> Self {
            Self {
                build_events,
                push_events,
                ..Default::default()
            }
        }

        pub(crate) fn built_context(&self) -> Option<PathBuf> {
            self.built.lock().unwrap().first().map(|(dir, _, _)| dir.clone())
        }
    }

    impl ImageBackend for ScriptedBackend {
        fn build<'a>(
            &'a self,
            context_dir: &'a Path,
            build_file: &'a Path,
            tag: &'a str,
        ) -> BoxStream<'a, BuildEvent> {
            self.built.lock().unwrap().push((
                context_dir.to_path_buf(),
                build_file.to_string_lossy().into_owned(),
                tag.to_string(),
            ));
            self.context_existed
                .lock()
                .unwrap()
                .push(context_dir.exists() && build_file.exists());

            stream::iter(self.build_events.clone())
                .inspect(|_| {
                    self.build_events_pulled.fetch_add(1, Ordering::SeqCst);
                })
                .boxed()
        }

        fn push<'a>(&'a self, tag: &'a str) -> BoxStream<'a, PushEvent> {
            self.pushed.lock().unwrap().push(tag.to_string());
            stream::iter(self.push_events.clone()).boxed()
        }
    }
}
