//! Packages a model directory into a container image and launches the
//! training master on Kubernetes.

pub mod build;
pub mod cluster;
pub mod config;
pub mod core;
pub mod error;
pub mod launch;
pub mod pipeline;
pub mod resource;
pub mod shutdown;
pub mod tls;
pub mod utils;

pub use error::{LaunchError, LaunchResult};
