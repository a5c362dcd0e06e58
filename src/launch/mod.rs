//! Launch-request construction from validated options.

pub mod options;
pub mod request;

pub use options::{ImagePullPolicy, RestartPolicy, TrainOptions};
pub use request::{
    pair_volume, CreateManagerRequest, LaunchRequest, ManagerArgs, ResourceBounds, VolumeBinding,
};
