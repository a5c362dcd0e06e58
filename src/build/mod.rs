//! Packaging of user code into a launchable image.

pub mod context;
pub mod docker;
pub mod image;
pub mod instruction;
pub mod template;

pub use context::{validate_framework_dir, validate_model_def, BuildContext};
pub use image::{build_image, push_image, BuildEvent, ImageBackend, PushEvent};
pub use instruction::{BuildFile, Instruction};
pub use template::{model_path_in_image, plan_build_file, BuildSpec};
