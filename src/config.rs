use crate::core::{get_config_dir, get_data_dir};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    /// Resource strings used when the command line leaves them out
    #[serde(default)]
    pub defaults: ResourceDefaults,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ImageConfig {
    /// Root under which the user's model directory lives inside the image.
    /// The master derives model paths from `model_root + basename(model_def)`.
    #[serde(default = "default_model_root")]
    pub model_root: String,
    /// Base image used when `--image_base` is not given
    #[serde(default = "default_base_image")]
    pub default_base: String,
    /// Framework source tree staged next to the user's code.
    /// Falls back to `<data_dir>/kubelaunch/framework`.
    #[serde(default)]
    pub framework_dir: Option<PathBuf>,
    /// Environment variable extended with the framework and model roots
    #[serde(default = "default_search_path_var")]
    pub search_path_var: String,
    /// Package installer; `-r <file>` is appended
    #[serde(default = "default_install_command")]
    pub install_command: String,
    /// Installer flag naming an extra package index
    #[serde(default = "default_extra_index_flag")]
    pub extra_index_flag: String,
    /// Command run after the framework's dependencies are installed.
    /// `{framework}` is replaced with the framework's path in the image.
    /// An empty command is skipped.
    #[serde(default = "default_framework_build")]
    pub framework_build: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ManagerConfig {
    /// Entry point of the master container; the rendered flags follow it
    #[serde(default = "default_manager_command")]
    pub command: Vec<String>,
    #[serde(default = "default_pod_name_prefix")]
    pub pod_name_prefix: String,
    /// Extended resource name for `accelerator=<n>`
    #[serde(default = "default_accelerator_resource")]
    pub accelerator_resource: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResourceDefaults {
    #[serde(default = "default_master_resource_request")]
    pub master_resource_request: String,
    #[serde(default = "default_worker_resource_request")]
    pub worker_resource_request: String,
    #[serde(default = "default_worker_resource_limit")]
    pub worker_resource_limit: String,
}

fn default_model_root() -> String {
    "/model".to_string()
}

fn default_base_image() -> String {
    "tensorflow/tensorflow:2.0.0b0-py3".to_string()
}

fn default_search_path_var() -> String {
    "PYTHONPATH".to_string()
}

fn default_install_command() -> String {
    "pip install".to_string()
}

fn default_extra_index_flag() -> String {
    "--extra-index-url".to_string()
}

fn default_framework_build() -> Option<String> {
    Some("make -f {framework}/Makefile".to_string())
}

fn default_manager_command() -> Vec<String> {
    vec!["python".to_string(), "-m".to_string(), "master.main".to_string()]
}

fn default_pod_name_prefix() -> String {
    "kubelaunch".to_string()
}

fn default_accelerator_resource() -> String {
    "nvidia.com/gpu".to_string()
}

fn default_master_resource_request() -> String {
    "cpu=0.1,memory=1024Mi".to_string()
}

fn default_worker_resource_request() -> String {
    "cpu=1,memory=4096Mi".to_string()
}

fn default_worker_resource_limit() -> String {
    "cpu=1,memory=4096Mi".to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model_root: default_model_root(),
            default_base: default_base_image(),
            framework_dir: None,
            search_path_var: default_search_path_var(),
            install_command: default_install_command(),
            extra_index_flag: default_extra_index_flag(),
            framework_build: default_framework_build(),
        }
    }
}

impl ImageConfig {
    /// Framework tree to stage, falling back to the per-user data directory.
    pub fn framework_dir(&self) -> Option<PathBuf> {
        self.framework_dir
            .clone()
            .or_else(|| get_data_dir().ok().map(|dir| dir.join("framework")))
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            command: default_manager_command(),
            pod_name_prefix: default_pod_name_prefix(),
            accelerator_resource: default_accelerator_resource(),
        }
    }
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            master_resource_request: default_master_resource_request(),
            worker_resource_request: default_worker_resource_request(),
            worker_resource_limit: default_worker_resource_limit(),
        }
    }
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let mut config_vec = vec![];

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            tracing::warn!("Config file {config_path:?} not found.");
        }
    }

    // Default config file
    if let Ok(default_config_path) = get_config_dir().map(|d| d.join("kubelaunch.toml")) {
        if default_config_path.exists() {
            config_vec.push(default_config_path);
        }
    }

    let settings = config::Config::builder();
    let settings = config_vec.iter().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    settings
        .add_source(
            config::Environment::with_prefix("KUBELAUNCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("manager.command"),
        )
        .build()?
        .try_deserialize()
}
