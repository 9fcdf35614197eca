use crate::cli::OutputFormat;
use clustermut::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_template: PathBuf,
    pub format: OutputFormat,
    pub count: usize,
    /// `None` draws a fresh seed at run time.
    pub seed: Option<u64>,
    pub core_config: core_config::PackingConfig,
}
