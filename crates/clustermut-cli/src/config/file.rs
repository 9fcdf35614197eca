use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use clustermut::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum FileOutputFormat {
    Toml,
    Xyz,
}

impl From<FileOutputFormat> for OutputFormat {
    fn from(p: FileOutputFormat) -> Self {
        match p {
            FileOutputFormat::Toml => OutputFormat::Toml,
            FileOutputFormat::Xyz => OutputFormat::Xyz,
        }
    }
}

/// Run settings read from a TOML file. Every field may be overridden on the
/// command line.
///
/// ```toml
/// count = 8
/// seed = 42
/// format = "xyz"
///
/// [packing]
/// order = "by-size"
/// box-increment = 3.0
/// max-resets = 10
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub count: Option<usize>,
    pub seed: Option<u64>,
    pub format: Option<FileOutputFormat>,
    pub packing: Option<core_config::PackingConfigBuilder>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Applies `f` to the packing builder, creating it first if needed.
    pub fn update_packing(
        &mut self,
        f: impl FnOnce(core_config::PackingConfigBuilder) -> core_config::PackingConfigBuilder,
    ) {
        let packing = self.packing.take().unwrap_or_default();
        self.packing = Some(f(packing));
    }
}
