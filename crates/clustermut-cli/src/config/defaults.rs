use crate::cli::OutputFormat;

pub struct DefaultsConfig {
    pub count: usize,
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            count: 1,
            format: OutputFormat::Toml,
        }
    }
}
