use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::{CollisionStrategyArg, OutputFormat, PackArgs, PackingOrderArg};
use crate::error::{CliError, Result};
use clustermut::core::collision::CollisionStrategy;
use clustermut::engine::config as core_config;
use std::path::Path;
use std::str::FromStr;

impl From<PackingOrderArg> for core_config::PackingOrder {
    fn from(p: PackingOrderArg) -> Self {
        match p {
            PackingOrderArg::Ascending => core_config::PackingOrder::Ascending,
            PackingOrderArg::Random => core_config::PackingOrder::Random,
            PackingOrderArg::BySize => core_config::PackingOrder::BySize,
        }
    }
}

impl From<CollisionStrategyArg> for CollisionStrategy {
    fn from(p: CollisionStrategyArg) -> Self {
        match p {
            CollisionStrategyArg::Pairwise => CollisionStrategy::Pairwise,
            CollisionStrategyArg::Spatial => CollisionStrategy::Spatial,
        }
    }
}

pub fn build_config(args: &PackArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let count = args
        .count
        .or(file_config.count)
        .unwrap_or(defaults.count);
    if count == 0 {
        return Err(CliError::Argument(
            "The number of structures to pack must be at least 1.".to_string(),
        ));
    }
    let seed = args.seed.or(file_config.seed);
    let format = args
        .format
        .or(file_config.format.map(Into::into))
        .or_else(|| infer_format(&args.output))
        .unwrap_or(defaults.format);

    let mut packing = file_config.packing.take().unwrap_or_default();
    if let Some(order) = args.order {
        packing = packing.order(order.into());
    }
    if let Some(increment) = args.box_increment {
        packing = packing.box_increment(increment);
    }
    if let Some(max_resets) = args.max_resets {
        packing = packing.max_resets(max_resets);
    }
    if let Some(strategy) = args.collision_detection {
        packing = packing.collision_detection(strategy.into());
    }
    let core_config = packing
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_template: args.output.clone(),
        format,
        count,
        seed,
        core_config,
    })
}

fn infer_format(output: &Path) -> Option<OutputFormat> {
    let extension = output.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "xyz" => Some(OutputFormat::Xyz),
        "toml" => Some(OutputFormat::Toml),
        _ => None,
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_order(key: &str, value: &str) -> Result<core_config::PackingOrder> {
    match value {
        "ascending" => Ok(core_config::PackingOrder::Ascending),
        "random" => Ok(core_config::PackingOrder::Random),
        "by-size" => Ok(core_config::PackingOrder::BySize),
        _ => Err(CliError::Config(format!(
            "Invalid packing order for {}: '{}'. Expected ascending, random, or by-size.",
            key, value
        ))),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "count" => config.count = Some(parse_value(key, value_str, "integer")?),
            "seed" => config.seed = Some(parse_value(key, value_str, "integer")?),
            "packing.order" => {
                let order = parse_order(key, value_str)?;
                config.update_packing(|p| p.order(order));
            }
            "packing.collision-blow-factor" => {
                let v = parse_value(key, value_str, "float")?;
                config.update_packing(|p| p.collision_blow_factor(v));
            }
            "packing.dissociation-blow-factor" => {
                let v = parse_value(key, value_str, "float")?;
                config.update_packing(|p| p.dissociation_blow_factor(v));
            }
            "packing.box-increment" => {
                let v = parse_value(key, value_str, "float")?;
                config.update_packing(|p| p.box_increment(v));
            }
            "packing.attempts-before-inflation" => {
                let v = parse_value(key, value_str, "integer")?;
                config.update_packing(|p| p.attempts_before_inflation(v));
            }
            "packing.tries-before-reset" => {
                let v = parse_value(key, value_str, "integer")?;
                config.update_packing(|p| p.tries_before_reset(v));
            }
            "packing.max-resets" => {
                let v = parse_value(key, value_str, "integer")?;
                config.update_packing(|p| p.max_resets(v));
            }
            "packing.max-environment-attempts" => {
                let v = parse_value(key, value_str, "integer")?;
                config.update_packing(|p| p.max_environment_attempts(v));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
