//! R-Droid Bundletool
//!
//! Thin command-line wrapper around the engine: reads JSON inputs, prints
//! JSON or CSV results.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use r_droid_bundletool::build::format_size;
use r_droid_bundletool::prelude::*;
use r_droid_core::{APP_NAME, VERSION};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "usage:
  r-droid-bundletool match <device.json> <catalog.json>
  r-droid-bundletool split <modules.json>
  r-droid-bundletool sizes <catalog.json> <sizes.json> [dimensions] [device.json]
  r-droid-bundletool config";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("{} v{} starting...", APP_NAME, VERSION);

    let config = EngineConfig::load().await?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["config"] => {
            if let Some(path) = EngineConfig::config_file() {
                info!("Config file: {:?}", path);
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ["match", device, catalog] => {
            let engine = Engine::new(config)?;
            let device: DeviceSpec = read_json(Path::new(device)).await?;
            let catalog: ApkCatalog = read_json(Path::new(catalog)).await?;
            catalog.validate()?;
            let apks = engine
                .select_apks(&device, &catalog)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&apks)?);
        }
        ["split", modules] => {
            let engine = Engine::new(config)?;
            let modules: Vec<ModuleSplit> = read_json(Path::new(modules)).await?;
            let splits = engine.split_modules(modules)?;
            for split in &splits {
                info!("{}: {} entries, {}", split.split_id(), split.entries.len(), format_size(split.total_size()));
            }
            println!("{}", serde_json::to_string_pretty(&splits)?);
        }
        ["sizes", catalog, sizes, rest @ ..] => {
            let human_readable = config.sizes.human_readable;
            let engine = Engine::new(config)?;
            let catalog: ApkCatalog = read_json(Path::new(catalog)).await?;
            catalog.validate()?;
            let sizes: BTreeMap<String, u64> = read_json(Path::new(sizes)).await?;

            let device = match rest.get(1) {
                Some(path) => Some(read_json::<DeviceSpec>(Path::new(path)).await?),
                None => None,
            };
            let mut request = engine.size_request(None, device)?;
            if let Some(names) = rest.first() {
                request = request.with_dimension_names(names)?;
            }
            let estimate = engine
                .estimate_sizes(&catalog, &sizes, &request)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            let dimensions: Vec<TargetingDimension> = request.dimensions.iter().copied().collect();
            println!("{}", estimate.to_csv(&dimensions, human_readable));
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

/// Read and parse a JSON input file
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
