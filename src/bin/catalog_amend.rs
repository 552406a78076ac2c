//! catalog-amend: apply one version update from the command line
//!
//! ```text
//! catalog-amend <dataset_id> <edition> <version> <update.json>
//!               [--if-match <etag>] [--has-downloads] [--config <path>]
//! ```
//!
//! Loads configuration, opens the configured store, runs one transition and
//! prints the persisted version as JSON on stdout.
//!
//! ## Configuration
//! - CATALOG_CONFIG: path to a YAML config file (or `--config`)
//! - CATALOG__STORAGE__TYPE: `memory` or `sqlite`
//! - CATALOG_LOG: tracing filter (default: info)

use std::path::PathBuf;

use tracing::{error, info};

use dataset_catalog::config::Config;
use dataset_catalog::models::{Version, VersionIdentifiers};
use dataset_catalog::storage::init_storage;
use dataset_catalog::utils::bootstrap::{init_tracing, parse_config_path};
use dataset_catalog::workflow::{AmendOptions, StateMachine};

const USAGE: &str = "usage: catalog-amend <dataset_id> <edition> <version> <update.json> \
                     [--if-match <etag>] [--has-downloads] [--config <path>]";

#[derive(Debug)]
struct Args {
    identifiers: VersionIdentifiers,
    update_path: PathBuf,
    options: AmendOptions,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut options = AmendOptions::default();

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--if-match" => {
                let etag = args.next().ok_or("--if-match needs a value")?;
                options = options.if_match(etag);
            }
            "--has-downloads" => options = options.has_downloads(true),
            "--config" => {
                args.next();
            }
            other if other.starts_with("--config=") => {}
            other if other.starts_with("--") => return Err(format!("unknown flag {other}")),
            _ => positional.push(arg),
        }
    }

    let [dataset_id, edition, version, update_path]: [String; 4] = positional
        .try_into()
        .map_err(|_| USAGE.to_string())?;

    Ok(Args {
        identifiers: VersionIdentifiers::new(dataset_id, edition, version),
        update_path: PathBuf::from(update_path),
        options,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = parse_args(std::env::args()).inspect_err(|e| eprintln!("{e}"))?;
    let config = Config::load(parse_config_path().as_deref())?;

    let raw = std::fs::read_to_string(&args.update_path)?;
    let update: Version = serde_json::from_str(&raw)?;

    let store = init_storage(&config.storage, config.locks.acquire_timeout()).await?;
    let machine = StateMachine::from_config(store, &config)?;

    info!(
        dataset_id = %args.identifiers.dataset_id,
        edition = %args.identifiers.edition,
        version = %args.identifiers.version,
        "catalog-amend started"
    );

    match machine
        .amend_version(&args.identifiers, update, args.options)
        .await
    {
        Ok(persisted) => {
            println!("{}", serde_json::to_string_pretty(&persisted)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "amend failed");
            Err(e.into())
        }
    }
}
