//! # Storefront Operator CLI
//!
//! Read-mostly commands against the configured storefront service.
//!
//! ## Usage
//! ```bash
//! # List stores
//! cargo run -p storefront-client --bin storefront -- stores
//!
//! # Stock view for HQ, or for store 3
//! cargo run -p storefront-client --bin storefront -- stock
//! cargo run -p storefront-client --bin storefront -- stock 3
//!
//! # Reconcile store 3 and send unsold stock back to HQ
//! cargo run -p storefront-client --bin storefront -- reconcile 3 --return-stock
//!
//! # Past reconciliations / order summary
//! cargo run -p storefront-client --bin storefront -- history 3
//! cargo run -p storefront-client --bin storefront -- summary [3]
//!
//! # Order search by customer
//! cargo run -p storefront-client --bin storefront -- orders --name jane --phone 0300
//!
//! # Explicit config file
//! cargo run -p storefront-client --bin storefront -- --config ./storefront.toml stores
//! ```
//!
//! Output is pretty-printed JSON on stdout. Errors go to stderr with exit
//! code 1.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;
use storefront::{telemetry, ClientConfig, ClientError, ClientResult, HttpBackend, PosSession, RetryPolicy};
use storefront_core::{OrderQuery, StoreContext, StoreId};
use tracing::info;

#[derive(Debug, PartialEq)]
enum Command {
    Stores,
    Stock(StoreContext),
    Reconcile { store: StoreId, return_stock: bool },
    History(StoreId),
    Summary(Option<StoreId>),
    Orders(OrderQuery),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StockRow<'a> {
    sku: &'a str,
    name: &'a str,
    kind: String,
    price: String,
    available: u32,
}

fn print_help() {
    println!("Storefront POS Operator CLI");
    println!();
    println!("Usage: storefront [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  stores                          List stores");
    println!("  stock [STORE_ID|hq]             Stock view (default: hq)");
    println!("  reconcile STORE_ID [--return-stock]");
    println!("                                  Reconcile a store");
    println!("  history STORE_ID                Past reconciliations of a store");
    println!("  summary [STORE_ID]              Order reconciliation summary");
    println!("  orders [--name N] [--phone P]   Search past orders by customer");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Config file (default: platform config dir)");
    println!("  -h, --help            Show this help message");
}

fn parse_store(value: Option<&String>) -> ClientResult<StoreId> {
    let value = value.ok_or_else(|| ClientError::InvalidConfig("missing STORE_ID".into()))?;
    value
        .parse::<i64>()
        .map(StoreId)
        .map_err(|_| ClientError::InvalidConfig(format!("invalid STORE_ID: {}", value)))
}

/// The value following the flag at `args[i]`.
fn flag_value<'a>(args: &'a [String], i: usize) -> ClientResult<&'a String> {
    args.get(i + 1)
        .ok_or_else(|| ClientError::InvalidConfig(format!("missing value for {}", args[i])))
}

/// `Ok(None)` means help was printed.
fn parse_args(args: &[String]) -> ClientResult<Option<(Option<PathBuf>, Command)>> {
    let mut config_path = None;
    let mut positional: Vec<&String> = Vec::new();
    let mut return_stock = false;
    let mut customer_name = None;
    let mut customer_phone = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(flag_value(args, i)?));
                i += 1;
            }
            "--name" => {
                customer_name = Some(flag_value(args, i)?.as_str());
                i += 1;
            }
            "--phone" => {
                customer_phone = Some(flag_value(args, i)?.as_str());
                i += 1;
            }
            "--return-stock" => return_stock = true,
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    let command = match positional.first().map(|s| s.as_str()) {
        Some("stores") => Command::Stores,
        Some("stock") => match positional.get(1) {
            Some(value) => Command::Stock(
                value
                    .parse()
                    .map_err(|e: storefront_core::ValidationError| ClientError::InvalidConfig(e.to_string()))?,
            ),
            None => Command::Stock(StoreContext::Hq),
        },
        Some("reconcile") => Command::Reconcile {
            store: parse_store(positional.get(1).copied())?,
            return_stock,
        },
        Some("history") => Command::History(parse_store(positional.get(1).copied())?),
        Some("summary") => Command::Summary(
            positional
                .get(1)
                .map(|value| parse_store(Some(*value)))
                .transpose()?,
        ),
        Some("orders") => Command::Orders(OrderQuery::new(customer_name, customer_phone)),
        Some(other) => {
            return Err(ClientError::InvalidConfig(format!("unknown command: {}", other)))
        }
        None => {
            print_help();
            return Ok(None);
        }
    };

    Ok(Some((config_path, command)))
}

fn print_json<T: Serialize>(value: &T) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session_for(config: &ClientConfig, context: StoreContext) -> ClientResult<PosSession> {
    let backend = HttpBackend::from_config(config)?;
    Ok(PosSession::new(Arc::new(backend), context, config.capabilities())
        .with_retry(RetryPolicy::from(&config.retry)))
}

async fn run(config: ClientConfig, command: Command) -> ClientResult<()> {
    match command {
        Command::Stores => {
            let session = session_for(&config, StoreContext::Hq)?;
            print_json(&session.list_stores().await?)
        }
        Command::Stock(context) => {
            let session = session_for(&config, context)?;
            let snapshot = session.reload_stock().await?;
            let rows: Vec<StockRow<'_>> = snapshot
                .entries()
                .into_iter()
                .map(|entry| StockRow {
                    sku: &entry.product.sku,
                    name: &entry.product.name,
                    kind: entry.product.kind().to_string(),
                    price: entry.product.price.to_decimal_string(),
                    available: entry.available,
                })
                .collect();
            print_json(&rows)
        }
        Command::Reconcile {
            store,
            return_stock,
        } => {
            let session = session_for(&config, StoreContext::Store(store))?;
            print_json(&session.reconcile(return_stock).await?)
        }
        Command::History(store) => {
            let session = session_for(&config, StoreContext::Store(store))?;
            print_json(&session.reconciliation_history(store).await?)
        }
        Command::Summary(store) => {
            let session = session_for(&config, StoreContext::Hq)?;
            print_json(&session.order_reconciliation_summary(store).await?)
        }
        Command::Orders(query) => {
            let session = session_for(&config, StoreContext::Hq)?;
            print_json(&session.list_orders(&query).await?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let args: Vec<String> = env::args().collect();
    let (config_path, command) = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::FAILURE;
        }
    };

    let config = match ClientConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(server = %config.server.base_url, "Storefront CLI");

    match run(config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
