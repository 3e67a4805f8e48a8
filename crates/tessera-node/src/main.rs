//! tessera-node: runs the fee engine on a single node.
//!
//! ```text
//! tessera-node                 print the fee schedule at the current price
//! tessera-node run <blocks>    advance the oracle by <blocks> blocks
//! ```

use anyhow::Context;
use tessera_node::{App, NodeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = NodeConfig::load()?;

    // 2. Initialize tracing; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(home = %NodeConfig::home_dir().display(), "Tessera node starting");

    // 3. Build state from genesis
    let mut app = App::new(config)?;

    // 4. Dispatch
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("schedule") => print_schedule(&app)?,
        Some("run") => {
            let blocks: u64 = args
                .get(1)
                .context("usage: tessera-node run <blocks>")?
                .parse()
                .context("<blocks> must be a number")?;
            for _ in 0..blocks {
                for event in app.end_block()? {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            info!(height = app.height(), "run complete");
            print_schedule(&app)?;
        }
        Some(other) => anyhow::bail!("unknown command {other:?}"),
    }
    Ok(())
}

fn print_schedule(app: &App) -> anyhow::Result<()> {
    let price = app.price()?;
    let symbol = &app.config().chain.symbol;
    let exponent = app.fee_config().native_exponent;
    let tokens = |amount: u128| whole(amount, exponent);
    println!("price: {price} USD/{symbol}");
    for (op, bounds) in app.fee_schedule()? {
        let ceiling = bounds
            .ceiling
            .map_or_else(|| "unbounded".to_string(), tokens);
        println!(
            "{:<24} {:>20} .. {:<20} {symbol}",
            op.to_string(),
            tokens(bounds.floor),
            ceiling
        );
    }
    Ok(())
}

/// Render a base-denom amount in whole tokens of `exponent` decimals.
fn whole(amount: u128, exponent: u32) -> String {
    match 10u128.checked_pow(exponent) {
        Some(unit) if exponent > 0 => {
            let width = exponent as usize;
            format!("{}.{:0>width$}", amount / unit, amount % unit)
        }
        _ => amount.to_string(),
    }
}
