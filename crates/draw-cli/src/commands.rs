use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use colored::Colorize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use draw_sdk::{
    ClientConfig, ConfiguredTrigger, Identity, InMemoryLedger, PurchaseError, Session,
    SimulatedWallet,
};

use crate::cli::*;
use crate::market;
use crate::render;

struct Context {
    config: ClientConfig,
    format: OutputFormat,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(wallet) = cli.wallet {
        config.wallet = Some(wallet);
        config.validate()?;
    }
    let ctx = Context {
        config,
        format: cli.format,
    };

    match cli.command {
        Command::Status(_) => cmd_status(&ctx).await,
        Command::Buy(args) => cmd_buy(&ctx, args).await,
        Command::Watch(args) => cmd_watch(&ctx, args).await,
        Command::Config(_) => cmd_config(&ctx),
    }
}

/// Connect to a fresh in-memory ledger with the configured wallet.
async fn connect(config: &ClientConfig) -> anyhow::Result<(Arc<InMemoryLedger>, Session)> {
    let identity = config.wallet_identity()?.unwrap_or_else(Identity::random);
    let ledger = config.simulation.build_ledger(&identity)?;
    let wallet = SimulatedWallet::new(Arc::clone(&ledger), identity);
    let session = Session::connect(&wallet, config).await?;
    Ok((ledger, session))
}

async fn cmd_status(ctx: &Context) -> anyhow::Result<()> {
    let (_ledger, session) = connect(&ctx.config).await?;
    session.refresh().await?;

    let mut sink = render::sink(ctx.format);
    if let OutputFormat::Text = ctx.format {
        println!("{}", render::format_prizes(session.constants()));
    }
    session.render(sink.as_mut());
    Ok(())
}

async fn cmd_buy(ctx: &Context, args: BuyArgs) -> anyhow::Result<()> {
    let (_ledger, session) = connect(&ctx.config).await?;
    session.refresh().await?;
    let mut sink = render::sink(ctx.format);

    for bought in 0..args.count {
        match session.purchase_and_render(sink.as_mut()).await {
            Ok(settlement) => match ctx.format {
                OutputFormat::Text => println!("{}", render::format_receipt(&settlement.receipt)),
                OutputFormat::Json => {
                    println!("{}", json!({ "receipt": render::receipt_json(&settlement.receipt) }))
                }
            },
            Err(PurchaseError::AlreadyInFlight) => {
                anyhow::bail!("a purchase is already in flight")
            }
            Err(PurchaseError::Failed { failure, .. }) => {
                anyhow::bail!("stopped after {bought} of {} purchases: {failure}", args.count)
            }
        }
    }
    Ok(())
}

async fn cmd_watch(ctx: &Context, args: WatchArgs) -> anyhow::Result<()> {
    let (ledger, session) = connect(&ctx.config).await?;
    let viewer = session.identity().clone();
    let mut events = session
        .events()
        .context("the wallet does not expose ledger events")?;
    let mut adopted = session.subscribe();

    let (trigger, handle) = ConfiguredTrigger::from_config(&ctx.config, &session)?;
    let refresh_task = session.spawn_refresh_loop(trigger);
    let market_task = tokio::spawn(market::simulate(
        Arc::clone(&ledger),
        Duration::from_millis(args.market_interval_ms),
        handle,
    ));
    if let OutputFormat::Text = ctx.format {
        println!(
            "Watching as {} ({:?} refresh)\n",
            viewer.short().cyan(),
            ctx.config.trigger
        );
    }

    let mut sink = render::sink(ctx.format);
    let mut ticks = 0;
    while ticks < args.ticks {
        tokio::select! {
            changed = adopted.changed() => {
                if changed.is_err() {
                    break;
                }
                session.render(sink.as_mut());
                ticks += 1;
            }
            event = events.recv() => match event {
                Ok(event) => match ctx.format {
                    OutputFormat::Text => {
                        if let Some(line) = render::format_event(&event, &viewer) {
                            println!("{line}\n");
                        }
                    }
                    OutputFormat::Json => println!("{}", json!({ "event": event })),
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    market_task.abort();
    refresh_task.abort();
    Ok(())
}

fn cmd_config(ctx: &Context) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Text => print!("{}", ctx.config.to_toml_string()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ctx.config)?),
    }
    Ok(())
}
