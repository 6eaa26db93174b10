//! Console Bot
//!
//! Feeds lines from standard input through the Wayfarer runtime as chat
//! messages. A line may start with `#<server id>` to pretend it was sent in
//! a server; otherwise it is a direct message from user 1.
//!
//! ```text
//! %ping
//! %greet <@42> welcome aboard
//! %greet channel <#7>
//! %roll 20
//! %settings prefix show
//! #42 %ping
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use wayfarer::prelude::*;

const CONSOLE_USER: u64 = 1;

// ============================================================================
// Handlers
// ============================================================================

async fn ping(_ctx: Arc<CommandContext>) {
    println!("Pong!");
}

async fn greet(ctx: Arc<CommandContext>) {
    let Some(schema) = ctx.schema() else {
        println!("usage: greet <user> [message] | greet channel <channel>");
        return;
    };

    if schema.has_identifier("channel") {
        if let Some(channel) = schema.channel("target") {
            println!("Hello everyone in <#{channel}>!");
        }
        return;
    }

    let user = schema.user("user").unwrap_or_default();
    match schema.text("message") {
        Some(message) => println!("<@{user}>: {message}"),
        None => println!("Hello, <@{user}>!"),
    }
}

async fn roll(ctx: Arc<CommandContext>) -> Result<()> {
    let sides = ctx.schema().and_then(|s| s.integer("sides")).unwrap_or(6);
    if sides < 1 {
        anyhow::bail!("a die needs at least one side, got {sides}");
    }
    let nanos = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)?.subsec_nanos();
    println!("You rolled {} (d{sides})", nanos % sides.unsigned_abs() + 1);
    Ok(())
}

async fn settings(ctx: Arc<CommandContext>) -> HandlerResult {
    let routed = ctx
        .route_with(|router| {
            router
                .route("prefix show", |ctx: Arc<CommandContext>, _: Option<Arc<ResolvedSchema>>| async move {
                    println!("Prefix here is {:?}", ctx.prefix());
                })
                .route("whoami", |ctx: Arc<CommandContext>, _: Option<Arc<ResolvedSchema>>| async move {
                    let event = ctx.event();
                    println!("You are <@{}> in {}", event.author().id, event.origin());
                })
        })
        .await?;

    if !routed {
        println!("usage: settings prefix show | settings whoami");
    }
    Ok(())
}

// ============================================================================
// Input
// ============================================================================

/// Splits an optional `#<server>` marker off the line.
fn to_message(line: &str) -> BoxedMessage {
    if let Some(rest) = line.strip_prefix('#')
        && let Some((server, content)) = rest.split_once(' ')
        && let Ok(server) = server.parse()
    {
        return TextMessage::in_server(server, CONSOLE_USER, content).boxed();
    }
    TextMessage::private(CONSOLE_USER, line).boxed()
}

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = WayfarerRuntime::builder().build()?;

    runtime.register(Command::builder("ping").description("Replies with pong").handler(ping).build())?;
    runtime.register(
        Command::builder("greet")
            .description("Greets a user or a channel")
            .grammar("[user:user] [*message:string]")
            .grammar("channel [target:channel]")
            .handler(greet)
            .build(),
    )?;
    runtime.register(
        Command::builder("roll")
            .description("Rolls a die")
            .grammar("[sides:int]")
            .handler(roll)
            .build(),
    )?;
    runtime.register(Command::builder("settings").handler(settings).build())?;

    let dispatched = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&dispatched);
    runtime.dispatcher().add_afterware(move |_ctx: Arc<CommandContext>| {
        counter.fetch_add(1, Ordering::Relaxed);
        std::future::ready(())
    });
    runtime
        .dispatcher()
        .add_middleware(|ctx: Arc<CommandContext>, _stop: StopSignal| async move {
            info!(command = ctx.command().name(), args = ?ctx.args(), "Running command");
        });

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim() == "/quit" => break,
                Ok(Some(line)) => {
                    if tx.send(to_message(&line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read standard input");
                    break;
                }
            }
        }
    });

    info!("Type commands, /quit to exit");
    runtime.run(rx).await;
    reader.abort();

    info!(completed = dispatched.load(Ordering::Relaxed), "Console bot stopped");
    Ok(())
}
