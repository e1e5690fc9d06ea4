use std::sync::Arc;

use deltabus_lib::{
    BusConfig, ConnectionHandle, DeltaRequest, DeltaSender, EventBus, StoreUpdate,
    StreamSubscriber,
};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tail,
    Send,
}

impl Command {
    fn from_arg(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tail" => Ok(Self::Tail),
            "send" => Ok(Self::Send),
            _ => Err(format!("unknown command '{value}'. Use tail or send")),
        }
    }
}

#[derive(Debug, Default)]
struct Options {
    base_url: Option<String>,
    deltas_only: bool,
    value: Option<String>,
    group: Option<String>,
    key: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    deltabus_lib::init_tracing();

    if let Err(error) = run().await {
        eprintln!("deltabus failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let command = match args.next() {
        Some(arg) if arg == "--help" || arg == "-h" => {
            print_help();
            return Ok(());
        }
        Some(arg) => Command::from_arg(&arg)?,
        None => {
            print_help();
            return Err("missing command".to_string());
        }
    };

    let mut options = Options::default();
    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(());
        }
        if arg == "--deltas-only" {
            options.deltas_only = true;
            continue;
        }

        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };
        let slot = match flag.as_str() {
            "--base" => &mut options.base_url,
            "--value" => &mut options.value,
            "--group" => &mut options.group,
            "--key" => &mut options.key,
            _ => return Err(format!("unknown option '{arg}'")),
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| format!("{flag} requires a value"))?,
        };
        *slot = Some(value);
    }

    let mut config = BusConfig::from_env();
    if let Some(base_url) = options.base_url.take() {
        config.base_url = base_url;
    }
    config.validate().map_err(|e| e.to_string())?;

    match command {
        Command::Tail => tail(&config, options.deltas_only).await,
        Command::Send => send(&config, options).await,
    }
}

async fn tail(config: &BusConfig, deltas_only: bool) -> Result<(), String> {
    let bus = Arc::new(EventBus::from_config(config));
    let mut rx = bus.subscribe();
    let subscriber = StreamSubscriber::new(config, bus).map_err(|e| e.to_string())?;
    let mut handle = subscriber.connect();
    tracing::info!("tailing {}", handle.url());

    loop {
        tokio::select! {
            biased;
            result = rx.recv() => match result {
                Ok(update) => print_update(&update, deltas_only)?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("output lagged, skipped {n} updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = handle.closed() => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    while let Ok(update) = rx.try_recv() {
        print_update(&update, deltas_only)?;
    }
    finish(handle);
    Ok(())
}

fn finish(handle: ConnectionHandle) {
    if handle.is_closed() {
        tracing::warn!("event stream at {} closed", handle.url());
    }
    handle.close();
}

fn print_update(update: &StoreUpdate, deltas_only: bool) -> Result<(), String> {
    if deltas_only && !update.is_delta {
        return Ok(());
    }
    let line = serde_json::to_string(update).map_err(|e| e.to_string())?;
    println!("{line}");
    Ok(())
}

async fn send(config: &BusConfig, options: Options) -> Result<(), String> {
    let value = options
        .value
        .ok_or_else(|| "send requires --value".to_string())?;
    let mut request = DeltaRequest::new(value);
    request.group = options.group;
    request.key = options.key;

    let sender = DeltaSender::new(config).map_err(|e| e.to_string())?;
    let response = sender.send(&request).await.map_err(|e| e.to_string())?;
    let pretty = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{pretty}");
    Ok(())
}

fn print_help() {
    println!("deltabus: watch a node's event stream or submit a delta");
    println!();
    println!("Usage:");
    println!("  deltabus tail [--base <url>] [--deltas-only]");
    println!("  deltabus send --value <v> [--group <g>] [--key <k>] [--base <url>]");
    println!();
    println!("Options:");
    println!("  --base <url>       Node web address (default: $DELTABUS_BASE_URL or http://127.0.0.1:9091)");
    println!("  --deltas-only      tail: print only delta/delta_update envelopes");
    println!("  --value <v>        send: delta value (required)");
    println!("  --group <g>        send: delta group");
    println!("  --key <k>          send: delta key");
    println!();
    println!("Environment:");
    println!("  DELTABUS_BASE_URL, DELTABUS_EVENT_CAPACITY, DELTABUS_DELTA_CAPACITY,");
    println!("  DELTABUS_CONNECT_TIMEOUT_MS, RUST_LOG (a .env file is read if present)");
}
