//! Charity CLI - session actions against a development node
//!
//! Every command connects first (there is no persisted session), runs one
//! action, and prints the resulting view:
//!   charity status                 → configuration and wallet detection
//!   charity connect                → authorize and load balance/owner
//!   charity donate <amount>        → donate <amount> ETH
//!   charity withdraw               → withdraw all funds (owner)
//!   charity refund                 → refund your donation
//!   charity change-owner <address> → transfer ownership (owner)
//!
//! Configuration (environment or .env):
//!   CHARITY_RPC_URL   JSON-RPC endpoint (default http://127.0.0.1:8545)
//!   CHARITY_CONTRACT  contract address
//!   CHARITY_ABI       path to the contract artifact JSON
//!   CHARITY_POLL_MS   receipt poll interval
//!
//! Output format:
//!   --json     Compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use charity_client::logging::init_logging;
use charity_client::{ClientConfig, RpcHost, SessionController};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    load_env_file(".env");
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.version {
        println!("charity {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if opts.help || opts.command.is_none() {
        print_usage();
        return;
    }

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    let render = |value: &Value| {
        let text = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
        text.unwrap_or_else(|_| value.to_string())
    };

    match run(&opts).await {
        Ok(output) => println!("{}", render(&output)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{e:#}")})));
            std::process::exit(1);
        }
    }
}

async fn run(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let command = opts.command.as_deref().unwrap_or("status");

    let config = ClientConfig::from_env().context("loading configuration")?;
    debug!(rpc_url = %config.rpc_url, contract = %config.contract_address, "configuration loaded");
    let host = RpcHost::new(&config.rpc_url);
    let session = SessionController::new(config.clone(), &host)?;

    if command == "status" {
        return Ok(json!({
            "rpc_url": config.rpc_url,
            "contract": config.contract_address,
            "confirmation_poll_ms": config.confirmation_poll.as_millis() as u64,
            "view": session.view(),
        }));
    }

    session.connect().await.context("connecting wallet")?;
    if session.snapshot().account.is_none() {
        bail!("no account available on {}", config.rpc_url);
    }

    let result = match command {
        "connect" => Ok(None),
        "donate" => {
            session.set_donation_amount(opts.arg.clone().ok_or_else(|| anyhow!("usage: charity donate <amount>"))?);
            session.donate().await.map(Some)
        }
        "withdraw" => session.withdraw().await.map(Some),
        "refund" => session.refund_donation().await.map(Some),
        "change-owner" => {
            session.set_new_owner(opts.arg.clone().ok_or_else(|| anyhow!("usage: charity change-owner <address>"))?);
            session.change_owner().await.map(Some)
        }
        other => bail!("Unknown command: {}", other),
    };

    let view = session.view();
    match result {
        Ok(receipt) => Ok(json!({"receipt": receipt, "view": view})),
        Err(e) => {
            let message = view.notice.as_ref().map(|n| n.message().to_string()).unwrap_or_else(|| e.user_message());
            Err(anyhow!(e).context(message))
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    arg: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        for arg in args {
            match arg.as_str() {
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "-h" | "--help" => opts.help = true,
                "-V" | "--version" => opts.version = true,
                _ if opts.command.is_none() => opts.command = Some(arg.clone()),
                _ if opts.arg.is_none() => opts.arg = Some(arg.clone()),
                _ => {}
            }
        }
        opts
    }
}

/// Keys a `.env` file may set. Anything else in the file is ignored.
fn is_client_key(key: &str) -> bool { key.starts_with("CHARITY_") || key == "RUST_LOG" }

/// Parse `KEY=value` lines, skipping comments, `export ` prefixes and foreign keys.
fn parse_env_file(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.strip_prefix("export ").unwrap_or(line).split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches(['"', '\''])))
        .filter(|(key, value)| is_client_key(key) && !value.is_empty())
        .collect()
}

/// Apply `path` to the environment. Variables already set win.
fn load_env_file(path: &str) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return;
    };
    for (key, value) in parse_env_file(&contents) {
        if env::var_os(key).is_none() {
            env::set_var(key, value);
        }
    }
}

fn print_usage() {
    println!(
        r#"charity - CharityFund client

USAGE:
    charity <command> [argument] [--json|--pretty]

COMMANDS:
    status                  Show configuration and wallet detection
    connect                 Authorize the node's first account and load the session
    donate <amount>         Donate <amount> ETH
    withdraw                Withdraw all funds (owner only)
    refund                  Refund your donation
    change-owner <address>  Transfer ownership (owner only)

ENVIRONMENT:
    CHARITY_RPC_URL         JSON-RPC endpoint (default http://127.0.0.1:8545)
    CHARITY_CONTRACT        Contract address
    CHARITY_ABI             Path to the contract artifact JSON
    CHARITY_POLL_MS         Receipt poll interval in milliseconds
    CHARITY_LOG_JSON=1      JSON log lines on stderr
    RUST_LOG                Log filter (default info)"#
    );
}
