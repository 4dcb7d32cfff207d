//! Caro - console client
//!
//! Plays five-in-a-row in the terminal against the built-in bot or a peer
//! over TCP. Logs go to a file because stdout carries the board.

#![warn(missing_docs)]

mod cli;
mod config;
mod console;
mod net;

use anyhow::Result;
use caro_engine::{Adversary, HeuristicOpponent, Input, LocalAction, Message, spawn_session};
use clap::Parser;
use cli::{Cli, Command};
use config::ClientConfig;
use console::{ConsoleCommand, HELP, Renderer};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;
    init_tracing(config.log_file())?;
    info!(nickname = %config.nickname(), "Starting caro");

    match cli.command {
        Command::Bot => run_bot(&config).await,
        Command::Host { port } => {
            println!("Waiting for a peer on port {port}...");
            let stream = net::accept_peer(port).await?;
            run_networked(&config, stream, 0).await
        }
        Command::Join { addr } => {
            let stream = net::connect_peer(&addr).await?;
            run_networked(&config, stream, 1).await
        }
    }
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = std::fs::File::create(log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,caro_engine=debug")),
        )
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Plays against the heuristic opponent.
#[instrument(skip_all)]
async fn run_bot(config: &ClientConfig) -> Result<()> {
    let bot = HeuristicOpponent::new(*config.rules().win_length());
    println!("Hi {}, you are playing the bot.", config.nickname());
    play(config, Adversary::Automated(Box::new(bot)), 0, None).await
}

/// Plays against a peer on `stream`; the host opens round 0, the joiner
/// starts its count at round 1 so seating is mirrored.
#[instrument(skip_all, fields(first_round = first_round))]
async fn run_networked(config: &ClientConfig, stream: TcpStream, first_round: u32) -> Result<()> {
    println!("Hi {}, you are connected.", config.nickname());
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    play(
        config,
        Adversary::Remote(Box::new(outbound_tx)),
        first_round,
        Some((stream, outbound_rx)),
    )
    .await
}

async fn play(
    config: &ClientConfig,
    adversary: Adversary,
    first_round: u32,
    peer: Option<(TcpStream, mpsc::UnboundedReceiver<Message>)>,
) -> Result<()> {
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let (handle, session_task) = spawn_session(*config.rules(), adversary, Box::new(notify_tx));

    let mut writer_task = None;
    if let Some((stream, outbound_rx)) = peer {
        let (read_half, write_half) = stream.into_split();
        tokio::spawn(net::read_messages(read_half, handle.clone()));
        writer_task = Some(tokio::spawn(net::write_messages(outbound_rx, write_half)));
    }

    let mut renderer = Renderer::new(*config.rules().board_size());
    let render_task = tokio::spawn(async move {
        while let Some(notification) = notify_rx.recv().await {
            for line in renderer.render(notification) {
                println!("{line}");
            }
        }
    });

    println!("{HELP}");
    handle.start_round(first_round)?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = stdin.next_line().await? else {
            info!("Stdin closed, leaving");
            let _ = handle.leave();
            break;
        };
        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Session(input) => {
                let leaving = matches!(input, Input::Local(LocalAction::Leave));
                if handle.submit(input).is_err() {
                    warn!("Session ended unexpectedly");
                    break;
                }
                if leaving {
                    break;
                }
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(text) => println!("Unknown command {text:?}. Type `help`."),
        }
    }

    drop(handle);
    let session = session_task.await?;
    info!(outcome = ?session.outcome(), last_round = session.round(), "Session over");
    drop(session);
    render_task.await?;
    if let Some(writer) = writer_task {
        writer.await?;
    }
    Ok(())
}
