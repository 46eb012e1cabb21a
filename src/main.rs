//! Networked falling-blocks game for the terminal (default binary).
//!
//! Parses the command line, sets up optional file logging, then hands the
//! terminal to the engine until the player quits.

use std::fs::File;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use netris::engine::config::{default_port, user_name_from_env};
use netris::engine::{GameConfig, NetMode};
use netris::input::map_keys;
use netris::term::{ScreenOptions, TerminalDisplay};
use netris::types::DEFAULT_INTERVAL_US;

#[derive(Debug, Parser)]
#[command(name = "netris", version, about = "Networked falling-blocks game")]
struct Cli {
    /// Connect to an opponent waiting on HOST
    #[arg(short = 'c', value_name = "HOST", conflicts_with = "wait")]
    connect: Option<String>,

    /// Wait for an opponent to connect
    #[arg(short = 'w')]
    wait: bool,

    /// Port to connect to or listen on (default $NETRIS_PORT or 9284)
    #[arg(short = 'p', value_name = "PORT")]
    port: Option<u16>,

    /// Step-down interval in seconds
    #[arg(short = 'i', value_name = "SECONDS")]
    interval: Option<f64>,

    /// Start with a given random seed
    #[arg(short = 's', value_name = "SEED", allow_negative_numbers = true)]
    seed: Option<i32>,

    /// Let a robot program play instead of the keyboard
    #[arg(short = 'r', value_name = "COMMAND")]
    robot: Option<String>,

    /// Only accept robot moves for the current piece
    #[arg(short = 'F')]
    fair_robot: bool,

    /// Remap keys, in the order of the default "jJklL mspf^lnq"
    #[arg(short = 'k', value_name = "KEYS")]
    keys: Option<String>,

    /// Disable color
    #[arg(short = 'C')]
    no_color: bool,

    /// Disable reverse video
    #[arg(short = 'S')]
    no_standout: bool,

    /// Print distribution info and exit
    #[arg(short = 'H')]
    dist_info: bool,

    /// Print the game rules and exit
    #[arg(short = 'R')]
    rules: bool,
}

const DIST_INFO: &str = "\
Netris: a networked game of falling blocks for two players.

Run one copy with -w to wait for an opponent and another with -c HOST
to join it. Without either option a single-player game starts.
The port defaults to 9284 and may be overridden with -p or NETRIS_PORT.
";

const RULES: &str = "\
Pieces fall down the board one row per step. Move and rotate them so that
they fill complete rows; a full row disappears.

Two-player game:
  Clearing rows sends junk to the opponent. Two rows cleared at once send
  one row of junk, three send two and four send four. Junk appears at the
  bottom of the opponent's board with a single gap. Whoever overflows the
  top of the board first loses.

Single-player game:
  Play until the board overflows. The 'faster' key shortens the step
  interval.
";

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.dist_info {
        print!("{DIST_INFO}");
        return ExitCode::SUCCESS;
    }
    if cli.rules {
        print!("{RULES}");
        return ExitCode::SUCCESS;
    }

    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to `NETRIS_LOG_PATH` when set; stdout belongs to the game screen.
fn init_logging() {
    let Ok(path) = std::env::var("NETRIS_LOG_PATH") else {
        return;
    };
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cannot open log file {path}: {e}");
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
}

fn build_config(cli: &Cli) -> Result<GameConfig> {
    let keys = cli.keys.as_deref().map(map_keys).transpose()?.unwrap_or_default();
    let port = cli.port.unwrap_or_else(default_port);
    let net = match (&cli.connect, cli.wait) {
        (Some(host), _) => NetMode::Connect {
            host: host.clone(),
            port,
        },
        (None, true) => NetMode::Listen { port },
        (None, false) => NetMode::None,
    };
    let interval_us = match cli.interval {
        Some(secs) if secs.is_finite() && secs > 0.0 => (secs * 1e6) as u32,
        Some(_) => 0,
        None => DEFAULT_INTERVAL_US,
    };

    let config = GameConfig {
        keys,
        interval_us,
        seed: cli.seed,
        robot: cli.robot.clone(),
        fair_robot: cli.fair_robot,
        net,
        color: !cli.no_color,
        standout: !cli.no_standout,
        user_name: user_name_from_env(),
        ..GameConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    log::info!("starting netris ({:?})", config.net);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building the async runtime")?;

    let mut display = TerminalDisplay::new(ScreenOptions {
        color: config.color,
        standout: config.standout,
    });
    display.enter()?;

    let result = runtime.block_on(netris::engine::run(&config, &mut display));

    // Always try to restore terminal state.
    let _ = display.exit();
    let counters = result?;
    log::info!("session over: won {} lost {}", counters.won, counters.lost);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_and_port_select_listen_mode() {
        let cli = Cli::parse_from(["netris", "-w", "-p", "4000"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.net, NetMode::Listen { port: 4000 });
    }

    #[test]
    fn interval_is_given_in_seconds() {
        let cli = Cli::parse_from(["netris", "-i", "0.25"]);
        assert_eq!(build_config(&cli).unwrap().interval_us, 250_000);
    }

    #[test]
    fn fair_robot_without_robot_is_fatal() {
        let cli = Cli::parse_from(["netris", "-F"]);
        let err = build_config(&cli).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You can't use the -F option without the -r option"
        );
    }

    #[test]
    fn colliding_keys_are_fatal() {
        let cli = Cli::parse_from(["netris", "-k", "jj"]);
        assert!(build_config(&cli).is_err());
    }
}
