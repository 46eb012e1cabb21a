//! Outer play loop: connect, negotiate, play a round, offer another.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;

use crate::config::{GameConfig, NetMode};
use crate::core::{Display, DisplayInfo, GameOutcome, MatchState, SimpleRng};
use crate::game::{Game, GameSetup, Opponent};
use crate::input::{spawn_key_reader, KeyTable};
use crate::mux::{Event, EventMask, EventMux};
use crate::negotiate::{negotiate, LocalSettings, Negotiated, Role};
use crate::net::{NetError, NetLink, Packet};
use crate::robot::RobotLink;
use crate::timer::GravityTimer;
use crate::types::{BoardId, ConnFlags, GameType, KeyAction};

/// How long the losing side waits for the winner to notice before hanging
/// up. Both sides losing at once would otherwise wait on each other forever.
pub const GAME_OVER_GRACE: Duration = Duration::from_secs(3);

/// Run games until the player quits. Reads keys from the terminal.
pub async fn run(config: &GameConfig, display: &mut dyn Display) -> Result<MatchState> {
    config.validate()?;
    let mut mux = EventMux::new(GravityTimer::new(config.interval()));
    mux.register_keys(spawn_key_reader());
    play(config, display, &mut mux).await
}

/// Same as [`run`] with the key source already registered on `mux`.
pub async fn play(
    config: &GameConfig,
    display: &mut dyn Display,
    mux: &mut EventMux,
) -> Result<MatchState> {
    config.validate()?;
    let mut counters = MatchState::new();
    let solo_seed = config.seed.unwrap_or_else(clock_seed);
    let mut rng = SimpleRng::new(solo_seed as u32);

    loop {
        let outcome = play_round(config, display, mux, &mut counters, &mut rng, solo_seed).await?;
        if outcome == GameOutcome::Quit {
            return Ok(counters);
        }
        if config.robot.is_some() {
            continue;
        }
        if !wait_for_new_game(&config.keys, display, mux).await? {
            return Ok(counters);
        }
    }
}

async fn play_round(
    config: &GameConfig,
    display: &mut dyn Display,
    mux: &mut EventMux,
    counters: &mut MatchState,
    rng: &mut SimpleRng,
    solo_seed: i32,
) -> Result<GameOutcome> {
    let mut robot = config.robot.as_deref().map(RobotLink::spawn).transpose()?;
    if let Some(lines) = robot.as_mut().and_then(RobotLink::take_lines) {
        mux.register_robot(lines);
    }

    let mut link = None;
    let mut agreed: Option<Negotiated> = None;
    if config.net != NetMode::None {
        display.init_board(BoardId::Local, config.board_width, config.board_visible);
        display.init_board(BoardId::Remote, config.board_width, config.board_visible);
        display.print_status(match config.net {
            NetMode::Connect { .. } => "Connecting to opponent...",
            _ => "Waiting for opponent...",
        });
        display.refresh()?;
    }
    if let Some((mut net, role)) = open_link(&config.net).await? {
        display.clear_status();
        if let Some(inbound) = net.take_inbound() {
            mux.register_net(inbound);
        }
        let local = LocalSettings::new(
            config.flags(),
            config.seed.unwrap_or_else(clock_seed),
            config.interval_us,
            config.user_name.clone(),
        );
        let negotiated = negotiate(mux, &net.sender(), &local, role, net.peer_host()).await?;
        *rng = SimpleRng::new(negotiated.seed as u32);
        agreed = Some(negotiated);
        link = Some(net);
    }

    let seed = agreed.as_ref().map_or(solo_seed, |n| n.seed);
    let opponent = agreed.as_ref().map(|n| Opponent {
        name: n.opponent_name.to_string(),
        host: n.opponent_host.clone(),
        flags: n.opponent_flags,
    });
    let opponent_flags = opponent.as_ref().map_or(ConnFlags::empty(), |o| o.flags);
    let setup = GameSetup {
        game_type: config.game_type(),
        keys: config.keys,
        interval: config.interval(),
        seed: seed as u32,
        fair_robot: config.fair_robot,
        width: config.board_width,
        visible: config.board_visible,
        opponent,
    };

    let mut game = Game::new(setup, mux, display, counters, rng);
    if let Some(net) = &link {
        game = game.with_peer(net.sender());
    }
    if let Some(sender) = robot.as_ref().and_then(RobotLink::sender) {
        game = game.with_robot(sender);
    }
    let outcome = game.run().await?;
    let interval = game.interval();
    drop(game);
    counters.record(outcome);

    if let Some(net) = link {
        let peer = net.sender();
        match outcome {
            GameOutcome::Quit => {
                peer.send(Packet::ByeBye);
            }
            GameOutcome::Lost => {
                peer.send(Packet::EndConn);
                let answer = tokio::time::timeout(GAME_OVER_GRACE, mux.wait_event(EventMask::NET));
                if answer.await.is_err() {
                    log::info!("opponent did not acknowledge the end of the game");
                }
            }
            GameOutcome::Won => {}
        }
        mux.unregister_net();
        net.close().await;
    }

    mux.unregister_robot();
    if let Some(robot) = robot {
        robot.close().await;
    }

    if outcome != GameOutcome::Quit {
        display.invert_board(BoardId::Local);
        if config.game_type() == GameType::ClassicTwo {
            display.invert_board(BoardId::Remote);
        }
        display.show_info(&DisplayInfo {
            game_type: config.game_type(),
            seed: seed as u32,
            interval_us: u32::try_from(interval.as_micros()).unwrap_or(u32::MAX),
            robot: config.robot.is_some(),
            opponent_flags,
            counters: *counters,
        });
        display.refresh()?;
    }
    Ok(outcome)
}

async fn open_link(mode: &NetMode) -> Result<Option<(NetLink, Role)>, NetError> {
    match mode {
        NetMode::None => Ok(None),
        NetMode::Connect { host, port } => {
            Ok(Some((NetLink::connect(host, *port).await?, Role::Client)))
        }
        NetMode::Listen { port } => Ok(Some((NetLink::listen(*port).await?, Role::Server))),
    }
}

/// Prompt for the new-game key. False means quit.
async fn wait_for_new_game(
    keys: &KeyTable,
    display: &mut dyn Display,
    mux: &mut EventMux,
) -> Result<bool> {
    let new_key = keys.key_for(KeyAction::New);
    display.print_status(&format!("Press '{}' for a new game.", new_key as char));
    display.refresh()?;
    loop {
        match mux.wait_event(EventMask::KEY).await {
            Event::Key(key) => match keys.action_for(key) {
                Some(KeyAction::New) => {
                    display.clear_status();
                    return Ok(true);
                }
                Some(KeyAction::Quit) => return Ok(false),
                _ => {}
            },
            _ => return Ok(false),
        }
    }
}

fn clock_seed() -> i32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NullDisplay;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn quit_during_play_ends_session() {
        let config = GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        };
        let mut mux = EventMux::new(GravityTimer::new(config.interval()));
        let (keys, rx) = mpsc::channel(4);
        mux.register_keys(rx);
        keys.send(b'q').await.unwrap();

        let counters = play(&config, &mut NullDisplay, &mut mux).await.unwrap();
        assert_eq!(counters, MatchState::new());
    }

    #[tokio::test]
    async fn fair_without_robot_is_rejected() {
        let config = GameConfig {
            fair_robot: true,
            ..GameConfig::default()
        };
        let mut mux = EventMux::new(GravityTimer::new(config.interval()));
        let err = play(&config, &mut NullDisplay, &mut mux).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "You can't use the -F option without the -r option"
        );
    }
}
