//! Session configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::input::KeyTable;
use crate::types::{
    ConnFlags, GameType, DEFAULT_BOARD_VISIBLE, DEFAULT_BOARD_WIDTH, DEFAULT_INTERVAL_US,
    DEFAULT_PORT,
};

/// How (and whether) to reach the opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetMode {
    /// Single player.
    None,
    Connect { host: String, port: u16 },
    /// Wait for one opponent on `port`.
    Listen { port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("You can't use the -F option without the -r option")]
    FairWithoutRobot,
    #[error("step interval must be positive")]
    BadInterval,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub keys: KeyTable,
    /// Gravity interval in microseconds.
    pub interval_us: u32,
    /// Explicit seed; otherwise one is taken from the clock.
    pub seed: Option<i32>,
    /// Shell command line of the robot program.
    pub robot: Option<String>,
    pub fair_robot: bool,
    pub net: NetMode,
    pub color: bool,
    pub standout: bool,
    pub board_width: u8,
    pub board_visible: u8,
    pub user_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            keys: KeyTable::default(),
            interval_us: DEFAULT_INTERVAL_US,
            seed: None,
            robot: None,
            fair_robot: false,
            net: NetMode::None,
            color: true,
            standout: true,
            board_width: DEFAULT_BOARD_WIDTH,
            board_visible: DEFAULT_BOARD_VISIBLE,
            user_name: user_name_from_env(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fair_robot && self.robot.is_none() {
            return Err(ConfigError::FairWithoutRobot);
        }
        if self.interval_us == 0 {
            return Err(ConfigError::BadInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_micros(u64::from(self.interval_us))
    }

    pub fn game_type(&self) -> GameType {
        match self.net {
            NetMode::None => GameType::OnePlayer,
            _ => GameType::ClassicTwo,
        }
    }

    /// Flags announced in `startConn`.
    pub fn flags(&self) -> ConnFlags {
        let mut flags = ConnFlags::empty();
        if self.seed.is_some() {
            flags.insert(ConnFlags::SET_SEED);
        }
        if self.robot.is_some() {
            flags.insert(ConnFlags::USING_ROBOT);
        }
        if self.fair_robot {
            flags.insert(ConnFlags::FAIR_ROBOT);
        }
        flags
    }
}

/// Port from `NETRIS_PORT`, if set and valid.
pub fn port_from_env() -> Option<u16> {
    env::var("NETRIS_PORT").ok().and_then(|s| s.trim().parse().ok())
}

/// Default port with the environment override applied.
pub fn default_port() -> u16 {
    port_from_env().unwrap_or(DEFAULT_PORT)
}

/// `LOGNAME`, then `USER`, then `???`.
pub fn user_name_from_env() -> String {
    ["LOGNAME", "USER"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "???".to_string())
}
