//! Game loop.
//!
//! One [`Game`] is one round: pieces spawn on the local board until it tops
//! out, the opponent drops out, or the player quits. Local actions are
//! mirrored to the peer after they succeed; peer packets only ever touch the
//! remote board, except `giveJunk` which lands on ours.

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use crate::core::{Display, DisplayInfo, GameOutcome, MatchState, PauseState, PlayerBoard};
use crate::core::{ShownBoard, SimpleRng};
use crate::input::KeyTable;
use crate::mux::{Event, EventMask, EventMux};
use crate::net::{sanitize_text, Packet, PeerSender};
use crate::robot::{RobotCommand, RobotDirective, RobotSender};
use crate::types::{BoardId, ConnFlags, GameType, KeyAction, ShapeId, FASTER_FACTOR};

/// The opponent as agreed during negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub name: String,
    pub host: String,
    pub flags: ConnFlags,
}

/// Fixed parameters of one round.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub game_type: GameType,
    pub keys: KeyTable,
    pub interval: Duration,
    /// Shown on the status panel.
    pub seed: u32,
    pub fair_robot: bool,
    pub width: u8,
    pub visible: u8,
    pub opponent: Option<Opponent>,
}

enum Flow {
    Continue,
    /// The live piece is done; settle it and spawn the next one.
    NextPiece,
    Over(GameOutcome),
}

pub struct Game<'a> {
    setup: GameSetup,
    mux: &'a mut EventMux,
    display: &'a mut dyn Display,
    counters: &'a mut MatchState,
    rng: &'a mut SimpleRng,
    peer: Option<PeerSender>,
    robot: Option<RobotSender>,
    local: PlayerBoard,
    remote: Option<PlayerBoard>,
    shown_local: ShownBoard,
    shown_remote: ShownBoard,
    spying: bool,
    pause: PauseState,
    interval: Duration,
    started: Instant,
}

impl<'a> Game<'a> {
    pub fn new(
        setup: GameSetup,
        mux: &'a mut EventMux,
        display: &'a mut dyn Display,
        counters: &'a mut MatchState,
        rng: &'a mut SimpleRng,
    ) -> Self {
        let (width, visible) = (setup.width, setup.visible);
        let two_player = setup.game_type == GameType::ClassicTwo;
        Self {
            interval: setup.interval,
            mux,
            display,
            counters,
            rng,
            peer: None,
            robot: None,
            local: PlayerBoard::new(width, visible),
            remote: two_player.then(|| PlayerBoard::new(width, visible)),
            shown_local: ShownBoard::new(BoardId::Local, width, visible),
            shown_remote: ShownBoard::new(BoardId::Remote, width, visible),
            spying: two_player,
            pause: PauseState::default(),
            started: Instant::now(),
            setup,
        }
    }

    /// Mirror local play to the opponent.
    pub fn with_peer(mut self, peer: PeerSender) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Hand control to a robot; local keys are reported to it instead.
    pub fn with_robot(mut self, robot: RobotSender) -> Self {
        self.robot = Some(robot);
        self
    }

    pub fn local_board(&self) -> &PlayerBoard {
        &self.local
    }

    pub fn remote_board(&self) -> Option<&PlayerBoard> {
        self.remote.as_ref()
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause
    }

    /// Current gravity interval (shrinks with "faster").
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_spying(&self) -> bool {
        self.spying
    }

    /// Play until the round ends.
    pub async fn run(&mut self) -> Result<GameOutcome> {
        self.begin();
        let outcome = loop {
            let shape = self.rng.choose_shape();
            if !self.local.start_new_piece(shape) {
                break GameOutcome::Lost;
            }
            self.announce_piece(shape);
            if let Some(outcome) = self.play_piece().await? {
                break outcome;
            }
            self.settle_piece();
        };
        self.mux.timer_mut().disarm();
        self.refresh()?;
        log::info!("game over: {outcome:?}");
        Ok(outcome)
    }

    fn begin(&mut self) {
        let (width, visible) = (self.setup.width, self.setup.visible);
        self.counters.start_game();
        self.display.init_board(BoardId::Local, width, visible);
        if self.remote.is_some() {
            self.display.init_board(BoardId::Remote, width, visible);
        }
        if let Some(opponent) = &self.setup.opponent {
            self.display.show_opponent(&opponent.name, &opponent.host);
        }
        self.display.clear_status();
        self.display.show_pause(self.pause);
        self.show_info();
        self.mux.timer_mut().arm(self.interval);
        self.send_robot_preamble();
    }

    fn send_robot_preamble(&self) {
        let Some(robot) = &self.robot else {
            return;
        };
        let (width, visible) = (self.setup.width, self.setup.visible);
        robot.send(RobotCommand::GameType(self.setup.game_type));
        robot.send(RobotCommand::BoardSize {
            board: 0,
            visible,
            width,
        });
        if let Some(opponent) = &self.setup.opponent {
            robot.send(RobotCommand::BoardSize {
                board: 1,
                visible,
                width,
            });
            robot.send(RobotCommand::Opponent {
                board: 1,
                name: opponent.name.clone(),
                host: opponent.host.clone(),
            });
            if opponent.flags.contains(ConnFlags::USING_ROBOT) {
                robot.send(RobotCommand::OpponentFlag {
                    board: 1,
                    flag: "robot",
                });
            }
            if opponent.flags.contains(ConnFlags::FAIR_ROBOT) {
                robot.send(RobotCommand::OpponentFlag {
                    board: 1,
                    flag: "fairRobot",
                });
            }
        }
        robot.send(RobotCommand::TickLength(self.interval.as_secs_f64()));
        robot.send(RobotCommand::BeginGame);
        robot.send(RobotCommand::TimeStamp(self.started.elapsed().as_secs_f64()));
    }

    fn announce_piece(&mut self, shape: ShapeId) {
        self.mirror(Packet::NewPiece {
            shape: shape.to_net(),
        });
        if let Some(robot) = &self.robot {
            robot.send(RobotCommand::NewPiece(self.local.pieces_spawned()));
        }
    }

    /// Handle events until the live piece is done. `Some` ends the round.
    async fn play_piece(&mut self) -> Result<Option<GameOutcome>> {
        loop {
            self.refresh()?;
            let event = self.mux.wait_event(EventMask::ANY).await;
            let was_paused = self.pause.effective();
            let flow = self.handle(event);
            self.sync_pause(was_paused);
            match flow {
                Flow::Continue => {}
                Flow::NextPiece => return Ok(None),
                Flow::Over(outcome) => return Ok(Some(outcome)),
            }
        }
    }

    /// Freeze, clear lines, tell the peer and grant junk.
    fn settle_piece(&mut self) {
        self.local.freeze_piece();
        let cleared = self.local.clear_full_lines();
        if cleared == 0 {
            return;
        }
        self.counters.add_my_lines(cleared);
        self.show_info();
        self.mirror(Packet::Clear);

        if self.setup.game_type == GameType::ClassicTwo && cleared > 1 {
            let rows = cleared - u32::from(cleared < 4);
            self.mirror(Packet::GiveJunk { rows: rows as i16 });
        }
    }

    fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Tick => self.on_tick(),
            Event::Key(key) => self.on_key(key),
            Event::Robot(line) => self.on_robot(&line),
            Event::Net(packet) => self.on_packet(packet),
            Event::LostConn => {
                log::info!("lost connection to opponent");
                Flow::Over(GameOutcome::Won)
            }
            Event::LostRobot => {
                log::info!("robot went away");
                Flow::Over(GameOutcome::Won)
            }
            Event::None => {
                log::warn!("no event sources left");
                Flow::Over(GameOutcome::Quit)
            }
        }
    }

    fn on_tick(&mut self) -> Flow {
        if self.local.move_piece(-1, 0) {
            self.mirror(Packet::Down);
            Flow::Continue
        } else {
            Flow::NextPiece
        }
    }

    fn on_key(&mut self, key: u8) -> Flow {
        let action = self.setup.keys.action_for(key);
        if let Some(robot) = &self.robot {
            robot.send(RobotCommand::UserKey { key, action });
            return Flow::Continue;
        }
        match action {
            Some(action) => self.apply(action),
            None => Flow::Continue,
        }
    }

    fn on_robot(&mut self, line: &str) -> Flow {
        let Some(directive) = RobotDirective::parse(line) else {
            log::debug!("unknown robot command `{line}`");
            return Flow::Continue;
        };
        if !directive.is_current(self.setup.fair_robot, self.local.pieces_spawned()) {
            log::debug!("stale robot command `{line}`");
            return Flow::Continue;
        }
        match directive {
            RobotDirective::Message(text) => {
                self.display.message(&sanitize_text(&text));
                Flow::Continue
            }
            RobotDirective::Key { action, .. } => self.apply(action),
        }
    }

    fn apply(&mut self, action: KeyAction) -> Flow {
        if self.pause.effective()
            && !matches!(
                action,
                KeyAction::Pause | KeyAction::Redraw | KeyAction::Quit
            )
        {
            return Flow::Continue;
        }

        match action {
            KeyAction::Left => self.shift(-1),
            KeyAction::Right => self.shift(1),
            KeyAction::FullLeft => self.slide(-1),
            KeyAction::FullRight => self.slide(1),
            KeyAction::Rotate => {
                if self.local.rotate_piece() {
                    self.mirror(Packet::Rotate);
                }
            }
            KeyAction::Down => {
                if self.local.move_piece(-1, 0) {
                    self.mirror(Packet::Down);
                }
            }
            KeyAction::Drop => {
                if self.local.drop_piece() > 0 {
                    self.mirror(Packet::Drop);
                }
                self.mux.timer_mut().restart();
                return Flow::NextPiece;
            }
            KeyAction::ToggleSpy => {
                self.spying = !self.spying && self.remote.is_some();
                if self.spying {
                    self.shown_remote.invalidate();
                } else if self.remote.is_some() {
                    self.shown_remote.blank(&mut *self.display);
                }
            }
            KeyAction::Pause => {
                self.pause.local = !self.pause.local;
                if let Some(peer) = &self.peer {
                    peer.send(Packet::Pause {
                        paused: self.pause.local,
                    });
                }
                self.report_pause();
            }
            KeyAction::Faster => {
                if self.setup.game_type == GameType::OnePlayer {
                    self.interval = self.interval.mul_f64(FASTER_FACTOR);
                    self.mux.timer_mut().set_interval(self.interval);
                    self.show_info();
                }
            }
            KeyAction::Redraw => self.display.schedule_full_redraw(),
            KeyAction::New => {}
            KeyAction::Quit => return Flow::Over(GameOutcome::Quit),
        }
        Flow::Continue
    }

    fn shift(&mut self, dcol: i16) {
        if self.local.move_piece(0, dcol) {
            self.mirror(sideways(dcol));
        }
    }

    fn slide(&mut self, dcol: i16) {
        for _ in 0..self.local.slide_piece(dcol) {
            self.mirror(sideways(dcol));
        }
    }

    fn on_packet(&mut self, packet: Packet) -> Flow {
        let packet = match packet {
            Packet::GiveJunk { rows } => return self.receive_junk(rows),
            Packet::EndConn => {
                log::info!("opponent lost");
                return Flow::Over(GameOutcome::Won);
            }
            Packet::ByeBye => {
                log::info!("opponent quit");
                return Flow::Over(GameOutcome::Won);
            }
            Packet::Pause { paused } => {
                self.pause.remote = paused;
                self.report_pause();
                return Flow::Continue;
            }
            other => other,
        };

        let Some(remote) = self.remote.as_mut() else {
            log::debug!("{:?} without an opponent board", packet.packet_type());
            return Flow::Continue;
        };
        match packet {
            Packet::NewPiece { shape } => match ShapeId::from_net(shape) {
                Some(shape) => {
                    if !remote.start_new_piece(shape) {
                        log::debug!("opponent piece does not fit");
                    }
                }
                None => log::debug!("unknown shape {shape} from opponent"),
            },
            Packet::Down => {
                remote.move_piece(-1, 0);
            }
            Packet::Left => {
                remote.move_piece(0, -1);
            }
            Packet::Right => {
                remote.move_piece(0, 1);
            }
            Packet::Rotate => {
                remote.rotate_piece();
            }
            Packet::Drop => {
                remote.drop_piece();
            }
            Packet::Clear => {
                remote.freeze_piece();
                let cleared = remote.clear_full_lines();
                if cleared > 0 {
                    self.counters.add_opponent_lines(cleared);
                    self.show_info();
                }
            }
            Packet::InsertJunk { rows, column } => {
                if remote.insert_junk(rows, column).is_err() {
                    log::debug!("opponent board overflowed");
                }
            }
            other => log::debug!("ignoring {:?} during play", other.packet_type()),
        }
        Flow::Continue
    }

    fn receive_junk(&mut self, rows: i16) -> Flow {
        if rows <= 0 {
            log::debug!("ignoring empty junk grant ({rows} rows)");
            return Flow::Continue;
        }
        let column = self.rng.range(0, i16::from(self.local.board().width()));
        let result = self.local.insert_junk(rows, column);
        self.mirror(Packet::InsertJunk { rows, column });
        match result {
            Ok(()) => Flow::Continue,
            Err(e) => {
                log::info!("{e}");
                Flow::Over(GameOutcome::Lost)
            }
        }
    }

    fn report_pause(&mut self) {
        if let Some(robot) = &self.robot {
            robot.send(RobotCommand::Pause {
                local: self.pause.local,
                remote: self.pause.remote,
            });
        }
        self.display.show_pause(self.pause);
    }

    /// Gravity stops while either side is paused.
    fn sync_pause(&mut self, was_paused: bool) {
        let paused = self.pause.effective();
        if paused == was_paused {
            return;
        }
        let timer = self.mux.timer_mut();
        if paused {
            let left = timer.suspend();
            log::debug!("paused with {left:?} left in the step");
        } else {
            timer.resume();
        }
    }

    fn mirror(&self, packet: Packet) {
        if let Some(peer) = &self.peer {
            if !peer.send(packet) {
                log::debug!("peer link closed, packet dropped");
            }
        }
    }

    fn show_info(&mut self) {
        let info = DisplayInfo {
            game_type: self.setup.game_type,
            seed: self.setup.seed,
            interval_us: u32::try_from(self.interval.as_micros()).unwrap_or(u32::MAX),
            robot: self.robot.is_some(),
            opponent_flags: self
                .setup
                .opponent
                .as_ref()
                .map_or(ConnFlags::empty(), |o| o.flags),
            counters: *self.counters,
        };
        self.display.show_info(&info);
    }

    fn refresh(&mut self) -> Result<()> {
        self.shown_local.refresh(&self.local, &mut *self.display);
        if self.spying {
            if let Some(remote) = &self.remote {
                self.shown_remote.refresh(remote, &mut *self.display);
            }
        }
        self.display.refresh()
    }
}

fn sideways(dcol: i16) -> Packet {
    if dcol < 0 {
        Packet::Left
    } else {
        Packet::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NullDisplay;
    use crate::timer::GravityTimer;
    use tokio::sync::mpsc;

    fn setup(game_type: GameType) -> GameSetup {
        GameSetup {
            game_type,
            keys: KeyTable::default(),
            interval: Duration::from_millis(300),
            seed: 1,
            fair_robot: false,
            width: 10,
            visible: 20,
            opponent: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quit_key_ends_the_round() {
        let mut mux = EventMux::new(GravityTimer::new(Duration::from_millis(300)));
        let (keys, rx) = mpsc::channel(8);
        mux.register_keys(rx);
        keys.send(b'q').await.unwrap();

        let mut display = NullDisplay;
        let mut counters = MatchState::new();
        let mut rng = SimpleRng::new(1);
        let mut game = Game::new(
            setup(GameType::OnePlayer),
            &mut mux,
            &mut display,
            &mut counters,
            &mut rng,
        );
        assert_eq!(game.run().await.unwrap(), GameOutcome::Quit);
        assert_eq!(game.local_board().pieces_spawned(), 1);
        assert!(game.remote_board().is_none());
        drop(game);
        assert!(!mux.timer().is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn faster_is_single_player_only() {
        for (game_type, expect) in [
            (GameType::OnePlayer, Duration::from_millis(240)),
            (GameType::ClassicTwo, Duration::from_millis(300)),
        ] {
            let mut mux = EventMux::new(GravityTimer::new(Duration::from_millis(300)));
            let (keys, rx) = mpsc::channel(8);
            mux.register_keys(rx);
            keys.send(b'f').await.unwrap();
            keys.send(b'q').await.unwrap();

            let mut display = NullDisplay;
            let mut counters = MatchState::new();
            let mut rng = SimpleRng::new(1);
            let mut game =
                Game::new(setup(game_type), &mut mux, &mut display, &mut counters, &mut rng);
            game.run().await.unwrap();
            assert_eq!(game.interval(), expect);
        }
    }

    #[test]
    fn sideways_packets() {
        assert_eq!(sideways(-1), Packet::Left);
        assert_eq!(sideways(1), Packet::Right);
    }
}
