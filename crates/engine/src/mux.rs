//! Event multiplexer.
//!
//! Merges the gravity timer, terminal keys, robot lines and peer packets into
//! one stream. Each `wait_event` returns exactly one event. When several
//! sources are ready at once the order is timer, key, robot, network.

use std::future;
use std::ops::BitOr;

use tokio::sync::mpsc;

use crate::net::Packet;
use crate::timer::GravityTimer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Gravity step.
    Tick,
    /// Raw key byte from the terminal.
    Key(u8),
    /// One line from the robot.
    Robot(String),
    Net(Packet),
    /// Peer connection closed or failed.
    LostConn,
    /// Robot process closed its output.
    LostRobot,
    /// Nothing the mask admits can ever produce an event.
    None,
}

/// Which event classes a `wait_event` call accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u8);

impl EventMask {
    pub const TIMER: EventMask = EventMask(0x1);
    pub const KEY: EventMask = EventMask(0x2);
    pub const ROBOT: EventMask = EventMask(0x4);
    pub const NET: EventMask = EventMask(0x8);
    pub const ANY: EventMask = EventMask(0xf);

    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

enum Ready {
    Tick,
    Key(Option<u8>),
    Robot(Option<String>),
    Net(Option<Packet>),
}

pub struct EventMux {
    timer: GravityTimer,
    keys: Option<mpsc::Receiver<u8>>,
    robot: Option<mpsc::Receiver<String>>,
    net: Option<mpsc::UnboundedReceiver<Packet>>,
}

impl EventMux {
    pub fn new(timer: GravityTimer) -> Self {
        Self {
            timer,
            keys: None,
            robot: None,
            net: None,
        }
    }

    pub fn timer(&self) -> &GravityTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut GravityTimer {
        &mut self.timer
    }

    pub fn register_keys(&mut self, keys: mpsc::Receiver<u8>) {
        self.keys = Some(keys);
    }

    pub fn unregister_keys(&mut self) -> Option<mpsc::Receiver<u8>> {
        self.keys.take()
    }

    pub fn register_robot(&mut self, lines: mpsc::Receiver<String>) {
        self.robot = Some(lines);
    }

    pub fn unregister_robot(&mut self) -> Option<mpsc::Receiver<String>> {
        self.robot.take()
    }

    pub fn register_net(&mut self, packets: mpsc::UnboundedReceiver<Packet>) {
        self.net = Some(packets);
    }

    pub fn unregister_net(&mut self) -> Option<mpsc::UnboundedReceiver<Packet>> {
        self.net.take()
    }

    pub fn has_keys(&self) -> bool {
        self.keys.is_some()
    }

    pub fn has_robot(&self) -> bool {
        self.robot.is_some()
    }

    pub fn has_net(&self) -> bool {
        self.net.is_some()
    }

    /// Wait for the next event admitted by `mask`.
    ///
    /// Returns [`Event::None`] at once if no admitted source is live. A
    /// closed robot or peer channel is reported once, then unregistered; a
    /// closed key source is dropped silently.
    pub async fn wait_event(&mut self, mask: EventMask) -> Event {
        loop {
            let timer_on = mask.contains(EventMask::TIMER) && self.timer.is_armed();
            let keys_on = mask.contains(EventMask::KEY) && self.keys.is_some();
            let robot_on = mask.contains(EventMask::ROBOT) && self.robot.is_some();
            let net_on = mask.contains(EventMask::NET) && self.net.is_some();
            if !(timer_on || keys_on || robot_on || net_on) {
                return Event::None;
            }

            let ready = tokio::select! {
                biased;
                _ = self.timer.expired(), if timer_on => Ready::Tick,
                key = recv_or_pending(self.keys.as_mut()), if keys_on => Ready::Key(key),
                line = recv_or_pending(self.robot.as_mut()), if robot_on => Ready::Robot(line),
                packet = recv_unbounded_or_pending(self.net.as_mut()), if net_on => Ready::Net(packet),
            };

            match ready {
                Ready::Tick => return Event::Tick,
                Ready::Key(Some(key)) => return Event::Key(key),
                Ready::Key(None) => {
                    log::debug!("key source closed");
                    self.keys = None;
                }
                Ready::Robot(Some(line)) => return Event::Robot(line),
                Ready::Robot(None) => {
                    self.robot = None;
                    return Event::LostRobot;
                }
                Ready::Net(Some(packet)) => return Event::Net(packet),
                Ready::Net(None) => {
                    self.net = None;
                    return Event::LostConn;
                }
            }
        }
    }
}

async fn recv_or_pending<T>(rx: Option<&mut mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn recv_unbounded_or_pending<T>(rx: Option<&mut mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::advance;
    use tokio_test::{assert_pending, task};

    const STEP: Duration = Duration::from_millis(300);

    fn mux() -> EventMux {
        EventMux::new(GravityTimer::new(STEP))
    }

    #[tokio::test]
    async fn nothing_registered_returns_none() {
        let mut mux = mux();
        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::None);
    }

    #[tokio::test]
    async fn masked_out_sources_return_none() {
        let mut mux = mux();
        let (_tx, rx) = mpsc::channel(4);
        mux.register_keys(rx);
        assert_eq!(mux.wait_event(EventMask::NET).await, Event::None);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_beats_ready_key() {
        let mut mux = mux();
        let (tx, rx) = mpsc::channel(4);
        mux.register_keys(rx);
        mux.timer_mut().arm(STEP);
        tx.send(b'j').await.unwrap();
        advance(STEP).await;

        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::Tick);
        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::Key(b'j'));
    }

    #[tokio::test]
    async fn key_beats_robot_beats_net() {
        let mut mux = mux();
        let (key_tx, key_rx) = mpsc::channel(4);
        let (robot_tx, robot_rx) = mpsc::channel(4);
        let (net_tx, net_rx) = mpsc::unbounded_channel();
        mux.register_keys(key_rx);
        mux.register_robot(robot_rx);
        mux.register_net(net_rx);

        net_tx.send(Packet::Left).unwrap();
        robot_tx.send("Left".to_string()).await.unwrap();
        key_tx.send(b'k').await.unwrap();

        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::Key(b'k'));
        assert_eq!(
            mux.wait_event(EventMask::ANY).await,
            Event::Robot("Left".to_string())
        );
        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::Net(Packet::Left));
    }

    #[tokio::test]
    async fn closed_net_is_reported_once() {
        let mut mux = mux();
        let (net_tx, net_rx) = mpsc::unbounded_channel::<Packet>();
        mux.register_net(net_rx);
        drop(net_tx);

        assert_eq!(mux.wait_event(EventMask::NET).await, Event::LostConn);
        assert!(!mux.has_net());
        assert_eq!(mux.wait_event(EventMask::NET).await, Event::None);
    }

    #[tokio::test]
    async fn closed_robot_is_reported_once() {
        let mut mux = mux();
        let (robot_tx, robot_rx) = mpsc::channel::<String>(1);
        mux.register_robot(robot_rx);
        drop(robot_tx);

        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::LostRobot);
        assert!(!mux.has_robot());
    }

    #[tokio::test]
    async fn closed_keys_are_dropped_silently() {
        let mut mux = mux();
        let (key_tx, key_rx) = mpsc::channel::<u8>(1);
        mux.register_keys(key_rx);
        drop(key_tx);

        assert_eq!(mux.wait_event(EventMask::ANY).await, Event::None);
        assert!(!mux.has_keys());
    }

    #[tokio::test]
    async fn net_only_mask_ignores_pending_keys() {
        let mut mux = mux();
        let (key_tx, key_rx) = mpsc::channel(4);
        let (net_tx, net_rx) = mpsc::unbounded_channel();
        mux.register_keys(key_rx);
        mux.register_net(net_rx);

        key_tx.send(b'q').await.unwrap();
        {
            let mut wait = task::spawn(mux.wait_event(EventMask::NET));
            assert_pending!(wait.poll());
        }

        net_tx.send(Packet::Down).unwrap();
        assert_eq!(mux.wait_event(EventMask::NET).await, Event::Net(Packet::Down));
        assert_eq!(mux.wait_event(EventMask::KEY).await, Event::Key(b'q'));
    }
}
