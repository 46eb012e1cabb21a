//! Robot process link.
//!
//! The robot is an arbitrary program run through `sh -c`. Its stdout is
//! read line by line into a channel; commands are written to its stdin by a
//! separate task so that a slow robot never blocks the game.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::protocol::RobotCommand;

/// Lines buffered from the robot before its reader waits for the game.
const LINE_BUFFER: usize = 64;

/// How long `close` gives the robot to exit once its stdin is closed.
const EXIT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("cannot start robot `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("robot `{0}` has no {1} pipe")]
    MissingPipe(String, &'static str),
}

/// Cloneable handle for sending commands to the robot.
#[derive(Debug, Clone)]
pub struct RobotSender {
    tx: mpsc::UnboundedSender<String>,
}

impl RobotSender {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// A sender whose lines land on the returned receiver, newline included.
    pub fn channel() -> (RobotSender, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, cmd: RobotCommand) -> bool {
        log::trace!("robot <- {cmd}");
        self.tx.send(format!("{cmd}\n")).is_ok()
    }
}

pub struct RobotLink {
    child: Option<Child>,
    sender: Option<RobotSender>,
    lines: Option<mpsc::Receiver<String>>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl RobotLink {
    /// Run `program` with piped stdin/stdout.
    pub fn spawn(program: &str) -> Result<Self, RobotError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RobotError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RobotError::MissingPipe(program.to_string(), "stdout"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RobotError::MissingPipe(program.to_string(), "stdin"))?;

        log::info!("started robot `{program}`");
        let mut link = Self::from_pipes(stdout, stdin);
        link.child = Some(child);
        Ok(link)
    }

    /// Attach to an already open pair of pipes. Must be called inside a
    /// tokio runtime.
    pub fn from_pipes<R, W>(stdout: R, stdin: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let read_task = tokio::spawn(read_loop(stdout, line_tx));
        let write_task = tokio::spawn(write_loop(stdin, cmd_rx));

        Self {
            child: None,
            sender: Some(RobotSender::new(cmd_tx)),
            lines: Some(line_rx),
            read_task,
            write_task,
        }
    }

    pub fn sender(&self) -> Option<RobotSender> {
        self.sender.clone()
    }

    /// Hand the line stream to the event multiplexer. Only the first call
    /// returns `Some`.
    pub fn take_lines(&mut self) -> Option<mpsc::Receiver<String>> {
        self.lines.take()
    }

    /// Close the robot's stdin and wait briefly for it to exit.
    pub async fn close(mut self) {
        // Dropping our sender ends the writer once other clones are gone.
        self.sender = None;
        if tokio::time::timeout(EXIT_TIMEOUT, &mut self.write_task)
            .await
            .is_err()
        {
            self.write_task.abort();
        }
        self.read_task.abort();

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(EXIT_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => log::info!("robot exited with {status}"),
                Ok(Err(e)) => log::warn!("waiting for robot failed: {e}"),
                Err(_) => {
                    log::warn!("robot did not exit, killing it");
                    if let Err(e) = child.kill().await {
                        log::warn!("cannot kill robot: {e}");
                    }
                }
            }
        }
    }
}

impl Drop for RobotLink {
    fn drop(&mut self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

async fn read_loop<R>(stdout: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                log::trace!("robot -> {line}");
                if tx.send(line).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                log::info!("robot closed its output");
                return;
            }
            Err(e) => {
                log::warn!("read from robot failed: {e}");
                return;
            }
        }
    }
}

async fn write_loop<W>(mut stdin: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        if let Err(e) = stdin.write_all(line.as_bytes()).await {
            log::warn!("write to robot failed: {e}");
            return;
        }
        if let Err(e) = stdin.flush().await {
            log::warn!("flush to robot failed: {e}");
            return;
        }
    }
    let _ = stdin.shutdown().await;
}
