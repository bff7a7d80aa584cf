use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use shakmaty::uci::UciMove;
use tracing::{debug, instrument, trace, warn};

use super::{protocol, EngineError, EngineFactory, EngineHandle, MoveReply};
use crate::constraints::Constraints;
use crate::participant::{OptionValue, Participant};

/// Launches participants as UCI child processes.
#[derive(Debug, Clone, Copy)]
pub struct ProcessEngineFactory {
    handshake_timeout: Duration,
    timeout_margin: Duration,
    shutdown_grace: Duration,
    show_stderr: bool,
}

impl ProcessEngineFactory {
    /// Factory using the timeouts of `constraints`. Engines' stderr is discarded unless
    /// `show_stderr` is set.
    pub fn new(constraints: &Constraints, show_stderr: bool) -> Self {
        Self {
            handshake_timeout: constraints.handshake_timeout,
            timeout_margin: constraints.timeout_margin,
            shutdown_grace: constraints.shutdown_grace,
            show_stderr,
        }
    }
}

impl EngineFactory for ProcessEngineFactory {
    type Handle = EngineProcess;

    fn launch(&self, participant: &Participant) -> Result<EngineProcess, EngineError> {
        EngineProcess::start(participant, *self)
    }
}

/// A running UCI engine.
///
/// The process is killed on drop if [`shutdown`](EngineHandle::shutdown) was not called.
#[derive(Debug)]
pub struct EngineProcess {
    name: String,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    /// lowercase, UCI option names are case insensitive
    advertised_options: HashSet<String>,
    settings: ProcessEngineFactory,
    is_shut_down: bool,
}

impl EngineProcess {
    /// launch `participant` and complete the `uci`/`uciok` handshake
    #[instrument(skip_all, fields(engine = %participant.name))]
    pub fn start(
        participant: &Participant,
        settings: ProcessEngineFactory,
    ) -> Result<EngineProcess, EngineError> {
        let mut cmd = Command::new(&participant.path_to_exe);
        cmd.args(&participant.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        if !settings.show_stderr {
            cmd.stderr(Stdio::null());
        }
        let mut child = cmd.spawn().map_err(|e| {
            EngineError::Launch(format!(
                "could not start '{}': {e}",
                participant.path_to_exe.display()
            ))
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Launch("no pipe to the engine".to_string()));
        };

        // stdout is read on its own thread so that every wait can have a deadline
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut engine = EngineProcess {
            name: participant.name.clone(),
            child,
            stdin: BufWriter::new(stdin),
            lines: rx,
            advertised_options: HashSet::new(),
            settings,
            is_shut_down: false,
        };
        // on error, `engine` is dropped, which kills the process
        engine.handshake()?;
        debug!(pid = engine.child.id(), "engine started");
        Ok(engine)
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.write_line("uci")
            .map_err(|e| EngineError::Launch(format!("could not send 'uci': {e}")))?;
        let deadline = Instant::now() + self.settings.handshake_timeout;
        loop {
            match self.recv_line_until(deadline) {
                Ok(line) if line.trim() == "uciok" => return Ok(()),
                Ok(line) => {
                    if let Some(name) = protocol::parse_option_name(&line) {
                        self.advertised_options.insert(name.to_lowercase());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Launch(format!(
                        "no 'uciok' within {:?}",
                        self.settings.handshake_timeout
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Launch(
                        "process exited during handshake".to_string(),
                    ))
                }
            }
        }
    }

    fn wait_ready(&mut self) -> Result<(), EngineError> {
        self.write_line("isready")
            .map_err(|e| EngineError::Config(format!("could not send 'isready': {e}")))?;
        let deadline = Instant::now() + self.settings.handshake_timeout;
        loop {
            match self.recv_line_until(deadline) {
                Ok(line) if line.trim() == "readyok" => return Ok(()),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Config(format!(
                        "no 'readyok' within {:?}",
                        self.settings.handshake_timeout
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Config(
                        "process exited while being configured".to_string(),
                    ))
                }
            }
        }
    }

    fn recv_line_until(&self, deadline: Instant) -> Result<String, RecvTimeoutError> {
        let line = self
            .lines
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))?;
        trace!(engine = %self.name, "<< {line}");
        Ok(line)
    }

    fn write_line(&mut self, msg: &str) -> std::io::Result<()> {
        trace!(engine = %self.name, ">> {msg}");
        self.stdin.write_all(msg.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl EngineHandle for EngineProcess {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(engine = %self.name))]
    fn configure(&mut self, options: &[(String, OptionValue)]) -> Result<(), EngineError> {
        for (name, value) in options {
            if !self.advertised_options.contains(&name.to_lowercase()) {
                return Err(EngineError::Config(format!(
                    "{} has no option '{name}'",
                    self.name
                )));
            }
            self.write_line(&protocol::setoption_command(name, &value.to_string()))
                .map_err(|e| EngineError::Config(format!("could not set '{name}': {e}")))?;
        }
        self.write_line("ucinewgame")
            .map_err(|e| EngineError::Config(format!("could not send 'ucinewgame': {e}")))?;
        self.wait_ready()
    }

    fn request_move(
        &mut self,
        moves: &[UciMove],
        budget: Duration,
    ) -> Result<MoveReply, EngineError> {
        if self.has_exited() {
            return Err(EngineError::Terminated(format!("{} is not running", self.name)));
        }
        let position = protocol::position_command(moves);
        self.write_line(&position)
            .and_then(|_| self.write_line(&protocol::go_command(budget)))
            .map_err(|e| EngineError::Terminated(format!("could not write to {}: {e}", self.name)))?;

        let start = Instant::now();
        let mut deadline = start + budget + self.settings.timeout_margin;
        let mut stop_sent = false;
        loop {
            match self.recv_line_until(deadline) {
                Ok(line) => {
                    if let Some(reply) = protocol::parse_bestmove(&line)? {
                        return Ok(reply);
                    }
                }
                Err(RecvTimeoutError::Timeout) if !stop_sent => {
                    debug!(engine = %self.name, "move time exceeded, sending 'stop'");
                    stop_sent = true;
                    deadline = Instant::now() + self.settings.timeout_margin;
                    if let Err(e) = self.write_line("stop") {
                        return Err(EngineError::Terminated(format!(
                            "could not write to {}: {e}",
                            self.name
                        )));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Timeout(start.elapsed()));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Terminated(format!(
                        "{} closed its output",
                        self.name
                    )));
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        self.is_shut_down = true;

        let _ = self.write_line("quit");
        let grace = self.settings.shutdown_grace;
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(Duration::from_millis(10).min(grace / 10));
        }
        warn!(engine = %self.name, "did not quit within {grace:?}, killing it");
        if let Err(e) = self.child.kill() {
            debug!(engine = %self.name, "kill failed: {e}");
        }
        let _ = self.child.wait();
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}
