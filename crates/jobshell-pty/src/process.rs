//! A child process attached to a pseudo-terminal.
//!
//! Output is read on a dedicated thread and forwarded over a channel, so
//! pattern searches can be awaited with or without a deadline. Everything
//! read is kept in a transcript for diagnostics.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use regex::bytes::Regex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::endpoint::ShellCommand;
use crate::error::{ShellError, ShellResult};

const READ_CHUNK_BYTES: usize = 8192;

/// Result of a successful pattern search.
#[derive(Debug, Clone)]
pub struct PtyMatch {
    /// Index of the pattern that matched.
    pub index: usize,
    /// Output consumed before the match.
    pub preceding: Vec<u8>,
    /// The matched bytes themselves.
    pub matched: Vec<u8>,
}

/// A process running on the slave side of a pseudo-terminal.
pub struct PtyProcess {
    command: String,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    _master: Box<dyn MasterPty + Send>,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: Vec<u8>,
    transcript: Vec<u8>,
    eof: bool,
}

impl PtyProcess {
    /// Spawn `command` on a fresh pseudo-terminal.
    pub fn spawn(command: &ShellCommand) -> ShellResult<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 1024,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ShellError::Pty(format!("failed to open pty: {e}")))?;

        let mut builder = CommandBuilder::new(&command.program);
        builder.args(&command.args);
        for (key, value) in &command.env {
            builder.env(key, value);
        }

        let child = pair.slave.spawn_command(builder).map_err(|e| {
            ShellError::ConnectionFailure(format!("failed to spawn '{command}': {e}"))
        })?;
        // Only the child may hold the slave side, so its exit closes the terminal.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ShellError::Pty(format!("failed to clone pty reader: {e}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ShellError::Pty(format!("failed to take pty writer: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        std::thread::Builder::new()
            .name("jobshell-pty-reader".to_string())
            .spawn(move || {
                let mut buf = [0u8; READ_CHUNK_BYTES];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
            })?;

        debug!(command = %command, "spawned pty process");

        Ok(Self {
            command: command.to_string(),
            child,
            writer,
            _master: pair.master,
            output: rx,
            buffer: Vec::new(),
            transcript: Vec::new(),
            eof: false,
        })
    }

    /// The command line this process was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Write raw input to the terminal.
    pub fn write(&mut self, data: &str) -> ShellResult<()> {
        self.writer.write_all(data.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Wait until one of `patterns` matches the unconsumed output.
    ///
    /// Patterns are tried in order against the whole pending buffer; on a
    /// match, everything up to the end of the match is consumed. Returns
    /// `None` if `timeout` elapses first or the terminal is closed. A `None`
    /// timeout waits as long as the process produces output.
    pub async fn find(
        &mut self,
        patterns: &[Regex],
        timeout: Option<Duration>,
    ) -> ShellResult<Option<PtyMatch>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if let Some(found) = self.take_match(patterns) {
                return Ok(Some(found));
            }
            if self.eof {
                return Ok(None);
            }

            let chunk = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.output.recv()).await {
                        Ok(chunk) => chunk,
                        Err(_) => return Ok(None),
                    }
                }
                None => self.output.recv().await,
            };

            match chunk {
                Some(bytes) => {
                    trace!(bytes = bytes.len(), "pty output");
                    self.transcript.extend_from_slice(&bytes);
                    self.buffer.extend_from_slice(&bytes);
                }
                None => {
                    debug!(command = %self.command, "pty closed");
                    self.eof = true;
                }
            }
        }
    }

    fn take_match(&mut self, patterns: &[Regex]) -> Option<PtyMatch> {
        for (index, pattern) in patterns.iter().enumerate() {
            if let Some(m) = pattern.find(&self.buffer) {
                let (start, end) = (m.start(), m.end());
                let consumed: Vec<u8> = self.buffer.drain(..end).collect();
                let (preceding, matched) = consumed.split_at(start);
                return Some(PtyMatch {
                    index,
                    preceding: preceding.to_vec(),
                    matched: matched.to_vec(),
                });
            }
        }
        None
    }

    /// Append a marker line to the transcript.
    pub fn note(&mut self, message: &str) {
        self.transcript
            .extend_from_slice(format!("\n[jobshell: {message}]\n").as_bytes());
    }

    /// Everything read from the terminal so far.
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.transcript).into_owned()
    }

    /// Check whether the process is still running.
    pub fn alive(&mut self) -> bool {
        if self.eof {
            return false;
        }
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the process if it is still running.
    pub fn close(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            debug!(command = %self.command, "killing pty process");
            let _ = self.child.kill();
            let _ = self.child.try_wait();
        }
        self.eof = true;
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.close();
    }
}
