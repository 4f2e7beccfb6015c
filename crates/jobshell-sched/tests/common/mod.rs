//! Scripted shell used by the adaptor tests.
//!
//! `MockCluster` answers commands by prefix and records every command it
//! receives, so tests can both steer the scheduler's replies and count
//! round-trips.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jobshell_pty::{
    CommandOutput, IoMode, Shell, ShellEndpoint, ShellError, ShellFactory, ShellResult,
};

#[derive(Default)]
struct Rule {
    prefix: String,
    replies: VecDeque<(i32, String)>,
}

#[derive(Default)]
struct ClusterState {
    rules: Vec<Rule>,
    commands: Vec<String>,
    alive: bool,
    opens: usize,
    fail_open: bool,
    endpoints: Vec<String>,
}

/// Shared state behind every mock shell opened for one test.
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix`.
    ///
    /// Replies queue up per prefix; the last one repeats forever.
    pub fn respond(&self, prefix: &str, exit_code: i32, output: &str) -> &Self {
        let mut state = self.state.lock().unwrap();
        let reply = (exit_code, output.to_string());
        match state.rules.iter_mut().find(|rule| rule.prefix == prefix) {
            Some(rule) => rule.replies.push_back(reply),
            None => state.rules.push(Rule {
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Number of received commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }

    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }

    /// How many shells were opened.
    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    /// Endpoints shells were opened for, as displayed.
    pub fn endpoints(&self) -> Vec<String> {
        self.state.lock().unwrap().endpoints.clone()
    }

    /// Simulate the shell process dying.
    pub fn kill(&self) {
        self.state.lock().unwrap().alive = false;
    }

    /// Make subsequent shell opens fail.
    pub fn refuse_connections(&self) {
        self.state.lock().unwrap().fail_open = true;
    }

    pub fn factory(&self) -> Arc<dyn ShellFactory> {
        Arc::new(MockFactory {
            cluster: self.clone(),
        })
    }

    fn reply(&self, command: &str) -> (i32, String) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());
        match state
            .rules
            .iter_mut()
            .find(|rule| command.starts_with(&rule.prefix))
        {
            Some(rule) if rule.replies.len() > 1 => rule.replies.pop_front().unwrap_or_default(),
            Some(rule) => rule.replies.front().cloned().unwrap_or_default(),
            None => (0, String::new()),
        }
    }
}

struct MockFactory {
    cluster: MockCluster,
}

#[async_trait]
impl ShellFactory for MockFactory {
    async fn open(&self, endpoint: &ShellEndpoint) -> ShellResult<Box<dyn Shell>> {
        let mut state = self.cluster.state.lock().unwrap();
        if state.fail_open {
            return Err(ShellError::ConnectionFailure(format!(
                "ssh: connect to host {}: Connection refused",
                endpoint.host
            )));
        }
        state.opens += 1;
        state.alive = true;
        state.endpoints.push(endpoint.to_string());
        Ok(Box::new(MockShell {
            cluster: self.cluster.clone(),
        }))
    }
}

struct MockShell {
    cluster: MockCluster,
}

#[async_trait]
impl Shell for MockShell {
    async fn run_sync(&mut self, command: &str, mode: IoMode) -> ShellResult<CommandOutput> {
        if !self.alive() {
            return Err(ShellError::NoSuccess("shell is closed".to_string()));
        }

        let (exit_code, text) = self.cluster.reply(command);
        let (stdout, stderr) = match mode {
            IoMode::Ignore => (None, None),
            IoMode::Merged | IoMode::Stdout => (Some(text), None),
            IoMode::Stderr => (None, Some(text)),
            IoMode::Separate => (Some(text), Some(String::new())),
        };

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    fn alive(&mut self) -> bool {
        self.cluster.state.lock().unwrap().alive
    }

    fn close(&mut self) {
        self.cluster.kill();
    }
}
