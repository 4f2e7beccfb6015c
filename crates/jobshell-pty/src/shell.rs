//! Synchronous command execution over an interactive shell.
//!
//! A [`PtyShell`] bootstraps a shell on a pseudo-terminal, answers password
//! and host-key prompts, and then replaces the user's prompt with one that
//! carries the previous command's exit status:
//!
//! ```text
//!   SPAWN ──→ AWAIT_SIGNAL ──→ native prompt ──→ set PROMPT-$?-> ──→ READY
//!                │    ▲
//!                │    │ password / "yes"
//!                └────┘
//! ```
//!
//! Once ready, each command is one line on the terminal, and its completion
//! is detected by matching the prompt at the end of the output.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::bytes::Regex;
use tracing::{debug, info, warn};

use crate::endpoint::{ShellCommand, ShellEndpoint};
use crate::error::{ShellError, ShellResult};
use crate::process::{PtyMatch, PtyProcess};

/// A line ending in `$`, `#` or `>`: what most user prompts look like.
pub const NATIVE_PROMPT: &str = r"[\$#>]\s*$";

/// The prompt installed after bootstrap. Captures the last exit status.
pub const EXIT_STATUS_PROMPT: &str = r"PROMPT-(\d+)->\s*$";

const PASSWORD_PROMPT: &str = r"(?i)password\s*:\s*$";
const HOST_KEY_PROMPT: &str = r"want to continue connecting";

/// Installs [`EXIT_STATUS_PROMPT`] and silences terminal echo.
const SET_PROMPT_COMMAND: &str = "unset PROMPT_COMMAND; stty -echo; PS1='PROMPT-$?->'; export PS1";

/// How long one bootstrap scan waits before checking that the shell still lives.
const BOOTSTRAP_SCAN_TIMEOUT: Duration = Duration::from_secs(2);

/// Scratch file for stderr in [`IoMode::Separate`]; `$$` keeps sessions apart.
const STDERR_SCRATCH: &str = "/tmp/jobshell.stderr.$$";

/// Upper bound for one staging command line, well below the tty line limit.
const STAGE_CHUNK_BYTES: usize = 1024;

static CONTROL_SEQUENCE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|\x1b[=>]")
        .expect("control sequence pattern is valid")
});

/// Which output streams of a command are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoMode {
    /// Discard stdout and stderr.
    Ignore,
    /// Merge stderr into stdout.
    #[default]
    Merged,
    /// Capture both streams; stderr costs a second round-trip.
    Separate,
    /// Capture stdout, discard stderr.
    Stdout,
    /// Capture stderr, discard stdout.
    Stderr,
}

impl IoMode {
    /// Shell redirection appended to a command in this mode.
    pub fn redirection(&self) -> &'static str {
        match self {
            IoMode::Ignore => " 1>>/dev/null 2>>/dev/null",
            IoMode::Merged => " 2>&1",
            IoMode::Separate => " 2>/tmp/jobshell.stderr.$$",
            IoMode::Stdout => " 2>/dev/null",
            IoMode::Stderr => " 2>&1 1>/dev/null",
        }
    }
}

/// Exit status and captured streams of one command.
///
/// A stream that was not requested is `None`; a requested stream that
/// produced nothing is an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl CommandOutput {
    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Captured stdout, or an empty string if it was not captured.
    pub fn stdout_str(&self) -> &str {
        self.stdout.as_deref().unwrap_or("")
    }
}

/// A shell that runs one command at a time.
#[async_trait]
pub trait Shell: Send {
    /// Run `command` in the foreground and wait for it to finish.
    async fn run_sync(&mut self, command: &str, mode: IoMode) -> ShellResult<CommandOutput>;

    /// Check whether the underlying process is still running.
    fn alive(&mut self) -> bool;

    /// Tear down the session.
    fn close(&mut self);

    /// Write `content` to `target` on the shell's host.
    ///
    /// `target` is double-quoted, so shell variables such as `$HOME` expand.
    async fn stage_to_file(&mut self, content: &str, target: &str) -> ShellResult<()> {
        for command in stage_commands(content, target) {
            let output = self.run_sync(&command, IoMode::Merged).await?;
            if !output.success() {
                return Err(ShellError::NoSuccess(format!(
                    "failed to write {target} ({}): {}",
                    output.exit_code,
                    output.stdout_str().trim()
                )));
            }
        }
        Ok(())
    }
}

/// Opens shells for endpoints.
#[async_trait]
pub trait ShellFactory: Send + Sync {
    async fn open(&self, endpoint: &ShellEndpoint) -> ShellResult<Box<dyn Shell>>;
}

/// Factory for [`PtyShell`] sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct PtyShellFactory;

#[async_trait]
impl ShellFactory for PtyShellFactory {
    async fn open(&self, endpoint: &ShellEndpoint) -> ShellResult<Box<dyn Shell>> {
        let shell = PtyShell::open(endpoint.clone()).await?;
        Ok(Box::new(shell))
    }
}

/// An interactive shell on a pseudo-terminal.
pub struct PtyShell {
    endpoint: ShellEndpoint,
    pty: Option<PtyProcess>,
    prompt: Regex,
}

impl PtyShell {
    /// Start a shell for `endpoint` and bring it to the ready state.
    pub async fn open(endpoint: ShellEndpoint) -> ShellResult<Self> {
        let command = endpoint.command();
        Self::open_with(endpoint, &command).await
    }

    /// Bootstrap `command` as the shell for `endpoint`.
    pub(crate) async fn open_with(endpoint: ShellEndpoint, command: &ShellCommand) -> ShellResult<Self> {
        info!(%endpoint, %command, "opening shell");

        let pty = PtyProcess::spawn(command)?;
        let mut shell = Self {
            endpoint,
            pty: Some(pty),
            prompt: compile_prompt(NATIVE_PROMPT)?,
        };

        if let Err(e) = shell.bootstrap().await {
            shell.close();
            return Err(match e {
                ShellError::ConnectionFailure(_) => e,
                other => ShellError::ConnectionFailure(format!("failed to bootstrap shell: {other}")),
            });
        }

        Ok(shell)
    }

    /// The endpoint this shell was opened for.
    pub fn endpoint(&self) -> &ShellEndpoint {
        &self.endpoint
    }

    /// Everything the shell has printed so far, with protocol markers.
    pub fn transcript(&self) -> String {
        self.pty
            .as_ref()
            .map(PtyProcess::transcript)
            .unwrap_or_default()
    }

    async fn bootstrap(&mut self) -> ShellResult<()> {
        let patterns = [
            compile_prompt(PASSWORD_PROMPT)?,
            compile_prompt(HOST_KEY_PROMPT)?,
            self.prompt.clone(),
        ];

        loop {
            let Some(pty) = self.pty.as_mut() else {
                return Err(ShellError::ConnectionFailure("shell is closed".to_string()));
            };

            let Some(found) = pty.find(&patterns, Some(BOOTSTRAP_SCAN_TIMEOUT)).await? else {
                if !pty.alive() {
                    let transcript = clean_output(pty.transcript().as_bytes());
                    return Err(ShellError::ConnectionFailure(format!(
                        "failed to start shell ({})",
                        transcript.trim()
                    )));
                }
                continue;
            };

            match found.index {
                0 => {
                    pty.note("got password prompt");
                    let Some(secret) = self.endpoint.password() else {
                        return Err(ShellError::ConnectionFailure(format!(
                            "prompted for unknown password ({})",
                            clean_output(&found.matched).trim()
                        )));
                    };
                    pty.write(&format!("{secret}\n"))?;
                }
                1 => {
                    pty.note("got host key prompt");
                    pty.write("yes\n")?;
                }
                _ => {
                    pty.note("got initial shell prompt");
                    break;
                }
            }
        }

        self.run_sync_with_prompt(SET_PROMPT_COMMAND, IoMode::Merged, EXIT_STATUS_PROMPT)
            .await?;
        if let Some(pty) = self.pty.as_mut() {
            pty.note("got new shell prompt");
        }
        debug!(endpoint = %self.endpoint, "shell ready");

        Ok(())
    }

    /// Run a command that changes the prompt, then adopt `new_prompt`.
    ///
    /// The command's completion is detected with `new_prompt`, which must
    /// capture the exit status in its single group.
    pub async fn run_sync_with_prompt(
        &mut self,
        command: &str,
        mode: IoMode,
        new_prompt: &str,
    ) -> ShellResult<CommandOutput> {
        let prompt = compile_prompt(new_prompt)?;
        let output = self.execute(command, mode, &prompt).await?;
        self.set_prompt(new_prompt).await?;
        Ok(output)
    }

    /// Replace the prompt pattern and check it against a fresh prompt.
    ///
    /// The pattern must have exactly one capture group. Sends `true` and
    /// expects the new prompt to report exit status 0; the old pattern is
    /// kept if that fails.
    pub async fn set_prompt(&mut self, pattern: &str) -> ShellResult<()> {
        let prompt = compile_prompt(pattern)?;
        if prompt.captures_len() != 2 {
            return Err(ShellError::BadParameter(format!(
                "prompt '{pattern}' must capture the exit value in one group"
            )));
        }
        let old_prompt = std::mem::replace(&mut self.prompt, prompt);

        match self.run_sync("true", IoMode::Ignore).await {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => {
                self.prompt = old_prompt;
                Err(ShellError::NoSuccess(format!(
                    "could not set prompt, exit value {} instead of 0",
                    output.exit_code
                )))
            }
            Err(e) => {
                self.prompt = old_prompt;
                Err(ShellError::NoSuccess(format!("could not set prompt ({e})")))
            }
        }
    }

    async fn execute(
        &mut self,
        command: &str,
        mode: IoMode,
        prompt: &Regex,
    ) -> ShellResult<CommandOutput> {
        let command = foreground_command(command)?;
        debug!(command, ?mode, "run_sync");

        let found = self
            .round_trip(&format!("{command}{}\n", mode.redirection()), prompt)
            .await?;
        let exit_code = exit_status(prompt, &found)?;
        let text = command_output(&found.preceding);

        let mut output = CommandOutput {
            exit_code,
            stdout: None,
            stderr: None,
        };

        match mode {
            IoMode::Ignore => {}
            IoMode::Merged | IoMode::Stdout => output.stdout = Some(text),
            IoMode::Stderr => output.stderr = Some(text),
            IoMode::Separate => {
                output.stdout = Some(text);

                let found = self
                    .round_trip(&format!("cat {STDERR_SCRATCH}\n"), prompt)
                    .await?;
                let status = exit_status(prompt, &found)?;
                let stderr = command_output(&found.preceding);
                if status != 0 {
                    return Err(ShellError::NoSuccess(format!(
                        "run_sync failed, no stderr ({status}: {})",
                        stderr.trim()
                    )));
                }
                output.stderr = Some(stderr);
            }
        }

        Ok(output)
    }

    /// Write one line and block until `prompt` shows up again.
    ///
    /// The session is closed if the prompt never appears.
    async fn round_trip(&mut self, line: &str, prompt: &Regex) -> ShellResult<PtyMatch> {
        let Some(pty) = self.pty.as_mut() else {
            return Err(ShellError::NoSuccess("shell is closed".to_string()));
        };

        pty.write(line)?;
        match pty.find(std::slice::from_ref(prompt), None).await? {
            Some(found) => Ok(found),
            None => {
                warn!(endpoint = %self.endpoint, "prompt not found, closing shell");
                self.close();
                Err(ShellError::NoSuccess(format!(
                    "run_sync failed, no prompt ({})",
                    line.trim_end()
                )))
            }
        }
    }
}

#[async_trait]
impl Shell for PtyShell {
    async fn run_sync(&mut self, command: &str, mode: IoMode) -> ShellResult<CommandOutput> {
        let prompt = self.prompt.clone();
        self.execute(command, mode, &prompt).await
    }

    fn alive(&mut self) -> bool {
        self.pty.as_mut().is_some_and(PtyProcess::alive)
    }

    fn close(&mut self) {
        if let Some(mut pty) = self.pty.take() {
            pty.close();
        }
    }
}

impl Drop for PtyShell {
    fn drop(&mut self) {
        self.close();
    }
}

/// Compile a prompt pattern.
fn compile_prompt(pattern: &str) -> ShellResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| ShellError::BadParameter(format!("invalid prompt pattern '{pattern}': {e}")))
}

/// Reject commands that would detach from the shell.
pub fn foreground_command(command: &str) -> ShellResult<&str> {
    let command = command.trim();
    if command.ends_with('&') && !command.ends_with("&&") {
        return Err(ShellError::BadParameter(format!(
            "can only run foreground jobs ('{command}')"
        )));
    }
    Ok(command)
}

/// Extract the exit status captured by `prompt` from a prompt match.
fn exit_status(prompt: &Regex, found: &PtyMatch) -> ShellResult<i32> {
    let captures = prompt.captures(&found.matched).ok_or_else(|| {
        ShellError::NoSuccess(format!(
            "could not parse prompt ({})",
            String::from_utf8_lossy(&found.matched)
        ))
    })?;

    let status = captures.get(1).ok_or_else(|| {
        ShellError::NoSuccess(format!(
            "prompt does not capture exit value ({})",
            prompt.as_str()
        ))
    })?;

    std::str::from_utf8(status.as_bytes())
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            ShellError::NoSuccess(format!(
                "could not parse exit value ({})",
                String::from_utf8_lossy(status.as_bytes())
            ))
        })
}

/// Turn raw terminal output into plain text.
///
/// Drops terminal control sequences and carriage returns.
pub fn clean_output(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = CONTROL_SEQUENCE.replace_all(&text, "");
    text.replace("\r\n", "\n").replace('\r', "")
}

/// Output of one command, without the line break that accepted its input.
///
/// Line-editing shells print that break even with echo off.
fn command_output(raw: &[u8]) -> String {
    let text = clean_output(raw);
    match text.strip_prefix('\n') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Quote `s` for a POSIX shell.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Single-line commands that write `content` to `target`.
///
/// Lines are passed as `printf '%s\n'` arguments so no command spans more
/// than one terminal line; long content is split over several appends.
pub fn stage_commands(content: &str, target: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut args = String::new();

    let command = |args: &str, first: bool| {
        let op = if first { ">" } else { ">>" };
        format!("printf '%s\\n'{args} {op} \"{target}\"")
    };

    for line in content.lines() {
        let quoted = quote(line);
        if !args.is_empty() && args.len() + quoted.len() > STAGE_CHUNK_BYTES {
            commands.push(command(&args, commands.is_empty()));
            args.clear();
        }
        args.push(' ');
        args.push_str(&quoted);
    }

    if !args.is_empty() {
        commands.push(command(&args, commands.is_empty()));
    }
    if commands.is_empty() {
        commands.push(format!(": > \"{target}\""));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_commands_rejected() {
        assert!(matches!(
            foreground_command("sleep 100 &"),
            Err(ShellError::BadParameter(_))
        ));
        assert!(matches!(
            foreground_command("  sleep 100 &  "),
            Err(ShellError::BadParameter(_))
        ));
        assert_eq!(foreground_command(" ls -l ").unwrap(), "ls -l");
        assert_eq!(
            foreground_command("make 2>&1").unwrap(),
            "make 2>&1"
        );
    }

    #[test]
    fn test_redirections() {
        assert_eq!(IoMode::Ignore.redirection(), " 1>>/dev/null 2>>/dev/null");
        assert_eq!(IoMode::Merged.redirection(), " 2>&1");
        assert_eq!(
            IoMode::Separate.redirection(),
            format!(" 2>{STDERR_SCRATCH}")
        );
        assert_eq!(IoMode::Stdout.redirection(), " 2>/dev/null");
        assert_eq!(IoMode::Stderr.redirection(), " 2>&1 1>/dev/null");
        assert_eq!(IoMode::default(), IoMode::Merged);
    }

    #[test]
    fn test_exit_status_from_prompt() {
        let prompt = compile_prompt(EXIT_STATUS_PROMPT).unwrap();
        let found = PtyMatch {
            index: 0,
            preceding: b"hello\r\n".to_vec(),
            matched: b"PROMPT-127->".to_vec(),
        };
        assert_eq!(exit_status(&prompt, &found).unwrap(), 127);
    }

    #[test]
    fn test_prompt_without_group_is_rejected() {
        let prompt = compile_prompt(r"\$\s*$").unwrap();
        let found = PtyMatch {
            index: 0,
            preceding: Vec::new(),
            matched: b"$ ".to_vec(),
        };
        assert!(matches!(
            exit_status(&prompt, &found),
            Err(ShellError::NoSuccess(_))
        ));
    }

    #[test]
    fn test_exit_prompt_ignores_echoed_prompt_command() {
        let prompt = compile_prompt(EXIT_STATUS_PROMPT).unwrap();
        assert!(!prompt.is_match(SET_PROMPT_COMMAND.as_bytes()));
        assert!(prompt.is_match(b"output\r\nPROMPT-0->"));
        assert!(prompt.is_match(b"PROMPT-1->\r\n"));
        assert!(!prompt.is_match(b"PROMPT-1-> trailing"));
    }

    #[test]
    fn test_native_prompt_patterns() {
        let prompt = compile_prompt(NATIVE_PROMPT).unwrap();
        assert!(prompt.is_match(b"user@login1:~$ "));
        assert!(prompt.is_match(b"[root@node ~]# "));
        assert!(prompt.is_match(b"login1> "));
        assert!(!prompt.is_match(b"Last login: Mon Jan  1\r\n"));

        let password = compile_prompt(PASSWORD_PROMPT).unwrap();
        assert!(password.is_match(b"alice@host's Password: "));
    }

    #[test]
    fn test_clean_output() {
        assert_eq!(clean_output(b"a\r\nb\r\n"), "a\nb\n");
        assert_eq!(clean_output(b"\x1b[?2004lfoo\r\n\x1b[?2004h"), "foo\n");
        assert_eq!(clean_output(b"\x1b]0;title\x07bar"), "bar");
    }

    #[test]
    fn test_command_output_drops_accept_newline() {
        assert_eq!(command_output(b"\r\n"), "");
        assert_eq!(command_output(b"\x1b[?2004l\r\r\nhello\r\n\x1b[?2004h"), "hello\n");
        assert_eq!(command_output(b"\r\n\r\nblank first\r\n"), "\nblank first\n");
        assert_eq!(command_output(b"no break\r\n"), "no break\n");
        assert_eq!(command_output(b""), "");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn test_stage_commands_single_chunk() {
        let commands = stage_commands("#!/bin/bash\necho 'hi'\n", "$HOME/job.sh");
        assert_eq!(
            commands,
            vec![r#"printf '%s\n' '#!/bin/bash' 'echo '\''hi'\''' > "$HOME/job.sh""#]
        );
    }

    #[test]
    fn test_stage_commands_split_and_append() {
        let line = "x".repeat(600);
        let content = format!("{line}\n{line}\n{line}\n");
        let commands = stage_commands(&content, "/tmp/out");

        assert_eq!(commands.len(), 3);
        assert!(commands[0].ends_with(r#"> "/tmp/out""#));
        assert!(commands[1].ends_with(r#">> "/tmp/out""#));
        assert!(commands[2].ends_with(r#">> "/tmp/out""#));
        assert!(commands.iter().all(|c| !c.contains('\n')));
    }

    #[test]
    fn test_stage_commands_empty_content() {
        assert_eq!(stage_commands("", "/tmp/empty"), vec![r#": > "/tmp/empty""#]);
    }

    /// A bash without startup files, optionally behind a login dialogue.
    fn scripted_shell(dialogue: &str) -> ShellCommand {
        ShellCommand {
            program: "/bin/sh".to_string(),
            args: vec![
                "-c".to_string(),
                format!("{dialogue}exec bash --norc --noprofile -i"),
            ],
            env: vec![
                ("TERM".to_string(), "vt100".to_string()),
                ("PS1".to_string(), "$ ".to_string()),
                ("HISTFILE".to_string(), "/dev/null".to_string()),
            ],
        }
    }

    async fn open_scripted(endpoint: ShellEndpoint, dialogue: &str) -> ShellResult<PtyShell> {
        PtyShell::open_with(endpoint, &scripted_shell(dialogue)).await
    }

    #[tokio::test]
    async fn test_bootstrap_answers_password_and_host_key() {
        let dialogue = "printf 'alice@login1 password: '; read -r pw; \
            printf 'Are you sure you want to continue connecting (yes/no)? '; read -r answer; \
            export GOT_PW=\"$pw\" GOT_ANSWER=\"$answer\"; ";
        let endpoint = ShellEndpoint::local().with_password("s3cret");
        let mut shell = open_scripted(endpoint, dialogue).await.unwrap();

        let output = shell
            .run_sync("echo \"$GOT_PW $GOT_ANSWER\"", IoMode::Merged)
            .await
            .unwrap();
        assert_eq!(output.stdout.as_deref(), Some("s3cret yes\n"));

        let transcript = shell.transcript();
        assert!(transcript.contains("[jobshell: got password prompt]"));
        assert!(transcript.contains("[jobshell: got host key prompt]"));
        assert!(transcript.contains("[jobshell: got new shell prompt]"));
    }

    #[tokio::test]
    async fn test_bootstrap_without_password_fails() {
        let dialogue = "printf 'Password: '; read -r pw; ";
        let err = open_scripted(ShellEndpoint::local(), dialogue)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ShellError::ConnectionFailure(ref m) if m.contains("unknown password")));
    }

    #[tokio::test]
    async fn test_bootstrap_process_exit_is_connection_failure() {
        let command = ShellCommand {
            program: "/bin/sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo 'ssh: connect to host nowhere port 22: No route to host'; exit 255".to_string(),
            ],
            env: Vec::new(),
        };
        let err = PtyShell::open_with(ShellEndpoint::local(), &command)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ShellError::ConnectionFailure(ref m) if m.contains("No route to host")));
    }

    #[tokio::test]
    async fn test_capture_modes() {
        let mut shell = open_scripted(ShellEndpoint::local(), "").await.unwrap();
        let both = "sh -c 'echo out; echo err >&2'";

        let output = shell.run_sync(both, IoMode::Ignore).await.unwrap();
        assert_eq!((output.stdout, output.stderr), (None, None));

        let output = shell.run_sync(both, IoMode::Merged).await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some("out\nerr\n"));
        assert_eq!(output.stderr, None);

        let output = shell.run_sync(both, IoMode::Separate).await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some("out\n"));
        assert_eq!(output.stderr.as_deref(), Some("err\n"));

        let output = shell.run_sync(both, IoMode::Stdout).await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some("out\n"));
        assert_eq!(output.stderr, None);

        let output = shell.run_sync(both, IoMode::Stderr).await.unwrap();
        assert_eq!(output.stdout, None);
        assert_eq!(output.stderr.as_deref(), Some("err\n"));
    }

    #[tokio::test]
    async fn test_silent_command_yields_empty_streams() {
        let mut shell = open_scripted(ShellEndpoint::local(), "").await.unwrap();

        let output = shell.run_sync("true", IoMode::Merged).await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some(""));

        let output = shell.run_sync("true", IoMode::Separate).await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some(""));
        assert_eq!(output.stderr.as_deref(), Some(""));

        let output = shell.run_sync("exit 3", IoMode::Merged).await;
        assert!(output.is_err());
        assert!(!shell.alive());
    }

    #[test]
    fn test_command_output_streams() {
        let output = CommandOutput {
            exit_code: 0,
            stdout: None,
            stderr: None,
        };
        assert!(output.success());
        assert_eq!(output.stdout_str(), "");
    }
}
