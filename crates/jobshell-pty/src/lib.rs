//! Interactive shell sessions over a pseudo-terminal
//!
//! This crate drives a login shell (local, `ssh` or `gsissh`) through a
//! pseudo-terminal and turns it into a synchronous command channel: each
//! command returns its exit status and captured output.
//!
//! # Overview
//!
//! 1. **Spawn**: start the shell on a pty for a [`ShellEndpoint`]
//! 2. **Bootstrap**: answer password and host-key prompts, wait for the prompt
//! 3. **Prompt**: install `PROMPT-$?->` so every prompt carries an exit status
//! 4. **Run**: send one command per line, read up to the next prompt
//!
//! # Capture Modes
//!
//! | Mode | Redirection | stdout | stderr |
//! |------|-------------|--------|--------|
//! | `Ignore` | `1>>/dev/null 2>>/dev/null` | - | - |
//! | `Merged` | `2>&1` | both | - |
//! | `Separate` | `2>/tmp/...` then `cat` | yes | yes |
//! | `Stdout` | `2>/dev/null` | yes | - |
//! | `Stderr` | `2>&1 1>/dev/null` | - | yes |
//!
//! # Example
//!
//! ```ignore
//! use jobshell_pty::{IoMode, PtyShell, Shell, ShellEndpoint};
//!
//! let endpoint = ShellEndpoint::parse("ssh://alice@login.cluster.org")?;
//! let mut shell = PtyShell::open(endpoint).await?;
//!
//! let output = shell.run_sync("hostname", IoMode::Stdout).await?;
//! println!("{} ({})", output.stdout_str().trim(), output.exit_code);
//!
//! shell.stage_to_file("#!/bin/sh\necho hello\n", "$HOME/hello.sh").await?;
//! ```

pub mod endpoint;
pub mod error;
pub mod process;
pub mod shell;

// Re-exports
pub use endpoint::{SecurityContext, ShellCommand, ShellEndpoint, Transport};
pub use error::{ShellError, ShellResult};
pub use process::{PtyMatch, PtyProcess};
pub use shell::{CommandOutput, IoMode, PtyShell, PtyShellFactory, Shell, ShellFactory};
