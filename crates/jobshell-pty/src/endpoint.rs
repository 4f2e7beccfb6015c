//! Shell endpoints: where a shell runs and how it is launched.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ShellError, ShellResult};

/// Shell used for local sessions when `$SHELL` is not set.
const FALLBACK_SHELL: &str = "/bin/sh";

/// Terminal type forced on every session to keep escape sequences out of the output.
const TERMINAL_TYPE: &str = "vt100";

/// How the shell process is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// A login shell forked on this machine.
    Local,
    /// A remote shell through `ssh`.
    Ssh,
    /// A remote shell through `gsissh` (GSI-enabled OpenSSH).
    GsiSsh,
}

impl Transport {
    /// Parse a shell URL scheme (`fork`, `local`, `ssh`, `gsissh`).
    pub fn from_scheme(scheme: &str) -> ShellResult<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "fork" | "local" => Ok(Transport::Local),
            "ssh" => Ok(Transport::Ssh),
            "gsissh" => Ok(Transport::GsiSsh),
            other => Err(ShellError::BadParameter(format!(
                "shell sessions can only handle fork://, ssh:// and gsissh:// URLs, not {other}://"
            ))),
        }
    }

    /// Canonical URL scheme for this transport.
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Local => "fork",
            Transport::Ssh => "ssh",
            Transport::GsiSsh => "gsissh",
        }
    }

    /// Whether the shell runs on another host.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Transport::Local)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Security material handed to a shell session.
///
/// How the material was obtained is up to the caller; the session only
/// decides which pieces apply to its transport.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecurityContext {
    /// Public/private key pair for `ssh`.
    Ssh {
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        user_key: Option<PathBuf>,
    },
    /// Username and password, answered at the password prompt.
    UserPass { user_id: String, password: String },
    /// X.509 proxy certificate for `gsissh`.
    X509 { user_proxy: PathBuf },
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityContext::Ssh { user_id, user_key } => f
                .debug_struct("Ssh")
                .field("user_id", user_id)
                .field("user_key", user_key)
                .finish(),
            SecurityContext::UserPass { user_id, .. } => f
                .debug_struct("UserPass")
                .field("user_id", user_id)
                .field("password", &"[REDACTED]")
                .finish(),
            SecurityContext::X509 { user_proxy } => f
                .debug_struct("X509")
                .field("user_proxy", user_proxy)
                .finish(),
        }
    }
}

/// Target of a shell session.
#[derive(Clone)]
pub struct ShellEndpoint {
    /// How the shell is reached.
    pub transport: Transport,
    /// Remote host (ignored for local sessions).
    pub host: String,
    /// Remote port, if not the transport default.
    pub port: Option<u16>,
    /// Login name; takes precedence over any context user id.
    pub user: Option<String>,
    /// Security contexts to draw keys, passwords and proxies from.
    pub contexts: Vec<SecurityContext>,
    password: Option<String>,
}

impl ShellEndpoint {
    /// Create an endpoint for the given transport and host.
    pub fn new(transport: Transport, host: impl Into<String>) -> Self {
        Self {
            transport,
            host: host.into(),
            port: None,
            user: None,
            contexts: Vec::new(),
            password: None,
        }
    }

    /// Endpoint for a local login shell.
    pub fn local() -> Self {
        Self::new(Transport::Local, "localhost")
    }

    /// Parse a shell URL such as `ssh://user@host:2222` or `fork://localhost`.
    pub fn parse(url: &str) -> ShellResult<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| ShellError::BadParameter(format!("invalid shell URL '{url}': {e}")))?;

        let transport = Transport::from_scheme(parsed.scheme())?;
        let mut endpoint = Self::new(transport, parsed.host_str().unwrap_or("localhost"));
        endpoint.port = parsed.port();
        if !parsed.username().is_empty() {
            endpoint.user = Some(parsed.username().to_string());
        }
        endpoint.password = parsed.password().map(str::to_string);

        Ok(endpoint)
    }

    /// Set the login name.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the remote port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the password answered at a password prompt.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a security context.
    pub fn with_context(mut self, context: SecurityContext) -> Self {
        self.contexts.push(context);
        self
    }

    /// Replace the security contexts.
    pub fn with_contexts(mut self, contexts: Vec<SecurityContext>) -> Self {
        self.contexts = contexts;
        self
    }

    /// Secret to answer a password prompt with, if any was configured.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().or_else(|| {
            self.contexts.iter().find_map(|context| match context {
                SecurityContext::UserPass { password, .. } => Some(password.as_str()),
                _ => None,
            })
        })
    }

    /// Login name for remote transports.
    ///
    /// The name from the URL wins over user ids found in security contexts.
    pub fn login_user(&self) -> Option<&str> {
        if let Some(user) = self.user.as_deref() {
            return Some(user);
        }

        self.contexts.iter().find_map(|context| match context {
            SecurityContext::Ssh {
                user_id: Some(user_id),
                ..
            } if self.transport == Transport::Ssh => Some(user_id.as_str()),
            SecurityContext::UserPass { user_id, .. } => Some(user_id.as_str()),
            _ => None,
        })
    }

    /// Build the command line that starts this shell.
    pub fn command(&self) -> ShellCommand {
        let mut command = ShellCommand {
            program: String::new(),
            args: Vec::new(),
            env: vec![("TERM".to_string(), TERMINAL_TYPE.to_string())],
        };

        match self.transport {
            Transport::Local => {
                command.program = std::env::var("SHELL")
                    .ok()
                    .filter(|shell| !shell.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_SHELL.to_string());
                // Interactive login shell, so that startup files are read.
                command.args.extend(["-l".to_string(), "-i".to_string()]);
            }
            Transport::Ssh | Transport::GsiSsh => {
                command.program = match self.transport {
                    Transport::GsiSsh => "gsissh".to_string(),
                    _ => "ssh".to_string(),
                };
                command.args.push("-t".to_string());

                if let Some(port) = self.port {
                    command.args.extend(["-p".to_string(), port.to_string()]);
                }

                for context in &self.contexts {
                    match context {
                        SecurityContext::Ssh {
                            user_key: Some(key),
                            ..
                        } if self.transport == Transport::Ssh => {
                            command
                                .args
                                .extend(["-i".to_string(), key.display().to_string()]);
                        }
                        SecurityContext::X509 { user_proxy } if self.transport == Transport::GsiSsh => {
                            command.env.push((
                                "X509_USER_PROXY".to_string(),
                                user_proxy.display().to_string(),
                            ));
                        }
                        _ => {}
                    }
                }

                if let Some(user) = self.login_user() {
                    command.args.extend(["-l".to_string(), user.to_string()]);
                }

                command.args.push(self.host.clone());
            }
        }

        command
    }
}

impl fmt::Debug for ShellEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellEndpoint")
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("contexts", &self.contexts)
            .finish()
    }
}

impl fmt::Display for ShellEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.transport)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// A fully resolved process launch: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
