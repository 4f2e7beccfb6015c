//! Resource-manager endpoints.
//!
//! A resource manager is addressed by a URL whose scheme names the scheduler
//! family and, optionally, the shell transport used to reach it:
//!
//! | Scheme | Shell |
//! |--------|-------|
//! | `slurm://host` | local login shell |
//! | `slurm+ssh://user@host` | `ssh` |
//! | `pbs+gsissh://host:2222` | `gsissh` |

use std::fmt;

use jobshell_pty::{SecurityContext, ShellEndpoint, Transport};
use url::Url;

use crate::error::{SchedError, SchedResult};

/// A parsed resource-manager URL.
#[derive(Clone)]
pub struct ResourceManager {
    /// Full scheme, e.g. `slurm+ssh`; the registry key for the backend.
    scheme: String,
    /// Scheduler family, e.g. `slurm`.
    family: String,
    transport: Transport,
    host: String,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    /// The URL without its password, used in job ids and logs.
    public_url: String,
}

impl ResourceManager {
    /// Parse a resource-manager URL.
    pub fn parse(url: &str) -> SchedResult<Self> {
        let mut parsed = Url::parse(url)
            .map_err(|e| SchedError::BadParameter(format!("invalid resource manager URL '{url}': {e}")))?;

        let scheme = parsed.scheme().to_string();
        let (family, transport) = match scheme.split_once('+') {
            Some((family, shell)) => (family.to_string(), shell),
            None => (scheme.clone(), "fork"),
        };
        let transport = Transport::from_scheme(transport).map_err(|_| {
            SchedError::BadParameter(format!("unsupported transport in scheme '{scheme}'"))
        })?;

        let host = parsed.host_str().unwrap_or("localhost").to_string();
        if transport.is_remote() && parsed.host_str().is_none_or(str::is_empty) {
            return Err(SchedError::BadParameter(format!(
                "remote resource manager URL '{scheme}://...' needs a host"
            )));
        }

        let port = parsed.port();
        let user = Some(parsed.username())
            .filter(|user| !user.is_empty())
            .map(str::to_string);
        let password = parsed.password().map(str::to_string);

        if password.is_some() {
            // Only fails for URLs without a host, which carry no password either.
            let _ = parsed.set_password(None);
        }

        Ok(Self {
            scheme,
            family,
            transport,
            host,
            port,
            user,
            password,
            public_url: parsed.to_string(),
        })
    }

    /// Full URL scheme, e.g. `pbs+ssh`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Scheduler family, e.g. `pbs`.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// User name from the URL, if any.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The URL as it appears in job ids (never contains the password).
    pub fn url(&self) -> &str {
        &self.public_url
    }

    /// Shell endpoint that reaches this resource manager.
    pub fn shell_endpoint(&self, contexts: &[SecurityContext]) -> ShellEndpoint {
        let mut endpoint =
            ShellEndpoint::new(self.transport, self.host.clone()).with_contexts(contexts.to_vec());
        endpoint.port = self.port;
        endpoint.user = self.user.clone();
        if let Some(password) = &self.password {
            endpoint = endpoint.with_password(password.clone());
        }
        endpoint
    }
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("url", &self.public_url)
            .field("family", &self.family)
            .field("transport", &self.transport)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl fmt::Display for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.public_url)
    }
}
