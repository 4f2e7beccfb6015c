//! The job adaptor: one resource manager, one shell, many jobs.
//!
//! A [`JobAdaptor`] owns a single shell session to its resource manager.
//! All commands go through that session, one at a time; a session found
//! dead is reopened once before an operation gives up.

use std::sync::Arc;
use std::time::Duration;

use jobshell_pty::{CommandOutput, IoMode, PtyShellFactory, Shell, ShellFactory};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::JobBackend;
use crate::config::AdaptorConfig;
use crate::description::JobDescription;
use crate::endpoint::ResourceManager;
use crate::error::{SchedError, SchedResult};
use crate::job::{JobHandle, JobId, JobRecord, JobState};
use crate::registry::BackendRegistry;

/// Name of the generated submission script inside the base directory.
const SCRIPT_NAME: &str = "wrapper.sh";

/// An open shell plus what was learned while opening it.
struct Connection {
    shell: Box<dyn Shell>,
    user: String,
}

/// Submits and tracks jobs on one resource manager.
pub struct JobAdaptor {
    config: AdaptorConfig,
    manager: ResourceManager,
    backend: Box<dyn JobBackend>,
    factory: Arc<dyn ShellFactory>,
    connection: Mutex<Option<Connection>>,
}

impl JobAdaptor {
    /// Connect to the resource manager named in `config` through a pty shell.
    pub async fn connect(config: AdaptorConfig) -> SchedResult<Arc<Self>> {
        Self::with_factory(config, &BackendRegistry::with_defaults(), Arc::new(PtyShellFactory)).await
    }

    /// Connect using a custom backend registry and shell factory.
    pub async fn with_factory(
        config: AdaptorConfig,
        registry: &BackendRegistry,
        factory: Arc<dyn ShellFactory>,
    ) -> SchedResult<Arc<Self>> {
        config.validate()?;
        let manager = ResourceManager::parse(&config.url)?;
        let backend = registry.create(manager.scheme())?;

        let adaptor = Self {
            config,
            manager,
            backend,
            factory,
            connection: Mutex::new(None),
        };

        {
            let mut guard = adaptor.connection.lock().await;
            *guard = Some(adaptor.open().await?);
        }
        info!(url = %adaptor.manager, family = adaptor.backend.family(), "job service connected");

        Ok(Arc::new(adaptor))
    }

    /// Resource-manager URL as used in job ids.
    pub fn url(&self) -> &str {
        self.manager.url()
    }

    pub fn resource_manager(&self) -> &ResourceManager {
        &self.manager
    }

    pub fn backend(&self) -> &dyn JobBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &AdaptorConfig {
        &self.config
    }

    /// Open and prepare a fresh shell.
    async fn open(&self) -> SchedResult<Connection> {
        let endpoint = self.manager.shell_endpoint(&self.config.contexts);
        let mut shell = self.factory.open(&endpoint).await.map_err(|e| {
            SchedError::ConnectionFailure(format!("could not open shell to {}: {e}", self.manager))
        })?;

        let output = shell
            .run_sync(&format!("mkdir -p {}", self.config.base_dir), IoMode::Merged)
            .await
            .map_err(|e| SchedError::ConnectionFailure(format!("failed to prepare base dir: {e}")))?;
        if !output.success() {
            shell.close();
            return Err(SchedError::ConnectionFailure(format!(
                "failed to create base dir {}: {}",
                self.config.base_dir,
                output.stdout_str().trim()
            )));
        }

        let user = match endpoint.login_user() {
            Some(user) => user.to_string(),
            None => {
                let output = shell
                    .run_sync("whoami", IoMode::Stdout)
                    .await
                    .map_err(|e| SchedError::ConnectionFailure(format!("failed to detect user: {e}")))?;
                let user = output.stdout_str().trim().to_string();
                if !output.success() || user.is_empty() {
                    shell.close();
                    return Err(SchedError::ConnectionFailure(
                        "could not determine the user name".to_string(),
                    ));
                }
                user
            }
        };
        debug!(%user, base_dir = %self.config.base_dir, "shell prepared");

        Ok(Connection { shell, user })
    }

    /// Make sure `slot` holds a live connection, reopening it once if needed.
    ///
    /// A failed reopen leaves the adaptor disconnected and is reported as
    /// an incorrect state, not as a connection failure.
    async fn ensure_connected<'a>(
        &self,
        slot: &'a mut Option<Connection>,
    ) -> SchedResult<&'a mut Connection> {
        let alive = slot
            .as_mut()
            .is_some_and(|connection| connection.shell.alive());

        if !alive {
            if let Some(mut dead) = slot.take() {
                warn!(url = %self.manager, "shell is gone, reconnecting");
                dead.shell.close();
            }
            match self.open().await {
                Ok(connection) => *slot = Some(connection),
                Err(e) => {
                    warn!(url = %self.manager, error = %e, "reconnect failed");
                    return Err(SchedError::IncorrectState(
                        "job service is not connected, can't reconnect".to_string(),
                    ));
                }
            }
        }

        slot.as_mut().ok_or_else(|| {
            SchedError::IncorrectState("job service is not connected".to_string())
        })
    }

    /// Run one command on the (possibly reopened) shell.
    async fn run(&self, command: &str, mode: IoMode) -> SchedResult<CommandOutput> {
        let mut guard = self.connection.lock().await;
        let connection = self.ensure_connected(&mut guard).await?;
        connection
            .shell
            .run_sync(command, mode)
            .await
            .map_err(SchedError::from_shell)
    }

    /// User whose jobs this adaptor manages.
    pub async fn user(&self) -> SchedResult<String> {
        let mut guard = self.connection.lock().await;
        let connection = self.ensure_connected(&mut guard).await?;
        Ok(connection.user.clone())
    }

    /// Create a handle for `description`; nothing is submitted yet.
    pub fn create_job(self: &Arc<Self>, description: JobDescription) -> SchedResult<JobHandle> {
        self.check_description(&description)?;
        Ok(JobHandle::new(Arc::new(description), self))
    }

    fn check_description(&self, description: &JobDescription) -> SchedResult<()> {
        description.validate()?;
        let unsupported = self.backend.unsupported(description);
        if !unsupported.is_empty() {
            let names: Vec<_> = unsupported.iter().map(ToString::to_string).collect();
            return Err(SchedError::BadParameter(format!(
                "{} backend does not support: {}",
                self.backend.family(),
                names.join(", ")
            )));
        }
        Ok(())
    }

    /// Render, stage and submit a job script.
    pub async fn submit(&self, description: &JobDescription) -> SchedResult<JobId> {
        self.check_description(description)?;

        let script = self.backend.render_script(description);
        let script_path = format!("{}/{SCRIPT_NAME}", self.config.base_dir);
        debug!(script = %script, "generated submission script");

        // Stage, chmod and submit under one lock: the script path is shared.
        let mut guard = self.connection.lock().await;
        let connection = self.ensure_connected(&mut guard).await?;
        let shell = &mut connection.shell;

        shell
            .stage_to_file(&script, &script_path)
            .await
            .map_err(|e| SchedError::SubmissionFailure(format!("failed to stage script: {e}")))?;

        let output = shell
            .run_sync(&format!("chmod +x {script_path}"), IoMode::Merged)
            .await
            .map_err(SchedError::from_shell)?;
        if !output.success() {
            return Err(SchedError::SubmissionFailure(format!(
                "failed to make script executable: {}",
                output.stdout_str().trim()
            )));
        }

        let output = shell
            .run_sync(&self.backend.submit_command(&script_path), IoMode::Merged)
            .await
            .map_err(SchedError::from_shell)?;

        match self.backend.parse_submission(output.stdout_str()) {
            Some(backend_id) => {
                let id = JobId::new(self.manager.url(), backend_id);
                info!(%id, "job submitted");
                Ok(id)
            }
            None => Err(SchedError::SubmissionFailure(format!(
                "{} did not accept the job ({}): {}",
                self.backend.family(),
                output.exit_code,
                output.stdout_str().trim()
            ))),
        }
    }

    /// Current state of a job as seen by the scheduler.
    ///
    /// Jobs that were never started report NEW and jobs already in a
    /// terminal state report that state; neither touches the shell.
    pub async fn query_state(&self, record: &JobRecord) -> SchedResult<JobState> {
        if !record.is_started() || record.state().is_terminal() {
            return Ok(record.state());
        }
        let id = record.submitted_id()?;
        self.backend_state(id.backend_id()).await
    }

    async fn backend_state(&self, backend_id: &str) -> SchedResult<JobState> {
        let mut guard = self.connection.lock().await;
        let connection = self.ensure_connected(&mut guard).await?;
        let command = self.backend.listing_command(&connection.user);
        let output = connection
            .shell
            .run_sync(&command, IoMode::Stdout)
            .await
            .map_err(SchedError::from_shell)?;
        if !output.success() {
            return Err(SchedError::QueryFailure(format!(
                "failed to query state of {backend_id} ({})",
                output.exit_code
            )));
        }

        let state = self
            .backend
            .parse_listing(output.stdout_str(), &connection.user)
            .into_iter()
            .find(|(listed, _)| self.backend.same_job(listed, backend_id))
            .map_or(JobState::Unknown, |(_, token)| self.backend.map_state(&token));

        debug!(backend_id, %state, "queried job state");
        Ok(state)
    }

    /// Query the state and record it, stamping start and finish times.
    pub async fn refresh_state(&self, record: &mut JobRecord) -> SchedResult<JobState> {
        let state = self.query_state(record).await?;
        Ok(record.observe(state))
    }

    /// Reject ids that were issued by another resource manager.
    fn check_owned(&self, id: &JobId) -> SchedResult<()> {
        if id.endpoint() != self.manager.url() {
            return Err(SchedError::BadParameter(format!(
                "job {id} does not belong to {}",
                self.manager
            )));
        }
        Ok(())
    }

    /// Cancel a job by id.
    pub async fn cancel(&self, id: &JobId) -> SchedResult<()> {
        self.check_owned(id)?;
        let command = self.backend.cancel_command(id.backend_id());
        let output = self.run(&command, IoMode::Merged).await?;
        if !output.success() {
            return Err(SchedError::CancellationFailure(format!(
                "failed to cancel {id} ({}): {}",
                output.exit_code,
                output.stdout_str().trim()
            )));
        }
        info!(%id, "job canceled");
        Ok(())
    }

    /// Cancel the job behind `record` and mark it CANCELED.
    pub async fn cancel_job(&self, record: &mut JobRecord) -> SchedResult<()> {
        let id = record.submitted_id()?.clone();
        self.cancel(&id).await?;
        record.observe(JobState::Canceled);
        Ok(())
    }

    /// Exit code of a finished job.
    pub async fn exit_code(&self, id: &JobId) -> SchedResult<i32> {
        self.check_owned(id)?;
        let command = self.backend.exit_code_command(id.backend_id());
        let output = self.run(&command, IoMode::Stdout).await?;
        if !output.success() {
            return Err(SchedError::QueryFailure(format!(
                "failed to query exit code of {id} ({})",
                output.exit_code
            )));
        }
        self.backend.parse_exit_code(output.stdout_str()).ok_or_else(|| {
            SchedError::QueryFailure(format!("no exit code reported for {id}"))
        })
    }

    /// Poll until the job is in a terminal state.
    ///
    /// Returns `true` once terminal, `false` when `timeout` elapsed first.
    /// `None` waits indefinitely.
    pub async fn wait(&self, record: &mut JobRecord, timeout: Option<Duration>) -> SchedResult<bool> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let interval = self.config.poll_interval();

        loop {
            if self.refresh_state(record).await?.is_terminal() {
                return Ok(true);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    /// Ids of all jobs the scheduler currently lists for the user.
    pub async fn list(&self) -> SchedResult<Vec<JobId>> {
        let mut guard = self.connection.lock().await;
        let connection = self.ensure_connected(&mut guard).await?;
        let command = self.backend.listing_command(&connection.user);
        let output = connection
            .shell
            .run_sync(&command, IoMode::Stdout)
            .await
            .map_err(SchedError::from_shell)?;
        if !output.success() {
            return Err(SchedError::QueryFailure(format!(
                "failed to list jobs ({})",
                output.exit_code
            )));
        }

        Ok(self
            .backend
            .parse_listing(output.stdout_str(), &connection.user)
            .into_iter()
            .map(|(backend_id, _)| JobId::new(self.manager.url(), backend_id))
            .collect())
    }

    /// Close the shell. The next operation reconnects.
    pub async fn close(&self) {
        if let Some(mut connection) = self.connection.lock().await.take() {
            debug!(url = %self.manager, "closing job service");
            connection.shell.close();
        }
    }
}

impl std::fmt::Debug for JobAdaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobAdaptor")
            .field("manager", &self.manager)
            .field("family", &self.backend.family())
            .field("base_dir", &self.config.base_dir)
            .finish()
    }
}
