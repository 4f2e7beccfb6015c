//! Job identity, lifecycle state and handles.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adaptor::JobAdaptor;
use crate::description::JobDescription;
use crate::error::{SchedError, SchedResult};

static JOB_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(.*)\]-\[([^\[\]]*)\]$").expect("job id pattern is valid")
});

/// Identifier of a submitted job: `[<resource-manager-url>]-[<backend-id>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId {
    endpoint: String,
    backend_id: String,
}

impl JobId {
    /// Compose an id from a resource-manager URL and a scheduler-native id.
    pub fn new(endpoint: impl Into<String>, backend_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            backend_id: backend_id.into(),
        }
    }

    /// The resource-manager URL part.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The scheduler-native id.
    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]-[{}]", self.endpoint, self.backend_id)
    }
}

impl FromStr for JobId {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = JOB_ID
            .captures(s)
            .ok_or_else(|| SchedError::BadParameter(format!("cannot parse job id '{s}'")))?;
        Ok(Self::new(&captures[1], &captures[2]))
    }
}

impl TryFrom<String> for JobId {
    type Error = SchedError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.to_string()
    }
}

/// Canonical job state, independent of the scheduler's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Created but not submitted.
    New,
    /// Waiting in the queue.
    Pending,
    Running,
    Suspended,
    /// Finished.
    Done,
    Failed,
    Canceled,
    /// The scheduler no longer (or never) reported the job.
    Unknown,
}

impl JobState {
    /// Whether the state is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Canceled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::New => "NEW",
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Suspended => "SUSPENDED",
            JobState::Done => "DONE",
            JobState::Failed => "FAILED",
            JobState::Canceled => "CANCELED",
            JobState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Lifecycle bookkeeping of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    id: Option<JobId>,
    state: JobState,
    started: bool,
    exit_code: Option<i32>,
    created: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// A record for a job that has not been submitted yet.
    pub fn new() -> Self {
        Self {
            id: None,
            state: JobState::New,
            started: false,
            exit_code: None,
            created: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> Option<&JobId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Whether the job was submitted successfully.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Exit code, once retrieved.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the job was first seen running.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the job was first seen in a terminal state.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The backend id, or IncorrectState if the job was never submitted.
    pub(crate) fn submitted_id(&self) -> SchedResult<&JobId> {
        match (&self.id, self.started) {
            (Some(id), true) => Ok(id),
            _ => Err(SchedError::IncorrectState(
                "job has not been started".to_string(),
            )),
        }
    }

    pub(crate) fn mark_submitted(&mut self, id: JobId) {
        self.id = Some(id);
        self.started = true;
        self.state = JobState::Pending;
    }

    pub(crate) fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    /// Apply an observed state. Terminal states are never left.
    pub(crate) fn observe(&mut self, state: JobState) -> JobState {
        if self.state.is_terminal() || state == self.state {
            return self.state;
        }

        debug!(id = ?self.id.as_ref().map(ToString::to_string), from = %self.state, to = %state, "job state changed");
        let now = Utc::now();
        if state == JobState::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if state.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
        self.state = state;
        self.state
    }
}

impl Default for JobRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// A job created by a [`JobAdaptor`].
///
/// The handle holds a weak reference to its adaptor; once the adaptor is
/// dropped every backend operation fails with IncorrectState.
pub struct JobHandle {
    record: JobRecord,
    description: Arc<JobDescription>,
    adaptor: Weak<JobAdaptor>,
}

impl JobHandle {
    pub(crate) fn new(description: Arc<JobDescription>, adaptor: &Arc<JobAdaptor>) -> Self {
        Self {
            record: JobRecord::new(),
            description,
            adaptor: Arc::downgrade(adaptor),
        }
    }

    /// Job id, set once [`run`](Self::run) succeeded.
    pub fn id(&self) -> Option<&JobId> {
        self.record.id()
    }

    /// Last known state, without asking the scheduler.
    pub fn state(&self) -> JobState {
        self.record.state()
    }

    pub fn record(&self) -> &JobRecord {
        &self.record
    }

    pub fn description(&self) -> &JobDescription {
        &self.description
    }

    fn adaptor(&self) -> SchedResult<Arc<JobAdaptor>> {
        self.adaptor.upgrade().ok_or_else(|| {
            SchedError::IncorrectState("job service has been closed".to_string())
        })
    }

    /// Submit the job.
    pub async fn run(&mut self) -> SchedResult<()> {
        if self.record.is_started() {
            return Err(SchedError::IncorrectState(format!(
                "job {} has already been started",
                self.record.id().map(ToString::to_string).unwrap_or_default()
            )));
        }

        let adaptor = self.adaptor()?;
        let id = adaptor.submit(&self.description).await?;
        self.record.mark_submitted(id);
        Ok(())
    }

    /// Ask the scheduler for the current state and remember it.
    pub async fn refresh_state(&mut self) -> SchedResult<JobState> {
        let adaptor = self.adaptor()?;
        adaptor.refresh_state(&mut self.record).await
    }

    /// Cancel the job.
    pub async fn cancel(&mut self) -> SchedResult<()> {
        self.record.submitted_id()?;
        let adaptor = self.adaptor()?;
        adaptor.cancel_job(&mut self.record).await
    }

    /// Exit code of the job; cached after the first successful query.
    pub async fn exit_code(&mut self) -> SchedResult<i32> {
        if let Some(code) = self.record.exit_code() {
            return Ok(code);
        }

        let id = self.record.submitted_id()?.clone();
        let adaptor = self.adaptor()?;
        let code = adaptor.exit_code(&id).await?;
        self.record.set_exit_code(code);
        Ok(code)
    }

    /// Wait until the job reaches a terminal state.
    ///
    /// Returns `false` if `timeout` elapsed first; `None` waits forever.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> SchedResult<bool> {
        self.record.submitted_id()?;
        let adaptor = self.adaptor()?;
        adaptor.wait(&mut self.record, timeout).await
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("record", &self.record)
            .field("executable", &self.description.executable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::new("slurm+ssh://cluster.example.edu", "255042");
        assert_eq!(id.to_string(), "[slurm+ssh://cluster.example.edu]-[255042]");

        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.endpoint(), "slurm+ssh://cluster.example.edu");
        assert_eq!(parsed.backend_id(), "255042");
    }

    #[test]
    fn test_job_id_malformed() {
        for bad in ["255042", "[slurm://host]", "slurm://host-[1]", "[a]-[b]c", ""] {
            assert!(
                matches!(bad.parse::<JobId>(), Err(SchedError::BadParameter(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_job_id_serde() {
        let id = JobId::new("pbs://localhost", "12345.server");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"[pbs://localhost]-[12345.server]\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Done.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Canceled.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Unknown.is_terminal());
        assert!(!JobState::New.is_terminal());
    }

    #[test]
    fn test_record_timestamps() {
        let mut record = JobRecord::new();
        assert_eq!(record.state(), JobState::New);
        assert!(record.submitted_id().is_err());

        record.mark_submitted(JobId::new("slurm://localhost", "1"));
        assert_eq!(record.state(), JobState::Pending);
        assert!(record.started_at().is_none());

        record.observe(JobState::Running);
        let started = record.started_at().unwrap();
        record.observe(JobState::Suspended);
        record.observe(JobState::Running);
        assert_eq!(record.started_at(), Some(started));
        assert!(record.finished_at().is_none());

        record.observe(JobState::Done);
        assert!(record.finished_at().is_some());
    }

    fn observable_state() -> impl Strategy<Value = JobState> {
        prop::sample::select(vec![
            JobState::Pending,
            JobState::Running,
            JobState::Suspended,
            JobState::Done,
            JobState::Failed,
            JobState::Canceled,
            JobState::Unknown,
        ])
    }

    proptest! {
        #[test]
        fn prop_terminal_state_is_monotonic(
            observations in prop::collection::vec(observable_state(), 1..30),
        ) {
            let mut record = JobRecord::new();
            record.mark_submitted(JobId::new("slurm://localhost", "1"));

            let mut terminal: Option<JobState> = None;
            for observed in observations {
                let state = record.observe(observed);
                match terminal {
                    Some(t) => prop_assert_eq!(state, t),
                    None if state.is_terminal() => terminal = Some(state),
                    None => {}
                }
            }
        }
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut record = JobRecord::new();
        record.mark_submitted(JobId::new("slurm://localhost", "1"));
        record.observe(JobState::Canceled);

        assert_eq!(record.observe(JobState::Running), JobState::Canceled);
        assert_eq!(record.observe(JobState::Unknown), JobState::Canceled);
        assert_eq!(record.state(), JobState::Canceled);
    }
}
