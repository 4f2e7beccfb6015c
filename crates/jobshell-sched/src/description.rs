//! Job descriptions.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};

/// The attributes a job description can carry.
///
/// Backends declare which of these they can express; setting one a backend
/// does not support makes submission fail early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAttribute {
    Name,
    Executable,
    Arguments,
    Environment,
    WorkingDirectory,
    Input,
    Output,
    Error,
    Queue,
    Project,
    WallTimeLimit,
    JobContact,
    NumberOfProcesses,
    ProcessesPerHost,
    ThreadsPerProcess,
    TotalCpuCount,
    TotalPhysicalMemory,
    CandidateHosts,
}

impl JobAttribute {
    /// Every attribute, in declaration order.
    pub const ALL: [JobAttribute; 18] = [
        JobAttribute::Name,
        JobAttribute::Executable,
        JobAttribute::Arguments,
        JobAttribute::Environment,
        JobAttribute::WorkingDirectory,
        JobAttribute::Input,
        JobAttribute::Output,
        JobAttribute::Error,
        JobAttribute::Queue,
        JobAttribute::Project,
        JobAttribute::WallTimeLimit,
        JobAttribute::JobContact,
        JobAttribute::NumberOfProcesses,
        JobAttribute::ProcessesPerHost,
        JobAttribute::ThreadsPerProcess,
        JobAttribute::TotalCpuCount,
        JobAttribute::TotalPhysicalMemory,
        JobAttribute::CandidateHosts,
    ];

    /// Field name as used in serialized descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobAttribute::Name => "name",
            JobAttribute::Executable => "executable",
            JobAttribute::Arguments => "arguments",
            JobAttribute::Environment => "environment",
            JobAttribute::WorkingDirectory => "working_directory",
            JobAttribute::Input => "input",
            JobAttribute::Output => "output",
            JobAttribute::Error => "error",
            JobAttribute::Queue => "queue",
            JobAttribute::Project => "project",
            JobAttribute::WallTimeLimit => "wall_time_limit",
            JobAttribute::JobContact => "job_contact",
            JobAttribute::NumberOfProcesses => "number_of_processes",
            JobAttribute::ProcessesPerHost => "processes_per_host",
            JobAttribute::ThreadsPerProcess => "threads_per_process",
            JobAttribute::TotalCpuCount => "total_cpu_count",
            JobAttribute::TotalPhysicalMemory => "total_physical_memory",
            JobAttribute::CandidateHosts => "candidate_hosts",
        }
    }
}

impl fmt::Display for JobAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a batch job, independent of any scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobDescription {
    /// Job name shown by the scheduler.
    pub name: Option<String>,
    /// Program to run.
    pub executable: String,
    /// Program arguments, in order.
    pub arguments: Vec<String>,
    /// Environment variables exported before the program starts.
    pub environment: FxHashMap<String, String>,
    pub working_directory: Option<String>,
    /// File connected to stdin.
    pub input: Option<String>,
    /// File receiving stdout.
    pub output: Option<String>,
    /// File receiving stderr.
    pub error: Option<String>,
    pub queue: Option<String>,
    /// Project or account charged for the job.
    pub project: Option<String>,
    /// Wall-time limit in minutes.
    pub wall_time_limit: Option<u32>,
    /// Address notified about job events.
    pub job_contact: Option<String>,
    pub number_of_processes: Option<u32>,
    pub processes_per_host: Option<u32>,
    pub threads_per_process: Option<u32>,
    pub total_cpu_count: Option<u32>,
    /// Memory in megabytes.
    pub total_physical_memory: Option<u64>,
    pub candidate_hosts: Vec<String>,
}

impl JobDescription {
    /// Create a description that runs `executable`.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    /// Load a description from a JSON document.
    pub fn from_json_str(json: &str) -> SchedResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a description from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> SchedResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_input(mut self, path: impl Into<String>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<String>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_error(mut self, path: impl Into<String>) -> Self {
        self.error = Some(path.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the wall-time limit in minutes.
    pub fn with_wall_time_limit(mut self, minutes: u32) -> Self {
        self.wall_time_limit = Some(minutes);
        self
    }

    pub fn with_job_contact(mut self, contact: impl Into<String>) -> Self {
        self.job_contact = Some(contact.into());
        self
    }

    pub fn with_number_of_processes(mut self, n: u32) -> Self {
        self.number_of_processes = Some(n);
        self
    }

    pub fn with_processes_per_host(mut self, n: u32) -> Self {
        self.processes_per_host = Some(n);
        self
    }

    pub fn with_threads_per_process(mut self, n: u32) -> Self {
        self.threads_per_process = Some(n);
        self
    }

    pub fn with_total_cpu_count(mut self, n: u32) -> Self {
        self.total_cpu_count = Some(n);
        self
    }

    /// Set the memory requirement in megabytes.
    pub fn with_total_physical_memory(mut self, megabytes: u64) -> Self {
        self.total_physical_memory = Some(megabytes);
        self
    }

    pub fn with_candidate_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// The attributes that carry a value.
    pub fn attributes(&self) -> Vec<JobAttribute> {
        JobAttribute::ALL
            .into_iter()
            .filter(|attribute| self.is_set(*attribute))
            .collect()
    }

    /// Whether `attribute` carries a value.
    pub fn is_set(&self, attribute: JobAttribute) -> bool {
        match attribute {
            JobAttribute::Name => self.name.is_some(),
            JobAttribute::Executable => !self.executable.is_empty(),
            JobAttribute::Arguments => !self.arguments.is_empty(),
            JobAttribute::Environment => !self.environment.is_empty(),
            JobAttribute::WorkingDirectory => self.working_directory.is_some(),
            JobAttribute::Input => self.input.is_some(),
            JobAttribute::Output => self.output.is_some(),
            JobAttribute::Error => self.error.is_some(),
            JobAttribute::Queue => self.queue.is_some(),
            JobAttribute::Project => self.project.is_some(),
            JobAttribute::WallTimeLimit => self.wall_time_limit.is_some(),
            JobAttribute::JobContact => self.job_contact.is_some(),
            JobAttribute::NumberOfProcesses => self.number_of_processes.is_some(),
            JobAttribute::ProcessesPerHost => self.processes_per_host.is_some(),
            JobAttribute::ThreadsPerProcess => self.threads_per_process.is_some(),
            JobAttribute::TotalCpuCount => self.total_cpu_count.is_some(),
            JobAttribute::TotalPhysicalMemory => self.total_physical_memory.is_some(),
            JobAttribute::CandidateHosts => !self.candidate_hosts.is_empty(),
        }
    }

    /// Check that the description can be submitted at all.
    pub fn validate(&self) -> SchedResult<()> {
        if self.executable.trim().is_empty() {
            return Err(SchedError::BadParameter(
                "job description has no executable".to_string(),
            ));
        }
        Ok(())
    }

    /// Environment entries sorted by variable name.
    pub fn sorted_environment(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .environment
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// The command line: executable followed by arguments, space separated.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
