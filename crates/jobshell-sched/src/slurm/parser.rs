//! Parsers for SLURM command output.

use std::sync::LazyLock;

use regex::Regex;

use crate::job::JobState;

/// Marker `sbatch` prints when it accepted a job.
pub const SUBMITTED_MARKER: &str = "Submitted batch job";

static EXIT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ExitCode=(\d+)").expect("exit code pattern is valid"));

/// SLURM job state, as reported by `squeue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlurmState {
    Pending,
    Configuring,
    Running,
    Suspended,
    Completing,
    Completed,
    Cancelled,
    Failed,
    NodeFail,
    Preempted,
    Timeout,
    Unknown(String),
}

impl SlurmState {
    /// Parse a long state name or its two-letter code.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "PENDING" | "PD" => SlurmState::Pending,
            "CONFIGURING" | "CF" => SlurmState::Configuring,
            "RUNNING" | "R" => SlurmState::Running,
            "SUSPENDED" | "S" => SlurmState::Suspended,
            "COMPLETING" | "CG" => SlurmState::Completing,
            "COMPLETED" | "CD" => SlurmState::Completed,
            "CANCELLED" | "CA" => SlurmState::Cancelled,
            "FAILED" | "F" => SlurmState::Failed,
            "NODE_FAIL" | "NF" => SlurmState::NodeFail,
            "PREEMPTED" | "PR" => SlurmState::Preempted,
            "TIMEOUT" | "TO" => SlurmState::Timeout,
            _ => SlurmState::Unknown(token.to_string()),
        }
    }

    /// The canonical state for this SLURM state.
    ///
    /// Completing jobs count as done; preempted and timed-out jobs as
    /// canceled.
    pub fn job_state(&self) -> JobState {
        match self {
            SlurmState::Pending | SlurmState::Configuring => JobState::Pending,
            SlurmState::Running => JobState::Running,
            SlurmState::Suspended => JobState::Suspended,
            SlurmState::Completing | SlurmState::Completed => JobState::Done,
            SlurmState::Cancelled | SlurmState::Preempted | SlurmState::Timeout => {
                JobState::Canceled
            }
            SlurmState::Failed | SlurmState::NodeFail => JobState::Failed,
            SlurmState::Unknown(_) => JobState::Unknown,
        }
    }
}

/// Extract the job id from `sbatch` output.
///
/// Looks for a line containing "Submitted batch job <ID>" anywhere in the
/// output, since login banners and warnings may come first.
pub fn parse_sbatch_output(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.contains(SUBMITTED_MARKER))
        .find_map(|line| line.split_whitespace().last())
        .map(str::to_string)
}

/// Parse `squeue -h -o "%i %t"` output into `(id, state code)` pairs.
pub fn parse_squeue_listing(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let state = fields.next()?;
            Some((id.to_string(), state.to_string()))
        })
        .collect()
}

/// Extract the exit code from `scontrol show job` output.
///
/// SLURM reports `ExitCode=<code>:<signal>`; only the code is returned.
pub fn parse_scontrol_exit_code(output: &str) -> Option<i32> {
    EXIT_CODE
        .captures(output)
        .and_then(|captures| captures[1].parse().ok())
}
