//! Parsers for PBS command output.

use crate::job::JobState;

/// PBS job state code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbsState {
    /// Job is queued and waiting for resources.
    Queued,
    Running,
    /// Job is exiting (finishing up).
    Exiting,
    Completed,
    /// Job is held and will not run until released.
    Held,
    /// Job is waiting for its scheduled start time.
    Waiting,
    Suspended,
    /// Job is being moved to another location.
    Transit,
    /// Array job with subjobs running.
    ArrayRunning,
    /// Finished PBS Pro job (`F`).
    Finished,
    /// Expired subjob.
    Expired,
    Unknown(String),
}

impl PbsState {
    /// Parse a state code or its long name.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "Q" | "QUEUED" => PbsState::Queued,
            "R" | "RUNNING" => PbsState::Running,
            "E" | "EXITING" => PbsState::Exiting,
            "C" | "COMPLETED" => PbsState::Completed,
            "H" | "HELD" => PbsState::Held,
            "W" | "WAITING" => PbsState::Waiting,
            "S" | "SUSPENDED" => PbsState::Suspended,
            "T" | "TRANSIT" => PbsState::Transit,
            "B" | "BEGUN" => PbsState::ArrayRunning,
            "F" | "FINISHED" => PbsState::Finished,
            "X" | "EXPIRED" => PbsState::Expired,
            _ => PbsState::Unknown(token.to_string()),
        }
    }

    /// The canonical state for this PBS state.
    pub fn job_state(&self) -> JobState {
        match self {
            PbsState::Queued | PbsState::Held | PbsState::Waiting | PbsState::Transit => {
                JobState::Pending
            }
            PbsState::Running | PbsState::Exiting | PbsState::ArrayRunning => JobState::Running,
            PbsState::Completed | PbsState::Finished => JobState::Done,
            PbsState::Suspended => JobState::Suspended,
            PbsState::Expired => JobState::Failed,
            PbsState::Unknown(_) => JobState::Unknown,
        }
    }
}

/// Extract the job id from `qsub` output.
///
/// qsub output format varies by PBS implementation:
/// - PBS Pro: "12345.pbs-server"
/// - Torque: "12345.server.domain.com"
/// - some sites: just "12345"
pub fn parse_qsub_output(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let number = line.split('.').next().unwrap_or_default();
            !number.is_empty()
                && number.chars().all(|c| c.is_ascii_digit())
                && !line.contains(char::is_whitespace)
        })
        .last()
        .map(str::to_string)
}

/// Parse brief `qstat` output into `(id, state code)` pairs owned by `user`.
///
/// ```text
/// Job id            Name             User              Time Use S Queue
/// ----------------  ---------------- ----------------  -------- - -----
/// 12345.pbs-server  my_job           user              00:05:23 R batch
/// ```
pub fn parse_qstat_brief_output(output: &str, user: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 || parts[0].starts_with('-') || parts[0] == "Job" {
                return None;
            }
            // parts[1] is the name, parts[3] the time used
            if parts[2] != user {
                return None;
            }
            Some((parts[0].to_string(), parts[4].to_string()))
        })
        .collect()
}

/// Extract `Exit_status` from `qstat -f` output.
///
/// ```text
/// Job Id: 12345.pbs-server
///     Job_Name = my_job
///     job_state = C
///     Exit_status = 0
/// ```
pub fn parse_qstat_exit_status(output: &str) -> Option<i32> {
    output.lines().find_map(|line| {
        let (key, value) = line.trim().split_once('=')?;
        if key.trim() == "Exit_status" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Whether two PBS ids name the same job.
///
/// Brief `qstat` output truncates long server names, so only the sequence
/// number and the visible part of the server name are compared.
pub fn same_job(listed: &str, backend_id: &str) -> bool {
    if listed == backend_id {
        return true;
    }
    match listed.strip_suffix('*') {
        Some(prefix) => backend_id.starts_with(prefix),
        None => listed.split('.').next() == backend_id.split('.').next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qsub_output() {
        assert_eq!(parse_qsub_output("12345.pbs-server\n"), Some("12345.pbs-server".to_string()));
        assert_eq!(
            parse_qsub_output("12345.server.domain.com"),
            Some("12345.server.domain.com".to_string())
        );
        assert_eq!(parse_qsub_output("98765"), Some("98765".to_string()));
    }

    #[test]
    fn test_parse_qsub_output_error() {
        assert!(parse_qsub_output("qsub: Unknown queue MSG=cannot locate queue").is_none());
        assert!(parse_qsub_output("").is_none());
    }

    #[test]
    fn test_parse_qstat_brief_output() {
        let output = "\
Job id            Name             User              Time Use S Queue
----------------  ---------------- ----------------  -------- - -----
12345.pbs-server  my_job           alice             00:05:23 R batch
12346.pbs-server  other            bob               00:00:00 Q batch
12347.pbs-server  wrapper.sh       alice             0        Q batch
";
        assert_eq!(
            parse_qstat_brief_output(output, "alice"),
            vec![
                ("12345.pbs-server".to_string(), "R".to_string()),
                ("12347.pbs-server".to_string(), "Q".to_string()),
            ]
        );
        assert!(parse_qstat_brief_output("", "alice").is_empty());
    }

    #[test]
    fn test_parse_qstat_exit_status() {
        let output = "Job Id: 12345.pbs-server\n    Job_Name = my_job\n    job_state = C\n    Exit_status = 2\n";
        assert_eq!(parse_qstat_exit_status(output), Some(2));
        assert_eq!(parse_qstat_exit_status("Job Id: 1.s\n    job_state = R\n"), None);
    }

    #[test]
    fn test_state_mapping() {
        for code in ["Q", "H", "W", "T"] {
            assert_eq!(PbsState::parse(code).job_state(), JobState::Pending, "{code}");
        }
        for code in ["R", "E", "B"] {
            assert_eq!(PbsState::parse(code).job_state(), JobState::Running, "{code}");
        }
        assert_eq!(PbsState::parse("C").job_state(), JobState::Done);
        assert_eq!(PbsState::parse("F").job_state(), JobState::Done);
        assert_eq!(PbsState::parse("S").job_state(), JobState::Suspended);
        assert_eq!(PbsState::parse("X").job_state(), JobState::Failed);
        assert_eq!(PbsState::parse("Z").job_state(), JobState::Unknown);
    }

    #[test]
    fn test_same_job() {
        assert!(same_job("12345.pbs-server", "12345.pbs-server"));
        assert!(same_job("12345.pbs-serv*", "12345.pbs-server.example.org"));
        assert!(same_job("12345.head", "12345.head.cluster.org"));
        assert!(!same_job("12346.head", "12345.head"));
    }
}
