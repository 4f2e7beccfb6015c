//! PBS implementation of [`JobBackend`].

use crate::backend::JobBackend;
use crate::description::{JobAttribute, JobDescription};
use crate::job::JobState;
use crate::pbs::parser::{self, PbsState};
use crate::pbs::templates;

/// Command vocabulary of PBS and Torque.
#[derive(Debug, Default, Clone, Copy)]
pub struct PbsBackend;

impl PbsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl JobBackend for PbsBackend {
    fn family(&self) -> &'static str {
        "pbs"
    }

    fn supports(&self, attribute: JobAttribute) -> bool {
        !matches!(
            attribute,
            JobAttribute::Input
                | JobAttribute::ThreadsPerProcess
                | JobAttribute::TotalCpuCount
                | JobAttribute::CandidateHosts
        )
    }

    fn render_script(&self, description: &JobDescription) -> String {
        templates::generate_pbs_script(description)
    }

    fn submit_command(&self, script_path: &str) -> String {
        format!("qsub {script_path}")
    }

    fn parse_submission(&self, output: &str) -> Option<String> {
        parser::parse_qsub_output(output)
    }

    fn listing_command(&self, _user: &str) -> String {
        "qstat".to_string()
    }

    fn parse_listing(&self, output: &str, user: &str) -> Vec<(String, String)> {
        parser::parse_qstat_brief_output(output, user)
    }

    fn map_state(&self, token: &str) -> JobState {
        PbsState::parse(token).job_state()
    }

    fn same_job(&self, listed: &str, backend_id: &str) -> bool {
        parser::same_job(listed, backend_id)
    }

    fn cancel_command(&self, backend_id: &str) -> String {
        format!("qdel {backend_id}")
    }

    fn exit_code_command(&self, backend_id: &str) -> String {
        format!("qstat -f {backend_id}")
    }

    fn parse_exit_code(&self, output: &str) -> Option<i32> {
        parser::parse_qstat_exit_status(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        let backend = PbsBackend::new();
        assert_eq!(backend.family(), "pbs");
        assert_eq!(backend.submit_command("/tmp/wrapper.sh"), "qsub /tmp/wrapper.sh");
        assert_eq!(backend.listing_command("alice"), "qstat");
        assert_eq!(backend.cancel_command("12.head"), "qdel 12.head");
        assert_eq!(backend.exit_code_command("12.head"), "qstat -f 12.head");
    }

    #[test]
    fn test_unsupported_attributes() {
        let backend = PbsBackend::new();
        let jd = JobDescription::new("/bin/cat")
            .with_input("data.txt")
            .with_threads_per_process(4);
        assert_eq!(
            backend.unsupported(&jd),
            vec![JobAttribute::Input, JobAttribute::ThreadsPerProcess]
        );
    }
}
