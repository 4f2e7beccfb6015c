//! SLURM implementation of [`JobBackend`].

use crate::backend::JobBackend;
use crate::description::{JobAttribute, JobDescription};
use crate::job::JobState;
use crate::slurm::parser::{self, SlurmState};
use crate::slurm::templates;

/// Command vocabulary of SLURM.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlurmBackend;

impl SlurmBackend {
    pub fn new() -> Self {
        Self
    }
}

impl JobBackend for SlurmBackend {
    fn family(&self) -> &'static str {
        "slurm"
    }

    fn supports(&self, attribute: JobAttribute) -> bool {
        !matches!(
            attribute,
            JobAttribute::TotalCpuCount | JobAttribute::CandidateHosts
        )
    }

    fn render_script(&self, description: &JobDescription) -> String {
        templates::generate_batch_script(description)
    }

    fn submit_command(&self, script_path: &str) -> String {
        format!("sbatch {script_path}")
    }

    fn parse_submission(&self, output: &str) -> Option<String> {
        parser::parse_sbatch_output(output)
    }

    fn listing_command(&self, user: &str) -> String {
        format!("squeue -h -o \"%i %t\" -u {user}")
    }

    fn parse_listing(&self, output: &str, _user: &str) -> Vec<(String, String)> {
        parser::parse_squeue_listing(output)
    }

    fn map_state(&self, token: &str) -> JobState {
        SlurmState::parse(token).job_state()
    }

    fn cancel_command(&self, backend_id: &str) -> String {
        format!("scancel {backend_id}")
    }

    fn exit_code_command(&self, backend_id: &str) -> String {
        format!("scontrol show job {backend_id}")
    }

    fn parse_exit_code(&self, output: &str) -> Option<i32> {
        parser::parse_scontrol_exit_code(output)
    }
}
