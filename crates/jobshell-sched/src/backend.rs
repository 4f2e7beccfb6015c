//! Scheduler backend abstraction.
//!
//! A [`JobBackend`] knows one scheduler family's vocabulary: how to render
//! a submission script, which commands submit, list, cancel and inspect
//! jobs, and how to read their output. It never talks to a shell itself;
//! the [`JobAdaptor`](crate::adaptor::JobAdaptor) runs the commands.

use crate::description::{JobAttribute, JobDescription};
use crate::job::JobState;

/// Capabilities and command vocabulary of one scheduler family.
pub trait JobBackend: Send + Sync {
    /// Family name, e.g. `slurm`.
    fn family(&self) -> &'static str;

    /// Whether the backend can express `attribute` in a script.
    fn supports(&self, attribute: JobAttribute) -> bool;

    /// Render the submission script for `description`.
    fn render_script(&self, description: &JobDescription) -> String;

    /// Command that submits the script at `script_path`.
    fn submit_command(&self, script_path: &str) -> String;

    /// Extract the backend job id from the submission output.
    fn parse_submission(&self, output: &str) -> Option<String>;

    /// Command that lists `user`'s jobs with their status tokens.
    fn listing_command(&self, user: &str) -> String;

    /// Parse a listing into `(backend id, status token)` pairs.
    fn parse_listing(&self, output: &str, user: &str) -> Vec<(String, String)>;

    /// Translate a backend status token into the canonical state.
    fn map_state(&self, token: &str) -> JobState;

    /// Whether an id from a listing refers to `backend_id`.
    fn same_job(&self, listed: &str, backend_id: &str) -> bool {
        listed == backend_id
    }

    /// Command that cancels the job.
    fn cancel_command(&self, backend_id: &str) -> String;

    /// Command that shows the job's exit code.
    fn exit_code_command(&self, backend_id: &str) -> String;

    /// Extract the exit code from the output of [`exit_code_command`](Self::exit_code_command).
    fn parse_exit_code(&self, output: &str) -> Option<i32>;

    /// Attributes of `description` this backend cannot express.
    fn unsupported(&self, description: &JobDescription) -> Vec<JobAttribute> {
        description
            .attributes()
            .into_iter()
            .filter(|attribute| !self.supports(*attribute))
            .collect()
    }
}

/// Replace characters schedulers reject in job names, capped at 64 chars.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

/// `export` lines for the description's environment, sorted by name.
pub fn export_lines(description: &JobDescription) -> String {
    description
        .sorted_environment()
        .into_iter()
        .map(|(key, value)| {
            let value = value.replace('\\', "\\\\").replace('"', "\\\"");
            format!("export {key}=\"{value}\"\n")
        })
        .collect()
}
