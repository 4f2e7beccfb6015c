//! PBS batch script templates.

use crate::backend::{export_lines, sanitize_name};
use crate::description::JobDescription;

/// Generate a PBS batch script for a job description.
pub fn generate_pbs_script(jd: &JobDescription) -> String {
    let mut script = String::new();

    script.push_str("#!/bin/bash\n");

    if let Some(ref name) = jd.name {
        // PBS limits job names to 15 characters on older Torque releases
        let name: String = sanitize_name(name).chars().take(15).collect();
        script.push_str(&format!("#PBS -N {name}\n"));
    }
    if let Some(resources) = node_request(jd.number_of_processes, jd.processes_per_host) {
        script.push_str(&format!("#PBS -l {resources}\n"));
    }
    if let Some(ref output) = jd.output {
        script.push_str(&format!("#PBS -o {output}\n"));
    }
    if let Some(ref error) = jd.error {
        script.push_str(&format!("#PBS -e {error}\n"));
    }
    if let Some(minutes) = jd.wall_time_limit {
        script.push_str(&format!("#PBS -l walltime={}\n", format_walltime(minutes)));
    }
    if let Some(mb) = jd.total_physical_memory {
        script.push_str(&format!("#PBS -l mem={mb}mb\n"));
    }
    if let Some(ref queue) = jd.queue {
        script.push_str(&format!("#PBS -q {queue}\n"));
    }
    if let Some(ref project) = jd.project {
        script.push_str(&format!("#PBS -A {project}\n"));
    }
    if let Some(ref contact) = jd.job_contact {
        script.push_str(&format!("#PBS -M {contact}\n"));
    }

    script.push_str(&export_lines(jd));
    if let Some(ref dir) = jd.working_directory {
        script.push_str(&format!("cd \"{dir}\"\n"));
    }
    script.push_str(&jd.command_line());
    script.push('\n');

    script
}

/// Node request for a process count and processes per node.
fn node_request(processes: Option<u32>, per_host: Option<u32>) -> Option<String> {
    match (processes, per_host) {
        (None, None) => None,
        (Some(n), None) => Some(format!("procs={n}")),
        (n, Some(ppn)) => {
            let ppn = ppn.max(1);
            let nodes = n.unwrap_or(ppn).div_ceil(ppn).max(1);
            Some(format!("nodes={nodes}:ppn={ppn}"))
        }
    }
}

/// Format minutes as PBS walltime (HH:MM:SS, hours unbounded).
pub fn format_walltime(minutes: u32) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}
