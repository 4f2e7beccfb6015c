//! SLURM batch script templates.

use crate::backend::{export_lines, sanitize_name};
use crate::description::JobDescription;

/// Generate a SLURM batch script for a job description.
pub fn generate_batch_script(jd: &JobDescription) -> String {
    let mut script = String::new();

    script.push_str("#!/bin/bash\n");

    if let Some(ref name) = jd.name {
        script.push_str(&format!("#SBATCH -J {}\n", sanitize_name(name)));
    }
    if let Some(n) = jd.number_of_processes {
        script.push_str(&format!("#SBATCH -n {n}\n"));
    }
    if let Some(n) = jd.processes_per_host {
        script.push_str(&format!("#SBATCH --ntasks-per-node={n}\n"));
    }
    if let Some(n) = jd.threads_per_process {
        script.push_str(&format!("#SBATCH --cpus-per-task={n}\n"));
    }
    if let Some(ref dir) = jd.working_directory {
        script.push_str(&format!("#SBATCH -D {dir}\n"));
    }
    if let Some(ref input) = jd.input {
        script.push_str(&format!("#SBATCH -i {input}\n"));
    }
    if let Some(ref output) = jd.output {
        script.push_str(&format!("#SBATCH -o {output}\n"));
    }
    if let Some(ref error) = jd.error {
        script.push_str(&format!("#SBATCH -e {error}\n"));
    }
    if let Some(minutes) = jd.wall_time_limit {
        script.push_str(&format!("#SBATCH -t {}\n", format_time(minutes)));
    }
    if let Some(mb) = jd.total_physical_memory {
        script.push_str(&format!("#SBATCH --mem={mb}M\n"));
    }
    if let Some(ref queue) = jd.queue {
        script.push_str(&format!("#SBATCH -p {queue}\n"));
    }
    if let Some(ref project) = jd.project {
        script.push_str(&format!("#SBATCH -A {project}\n"));
    }
    if let Some(ref contact) = jd.job_contact {
        script.push_str(&format!("#SBATCH --mail-user={contact}\n"));
    }

    script.push_str(&export_lines(jd));
    script.push_str(&jd.command_line());
    script.push('\n');

    script
}

/// Format time in minutes to SLURM time format (D-HH:MM:SS or HH:MM:SS).
pub fn format_time(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours >= 24 {
        format!("{}-{:02}:{:02}:00", hours / 24, hours % 24, mins)
    } else {
        format!("{hours:02}:{mins:02}:00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_batch_script() {
        let jd = JobDescription::new("/bin/echo")
            .with_arguments(["hi"])
            .with_queue("batch")
            .with_wall_time_limit(90);

        let script = generate_batch_script(&jd);
        assert_eq!(
            script,
            "#!/bin/bash\n#SBATCH -t 01:30:00\n#SBATCH -p batch\n/bin/echo hi\n"
        );
    }

    #[test]
    fn test_generate_batch_script_all_directives() {
        let jd = JobDescription::new("./simulate")
            .with_name("my simulation")
            .with_arguments(["--steps", "100"])
            .with_env("OMP_NUM_THREADS", "8")
            .with_env("MODE", "fast")
            .with_working_directory("/scratch/run1")
            .with_input("in.dat")
            .with_output("out.log")
            .with_error("err.log")
            .with_number_of_processes(16)
            .with_processes_per_host(4)
            .with_threads_per_process(8)
            .with_total_physical_memory(4096)
            .with_project("proj42")
            .with_job_contact("alice@example.org");

        let script = generate_batch_script(&jd);
        let expected = "\
#!/bin/bash
#SBATCH -J my_simulation
#SBATCH -n 16
#SBATCH --ntasks-per-node=4
#SBATCH --cpus-per-task=8
#SBATCH -D /scratch/run1
#SBATCH -i in.dat
#SBATCH -o out.log
#SBATCH -e err.log
#SBATCH --mem=4096M
#SBATCH -A proj42
#SBATCH --mail-user=alice@example.org
export MODE=\"fast\"
export OMP_NUM_THREADS=\"8\"
./simulate --steps 100
";
        assert_eq!(script, expected);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(30), "00:30:00");
        assert_eq!(format_time(60), "01:00:00");
        assert_eq!(format_time(90), "01:30:00");
        assert_eq!(format_time(1440), "1-00:00:00");
        assert_eq!(format_time(1530), "1-01:30:00");
    }
}
