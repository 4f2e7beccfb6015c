//! Batch job submission for SLURM and PBS clusters
//!
//! This crate submits, tracks and cancels batch jobs by driving a login
//! shell on the cluster (locally, or through `ssh`/`gsissh`), so nothing
//! but the scheduler's own command line tools is needed on the remote side.
//!
//! # Overview
//!
//! 1. **Describe**: build a [`JobDescription`] (executable, resources, queue)
//! 2. **Create**: ask a [`JobAdaptor`] for a [`JobHandle`]; nothing runs yet
//! 3. **Run**: the adaptor renders a batch script, stages it and submits it
//! 4. **Track**: poll the scheduler's listing and map its states
//!
//! # Supported Schedulers
//!
//! | Scheduler | Schemes | Commands |
//! |-----------|---------|----------|
//! | SLURM | `slurm`, `slurm+ssh`, `slurm+gsissh` | sbatch, squeue, scontrol, scancel |
//! | PBS/Torque | `pbs`, `pbs+ssh`, `pbs+gsissh` | qsub, qstat, qdel |
//!
//! # Job States
//!
//! ```text
//!   NEW ──run()──→ PENDING ⇄ RUNNING ⇄ SUSPENDED
//!                     │         │
//!                     └────┬────┘
//!                          ▼
//!               DONE | FAILED | CANCELED     (terminal)
//! ```
//!
//! Jobs the scheduler no longer lists are reported as UNKNOWN.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use jobshell_sched::{AdaptorConfig, JobAdaptor, JobDescription};
//!
//! #[tokio::main]
//! async fn main() -> jobshell_sched::SchedResult<()> {
//!     let config = AdaptorConfig::new("slurm+ssh://alice@login.cluster.org");
//!     let adaptor = JobAdaptor::connect(config).await?;
//!
//!     let jd = JobDescription::new("/bin/hostname")
//!         .with_queue("debug")
//!         .with_wall_time_limit(5);
//!
//!     let mut job = adaptor.create_job(jd)?;
//!     job.run().await?;
//!     println!("Submitted: {}", job.id().unwrap());
//!
//!     if job.wait(Some(Duration::from_secs(600))).await? {
//!         println!("{} exited with {}", job.state(), job.exit_code().await?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adaptor;
pub mod backend;
pub mod config;
pub mod description;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod pbs;
pub mod registry;
pub mod slurm;

// Re-exports
pub use adaptor::JobAdaptor;
pub use backend::JobBackend;
pub use config::AdaptorConfig;
pub use description::{JobAttribute, JobDescription};
pub use endpoint::ResourceManager;
pub use error::{SchedError, SchedResult};
pub use job::{JobHandle, JobId, JobRecord, JobState};
pub use pbs::PbsBackend;
pub use registry::BackendRegistry;
pub use slurm::SlurmBackend;
