//! SLURM backend.
//!
//! Jobs are submitted with `sbatch`, listed with `squeue`, inspected with
//! `scontrol show job` and cancelled with `scancel`.

pub mod backend;
pub mod parser;
pub mod templates;

pub use backend::SlurmBackend;
