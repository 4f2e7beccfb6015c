//! PBS/Torque backend.
//!
//! Jobs are submitted with `qsub`, listed with `qstat`, inspected with
//! `qstat -f` and cancelled with `qdel`.

pub mod backend;
pub mod parser;
pub mod templates;

pub use backend::PbsBackend;
