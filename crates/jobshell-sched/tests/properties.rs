//! Property tests for job ids and status-token mapping.

use jobshell_sched::backend::JobBackend;
use jobshell_sched::{JobId, JobState, PbsBackend, SlurmBackend};
use proptest::prelude::*;

fn endpoint_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["slurm", "slurm+ssh", "slurm+gsissh", "pbs", "pbs+ssh"]),
        "[a-z][a-z0-9-]{0,15}(\\.[a-z][a-z0-9-]{0,10}){0,3}",
        prop::option::of(1u16..=65535),
    )
        .prop_map(|(scheme, host, port)| match port {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        })
}

fn backend_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,9}",
        "[0-9]{1,9}_[0-9]{1,4}",
        "[0-9]{1,9}\\.[a-z][a-z0-9.-]{0,20}",
    ]
}

proptest! {
    #[test]
    fn prop_job_id_roundtrip(endpoint in endpoint_strategy(), backend_id in backend_id_strategy()) {
        let id = JobId::new(endpoint.clone(), backend_id.clone());
        let parsed: JobId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed.endpoint(), endpoint.as_str());
        prop_assert_eq!(parsed.backend_id(), backend_id.as_str());
    }

    #[test]
    fn prop_slurm_mapping_is_total(token in "[A-Z_]{0,12}") {
        let state = SlurmBackend::new().map_state(&token);
        let known = [
            "CANCELLED", "CA", "COMPLETED", "CD", "CONFIGURING", "CF", "COMPLETING", "CG",
            "FAILED", "F", "NODE_FAIL", "NF", "PENDING", "PD", "PREEMPTED", "PR",
            "RUNNING", "R", "SUSPENDED", "S", "TIMEOUT", "TO",
        ];
        if !known.contains(&token.as_str()) {
            prop_assert_eq!(state, JobState::Unknown);
        } else {
            prop_assert_ne!(state, JobState::Unknown);
            prop_assert_ne!(state, JobState::New);
        }
    }

    #[test]
    fn prop_pbs_mapping_never_new(token in "[A-Z]{0,3}") {
        prop_assert_ne!(PbsBackend::new().map_state(&token), JobState::New);
    }
}
