//! Orchestrator configuration.

/// Configuration for the orchestration services.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Applications allowed per workspace unless a quota override
    /// exists (default: 5).
    pub default_application_quota: u32,
    /// Minimum seconds between credential rotations (default: 300).
    pub rotation_cooldown_secs: u64,
    /// Bound on synchronous workflow trigger calls (default: 10).
    pub workflow_trigger_timeout_secs: u64,
    /// Task queue name workflows are dispatched to.
    pub task_queue: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_application_quota: 5,
            rotation_cooldown_secs: 300,
            workflow_trigger_timeout_secs: 10,
            task_queue: "streamgate-provisioning".into(),
        }
    }
}
