//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `dpos_actions_applied_total` - Actions committed to the working snapshot
//! - `dpos_actions_failed_total` - Actions rejected by the staking core
//! - `dpos_blocks_committed_total` - Blocks persisted
//! - `dpos_matured_entries_total` - Unbonding and redelegation entries completed
//! - `dpos_end_block_duration_seconds` - Histogram of end-block latencies
//! - `dpos_bonded_consensus_token` - ConsensusToken bonded to validators
//! - `dpos_active_validators` - Validators in the power index

use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

/// Metrics collector
///
/// Collectors live in a private registry, so several engines can coexist in
/// one process.
#[derive(Clone)]
pub struct Metrics {
    /// Applied actions by type
    pub actions_applied: IntCounterVec,

    /// Rejected actions by type
    pub actions_failed: IntCounterVec,

    /// Committed blocks
    pub blocks_committed: IntCounter,

    /// Completed queue entries
    pub matured_entries: IntCounter,

    /// End-block duration histogram
    pub end_block_duration: Histogram,

    /// Bonded ConsensusToken
    pub bonded_consensus_token: Gauge,

    /// Ranked validators
    pub active_validators: IntGauge,

    registry: Registry,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("blocks_committed", &self.blocks_committed.get())
            .field("matured_entries", &self.matured_entries.get())
            .field("active_validators", &self.active_validators.get())
            .finish()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let actions_applied = IntCounterVec::new(
            Opts::new("dpos_actions_applied_total", "Actions committed to the working snapshot"),
            &["type_id"],
        )?;
        registry.register(Box::new(actions_applied.clone()))?;

        let actions_failed = IntCounterVec::new(
            Opts::new("dpos_actions_failed_total", "Actions rejected by the staking core"),
            &["type_id"],
        )?;
        registry.register(Box::new(actions_failed.clone()))?;

        let blocks_committed =
            IntCounter::new("dpos_blocks_committed_total", "Blocks persisted")?;
        registry.register(Box::new(blocks_committed.clone()))?;

        let matured_entries = IntCounter::new(
            "dpos_matured_entries_total",
            "Unbonding and redelegation entries completed",
        )?;
        registry.register(Box::new(matured_entries.clone()))?;

        let end_block_duration = Histogram::with_opts(
            HistogramOpts::new(
                "dpos_end_block_duration_seconds",
                "Histogram of end-block latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(end_block_duration.clone()))?;

        let bonded_consensus_token = Gauge::new(
            "dpos_bonded_consensus_token",
            "ConsensusToken bonded to validators",
        )?;
        registry.register(Box::new(bonded_consensus_token.clone()))?;

        let active_validators =
            IntGauge::new("dpos_active_validators", "Validators in the power index")?;
        registry.register(Box::new(active_validators.clone()))?;

        Ok(Self {
            actions_applied,
            actions_failed,
            blocks_committed,
            matured_entries,
            end_block_duration,
            bonded_consensus_token,
            active_validators,
            registry,
        })
    }

    /// Record an applied action
    pub fn record_action_applied(&self, type_id: &str) {
        self.actions_applied.with_label_values(&[type_id]).inc();
    }

    /// Record a rejected action
    pub fn record_action_failed(&self, type_id: &str) {
        self.actions_failed.with_label_values(&[type_id]).inc();
    }

    /// Record a committed block
    pub fn record_block_committed(&self, matured_entries: usize, duration_seconds: f64) {
        self.blocks_committed.inc();
        self.matured_entries.inc_by(matured_entries as u64);
        self.end_block_duration.observe(duration_seconds);
    }

    /// Update validator set gauges
    pub fn update_validator_set(&self, active_validators: usize, bonded: f64) {
        self.active_validators.set(active_validators as i64);
        self.bonded_consensus_token.set(bonded);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
