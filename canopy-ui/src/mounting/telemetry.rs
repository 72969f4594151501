use std::time::{Duration, Instant};

use canopy_types::SurfaceId;
use tracing::info;

/// Timestamps of one transaction's trip through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionTelemetry {
    commit_start: Option<Instant>,
    commit_end: Option<Instant>,
    layout_start: Option<Instant>,
    layout_end: Option<Instant>,
    diff_start: Option<Instant>,
    diff_end: Option<Instant>,
    mount_start: Option<Instant>,
    mount_end: Option<Instant>,
    affected_layout_nodes: usize,
}

fn span(start: Option<Instant>, end: Option<Instant>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start),
        _ => Duration::ZERO,
    }
}

impl TransactionTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn will_commit(&mut self) {
        self.commit_start = Some(Instant::now());
    }

    pub fn did_commit(&mut self) {
        self.commit_end = Some(Instant::now());
    }

    pub fn will_layout(&mut self) {
        self.layout_start = Some(Instant::now());
    }

    pub fn did_layout(&mut self, affected_nodes: usize) {
        self.layout_end = Some(Instant::now());
        self.affected_layout_nodes = affected_nodes;
    }

    pub fn will_diff(&mut self) {
        self.diff_start = Some(Instant::now());
    }

    pub fn did_diff(&mut self) {
        self.diff_end = Some(Instant::now());
    }

    pub fn will_mount(&mut self) {
        self.mount_start = Some(Instant::now());
    }

    pub fn did_mount(&mut self) {
        self.mount_end = Some(Instant::now());
    }

    pub fn commit_duration(&self) -> Duration {
        span(self.commit_start, self.commit_end)
    }

    pub fn layout_duration(&self) -> Duration {
        span(self.layout_start, self.layout_end)
    }

    pub fn diff_duration(&self) -> Duration {
        span(self.diff_start, self.diff_end)
    }

    pub fn mount_duration(&self) -> Duration {
        span(self.mount_start, self.mount_end)
    }

    pub fn affected_layout_nodes(&self) -> usize {
        self.affected_layout_nodes
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_end.is_some()
    }
}

/// Running totals for one surface, logged once per interval.
#[derive(Debug)]
pub struct SurfaceTelemetry {
    log_interval: Duration,
    last_emit: Instant,
    transactions: u64,
    mutations: u64,
    affected_layout_nodes: u64,
    total_commit_ns: u128,
    total_layout_ns: u128,
    total_diff_ns: u128,
    total_mount_ns: u128,
    max_commit_us: u64,
    last_revision: u64,
    lifetime_transactions: u64,
}

impl SurfaceTelemetry {
    pub fn new(log_interval: Duration) -> Self {
        Self {
            log_interval,
            last_emit: Instant::now(),
            transactions: 0,
            mutations: 0,
            affected_layout_nodes: 0,
            total_commit_ns: 0,
            total_layout_ns: 0,
            total_diff_ns: 0,
            total_mount_ns: 0,
            max_commit_us: 0,
            last_revision: 0,
            lifetime_transactions: 0,
        }
    }

    pub fn record(&mut self, revision: u64, mutations: usize, telemetry: &TransactionTelemetry) {
        self.transactions += 1;
        self.lifetime_transactions += 1;
        self.mutations += mutations as u64;
        self.affected_layout_nodes += telemetry.affected_layout_nodes() as u64;
        self.total_commit_ns += telemetry.commit_duration().as_nanos();
        self.total_layout_ns += telemetry.layout_duration().as_nanos();
        self.total_diff_ns += telemetry.diff_duration().as_nanos();
        self.total_mount_ns += telemetry.mount_duration().as_nanos();
        let commit_us = telemetry.commit_duration().as_micros() as u64;
        if commit_us > self.max_commit_us {
            self.max_commit_us = commit_us;
        }
        self.last_revision = revision;
    }

    pub fn lifetime_transactions(&self) -> u64 {
        self.lifetime_transactions
    }

    pub fn last_revision(&self) -> u64 {
        self.last_revision
    }

    pub fn maybe_emit(&mut self, surface_id: SurfaceId) {
        if self.last_emit.elapsed() < self.log_interval {
            return;
        }

        if self.transactions > 0 {
            let average_us = |total_ns: u128| (total_ns / self.transactions as u128) as u64 / 1000;

            info!(
                target = "canopy::mounting",
                surface_id,
                transactions = self.transactions,
                mutations = self.mutations,
                affected_layout_nodes = self.affected_layout_nodes,
                commit_avg_us = average_us(self.total_commit_ns),
                commit_max_us = self.max_commit_us,
                layout_avg_us = average_us(self.total_layout_ns),
                diff_avg_us = average_us(self.total_diff_ns),
                mount_avg_us = average_us(self.total_mount_ns),
                revision = self.last_revision,
                "surface-telemetry"
            );
        }

        self.transactions = 0;
        self.mutations = 0;
        self.affected_layout_nodes = 0;
        self.total_commit_ns = 0;
        self.total_layout_ns = 0;
        self.total_diff_ns = 0;
        self.total_mount_ns = 0;
        self.max_commit_us = 0;
        self.last_emit = Instant::now();
    }
}
