//! Per-tick metric movement.
//!
//! Exactly one mode applies to a metric on a given tick:
//! - `BeingRemediated`: geometric descent toward `min + 5`.
//! - `Steady`: bounded noise that cannot push a healthy metric over its
//!   threshold; breached metrics only jitter and never self-heal.
//! - `Volatile`: heavy-tailed random walk; the only mode that opens incidents on
//!   its own.

use autosre_domain::MetricDefinition;

use crate::rng::SimRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluctuationMode {
    BeingRemediated,
    Steady,
    Volatile,
}

impl FluctuationMode {
    pub fn select(is_remediating: bool, auto_pilot: bool) -> Self {
        if is_remediating {
            FluctuationMode::BeingRemediated
        } else if auto_pilot {
            FluctuationMode::Volatile
        } else {
            FluctuationMode::Steady
        }
    }
}

/// Compute the next value for `def`. Always within `[min, max]`.
pub fn next_value(
    def: &MetricDefinition,
    current: f64,
    mode: FluctuationMode,
    rng: &mut SimRng,
) -> f64 {
    let next = match mode {
        FluctuationMode::BeingRemediated => converge_step(def, current),
        FluctuationMode::Steady => steady_step(def, current, rng),
        FluctuationMode::Volatile => volatile_step(def, current, rng),
    };
    def.clamp(next)
}

pub fn converge_step(def: &MetricDefinition, current: f64) -> f64 {
    let diff = current - def.safe_target();
    let reduction = if diff > 0.0 {
        (diff * 0.25).ceil() + 3.0
    } else {
        0.0
    };
    (current - reduction).max(def.min)
}

/// Drive a metric under its threshold, as a completed remediation must leave it.
pub fn settle(def: &MetricDefinition, current: f64) -> f64 {
    let mut value = def.clamp(current);
    while def.is_breached(value) {
        let next = converge_step(def, value);
        if next >= value {
            // Target sits at or above the threshold; fall back to the steady ceiling.
            return steady_ceiling(def);
        }
        value = next;
    }
    value
}

fn steady_ceiling(def: &MetricDefinition) -> f64 {
    (def.threshold - 5.0).max(def.min)
}

fn steady_step(def: &MetricDefinition, current: f64, rng: &mut SimRng) -> f64 {
    if def.is_breached(current) {
        return current + rng.uniform(-1.0, 1.0);
    }
    let noise = rng.uniform(-2.0, 2.0);
    (current + noise).clamp(def.min, steady_ceiling(def))
}

fn volatile_step(def: &MetricDefinition, current: f64, rng: &mut SimRng) -> f64 {
    let is_high = current > def.threshold * 0.7;
    let trend = if is_high { 2.0 } else { 0.0 };
    let volatility = if is_high { 15.0 } else { 6.0 };
    let spike_chance = if is_high { 0.90 } else { 0.97 };

    let spike = if rng.unit() > spike_chance { 30.0 } else { 0.0 };
    let drift = if rng.unit() > 0.55 { 3.0 } else { -2.0 };
    let fluctuation = rng.uniform(0.0, volatility) - volatility / 2.0;

    (current + fluctuation + drift + spike + trend).round()
}
