//! Background jobs run alongside the server.

pub mod liveness_sweep;

pub use liveness_sweep::{
    liveness_sweep_task, sweep_once, LivenessSweepConfig, LivenessSweepMetrics,
    LivenessSweepSnapshot,
};
