//! Background compute
//!
//! Height and mesh jobs run off the scheduling thread. Their results come back
//! through a `ComputeQueue` that the scheduling thread drains once per tick.

pub mod compute_queue;
pub mod error;

pub use compute_queue::{ComputeQueue, ComputeQueueStats, QueueCounters, SpawnStrategy};
pub use error::ComputeError;
