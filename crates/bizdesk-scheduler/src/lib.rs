//! # BizDesk Scheduler
//!
//! Background task tracking with recurring-task scheduling.
//!
//! ## Design Principles
//! - In-memory only: tasks live for the lifetime of the process
//! - One `RwLock` per store: writes serialized, reads take snapshots
//! - Pull-based sweep: due tasks advance only when someone asks
//!
//! ## Architecture
//! ```text
//! TaskStore (RwLock<TaskTable>)
//!   ├── add / update / delete / list / run_now
//!   └── run_sweep(now)
//!         ├── nextRunAt <= now → lastRunAt = now, nextRunAt = now + interval
//!         └── completed → pending
//!
//! spawn_sweeper (optional tokio interval) ── calls run_sweep()
//! ```

pub mod store;
pub mod sweep;
pub mod tasks;

pub use store::{TaskFilter, TaskStore};
pub use sweep::spawn_sweeper;
pub use tasks::{BackgroundTask, NewTask, Payload, TaskUpdate};
pub use bizdesk_core::TaskStatus;
