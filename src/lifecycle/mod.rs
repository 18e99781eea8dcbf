//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start(options):
//!     Merge options into config → Create cache dir → Arm cache watch
//!     → Bind listener → Serve → Emit Start
//!
//! close():
//!     Disarm watch → Stop accepting → Drain connections → Emit End
//!
//! Cache change:
//!     notify event → change channel → control loop → restart
//!     (queued behind any lifecycle call already in flight)
//! ```
//!
//! # Design Decisions
//! - Two states only: Stopped and Running; no terminal state, the
//!   manager is reusable for the process lifetime
//! - Single-flight: start/close/restart serialize on one lock
//! - Watch notifications go through an explicit channel into one
//!   control task instead of mutating state from the watcher callback
//! - close is infallible and idempotent; bind and filesystem errors
//!   are the only caller-visible failures

pub mod events;
pub mod server;

pub use events::{Event, EventBus, RequestLog};
pub use server::{Server, ServerError};
