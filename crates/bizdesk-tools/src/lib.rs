//! # BizDesk Tools
//!
//! Turns tool invocations (and direct task requests) into task store writes,
//! according to each tool's declared submit behavior.

pub mod dispatch;

pub use dispatch::{DirectTask, ToolDispatcher};
