//! # BizDesk Core
//!
//! Shared foundation for the BizDesk workspace: the error taxonomy, the
//! configuration file, and the department/tool catalog that every other
//! crate reads from.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::BizDeskConfig;
pub use error::{BizDeskError, Result};
pub use registry::DepartmentRegistry;
pub use types::{
    DepartmentDefinition, FieldType, FormField, SelectOption, SubmitBehavior, TaskStatus, ToolDefinition,
};
