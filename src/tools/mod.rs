//! Tools module - capabilities the proxy agent executes
//!
//! Contains the tool registry and the finance data tools.

pub mod finance;
pub mod registry;

pub use finance::register_finance_tools;
pub use registry::{FnTool, Tool, ToolRegistry};
