//! Tooling: which capabilities a request advertises and how local function
//! calls are executed.
//!
//! - [`ToolingConfigResolver`] reads the environment into a [`ToolingConfig`]
//! - [`ToolSetBuilder`] turns a config into a [`ToolSet`] (descriptors, names,
//!   hints, warnings and a [`FunctionCallExecutor`])

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod executor;
pub mod python;

pub use builder::{format_skills_hint, ToolSet, ToolSetBuilder, SKILLS_CAPABILITY};
pub use config::{
    parse_bool_flag, ComputerDisplay, McpSettings, ToolingConfig, ToolingConfigResolver,
};
pub use descriptor::{Container, McpApproval, ToolDescriptor};
pub use executor::{FnHandler, FunctionCallExecutor, FunctionHandler};
pub use python::{
    format_script_output, ProcessScriptRunner, RunPythonInline, ScriptOutput, ScriptRunner,
    RUN_PYTHON_INLINE,
};
