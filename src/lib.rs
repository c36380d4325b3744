//! Robopilot - Natural Language Robot Command Pipeline

pub mod command;
pub mod core;
pub mod environment;
pub mod oracle;
pub mod pipeline;
pub mod skills;
