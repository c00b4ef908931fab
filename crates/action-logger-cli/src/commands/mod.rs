pub mod hook;
pub mod logs;
pub mod mcp;
pub mod record;
