pub mod codec;
mod models;

pub use codec::{decode, encode, encode_record};
pub use models::{
    format_timestamp_ms, now_ms, Event, LogRecord, Origin, SOURCE_CHROME, SOURCE_CLAUDE_CODE,
    SOURCE_CLI, TIMESTAMP_FORMAT,
};
