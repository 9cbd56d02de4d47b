pub mod commands;
pub mod error;
pub mod output;
pub mod transcript;

pub use commands::{ConfigCommand, ReplayCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_timestamp, truncate_string};
