pub mod config;
pub mod history;
pub mod modes;
pub mod profile;
pub mod run;
pub mod stats;

/// Result type shared by every subcommand.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
