//! Configuration helpers shared by the CLI.

pub mod duration;

pub use duration::{parse_duration, parse_duration_to_secs};

/// Parse a single-byte CSV delimiter such as `,`, `;` or `\t`.
pub fn parse_delimiter(s: &str) -> anyhow::Result<u8> {
    let s = if s == "\\t" { "\t" } else { s };
    match s.as_bytes() {
        [byte] => Ok(*byte),
        _ => anyhow::bail!("Delimiter must be a single ASCII character, got '{s}'"),
    }
}
