//! `lldb` subprocess backend.
//!
//! Each read runs one batch-mode `lldb` invocation:
//!
//! ```text
//! lldb --batch --no-lldbinit -p <pid> -o "register read s3_0_c15_c0_0"
//! lldb --batch --no-lldbinit --core <path> -o "register read s3_0_c15_c0_0"
//! ```
//!
//! and scans its output for the value. One process per read is slow but keeps
//! every read independent: a register that wedges or faults cannot take the
//! rest of a dump with it.

use std::path::PathBuf;
use std::process::Command;

use tracing::trace;

use super::RegisterReader;
use crate::error::{RegisterError, Result};
use crate::types::Encoding;

/// What `lldb` should attach to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LldbTarget
{
    /// A running process
    Pid(u32),
    /// A core file
    Core(PathBuf),
}

/// Reads registers by running `register read` in `lldb`
#[derive(Debug, Clone)]
pub struct LldbReader
{
    program: PathBuf,
    target: LldbTarget,
}

impl LldbReader
{
    pub fn new(target: LldbTarget) -> Self
    {
        LldbReader {
            program: PathBuf::from("lldb"),
            target,
        }
    }

    /// Use a specific `lldb` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self
    {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &LldbTarget
    {
        &self.target
    }

    fn command(&self, encoding: Encoding) -> Command
    {
        let mut command = Command::new(&self.program);
        command.arg("--batch").arg("--no-lldbinit");
        match &self.target {
            LldbTarget::Pid(pid) => command.arg("-p").arg(pid.to_string()),
            LldbTarget::Core(path) => command.arg("--core").arg(path),
        };
        command.arg("-o").arg(format!("register read {encoding}"));
        command
    }
}

impl RegisterReader for LldbReader
{
    fn read_register(&mut self, encoding: Encoding) -> Result<u64>
    {
        let failure = |detail: String| RegisterError::ReadFailure {
            register: encoding.to_string(),
            detail,
        };

        let output = self
            .command(encoding)
            .output()
            .map_err(|e| failure(format!("could not run {}: {e}", self.program.display())))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(%encoding, status = ?output.status, %stdout, %stderr, "lldb finished");

        if let Some(line) = stdout.lines().chain(stderr.lines()).find(|l| l.trim_start().starts_with("error:")) {
            return Err(failure(line.trim().to_string()));
        }

        if !output.status.success() {
            let detail = stderr.lines().last().map_or_else(
                || format!("lldb exited with {}", output.status),
                |line| line.trim().to_string(),
            );
            return Err(failure(detail));
        }

        parse_register_read_output(&stdout, &encoding.to_string())
            .ok_or_else(|| failure(String::from("no value in lldb output")))
    }
}

/// Extract a register value from `register read` output
///
/// `lldb` prints `<name> = 0x<hex>`, sometimes followed by a decoded
/// description. The line naming `register` is preferred; otherwise the first
/// `= 0x...` assignment, and finally the first hex literal anywhere.
///
/// ```rust
/// use aplreg_core::reader::parse_register_read_output;
///
/// let output = "(lldb) register read s3_0_c15_c0_0\ns3_0_c15_c0_0 = 0x10002990120e0e00\n";
/// assert_eq!(parse_register_read_output(output, "s3_0_c15_c0_0"), Some(0x10002990120e0e00));
/// assert_eq!(parse_register_read_output("error: invalid register name", "s3_0_c15_c0_0"), None);
/// ```
pub fn parse_register_read_output(output: &str, register: &str) -> Option<u64>
{
    let assigned = |line: &str| line.split_once('=').and_then(|(_, rhs)| hex_literal(rhs));

    output
        .lines()
        .filter(|line| line.contains(register) && !line.trim_start().starts_with("(lldb)"))
        .find_map(assigned)
        .or_else(|| output.lines().find_map(assigned))
        .or_else(|| output.lines().find_map(hex_literal))
}

/// First `0x` literal in `text`
fn hex_literal(text: &str) -> Option<u64>
{
    let start = text.find("0x")? + 2;
    let digits: String = text[start..].chars().take_while(char::is_ascii_hexdigit).collect();
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, 16).ok()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_plain_output()
    {
        let output = "s3_0_c15_c0_0 = 0x0000000000000010\n";
        assert_eq!(parse_register_read_output(output, "s3_0_c15_c0_0"), Some(0x10));
    }

    #[test]
    fn test_parse_prefers_named_line()
    {
        let output = "x0 = 0x1111\ns3_4_c15_c2_0 = 0x2222\n";
        assert_eq!(parse_register_read_output(output, "s3_4_c15_c2_0"), Some(0x2222));
    }

    #[test]
    fn test_parse_ignores_echoed_command()
    {
        let output = "(lldb) register read s3_0_c15_c0_0 0x10\n    s3_0_c15_c0_0 = 0x20\n";
        assert_eq!(parse_register_read_output(output, "s3_0_c15_c0_0"), Some(0x20));
    }

    #[test]
    fn test_parse_without_value()
    {
        assert_eq!(parse_register_read_output("", "s3_0_c15_c0_0"), None);
        assert_eq!(parse_register_read_output("s3_0_c15_c0_0 = 0x", "s3_0_c15_c0_0"), None);
    }

    #[test]
    fn test_command_line()
    {
        let reader = LldbReader::new(LldbTarget::Pid(42)).with_program("/usr/bin/lldb");
        let command = reader.command(Encoding::new_unchecked(3, 0, 15, 0, 0));
        let args: Vec<String> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(command.get_program(), "/usr/bin/lldb");
        assert_eq!(
            args,
            vec!["--batch", "--no-lldbinit", "-p", "42", "-o", "register read s3_0_c15_c0_0"]
        );
    }

    #[test]
    fn test_missing_program_is_read_failure()
    {
        let mut reader =
            LldbReader::new(LldbTarget::Core(PathBuf::from("/nonexistent.core"))).with_program("/nonexistent/lldb");
        assert!(matches!(
            reader.read_register(Encoding::new_unchecked(3, 0, 15, 0, 0)),
            Err(RegisterError::ReadFailure { .. })
        ));
    }
}
