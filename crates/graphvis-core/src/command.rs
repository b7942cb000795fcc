//! Running external programs.

use crate::error::{GraphVisError, Result};
use std::io::Write;
use std::process::{Command, Stdio};

fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run `cmd` to completion and return its stdout; non-zero exit is an error.
pub(crate) fn capture_stdout(cmd: &mut Command) -> Result<String> {
    let program = describe(cmd);
    tracing::debug!(command = %program, "running");
    let out = cmd.output().map_err(|e| GraphVisError::CommandFailed {
        program: program.clone(),
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;
    if !out.status.success() {
        return Err(GraphVisError::CommandFailed {
            program,
            status: out.status.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Run `cmd` with `input` on stdin, discarding stdout.
pub(crate) fn run_with_stdin(cmd: &mut Command, input: &[u8]) -> Result<()> {
    let program = describe(cmd);
    tracing::debug!(command = %program, "running");
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GraphVisError::CommandFailed {
            program: program.clone(),
            status: "not started".to_string(),
            stderr: e.to_string(),
        })?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
    }
    let out = child.wait_with_output()?;
    if !out.status.success() {
        return Err(GraphVisError::CommandFailed {
            program,
            status: out.status.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }
    Ok(())
}
