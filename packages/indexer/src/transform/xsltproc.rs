//! Sheets executed by the system `xsltproc` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use super::Sheet;

const DEFAULT_PROGRAM: &str = "xsltproc";

/// An XSLT 1.0 stylesheet run through `xsltproc <sheet> -`.
#[derive(Debug, Clone)]
pub struct XsltprocSheet {
    program: String,
    path: PathBuf,
    name: String,
}

impl XsltprocSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_program(DEFAULT_PROGRAM, path)
    }

    /// Use a different executable with the same command line.
    pub fn with_program(program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            program: program.into(),
            path,
            name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sheet for XsltprocSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, xml: &str) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .arg(&self.path)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("cannot run {}: {e}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| format!("{} stdin not available", self.program))?;

        // Feed stdin from a second thread so a large output cannot block the pipe.
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(xml.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| format!("{} failed: {e}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited with {}: {}", self.program, output.status, stderr.trim()));
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("cannot write unit to {}: {e}", self.program)),
            Err(_) => return Err(format!("writer thread for {} panicked", self.program)),
        }

        String::from_utf8(output.stdout).map_err(|e| format!("output is not valid UTF-8: {e}"))
    }
}
