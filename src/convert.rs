use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::ContextError;

pub const DEFAULT_OFFICE_BINARY: &str = "libreoffice";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts office documents (slide decks) to PDF by running an office suite in headless mode:
///
/// ```bash
/// $ HOME=/tmp libreoffice --headless --convert-to pdf --outdir <directory> <input>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeConverter {
    pub program: String,
    pub timeout: Duration,
}

impl Default for OfficeConverter {
    fn default() -> Self {
        OfficeConverter {
            program: DEFAULT_OFFICE_BINARY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OfficeConverter {
    pub fn new<S: Into<String>>(program: S, timeout: Duration) -> Self {
        OfficeConverter {
            program: program.into(),
            timeout,
        }
    }

    /// Converts `input_path` into a PDF in the same directory and returns its path.
    ///
    /// A non-zero exit reports the captured standard error, and a conversion running past the
    /// timeout is killed.
    pub fn convert_to_pdf(&self, input_path: &Path) -> Result<PathBuf, ContextError> {
        let output_directory = match input_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&output_directory)
            .arg(input_path)
            .env("HOME", "/tmp")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                ContextError::with_error(
                    format!("Unable to run the {} command", self.program),
                    &error,
                )
            })?;
        log::debug!(
            "Converting {:?} with {} (process {})",
            input_path,
            self.program,
            child.id()
        );

        // Drained on its own thread so a chatty converter cannot block on a full pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut captured = String::new();
                let _ = stderr.read_to_string(&mut captured);
                captured
            })
        });

        let started = Instant::now();
        let status = loop {
            let polled = child.try_wait().map_err(|error| {
                ContextError::with_error(
                    format!("Unable to wait for the {} command execution", self.program),
                    &error,
                )
            })?;
            if let Some(status) = polled {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ContextError::with_context(format!(
                    "{} did not finish converting {:?} within {} seconds",
                    self.program,
                    input_path,
                    self.timeout.as_secs_f32()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let captured_stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(ContextError {
                context: format!("{} failed with status {:?}", self.program, status.code()),
                source_error: Some(captured_stderr.trim().to_string()),
            });
        }

        let pdf_path = output_directory.join(converted_file_name(input_path));
        if !pdf_path.exists() {
            return Err(ContextError::with_context(format!(
                "{} finished without producing {:?}",
                self.program, pdf_path
            )));
        }
        log::info!("PDF saved: {}", pdf_path.display());

        Ok(pdf_path)
    }
}

/// `deck.pptx` becomes `deck.pdf`.
fn converted_file_name(input_path: &Path) -> PathBuf {
    Path::new(input_path.file_name().unwrap_or_default()).with_extension("pdf")
}
