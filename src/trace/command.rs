use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::assets::decode::SourceBitmap;
use crate::foundation::error::{QuillError, QuillResult};
use crate::foundation::temp::{TempFileGuard, unique_temp_path};
use crate::trace::svg::parse_traced_svg;
use crate::trace::{TraceOptions, TracedPath, Tracer};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Tracer backed by an external raster-to-SVG program.
///
/// The bitmap is written to a temporary PNG, `program` is run with `args` (where `{input}` and
/// `{output}` are replaced by the PNG and SVG paths), and the resulting SVG is parsed. The
/// child is killed once `TraceOptions::timeout` elapses.
#[derive(Clone, Debug)]
pub struct SvgCommandTracer {
    pub program: String,
    pub args: Vec<String>,
}

impl SvgCommandTracer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, input: &str, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{input}", input).replace("{output}", output))
            .collect()
    }
}

impl Default for SvgCommandTracer {
    /// `vtracer` in color spline mode.
    fn default() -> Self {
        Self::new("vtracer", default_vtracer_args())
    }
}

pub fn default_vtracer_args() -> Vec<String> {
    [
        "--input",
        "{input}",
        "--output",
        "{output}",
        "--colormode",
        "color",
        "--hierarchical",
        "cutout",
        "--mode",
        "spline",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

impl Tracer for SvgCommandTracer {
    fn trace(&self, bitmap: &SourceBitmap, opts: &TraceOptions) -> QuillResult<Vec<TracedPath>> {
        let png = bitmap
            .to_png()
            .map_err(|e| QuillError::vectorization(format!("encode tracer input: {e}")))?;

        let input = TempFileGuard(Some(unique_temp_path("trace_in", "png")));
        let output = TempFileGuard(Some(unique_temp_path("trace_out", "svg")));
        let (Some(input_path), Some(output_path)) = (input.0.as_ref(), output.0.as_ref()) else {
            return Err(QuillError::vectorization("temporary paths unavailable"));
        };

        std::fs::write(input_path, &png).map_err(|e| {
            QuillError::vectorization(format!(
                "failed to write tracer input '{}': {e}",
                input_path.display()
            ))
        })?;

        let args = self.expand_args(
            &input_path.to_string_lossy(),
            &output_path.to_string_lossy(),
        );
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                QuillError::vectorization(format!(
                    "failed to spawn tracer '{}' (is it installed and on PATH?): {e}",
                    self.program
                ))
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| QuillError::vectorization("failed to open tracer stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = stderr.read_to_end(&mut bytes);
            bytes
        });

        let deadline = Instant::now().checked_add(opts.timeout);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(QuillError::vectorization(format!(
                        "tracer '{}' timed out after {:.1}s",
                        self.program,
                        opts.timeout.as_secs_f64()
                    )));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(QuillError::vectorization(format!(
                        "failed to wait for tracer: {e}"
                    )));
                }
            }
        };
        let stderr_bytes = stderr_drain.join().unwrap_or_default();

        if !status.success() {
            return Err(QuillError::vectorization(format!(
                "tracer '{}' exited with status {status}: {}",
                self.program,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }

        let svg = std::fs::read(output_path).map_err(|e| {
            QuillError::vectorization(format!(
                "tracer produced no readable output '{}': {e}",
                output_path.display()
            ))
        })?;
        let paths = parse_traced_svg(&svg)?;
        tracing::debug!(program = %self.program, paths = paths.len(), "traced bitmap");
        Ok(paths)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trace/command.rs"]
mod tests;
