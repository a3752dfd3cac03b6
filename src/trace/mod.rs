//! Boundary to the external raster-to-vector tracer.
//!
//! The tracer is a black box with unstable output. Everything downstream only sees
//! [`TracedPath`] values, so alternate backends can be swapped in without touching palette
//! normalization or stroke sequencing.

pub mod command;
pub mod svg;

use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::assets::decode::SourceBitmap;
use crate::foundation::core::BezPath;
use crate::foundation::error::{QuillError, QuillResult};

/// One filled outline as reported by a tracer, before any normalization.
#[derive(Clone, Debug)]
pub struct TracedPath {
    /// Outline in source bitmap pixel coordinates.
    pub geometry: BezPath,
    /// Raw fill color as the tracer wrote it (hex or `rgb()`); may be malformed.
    pub fill: String,
}

/// Per-call tracing options.
#[derive(Clone, Debug)]
pub struct TraceOptions {
    /// Hard deadline for one trace call.
    pub timeout: Duration,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// A raster-to-vector tracing backend.
///
/// Implementations must stop work once `opts.timeout` has elapsed.
/// [`trace_with_timeout`] gives up on a late tracer but cannot cancel it: the detached thread
/// keeps running outside the build pool until `trace` returns. [`SvgCommandTracer`] kills its
/// child process at the deadline.
///
/// [`SvgCommandTracer`]: crate::trace::command::SvgCommandTracer
pub trait Tracer: Send + Sync {
    /// Trace `bitmap` into filled outlines.
    fn trace(&self, bitmap: &SourceBitmap, opts: &TraceOptions) -> QuillResult<Vec<TracedPath>>;
}

/// Run `tracer` on a watcher thread and give up after `opts.timeout`.
///
/// On timeout the worker thread is detached; its eventual result is dropped. Every failure is
/// reported as [`QuillError::VectorizationFailed`].
pub fn trace_with_timeout(
    tracer: Arc<dyn Tracer>,
    bitmap: Arc<SourceBitmap>,
    opts: &TraceOptions,
) -> QuillResult<Vec<TracedPath>> {
    let (tx, rx) = mpsc::sync_channel(1);
    let worker_opts = opts.clone();
    std::thread::Builder::new()
        .name("quill-trace".to_owned())
        .spawn(move || {
            let _ = tx.send(tracer.trace(&bitmap, &worker_opts));
        })
        .map_err(|e| QuillError::vectorization(format!("failed to spawn tracer thread: {e}")))?;

    match rx.recv_timeout(opts.timeout) {
        Ok(Ok(paths)) => Ok(paths),
        Ok(Err(QuillError::VectorizationFailed(msg))) => Err(QuillError::VectorizationFailed(msg)),
        Ok(Err(e)) => Err(QuillError::vectorization(e.to_string())),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(QuillError::vectorization(format!(
            "tracer timed out after {:.1}s",
            opts.timeout.as_secs_f64()
        ))),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(QuillError::vectorization("tracer thread panicked"))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trace/timeout.rs"]
mod tests;
