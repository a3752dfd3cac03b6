use super::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::foundation::core::{Point, Rect};
use kurbo::Shape;

struct Fixed(Vec<TracedPath>);

impl Tracer for Fixed {
    fn trace(&self, _bitmap: &SourceBitmap, _opts: &TraceOptions) -> QuillResult<Vec<TracedPath>> {
        Ok(self.0.clone())
    }
}

struct Sleepy(Duration);

impl Tracer for Sleepy {
    fn trace(&self, _bitmap: &SourceBitmap, _opts: &TraceOptions) -> QuillResult<Vec<TracedPath>> {
        std::thread::sleep(self.0);
        Ok(Vec::new())
    }
}

struct Broken;

impl Tracer for Broken {
    fn trace(&self, _bitmap: &SourceBitmap, _opts: &TraceOptions) -> QuillResult<Vec<TracedPath>> {
        Err(QuillError::render("backend exploded"))
    }
}

/// Works until the deadline it is handed, then gives up.
struct Deadline(Arc<AtomicBool>);

impl Tracer for Deadline {
    fn trace(&self, _bitmap: &SourceBitmap, opts: &TraceOptions) -> QuillResult<Vec<TracedPath>> {
        let start = Instant::now();
        while start.elapsed() < opts.timeout {
            std::thread::sleep(Duration::from_millis(2));
        }
        self.0.store(true, Ordering::SeqCst);
        Err(QuillError::vectorization("deadline reached"))
    }
}

fn bitmap() -> Arc<SourceBitmap> {
    Arc::new(SourceBitmap::from_rgba8(1, 1, vec![255, 255, 255, 255]).unwrap())
}

fn opts(ms: u64) -> TraceOptions {
    TraceOptions {
        timeout: Duration::from_millis(ms),
    }
}

#[test]
fn passes_paths_through() {
    let path = TracedPath {
        geometry: Rect::from_points(Point::ZERO, Point::new(4.0, 4.0)).to_path(0.1),
        fill: "#000000".to_owned(),
    };
    let out = trace_with_timeout(Arc::new(Fixed(vec![path])), bitmap(), &opts(5_000)).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].fill, "#000000");
}

#[test]
fn slow_tracer_times_out_as_vectorization_failure() {
    let err = trace_with_timeout(
        Arc::new(Sleepy(Duration::from_millis(500))),
        bitmap(),
        &opts(20),
    )
    .unwrap_err();
    match err {
        QuillError::VectorizationFailed(msg) => assert!(msg.contains("timed out")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tracer_errors_become_vectorization_failures() {
    let err = trace_with_timeout(Arc::new(Broken), bitmap(), &opts(5_000)).unwrap_err();
    match err {
        QuillError::VectorizationFailed(msg) => assert!(msg.contains("backend exploded")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tracer_sees_the_caller_timeout_and_its_thread_winds_down() {
    let done = Arc::new(AtomicBool::new(false));
    let err = trace_with_timeout(Arc::new(Deadline(Arc::clone(&done))), bitmap(), &opts(30));
    assert!(matches!(err, Err(QuillError::VectorizationFailed(_))));

    let waited = Instant::now();
    while !done.load(Ordering::SeqCst) && waited.elapsed() < Duration::from_secs(5) {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(done.load(Ordering::SeqCst));
}
