//! Quill turns narrated illustrations into hand-drawn whiteboard videos.
//!
//! Each scene's bitmap is traced into filled outlines, snapped to a small marker palette and
//! ordered into strokes. Frames are rendered on the CPU, revealing strokes progressively in
//! sync with the scene's narration, and streamed into `ffmpeg`.
//!
//! - Load a [`Project`] manifest (or assemble a [`Timeline`] and [`SceneAssetLibrary`] directly)
//! - Create a [`FrameRenderer`] per session
//! - Drive an [`ExportSession`] into a [`FrameSink`] with an [`AudioClock`]
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod assets;
pub mod audio;
pub mod config;
pub mod encode;
pub mod ink;
pub mod layout;
pub mod project;
pub mod render;
pub mod session;
pub mod timeline;
pub mod trace;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, FrameRGBA, Point, Rect, Rgb8, SceneId, Vec2,
};
pub use crate::foundation::error::{QuillError, QuillResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::decode::{PreparedImage, SourceBitmap};
pub use crate::assets::pool::{
    BitmapSource, Degradation, SceneAssetLibrary, SceneDegradation, SceneJob,
};
pub use crate::assets::scene::{AssetKind, SceneAsset, SceneBuildConfig, build_scene_asset};
pub use crate::audio::narration::{NARRATION_SAMPLE_RATE, NarrationClip};
pub use crate::config::{EngineConfig, OutputConfig, TraceConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::ink::palette::{PaletteConfig, normalize_color};
pub use crate::ink::sequence::{SequencedStrokes, SequencerConfig, sequence_strokes};
pub use crate::ink::stroke::Stroke;
pub use crate::layout::fit::{FitTransform, fit_content};
pub use crate::project::Project;
pub use crate::render::cpu::{FrameRenderer, Overlays, Watermark};
pub use crate::render::plan::{FramePlan, RenderSettings, plan_frame};
pub use crate::render::reveal::{RevealConfig, RevealState, reveal_at};
pub use crate::session::clock::{AudioClock, SampleClock};
pub use crate::session::export::{
    AbortHandle, ExportOutcome, ExportProgress, ExportReport, ExportSession, Mp4Output,
    render_frame_at, render_to_mp4,
};
pub use crate::timeline::{Timeline, TimelineEntry, TimelinePolicy};
pub use crate::trace::command::SvgCommandTracer;
pub use crate::trace::{TraceOptions, TracedPath, Tracer};
