//! Audio-clocked export of a whole timeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assets::pool::{Degradation, SceneAssetLibrary, SceneDegradation};
use crate::audio::mix::{mix_narration, write_mix_to_f32le_file};
use crate::audio::narration::{NARRATION_SAMPLE_RATE, NarrationClip};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_h264_encoder};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex, FrameRGBA, SceneId};
use crate::foundation::error::{QuillError, QuillResult};
use crate::foundation::temp::{TempFileGuard, unique_temp_path};
use crate::render::cpu::FrameRenderer;
use crate::render::plan::{FramePlan, plan_frame};
use crate::session::clock::{AudioClock, SampleClock};
use crate::timeline::Timeline;

/// Shared cancellation flag, checked once per frame.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress pushed after every encoded frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportProgress {
    pub frame: u64,
    pub clock_secs: f64,
    /// `100 * clock / total`, clamped to `[0, 100]` and never decreasing.
    pub percent: f64,
}

/// Summary of a completed export.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ExportReport {
    pub frames: u64,
    pub duration_secs: f64,
    /// Scenes that were not drawn as traced strokes, in scene order.
    pub degraded: Vec<SceneDegradation>,
}

/// How an export ended. Cancellation is an outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportOutcome {
    Completed(ExportReport),
    Aborted { frames: u64 },
}

/// One export pass: a renderer with its own cursor, driven by an audio clock.
pub struct ExportSession<'a> {
    timeline: &'a Timeline,
    library: &'a SceneAssetLibrary,
    renderer: FrameRenderer,
    fps: Fps,
    abort: AbortHandle,
}

impl<'a> ExportSession<'a> {
    pub fn new(
        timeline: &'a Timeline,
        library: &'a SceneAssetLibrary,
        renderer: FrameRenderer,
        fps: Fps,
    ) -> QuillResult<Self> {
        Fps::new(fps.num, fps.den)?;
        Ok(Self {
            timeline,
            library,
            renderer,
            fps,
            abort: AbortHandle::new(),
        })
    }

    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    /// Render frames into `sink` until `clock` reaches the end of the timeline.
    ///
    /// Scene failures degrade single frames; only sink failures end the export with an error.
    #[tracing::instrument(level = "info", skip_all, fields(total_secs = self.timeline.total_duration()))]
    pub fn run(
        &mut self,
        sink: &mut dyn FrameSink,
        clock: &mut dyn AudioClock,
        audio: Option<AudioInputConfig>,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> QuillResult<ExportOutcome> {
        let frame_canvas = self.renderer.settings().frame;
        sink.begin(SinkConfig {
            width: frame_canvas.width,
            height: frame_canvas.height,
            fps: self.fps,
            audio,
        })?;

        let total = self.timeline.total_duration();
        let mut render_failures: BTreeMap<SceneId, String> = BTreeMap::new();
        let mut frames = 0u64;
        let mut percent = 0.0f64;

        loop {
            if self.abort.is_aborted() {
                clock.stop();
                sink.abort()?;
                tracing::info!(frames, "export aborted");
                return Ok(ExportOutcome::Aborted { frames });
            }

            let t = clock.position_secs();
            if t >= total {
                break;
            }

            let frame = match self.frame_at(t) {
                Ok(f) => f,
                Err(e) if e.is_session_fatal() => {
                    clock.stop();
                    let _ = sink.abort();
                    return Err(e);
                }
                Err(e) => {
                    let scene = self.timeline.scene_at(t).map(|e| e.id);
                    tracing::warn!(?scene, error = %e, "frame render failed, emitting background");
                    if let Some(id) = scene {
                        render_failures.entry(id).or_insert_with(|| e.to_string());
                    }
                    let fallback = FramePlan::background_only(self.renderer.settings(), None);
                    match self.renderer.render(&fallback, None) {
                        Ok(f) => f,
                        Err(e) => {
                            clock.stop();
                            let _ = sink.abort();
                            return Err(e);
                        }
                    }
                }
            };

            if let Err(e) = sink.push_frame(FrameIndex(frames), &frame) {
                clock.stop();
                let _ = sink.abort();
                return Err(e);
            }
            frames += 1;
            clock.tick();

            let clock_secs = clock.position_secs();
            let p = if total > 0.0 {
                (100.0 * clock_secs / total).clamp(0.0, 100.0)
            } else {
                100.0
            };
            percent = percent.max(p);
            progress(ExportProgress {
                frame: frames,
                clock_secs,
                percent,
            });
        }

        clock.stop();
        sink.end()?;

        let report = ExportReport {
            frames,
            duration_secs: total,
            degraded: merge_degradations(self.library.degradations(), render_failures),
        };
        tracing::info!(frames, degraded = report.degraded.len(), "export complete");
        Ok(ExportOutcome::Completed(report))
    }

    /// Render the frame shown at absolute time `t`.
    pub fn frame_at(&mut self, t: f64) -> QuillResult<FrameRGBA> {
        render_frame_at(self.timeline, self.library, &mut self.renderer, t)
    }
}

/// Render the frame at absolute time `t` of `timeline` with `renderer`.
///
/// Times outside every scene, and scenes without an asset, show the background only.
pub fn render_frame_at(
    timeline: &Timeline,
    library: &SceneAssetLibrary,
    renderer: &mut FrameRenderer,
    t: f64,
) -> QuillResult<FrameRGBA> {
    let entry = timeline.scene_at(t);
    let asset = entry.and_then(|e| library.get(e.id));
    let plan = match (entry, asset) {
        (Some(e), Some(a)) => plan_frame(a, t - e.start_time, e.visual_duration, renderer.settings()),
        (e, _) => FramePlan::background_only(renderer.settings(), e.map(|e| e.id)),
    };
    renderer.render(&plan, asset.map(|a| &**a))
}

fn merge_degradations(
    built: Vec<SceneDegradation>,
    render_failures: BTreeMap<SceneId, String>,
) -> Vec<SceneDegradation> {
    let mut out: Vec<SceneDegradation> = built
        .into_iter()
        .chain(render_failures.into_iter().map(|(scene, reason)| SceneDegradation {
            scene,
            degradation: Degradation::RenderFailed(reason),
        }))
        .collect();
    out.sort_by_key(|d| d.scene);
    out
}

/// Output settings for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct Mp4Output {
    pub path: PathBuf,
    pub fps: Fps,
    pub bitrate_kbps: Option<u32>,
    pub overwrite: bool,
}

/// Mix narration, then export the timeline to an MP4 through the system ffmpeg.
///
/// Fails with `EncoderUnsupported` before any frame is rendered when no H.264 encoder is
/// available.
#[tracing::instrument(level = "info", skip_all, fields(out = %output.path.display()))]
pub fn render_to_mp4(
    timeline: &Timeline,
    library: &SceneAssetLibrary,
    narration: &BTreeMap<SceneId, NarrationClip>,
    renderer: FrameRenderer,
    output: &Mp4Output,
    abort: AbortHandle,
    progress: &mut dyn FnMut(ExportProgress),
) -> QuillResult<ExportOutcome> {
    ensure_h264_encoder()?;

    let mixed = mix_narration(timeline, |id| narration.get(&id), NARRATION_SAMPLE_RATE);
    let audio_path = unique_temp_path("narration_mix", "f32le");
    let _audio_tmp = TempFileGuard(Some(audio_path.clone()));
    write_mix_to_f32le_file(&mixed, &audio_path)?;

    let bg = renderer.settings().background.to_rgba();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: output.path.clone(),
        overwrite: output.overwrite,
        bg_rgba: bg,
        bitrate_kbps: output.bitrate_kbps,
    });
    let mut clock = SampleClock::new(output.fps, NARRATION_SAMPLE_RATE)?;
    let mut session = ExportSession::new(timeline, library, renderer, output.fps)?.with_abort(abort);

    session
        .run(
            &mut sink,
            &mut clock,
            Some(AudioInputConfig {
                path: audio_path.clone(),
                sample_rate: NARRATION_SAMPLE_RATE,
                channels: 1,
            }),
            progress,
        )
        .map_err(|e| match e {
            QuillError::Validation(_) | QuillError::EncoderUnsupported(_) | QuillError::Encode(_) => e,
            other => QuillError::encode(other.to_string()),
        })
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;
