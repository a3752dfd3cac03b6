//! Project manifests and the end-to-end pipeline.
//!
//! A manifest names one illustration and one narration clip per scene:
//!
//! ```json
//! {
//!   "config": { "output": { "aspect": "16:9" } },
//!   "scenes": [
//!     { "id": 1, "image": "scene1.png", "narration": "scene1.mp3" },
//!     { "id": 2, "image": "scene2.png", "silence_secs": 3.0 }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::decode::load_image;
use crate::assets::pool::{BitmapSource, SceneAssetLibrary, SceneJob};
use crate::audio::narration::{NARRATION_SAMPLE_RATE, NarrationClip, decode_narration};
use crate::config::EngineConfig;
use crate::encode::ffmpeg::{ensure_parent_dir, flatten_premul_over_bg_to_opaque_rgba8};
use crate::foundation::core::{FrameRGBA, SceneId};
use crate::foundation::error::{QuillError, QuillResult};
use crate::render::cpu::{FrameRenderer, Overlays, Watermark};
use crate::session::export::{
    AbortHandle, ExportOutcome, ExportProgress, Mp4Output, render_frame_at, render_to_mp4,
};
use crate::timeline::Timeline;
use crate::trace::Tracer;

/// One scene entry of a manifest.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestScene {
    pub id: SceneId,
    pub image: PathBuf,
    /// Narration audio, decoded with ffmpeg.
    #[serde(default)]
    pub narration: Option<PathBuf>,
    /// Length of a silent scene; used only when `narration` is absent.
    #[serde(default)]
    pub silence_secs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    #[serde(default)]
    pub config: EngineConfig,
    pub scenes: Vec<ManifestScene>,
}

/// A validated manifest with every path resolved.
#[derive(Clone, Debug)]
pub struct Project {
    config: EngineConfig,
    scenes: Vec<ManifestScene>,
}

impl Project {
    /// Load a manifest from disk, resolving relative paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> QuillResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            QuillError::validation(format!("open project manifest '{}': {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_reader(BufReader::new(f), base)
    }

    /// Parse a manifest, resolving relative paths against `base_dir`.
    pub fn from_reader<R: std::io::Read>(r: R, base_dir: &Path) -> QuillResult<Self> {
        let manifest: ProjectManifest = serde_json::from_reader(r)
            .map_err(|e| QuillError::validation(format!("parse project manifest JSON: {e}")))?;
        Self::new(manifest, base_dir)
    }

    pub fn new(manifest: ProjectManifest, base_dir: &Path) -> QuillResult<Self> {
        let ProjectManifest {
            mut config,
            mut scenes,
        } = manifest;

        if scenes.is_empty() {
            return Err(QuillError::validation("project has no scenes"));
        }
        let mut ids = BTreeSet::new();
        for s in &mut scenes {
            if !ids.insert(s.id) {
                return Err(QuillError::validation(format!("duplicate scene id {}", s.id)));
            }
            match (&s.narration, s.silence_secs) {
                (None, None) => {
                    return Err(QuillError::validation(format!(
                        "{} needs either narration or silence_secs",
                        s.id
                    )));
                }
                (None, Some(secs)) if !secs.is_finite() || secs < 0.0 => {
                    return Err(QuillError::validation(format!(
                        "{} silence_secs must be finite and >= 0",
                        s.id
                    )));
                }
                _ => {}
            }
            s.image = resolve(base_dir, &s.image);
            s.narration = s.narration.as_deref().map(|p| resolve(base_dir, p));
        }

        if let Some(sprite) = config.reveal.pen_sprite.take() {
            config.reveal.pen_sprite = Some(resolve(base_dir, &sprite));
        }
        if let Some(wm) = config.output.watermark.as_mut() {
            wm.image = resolve(base_dir, &wm.image);
        }

        config.apply_env();
        config.validate()?;
        Ok(Self { config, scenes })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scenes(&self) -> &[ManifestScene] {
        &self.scenes
    }

    /// Decode every scene's narration at the narration sample rate.
    ///
    /// Narration sets the timeline, so a clip that cannot be decoded fails the project.
    #[tracing::instrument(level = "info", skip_all, fields(scenes = self.scenes.len()))]
    pub fn load_narration(&self) -> QuillResult<BTreeMap<SceneId, NarrationClip>> {
        let mut out = BTreeMap::new();
        for s in &self.scenes {
            let clip = match (&s.narration, s.silence_secs) {
                (Some(path), _) => decode_narration(path, NARRATION_SAMPLE_RATE)?,
                (None, secs) => NarrationClip::silence(NARRATION_SAMPLE_RATE, secs.unwrap_or(0.0))?,
            };
            tracing::debug!(scene = %s.id, secs = clip.duration_secs(), "narration ready");
            out.insert(s.id, clip);
        }
        Ok(out)
    }

    /// Schedule scenes from narration durations, in manifest order.
    pub fn timeline(&self, narration: &BTreeMap<SceneId, NarrationClip>) -> QuillResult<Timeline> {
        let durations = self
            .scenes
            .iter()
            .map(|s| {
                narration
                    .get(&s.id)
                    .map(|c| (s.id, c.duration_secs()))
                    .ok_or_else(|| QuillError::validation(format!("no narration for {}", s.id)))
            })
            .collect::<QuillResult<Vec<_>>>()?;
        Timeline::build(&durations, self.config.timeline)
    }

    pub fn scene_jobs(&self) -> Vec<SceneJob> {
        self.scenes
            .iter()
            .map(|s| SceneJob {
                id: s.id,
                source: BitmapSource::Path(s.image.clone()),
            })
            .collect()
    }

    /// Build every scene asset with the configured pool size.
    pub fn build_assets(&self, tracer: Arc<dyn Tracer>) -> QuillResult<SceneAssetLibrary> {
        SceneAssetLibrary::build_all(
            &self.scene_jobs(),
            tracer,
            &self.config.scene_build(),
            self.config.trace.concurrency,
            self.config.output.frame_size(),
        )
    }

    /// Build every scene asset with the configured command tracer.
    pub fn build_assets_with_command_tracer(&self) -> QuillResult<SceneAssetLibrary> {
        self.build_assets(Arc::new(self.config.trace.tracer()))
    }

    /// Decode overlays and create a renderer for one session.
    ///
    /// An overlay image that cannot be loaded is skipped with a warning; the pen falls back to
    /// the marker dot.
    pub fn renderer(&self) -> QuillResult<FrameRenderer> {
        let mut overlays = Overlays::default();
        if let Some(path) = &self.config.reveal.pen_sprite {
            match load_image(path) {
                Ok(img) => overlays.pen_sprite = Some(img),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "pen sprite skipped"),
            }
        }
        if let Some(wm) = &self.config.output.watermark {
            match load_image(&wm.image) {
                Ok(image) => {
                    overlays.watermark = Some(Watermark {
                        image,
                        width_fraction: wm.width_fraction,
                        margin_px: wm.margin_px,
                        opacity: wm.opacity,
                    })
                }
                Err(e) => {
                    tracing::warn!(path = %wm.image.display(), error = %e, "watermark skipped")
                }
            }
        }
        FrameRenderer::new(self.config.render_settings(), overlays)
    }

    /// Run the whole pipeline and write an MP4 to `out`.
    pub fn export_mp4(
        &self,
        tracer: Arc<dyn Tracer>,
        out: &Path,
        overwrite: bool,
        abort: AbortHandle,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> QuillResult<ExportOutcome> {
        crate::encode::ffmpeg::ensure_h264_encoder()?;
        let narration = self.load_narration()?;
        let timeline = self.timeline(&narration)?;
        let library = self.build_assets(tracer)?;
        let output = Mp4Output {
            path: out.to_path_buf(),
            fps: self.config.output.fps,
            bitrate_kbps: Some(self.config.output.bitrate_kbps),
            overwrite,
        };
        render_to_mp4(
            &timeline,
            &library,
            &narration,
            self.renderer()?,
            &output,
            abort,
            progress,
        )
    }

    /// Render the single frame shown at time `t`, building only the scene visible then.
    pub fn render_still(&self, tracer: Arc<dyn Tracer>, t: f64) -> QuillResult<FrameRGBA> {
        let narration = self.load_narration()?;
        let timeline = self.timeline(&narration)?;
        let jobs: Vec<SceneJob> = match timeline.scene_at(t) {
            Some(entry) => self
                .scene_jobs()
                .into_iter()
                .filter(|j| j.id == entry.id)
                .collect(),
            None => Vec::new(),
        };
        let library = SceneAssetLibrary::build_all(
            &jobs,
            tracer,
            &self.config.scene_build(),
            1,
            self.config.output.frame_size(),
        )?;
        let mut renderer = self.renderer()?;
        render_frame_at(&timeline, &library, &mut renderer, t)
    }
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Write a frame as an opaque PNG, flattened over `bg_rgba`.
pub fn save_frame_png(frame: &FrameRGBA, bg_rgba: [u8; 4], path: &Path) -> QuillResult<()> {
    let mut rgba = vec![0u8; frame.data.len()];
    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(&mut rgba, &frame.data, bg_rgba)?;
    } else {
        rgba.copy_from_slice(&frame.data);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| QuillError::render("frame buffer size mismatch"))?;
    ensure_parent_dir(path)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
