//! Engine configuration, loaded from JSON.
//!
//! Every section has defaults, so `{}` is a valid configuration. Thresholds for palette
//! snapping and stroke sequencing live in their own sections and are validated together in
//! [`EngineConfig::validate`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::scene::SceneBuildConfig;
use crate::foundation::core::{Canvas, Fps, Rgb8};
use crate::foundation::error::{QuillError, QuillResult};
use crate::ink::palette::PaletteConfig;
use crate::ink::sequence::SequencerConfig;
use crate::render::plan::RenderSettings;
use crate::render::reveal::RevealConfig;
use crate::timeline::TimelinePolicy;
use crate::trace::TraceOptions;
use crate::trace::command::{SvgCommandTracer, default_vtracer_args};

/// Overrides `trace.concurrency` when set to a positive integer.
pub const TRACE_CONCURRENCY_ENV: &str = "QUILL_TRACE_CONCURRENCY";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub palette: PaletteConfig,
    pub sequencer: SequencerConfig,
    /// Share of the frame the scene content may occupy.
    pub fit_fraction: f64,
    pub timeline: TimelinePolicy,
    pub reveal: RevealConfig,
    pub output: OutputConfig,
    pub trace: TraceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            palette: PaletteConfig::default(),
            sequencer: SequencerConfig::default(),
            fit_fraction: 0.85,
            timeline: TimelinePolicy::default(),
            reveal: RevealConfig::default(),
            output: OutputConfig::default(),
            trace: TraceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> QuillResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| QuillError::validation(format!("parse engine config JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> QuillResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            QuillError::validation(format!("open engine config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> QuillResult<()> {
        if !(self.palette.saturation_floor >= 0.0 && self.palette.saturation_floor <= 1.0) {
            return Err(QuillError::validation(
                "palette.saturation_floor must be in [0, 1]",
            ));
        }
        self.sequencer.validate()?;
        if !(self.fit_fraction > 0.0 && self.fit_fraction <= 1.0) {
            return Err(QuillError::validation("fit_fraction must be in (0, 1]"));
        }
        self.timeline.validate()?;
        self.reveal.validate()?;
        self.output.validate()?;
        self.trace.validate()?;
        Ok(())
    }

    /// Apply environment overrides on top of the parsed values.
    pub fn apply_env(&mut self) {
        if let Some(n) = std::env::var(TRACE_CONCURRENCY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.trace.concurrency = n;
        }
    }

    pub fn scene_build(&self) -> SceneBuildConfig {
        SceneBuildConfig {
            palette: self.palette.clone(),
            sequencer: self.sequencer.clone(),
            trace: self.trace.options(),
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            frame: self.output.frame_size(),
            background: self.output.background,
            fit_fraction: self.fit_fraction,
            reveal: self.reveal.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
}

/// Output video settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub aspect: AspectRatio,
    pub quality: Quality,
    pub fps: Fps,
    pub bitrate_kbps: u32,
    pub background: Rgb8,
    pub watermark: Option<WatermarkConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            quality: Quality::default(),
            fps: Fps { num: 30, den: 1 },
            bitrate_kbps: 8000,
            background: Rgb8::WHITE,
            watermark: None,
        }
    }
}

impl OutputConfig {
    /// Output frame size for the aspect and quality tier. Square output is 1080x1080 for
    /// both tiers.
    pub fn frame_size(&self) -> Canvas {
        let (w, h) = match (self.aspect, self.quality) {
            (AspectRatio::Landscape, Quality::Hd1080) => (1920, 1080),
            (AspectRatio::Landscape, Quality::Hd720) => (1280, 720),
            (AspectRatio::Portrait, Quality::Hd1080) => (1080, 1920),
            (AspectRatio::Portrait, Quality::Hd720) => (720, 1280),
            (AspectRatio::Square, _) => (1080, 1080),
        };
        Canvas::new(w, h)
    }

    pub fn validate(&self) -> QuillResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.bitrate_kbps == 0 {
            return Err(QuillError::validation("output.bitrate_kbps must be > 0"));
        }
        if let Some(w) = &self.watermark {
            w.validate()?;
        }
        Ok(())
    }
}

/// Logo drawn in the bottom-right corner of every frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    pub image: PathBuf,
    /// Logo width as a fraction of the frame width.
    #[serde(default = "default_watermark_width")]
    pub width_fraction: f64,
    #[serde(default = "default_watermark_margin")]
    pub margin_px: f64,
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f32,
}

fn default_watermark_width() -> f64 {
    0.12
}

fn default_watermark_margin() -> f64 {
    24.0
}

fn default_watermark_opacity() -> f32 {
    0.8
}

impl WatermarkConfig {
    pub fn validate(&self) -> QuillResult<()> {
        if !(self.width_fraction > 0.0 && self.width_fraction <= 1.0) {
            return Err(QuillError::validation(
                "output.watermark.width_fraction must be in (0, 1]",
            ));
        }
        if !self.margin_px.is_finite() || self.margin_px < 0.0 {
            return Err(QuillError::validation(
                "output.watermark.margin_px must be finite and >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(QuillError::validation(
                "output.watermark.opacity must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// External tracer and scene build pool settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Scene builds running at once.
    pub concurrency: usize,
    pub timeout_secs: f64,
    pub program: String,
    /// Arguments with `{input}` / `{output}` placeholders.
    pub args: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 30.0,
            program: "vtracer".to_owned(),
            args: default_vtracer_args(),
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> QuillResult<()> {
        if self.concurrency == 0 {
            return Err(QuillError::validation("trace.concurrency must be > 0"));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(QuillError::validation("trace.timeout_secs must be > 0"));
        }
        if self.program.trim().is_empty() {
            return Err(QuillError::validation("trace.program must be non-empty"));
        }
        Ok(())
    }

    pub fn options(&self) -> TraceOptions {
        TraceOptions {
            timeout: Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX),
        }
    }

    pub fn tracer(&self) -> SvgCommandTracer {
        SvgCommandTracer::new(self.program.clone(), self.args.clone())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
