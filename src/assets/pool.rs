use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{SourceBitmap, decode_bitmap, load_bitmap};
use crate::assets::scene::{SceneAsset, SceneBuildConfig, build_scene_asset};
use crate::foundation::core::{Canvas, SceneId};
use crate::foundation::error::{QuillError, QuillResult};
use crate::trace::Tracer;

/// Where a scene's illustration comes from.
#[derive(Clone, Debug)]
pub enum BitmapSource {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
    Decoded(Arc<SourceBitmap>),
}

impl BitmapSource {
    pub fn load(&self) -> QuillResult<Arc<SourceBitmap>> {
        match self {
            Self::Path(p) => load_bitmap(p).map(Arc::new),
            Self::Bytes(b) => decode_bitmap(b).map(Arc::new),
            Self::Decoded(b) => Ok(Arc::clone(b)),
        }
    }
}

/// One scene to build.
#[derive(Clone, Debug)]
pub struct SceneJob {
    pub id: SceneId,
    pub source: BitmapSource,
}

/// Why a scene is not drawn as traced strokes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Degradation {
    /// Tracing failed or timed out; the bitmap is shown untraced.
    RasterFallback(String),
    /// The bitmap could not be loaded; the scene is background only.
    Blank(String),
    /// Rendering a frame of this scene failed; the frame shows background only.
    RenderFailed(String),
}

/// A degradation attributed to one scene.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SceneDegradation {
    pub scene: SceneId,
    pub degradation: Degradation,
}

/// Build one scene, recovering from every per-scene failure.
///
/// A load failure yields a blank asset sized `fallback_canvas`; a tracing failure yields a
/// raster-only asset.
pub fn build_or_degrade(
    job: &SceneJob,
    tracer: Arc<dyn Tracer>,
    cfg: &SceneBuildConfig,
    fallback_canvas: Canvas,
) -> (SceneAsset, Option<Degradation>) {
    let bitmap = match job.source.load() {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(scene = %job.id, error = %e, "scene bitmap unavailable, using blank scene");
            return (
                SceneAsset::blank(job.id, fallback_canvas),
                Some(Degradation::Blank(e.to_string())),
            );
        }
    };

    match build_scene_asset(job.id, Arc::clone(&bitmap), tracer, cfg) {
        Ok(asset) => (asset, None),
        Err(e) => {
            tracing::warn!(scene = %job.id, error = %e, "tracing failed, using raster fallback");
            (
                SceneAsset::raster_only(job.id, bitmap),
                Some(Degradation::RasterFallback(e.to_string())),
            )
        }
    }
}

pub(crate) fn build_thread_pool(threads: usize) -> QuillResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(QuillError::validation("trace concurrency must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("quill-scene-{i}"))
        .build()
        .map_err(|e| QuillError::Other(anyhow::anyhow!("failed to build scene thread pool: {e}")))
}

/// Scene assets keyed by scene id, plus the degradations recorded while building them.
#[derive(Debug, Default)]
pub struct SceneAssetLibrary {
    assets: BTreeMap<SceneId, Arc<SceneAsset>>,
    degraded: BTreeMap<SceneId, Degradation>,
}

impl SceneAssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every job in a pool of `concurrency` workers.
    ///
    /// Never fails because of a single scene; only pool construction can fail.
    #[tracing::instrument(level = "info", skip_all, fields(scenes = jobs.len(), concurrency = concurrency))]
    pub fn build_all(
        jobs: &[SceneJob],
        tracer: Arc<dyn Tracer>,
        cfg: &SceneBuildConfig,
        concurrency: usize,
        fallback_canvas: Canvas,
    ) -> QuillResult<Self> {
        let pool = build_thread_pool(concurrency)?;
        let built: Vec<(SceneId, SceneAsset, Option<Degradation>)> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let (asset, deg) =
                        build_or_degrade(job, Arc::clone(&tracer), cfg, fallback_canvas);
                    (job.id, asset, deg)
                })
                .collect()
        });

        let mut lib = Self::new();
        for (id, asset, deg) in built {
            lib.store(id, asset, deg);
        }
        tracing::info!(
            built = lib.assets.len(),
            degraded = lib.degraded.len(),
            "scene assets ready"
        );
        Ok(lib)
    }

    /// Replace one scene's asset by building it again.
    pub fn rebuild(
        &mut self,
        job: &SceneJob,
        tracer: Arc<dyn Tracer>,
        cfg: &SceneBuildConfig,
        fallback_canvas: Canvas,
    ) -> Arc<SceneAsset> {
        let (asset, deg) = build_or_degrade(job, tracer, cfg, fallback_canvas);
        self.store(job.id, asset, deg)
    }

    /// Insert a prebuilt asset, replacing any previous one for the same scene.
    pub fn insert(&mut self, asset: SceneAsset) -> Arc<SceneAsset> {
        let id = asset.id();
        self.store(id, asset, None)
    }

    fn store(
        &mut self,
        id: SceneId,
        asset: SceneAsset,
        deg: Option<Degradation>,
    ) -> Arc<SceneAsset> {
        let asset = Arc::new(asset);
        self.assets.insert(id, Arc::clone(&asset));
        match deg {
            Some(d) => {
                self.degraded.insert(id, d);
            }
            None => {
                self.degraded.remove(&id);
            }
        }
        asset
    }

    pub fn get(&self, id: SceneId) -> Option<&Arc<SceneAsset>> {
        self.assets.get(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Degradations in scene id order.
    pub fn degradations(&self) -> Vec<SceneDegradation> {
        self.degraded
            .iter()
            .map(|(scene, d)| SceneDegradation {
                scene: *scene,
                degradation: d.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/pool.rs"]
mod tests;
