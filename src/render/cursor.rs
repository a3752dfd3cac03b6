use crate::foundation::core::SceneId;

/// Incremental redraw state owned by one [`FrameRenderer`](crate::FrameRenderer).
///
/// Holds the background cache: background color, raster fallback and every stroke already
/// baked for the current scene, as a premultiplied RGBA8 frame. It only makes redraws cheaper;
/// frame content is always determined by the reveal state alone.
#[derive(Debug, Default)]
pub struct RenderCursor {
    scene: Option<SceneId>,
    asset: Option<u64>,
    baked: usize,
    primed: bool,
    cache: Vec<u8>,
    resets: u64,
}

impl RenderCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene the cache currently belongs to.
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Generation of the asset whose strokes are baked.
    pub fn asset(&self) -> Option<u64> {
        self.asset
    }

    /// Number of strokes baked into the cache.
    pub fn baked(&self) -> usize {
        self.baked
    }

    /// Index of the last baked stroke; `None` before the first one.
    pub fn last_fully_drawn_index(&self) -> Option<usize> {
        self.baked.checked_sub(1)
    }

    /// How many times the cache was cleared (scene or asset changes and backwards seeks).
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Whether the cache cannot serve a frame of `scene`/`asset` with `fully_drawn` strokes.
    ///
    /// A rebuilt asset keeps its scene id but gets a new generation, so it also invalidates.
    pub(crate) fn is_stale(
        &self,
        scene: Option<SceneId>,
        asset: Option<u64>,
        fully_drawn: usize,
    ) -> bool {
        !self.primed || self.scene != scene || self.asset != asset || fully_drawn < self.baked
    }

    /// Clear the cache for `scene`/`asset`, leaving it filled with `background`.
    pub(crate) fn reset(
        &mut self,
        scene: Option<SceneId>,
        asset: Option<u64>,
        frame_bytes: usize,
        background: [u8; 4],
    ) {
        self.cache.resize(frame_bytes, 0);
        crate::render::composite::fill_opaque(&mut self.cache, background);
        self.scene = scene;
        self.asset = asset;
        self.baked = 0;
        self.primed = true;
        self.resets += 1;
    }

    pub(crate) fn mark_baked(&mut self, count: usize) {
        self.baked = count;
    }

    pub(crate) fn cache(&self) -> &[u8] {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut [u8] {
        &mut self.cache
    }
}
