//! A single character card: sources, view state, canvases and their lifecycle.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::compositor::{Compositor, PaintKey, PaintOutcome, PaintRequest};
use crate::config::CardConfig;
use crate::error::CardResult;
use crate::export::{self, Overlay};
use crate::image_loading::{compress_upload, ImageHandle, LoadTicket, LoadedPair, ResourceLoader};
use crate::interaction::{DeviceClass, InteractionController, InteractionEvent, InteractionState};
use crate::model::{
    BackgroundChoice, Offset, PlacementMode, PortraitSource, Size, TransformState,
};
use crate::retry::{ErrorCallback, RetryPolicy};
use crate::sampler::AdaptiveColors;
use crate::transform::{compute_transform, freedom_limits};
use crate::upload::{UploadClient, UploadOutcome, UploadTarget};

/// The character a card is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterInfo {
    pub name: String,
    /// Build identifier, used in download file names.
    pub id: String,
    /// Game art shown when no custom portrait is stored.
    pub game_art_url: String,
}

/// Owns everything needed to paint and export one card.
pub struct Card {
    config: CardConfig,
    character: CharacterInfo,
    portrait: PortraitSource,
    background: BackgroundChoice,
    adaptive: bool,
    skip_gradient: bool,
    generation: u64,
    portrait_handle: ImageHandle,
    background_handle: ImageHandle,
    interaction: InteractionController,
    compositor: Compositor,
    retry: RetryPolicy,
    uploading: bool,
}

impl Card {
    /// Create a card showing the character's game art over `background`.
    pub fn new(
        config: CardConfig,
        character: CharacterInfo,
        background: BackgroundChoice,
        device: DeviceClass,
        on_error: Option<ErrorCallback>,
    ) -> CardResult<Self> {
        config.validate()?;
        let mut retry = RetryPolicy::new(config.retry);
        if let Some(callback) = on_error {
            retry = retry.with_error_callback(callback);
        }
        let compositor = Compositor::new(config.viewport, config.sampler, retry.clone())?;
        let interaction = InteractionController::new(device, &config.throttle);
        Ok(Self {
            portrait: PortraitSource::GameArt(character.game_art_url.clone()),
            config,
            character,
            background,
            adaptive: false,
            skip_gradient: false,
            generation: 0,
            portrait_handle: ImageHandle::pending(),
            background_handle: ImageHandle::pending(),
            interaction,
            compositor,
            retry,
            uploading: false,
        })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn character(&self) -> &CharacterInfo {
        &self.character
    }

    pub fn portrait(&self) -> &PortraitSource {
        &self.portrait
    }

    pub fn background(&self) -> &BackgroundChoice {
        &self.background
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transform(&self) -> TransformState {
        self.interaction.transform()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Colors derived by the last paint, if tinting succeeded.
    pub fn adaptive_colors(&self) -> Option<&AdaptiveColors> {
        self.compositor
            .last_outcome()
            .and_then(|outcome| outcome.adaptive.as_ref())
    }

    /// Placement mode implied by the portrait source.
    pub fn placement_mode(&self) -> PlacementMode {
        if self.portrait.is_game_art() {
            PlacementMode::GachaCrop(
                self.config
                    .framing
                    .resolve(&self.character.name, self.config.viewport.layout_scale),
            )
        } else {
            PlacementMode::Default
        }
    }

    /// A loader sharing this card's retry policy and error callback.
    pub fn loader(&self) -> ResourceLoader {
        ResourceLoader::new(self.retry.clone())
    }

    // --- Sources ---

    /// Switch the portrait. Zoom and pan start over.
    pub fn set_portrait(&mut self, portrait: PortraitSource) {
        info!("Switching portrait source");
        self.portrait = portrait;
        self.portrait_handle = ImageHandle::pending();
        self.interaction.reset_transform();
        self.bump_generation();
    }

    /// Compress a user-supplied image and use it as the portrait.
    pub fn set_user_upload(&mut self, bytes: &[u8]) -> CardResult<()> {
        let compressed = compress_upload(
            bytes,
            self.config.viewport.character_size(),
            self.config.upload.quality_factor,
        )?;
        self.set_portrait(PortraitSource::Encoded(Arc::from(compressed)));
        Ok(())
    }

    pub fn set_background(&mut self, background: BackgroundChoice) {
        if self.background == background {
            return;
        }
        self.background = background;
        self.background_handle = ImageHandle::pending();
        self.bump_generation();
    }

    pub fn set_adaptive_tint(&mut self, enabled: bool) {
        if self.adaptive != enabled {
            self.adaptive = enabled;
            self.compositor.invalidate();
        }
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.compositor.invalidate();
        debug!("Card generation {}", self.generation);
    }

    // --- Loading ---

    /// Describe the loads needed for the current generation.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
            portrait: self.portrait.image_ref(),
            background: self.background.image_ref(&self.config.asset_base),
            portrait_handle: self.portrait_handle.clone(),
            background_handle: self.background_handle.clone(),
        }
    }

    /// Accept a finished joint load. Returns `Ok(false)` for a superseded generation.
    pub fn finish_load(&mut self, pair: LoadedPair) -> CardResult<bool> {
        if pair.generation != self.generation {
            debug!(
                "Ignoring load for generation {} (current {})",
                pair.generation, self.generation
            );
            return Ok(false);
        }
        pair.portrait?;
        pair.background?;
        Ok(true)
    }

    /// Load both images for the current generation and paint.
    pub async fn load(&mut self) -> CardResult<Option<PaintOutcome>> {
        let ticket = self.begin_load();
        let pair = self.loader().load_pair(&ticket).await;
        if self.finish_load(pair)? {
            self.repaint()
        } else {
            Ok(None)
        }
    }

    // --- Painting ---

    /// Paint with the committed transform if anything changed since the last paint.
    pub fn repaint(&mut self) -> CardResult<Option<PaintOutcome>> {
        self.paint_with(self.interaction.transform(), false)
    }

    fn paint_with(
        &mut self,
        transform: TransformState,
        force: bool,
    ) -> CardResult<Option<PaintOutcome>> {
        let request = PaintRequest {
            key: PaintKey {
                generation: self.generation,
                background: self.background.clone(),
                transform,
                adaptive: self.adaptive,
                skip_gradient: self.skip_gradient,
            },
            mode: self.placement_mode(),
            portrait: &self.portrait_handle,
            background: &self.background_handle,
        };
        self.compositor.paint(&request, force)
    }

    fn apply(&mut self, event: InteractionEvent) -> CardResult<Option<PaintOutcome>> {
        match event {
            InteractionEvent::Repaint { transform, force } => self.paint_with(transform, force),
            InteractionEvent::ViewportLock(locked) => {
                debug!("Viewport lock: {}", locked);
                Ok(None)
            }
        }
    }

    // --- Interaction ---

    /// Restore a transform, e.g. one saved with the build.
    pub fn set_transform(&mut self, transform: TransformState) {
        self.interaction.set_transform(transform);
    }

    pub fn tap(&mut self) {
        self.interaction.tap();
    }

    pub fn exit_configure(&mut self) -> Vec<InteractionEvent> {
        self.interaction.exit_configure()
    }

    /// Start a drag; returns the viewport lock event when one starts.
    pub fn pointer_down(&mut self, pointer: Offset) -> Vec<InteractionEvent> {
        self.interaction.pointer_down(pointer)
    }

    pub fn pointer_move(
        &mut self,
        pointer: Offset,
        now: Instant,
    ) -> CardResult<Option<PaintOutcome>> {
        match self.interaction.pointer_move(pointer, now) {
            Some(event) => self.apply(event),
            None => Ok(None),
        }
    }

    /// Paint the trailing throttled drag position, if due.
    pub fn poll(&mut self, now: Instant) -> CardResult<Option<PaintOutcome>> {
        match self.interaction.poll(now) {
            Some(event) => self.apply(event),
            None => Ok(None),
        }
    }

    /// End a drag. The committed pan is clamped and then settled to the pan
    /// the paint actually applied, so stored and rendered positions agree.
    pub fn pointer_up(&mut self, pointer: Offset) -> CardResult<Vec<InteractionEvent>> {
        let freedom = self.freedom();
        let events = self.interaction.pointer_up(pointer, freedom);
        self.release(events)
    }

    /// The pointer left the card mid-drag; treated as a release at `pointer`.
    pub fn pointer_leave(&mut self, pointer: Offset) -> CardResult<Vec<InteractionEvent>> {
        let freedom = self.freedom();
        let events = self.interaction.pointer_leave(pointer, freedom);
        self.release(events)
    }

    fn freedom(&self) -> Offset {
        freedom_limits(
            &self.placement_mode(),
            self.rendered_size(),
            self.config.viewport.character_size(),
        )
    }

    fn release(&mut self, events: Vec<InteractionEvent>) -> CardResult<Vec<InteractionEvent>> {
        let mut forwarded = Vec::new();
        for event in events {
            match event {
                InteractionEvent::Repaint { .. } => {
                    // A skipped paint still leaves the last outcome describing the canvas
                    self.apply(event)?;
                    if let Some(outcome) = self.compositor.last_outcome() {
                        let pan = outcome.placement.pan;
                        self.interaction.settle_pan(pan);
                    }
                }
                InteractionEvent::ViewportLock(_) => forwarded.push(event),
            }
        }
        Ok(forwarded)
    }

    /// Size of the portrait as drawn with the committed transform.
    fn rendered_size(&self) -> Size {
        let viewport = self.config.viewport.character_size();
        if let Some(outcome) = self.compositor.last_outcome() {
            return outcome.placement.size();
        }
        match self.portrait_handle.get() {
            Some(bitmap) => {
                let natural = Size::new(bitmap.width() as f32, bitmap.height() as f32);
                let transform = self.interaction.transform();
                compute_transform(
                    natural,
                    viewport,
                    &self.placement_mode(),
                    transform.zoom,
                    transform.pan,
                )
                .size()
            }
            None => viewport,
        }
    }

    pub fn zoom_in(&mut self) -> CardResult<Option<PaintOutcome>> {
        let event = self.interaction.zoom_in();
        self.apply(event)
    }

    pub fn zoom_out(&mut self) -> CardResult<Option<PaintOutcome>> {
        let viewport = self.config.viewport.character_size();
        let rendered = self.rendered_size();
        let min_zoom = self.placement_mode().min_zoom();
        let event = self.interaction.zoom_out(rendered, viewport, min_zoom);
        self.apply(event)
    }

    /// Zoom 1, centered, always repainted.
    pub fn reset_view(&mut self) -> CardResult<Option<PaintOutcome>> {
        let event = self.interaction.reset();
        self.apply(event)
    }

    // --- Export ---

    /// PNG of the composed card with `overlay` on top.
    pub fn snapshot(&mut self, overlay: &mut Overlay) -> CardResult<Vec<u8>> {
        self.repaint()?;
        export::snapshot_png(&self.compositor, overlay, &self.config.export)
    }

    /// Write the composed card into `dir` as `{name}-{id}.png`.
    pub fn download(&mut self, overlay: &mut Overlay, dir: &Path) -> CardResult<PathBuf> {
        let png = self.snapshot(overlay)?;
        export::write_download(&png, dir, &self.character.name, &self.character.id)
    }

    /// The portrait canvas alone, painted without the edge fade.
    pub fn upload_payload(&mut self) -> CardResult<Vec<u8>> {
        self.skip_gradient = true;
        let painted = self.paint_with(self.interaction.transform(), true);
        let png = painted.and_then(|_| Ok(self.compositor.character_canvas().to_png(None)?));
        self.skip_gradient = false;
        self.paint_with(self.interaction.transform(), true)?;
        png
    }

    /// Upload the current portrait and switch to the stored copy.
    pub async fn upload(
        &mut self,
        client: &UploadClient,
        target: &UploadTarget,
        token: &str,
    ) -> CardResult<UploadOutcome> {
        let payload = self.upload_payload()?;
        self.send_upload(client, target, token, Some(payload)).await
    }

    /// Remove the stored portrait; the card falls back to game art.
    pub async fn clear_upload(
        &mut self,
        client: &UploadClient,
        target: &UploadTarget,
        token: &str,
    ) -> CardResult<UploadOutcome> {
        self.send_upload(client, target, token, None).await
    }

    async fn send_upload(
        &mut self,
        client: &UploadClient,
        target: &UploadTarget,
        token: &str,
        payload: Option<Vec<u8>>,
    ) -> CardResult<UploadOutcome> {
        self.uploading = true;
        let result = client.upload(target, token, payload, self.adaptive).await;
        self.uploading = false;
        match result {
            Ok(outcome) => {
                self.apply_upload_outcome(client, &outcome);
                Ok(outcome)
            }
            Err(err) => {
                warn!("Upload failed, keeping current portrait: {}", err);
                Err(err)
            }
        }
    }

    /// Point the portrait at the stored file, or back at game art when none is stored.
    pub fn apply_upload_outcome(&mut self, client: &UploadClient, outcome: &UploadOutcome) {
        let portrait = match &outcome.filename {
            Some(filename) => PortraitSource::CustomUrl(client.portrait_url(filename)),
            None => PortraitSource::GameArt(self.character.game_art_url.clone()),
        };
        self.set_portrait(portrait);
    }
}

impl std::fmt::Debug for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("character", &self.character)
            .field("background", &self.background)
            .field("generation", &self.generation)
            .field("adaptive", &self.adaptive)
            .field("transform", &self.interaction.transform())
            .finish()
    }
}
