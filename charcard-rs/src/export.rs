//! Snapshot of the composed card: background, portrait and overlay sprites.

use charcard_canvas2d::{Canvas2dContext, ImageBitmap};
use log::info;
use std::path::{Path, PathBuf};

use crate::compositor::Compositor;
use crate::config::{ExportConfig, SnapshotNudge};
use crate::error::{CardError, CardResult};
use crate::model::Offset;

/// A raster sprite drawn over the canvases, such as a stat table or an icon.
#[derive(Debug, Clone)]
pub struct OverlayElement {
    /// Class tag matched by snapshot nudges.
    pub class: String,
    /// Top-left in logical pixels.
    pub position: Offset,
    /// Pixels at device resolution.
    pub bitmap: ImageBitmap,
}

impl OverlayElement {
    pub fn new(class: &str, position: Offset, bitmap: ImageBitmap) -> Self {
        Self {
            class: class.to_string(),
            position,
            bitmap,
        }
    }

    /// Rasterize an SVG fragment at `density` device pixels per logical pixel.
    pub fn from_svg(class: &str, position: Offset, svg: &str, density: f32) -> CardResult<Self> {
        let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
            .map_err(|err| CardError::Svg(err.to_string()))?;
        let size = tree.size();
        let width = (size.width() * density).ceil().max(1.0) as u32;
        let height = (size.height() * density).ceil().max(1.0) as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| CardError::Svg(format!("cannot rasterize at {width}x{height}")))?;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(density, density),
            &mut pixmap.as_mut(),
        );
        Ok(Self::new(class, position, ImageBitmap::from_pixmap(pixmap, true)))
    }
}

/// Overlay sprites in paint order.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    elements: Vec<OverlayElement>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: OverlayElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Applies snapshot nudges to an overlay and reverts them when dropped.
struct NudgeGuard<'a> {
    overlay: &'a mut Overlay,
    applied: Vec<(usize, Offset)>,
}

impl<'a> NudgeGuard<'a> {
    fn apply(overlay: &'a mut Overlay, nudges: &[SnapshotNudge]) -> Self {
        let mut applied = Vec::new();
        for (index, element) in overlay.elements.iter_mut().enumerate() {
            for nudge in nudges.iter().filter(|n| n.class == element.class) {
                let delta = Offset::new(nudge.dx, nudge.dy);
                element.position = element.position + delta;
                applied.push((index, delta));
            }
        }
        Self { overlay, applied }
    }
}

impl Drop for NudgeGuard<'_> {
    fn drop(&mut self) {
        for (index, delta) in self.applied.drain(..).rev() {
            let element = &mut self.overlay.elements[index];
            element.position = element.position - delta;
        }
    }
}

/// Run `capture` with `nudges` applied to `overlay`. They are reverted
/// afterwards whether or not `capture` succeeds.
pub fn with_nudges<T>(
    overlay: &mut Overlay,
    nudges: &[SnapshotNudge],
    capture: impl FnOnce(&Overlay) -> CardResult<T>,
) -> CardResult<T> {
    let guard = NudgeGuard::apply(overlay, nudges);
    capture(guard.overlay)
}

/// Compose both canvases and the overlay into a single device-resolution canvas.
pub fn compose_snapshot(
    compositor: &Compositor,
    overlay: &mut Overlay,
    export: &ExportConfig,
) -> CardResult<Canvas2dContext> {
    let density = compositor.viewport().pixel_density;
    let background = compositor.background_canvas();
    let mut card = Canvas2dContext::new(background.width(), background.height())?;
    card.draw_canvas(background, 0.0, 0.0);

    let origin = export.character_origin.scaled(density);
    card.draw_canvas(compositor.character_canvas(), origin.x, origin.y);

    with_nudges(overlay, &export.nudges, |overlay| {
        for element in overlay.elements() {
            let at = element.position.scaled(density);
            card.draw_image(&element.bitmap, at.x, at.y);
        }
        Ok(())
    })?;
    Ok(card)
}

/// Snapshot as PNG bytes, for previews and in-memory blobs.
pub fn snapshot_png(
    compositor: &Compositor,
    overlay: &mut Overlay,
    export: &ExportConfig,
) -> CardResult<Vec<u8>> {
    Ok(compose_snapshot(compositor, overlay, export)?.to_png(None)?)
}

/// File name of a downloaded card.
pub fn download_file_name(name: &str, id: &str) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!("{}-{}.png", clean(name), clean(id))
}

/// Write `png` into `dir` under the card's download name.
pub fn write_download(png: &[u8], dir: &Path, name: &str, id: &str) -> CardResult<PathBuf> {
    let path = dir.join(download_file_name(name, id));
    std::fs::write(&path, png)?;
    info!("Saved card to {}", path.display());
    Ok(path)
}
