//! Dual-canvas paint pipeline: background, masked portrait and adaptive tint.

use charcard_canvas2d::{
    Canvas2dContext, CanvasColor, CanvasFilter, CompositeOperation, ImageBitmap, RectParams,
};
use log::{debug, warn};

use crate::config::{SamplerConfig, ViewportConfig};
use crate::error::{CardError, CardResult};
use crate::image_loading::ImageHandle;
use crate::model::{BackgroundChoice, PlacementMode, Size, TransformState, NAMECARD_HEIGHT};
use crate::retry::RetryPolicy;
use crate::sampler::{sample_edge_strip, synthesize, AdaptiveColors};
use crate::transform::{compute_transform, Placement};

const BLACK: CanvasColor = CanvasColor::from_rgba8(0, 0, 0, 255);
const TRANSPARENT: CanvasColor = CanvasColor::from_rgba8(0, 0, 0, 0);

/// Everything a paint depends on. Two equal keys produce the same pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintKey {
    /// Bumped whenever the portrait or background source changes.
    pub generation: u64,
    pub background: BackgroundChoice,
    pub transform: TransformState,
    pub adaptive: bool,
    pub skip_gradient: bool,
}

/// A single paint request.
#[derive(Debug, Clone)]
pub struct PaintRequest<'a> {
    pub key: PaintKey,
    pub mode: PlacementMode,
    pub portrait: &'a ImageHandle,
    pub background: &'a ImageHandle,
}

/// Result of a completed paint.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintOutcome {
    pub placement: Placement,
    /// Absent when tinting is disabled or sampling gave up.
    pub adaptive: Option<AdaptiveColors>,
}

/// Owns the character and background canvases and paints them in order.
pub struct Compositor {
    viewport: ViewportConfig,
    sampler: SamplerConfig,
    retry: RetryPolicy,
    character: Canvas2dContext,
    background: Canvas2dContext,
    last_key: Option<PaintKey>,
    last_outcome: Option<PaintOutcome>,
}

impl Compositor {
    pub fn new(
        viewport: ViewportConfig,
        sampler: SamplerConfig,
        retry: RetryPolicy,
    ) -> CardResult<Self> {
        viewport.validate()?;
        let (cw, ch) = viewport.device_size(viewport.character_size());
        let (bw, bh) = viewport.device_size(viewport.background_size());
        Ok(Self {
            viewport,
            sampler,
            retry,
            character: Canvas2dContext::new(cw, ch)?,
            background: Canvas2dContext::new(bw, bh)?,
            last_key: None,
            last_outcome: None,
        })
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn character_canvas(&self) -> &Canvas2dContext {
        &self.character
    }

    pub fn background_canvas(&self) -> &Canvas2dContext {
        &self.background
    }

    /// Outcome of the last successful paint.
    pub fn last_outcome(&self) -> Option<&PaintOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn is_dirty(&self, key: &PaintKey) -> bool {
        self.last_key.as_ref() != Some(key)
    }

    /// Forget the last paint so the next request repaints. Its outcome no
    /// longer describes the canvases either.
    pub fn invalidate(&mut self) {
        self.last_key = None;
        self.last_outcome = None;
    }

    /// Paint both canvases for `request`.
    ///
    /// Returns `Ok(None)` when the request matches the last paint and `force`
    /// is not set. Missing bitmaps are waited for with bounded retries.
    pub fn paint(
        &mut self,
        request: &PaintRequest<'_>,
        force: bool,
    ) -> CardResult<Option<PaintOutcome>> {
        if !force && !self.is_dirty(&request.key) {
            debug!("Skipping unchanged paint");
            return Ok(None);
        }

        let background = self
            .retry
            .run_blocking("background draw", || ready(request.background, "background"))?;
        self.paint_background(&background, request.key.background.is_namecard());

        let portrait = self
            .retry
            .run_blocking("portrait draw", || ready(request.portrait, "portrait"))?;
        let placement = self.paint_character(
            &portrait,
            &request.mode,
            request.key.transform,
            request.key.skip_gradient,
        );

        let adaptive = if request.key.adaptive {
            self.sample_colors()
        } else {
            None
        };
        if let Some(colors) = &adaptive {
            self.tint_background(colors);
        }

        let outcome = PaintOutcome {
            placement,
            adaptive,
        };
        self.last_key = Some(request.key.clone());
        self.last_outcome = Some(outcome.clone());
        Ok(Some(outcome))
    }

    fn paint_background(&mut self, bitmap: &ImageBitmap, namecard: bool) {
        let size = self.viewport.background_size();
        let density = self.viewport.pixel_density;
        let ctx = &mut self.background;

        ctx.reset();
        ctx.scale(density, density);
        ctx.set_canvas_filter(CanvasFilter::Contrast(1.0));
        if namecard {
            let height = NAMECARD_HEIGHT * self.viewport.layout_scale;
            ctx.draw_image_scaled(bitmap, 0.0, -(height - size.height), size.width, height);
        } else {
            ctx.draw_image_scaled(bitmap, 0.0, 0.0, size.width, size.height);
        }
        ctx.set_canvas_filter(CanvasFilter::None);
    }

    fn paint_character(
        &mut self,
        bitmap: &ImageBitmap,
        mode: &PlacementMode,
        transform: TransformState,
        skip_gradient: bool,
    ) -> Placement {
        let size = self.viewport.character_size();
        let s = self.viewport.layout_scale;
        let density = self.viewport.pixel_density;
        let ctx = &mut self.character;

        ctx.reset();
        ctx.scale(density, density);

        // Alpha mask: opaque where the portrait shows, fading out at the right edge
        ctx.set_composite_operation(CompositeOperation::SourceOut);
        if skip_gradient {
            ctx.set_fill_style_color(BLACK);
        } else {
            let mut mask =
                ctx.create_linear_gradient(size.width - 101.0 * s, 0.0, size.width - 3.0 * s, 0.0);
            mask.add_color_stop(0.0, BLACK);
            mask.add_color_stop(1.0, TRANSPARENT);
            ctx.set_fill_style_gradient(mask);
        }
        ctx.fill_rect(&RectParams::from_size(size.width, size.height));

        let natural = Size::new(bitmap.width() as f32, bitmap.height() as f32);
        let placement = compute_transform(natural, size, mode, transform.zoom, transform.pan);
        debug!("Portrait placement: {:?}", placement);

        ctx.set_composite_operation(CompositeOperation::SourceIn);
        ctx.draw_image_scaled(
            bitmap,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
        );
        ctx.set_composite_operation(CompositeOperation::SourceOver);
        placement
    }

    fn sample_colors(&self) -> Option<AdaptiveColors> {
        let strip = self.retry.run_blocking("pixel sample", || {
            sample_edge_strip(&self.character, &self.sampler).map_err(CardError::from)
        });
        match strip {
            Ok(strip) => Some(synthesize(&strip, &self.sampler)),
            Err(err) => {
                warn!("Skipping adaptive tint for this paint: {}", err);
                None
            }
        }
    }

    fn tint_background(&mut self, colors: &AdaptiveColors) {
        let size = self.viewport.background_size();
        let full = RectParams::from_size(size.width, size.height);
        let ctx = &mut self.background;

        ctx.set_composite_operation(CompositeOperation::Color);
        ctx.set_fill_style_gradient(colors.solid_gradient(size.height));
        ctx.fill_rect(&full);

        ctx.set_composite_operation(CompositeOperation::HardLight);
        ctx.set_canvas_filter(CanvasFilter::Contrast(1.5));
        ctx.set_fill_style_gradient(colors.translucent_gradient(size.height));
        ctx.fill_rect(&full);

        ctx.set_canvas_filter(CanvasFilter::None);
        ctx.set_composite_operation(CompositeOperation::SourceOver);
    }
}

fn ready(handle: &ImageHandle, what: &'static str) -> CardResult<ImageBitmap> {
    handle.get().cloned().ok_or(CardError::ImageNotReady(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::model::{Element, Framing, Offset};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn small_viewport() -> ViewportConfig {
        ViewportConfig {
            character: Size::new(200.0, 40.0),
            background: Size::new(480.0, 40.0),
            layout_scale: 1.0,
            pixel_density: 2.0,
        }
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4], origin_clean: bool) -> ImageHandle {
        let data = rgba.repeat((width * height) as usize);
        ImageHandle::ready(ImageBitmap::from_rgba8(width, height, data, origin_clean).unwrap())
    }

    fn key(adaptive: bool) -> PaintKey {
        PaintKey {
            generation: 1,
            background: BackgroundChoice::Element(Element::Hydro),
            transform: TransformState::default(),
            adaptive,
            skip_gradient: false,
        }
    }

    #[test]
    fn test_paint_masks_portrait_and_tints_background() {
        let mut compositor =
            Compositor::new(small_viewport(), SamplerConfig::default(), RetryPolicy::default())
                .unwrap();
        let portrait = solid(200, 100, [220, 30, 30, 255], true);
        let background = solid(10, 10, [128, 128, 128, 255], true);
        let request = PaintRequest {
            key: key(true),
            mode: PlacementMode::Default,
            portrait: &portrait,
            background: &background,
        };

        let outcome = compositor.paint(&request, false).unwrap().unwrap();
        let colors = outcome.adaptive.unwrap();
        assert_eq!(colors.solid.len(), 3);
        assert_eq!(colors.solid[0].color.a, 0xff);
        assert!(colors.solid[0].color.r > colors.solid[0].color.g);

        let fg = compositor.character_canvas().get_image_data(0, 0, 400, 80).unwrap();
        // opaque on the left, faded out at the right edge
        assert_eq!(fg.pixel(20, 40).unwrap().a, 255);
        assert!(fg.pixel(399, 40).unwrap().a < 10);

        let bg = compositor.background_canvas().get_image_data(0, 0, 960, 80).unwrap();
        let px = bg.pixel(100, 40).unwrap();
        assert!(px.r > px.g && px.r > px.b, "background not tinted red: {px:?}");
    }

    #[test]
    fn test_skip_gradient_keeps_right_edge_opaque() {
        let mut compositor =
            Compositor::new(small_viewport(), SamplerConfig::default(), RetryPolicy::default())
                .unwrap();
        let portrait = solid(100, 100, [0, 200, 0, 255], true);
        let background = solid(4, 4, [0, 0, 0, 255], true);
        let mut paint_key = key(false);
        paint_key.skip_gradient = true;
        let request = PaintRequest {
            key: paint_key,
            mode: PlacementMode::Default,
            portrait: &portrait,
            background: &background,
        };
        let outcome = compositor.paint(&request, false).unwrap().unwrap();
        assert!(outcome.adaptive.is_none());
        let fg = compositor.character_canvas().get_image_data(0, 0, 400, 80).unwrap();
        assert_eq!(fg.pixel(399, 40).unwrap().a, 255);
    }

    #[test]
    fn test_unchanged_key_skips_paint_unless_forced() {
        let mut compositor =
            Compositor::new(small_viewport(), SamplerConfig::default(), RetryPolicy::default())
                .unwrap();
        let portrait = solid(100, 100, [0, 0, 200, 255], true);
        let background = solid(4, 4, [0, 0, 0, 255], true);
        let request = PaintRequest {
            key: key(false),
            mode: PlacementMode::Default,
            portrait: &portrait,
            background: &background,
        };
        assert!(compositor.paint(&request, false).unwrap().is_some());
        assert!(compositor.paint(&request, false).unwrap().is_none());
        assert!(compositor.paint(&request, true).unwrap().is_some());
        compositor.invalidate();
        assert!(compositor.last_outcome().is_none());
        assert!(compositor.paint(&request, false).unwrap().is_some());
        assert!(compositor.last_outcome().is_some());
    }

    #[test]
    fn test_tainted_portrait_skips_tint_and_reports() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let retry = RetryPolicy::new(RetryConfig {
            max_retries: 5,
            delay_ms: 0,
        })
        .with_error_callback(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let mut compositor =
            Compositor::new(small_viewport(), SamplerConfig::default(), retry).unwrap();
        let portrait = solid(100, 100, [0, 0, 200, 255], false);
        let background = solid(4, 4, [90, 90, 90, 255], true);
        let request = PaintRequest {
            key: key(true),
            mode: PlacementMode::Default,
            portrait: &portrait,
            background: &background,
        };
        let outcome = compositor.paint(&request, false).unwrap().unwrap();
        assert!(outcome.adaptive.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let bg = compositor.background_canvas().get_image_data(0, 0, 1, 1).unwrap();
        assert_eq!(bg.pixel(0, 0).unwrap(), CanvasColor::from_rgba8(90, 90, 90, 255));
    }

    #[test]
    fn test_missing_portrait_is_terminal() {
        let mut compositor = Compositor::new(
            small_viewport(),
            SamplerConfig::default(),
            RetryPolicy::new(RetryConfig {
                max_retries: 2,
                delay_ms: 0,
            }),
        )
        .unwrap();
        let portrait = ImageHandle::pending();
        let background = solid(4, 4, [0, 0, 0, 255], true);
        let request = PaintRequest {
            key: key(false),
            mode: PlacementMode::GachaCrop(Framing {
                nudge: Offset::new(-130.0, -82.0),
                freedom: Offset::new(510.0, 158.0),
            }),
            portrait: &portrait,
            background: &background,
        };
        let err = compositor.paint(&request, false).unwrap_err();
        assert!(matches!(err, CardError::RetriesExhausted { attempts: 3, .. }));
        assert!(compositor.last_outcome().is_none());
    }

    #[test]
    fn test_namecard_is_bottom_aligned() {
        let mut compositor =
            Compositor::new(small_viewport(), SamplerConfig::default(), RetryPolicy::default())
                .unwrap();
        // top half white, bottom half black
        let mut data = [255u8, 255, 255, 255].repeat(2);
        data.extend([0u8, 0, 0, 255].repeat(2));
        let background =
            ImageHandle::ready(ImageBitmap::from_rgba8(1, 2, data, true).unwrap());
        let portrait = solid(100, 100, [0, 0, 200, 255], true);
        let mut paint_key = key(false);
        paint_key.background = BackgroundChoice::Namecard {
            url: "namecard.png".to_string(),
        };
        let request = PaintRequest {
            key: paint_key,
            mode: PlacementMode::Default,
            portrait: &portrait,
            background: &background,
        };
        compositor.paint(&request, false).unwrap();
        // 572px tall source shifted up by 532px: the visible band is the black half
        let bg = compositor.background_canvas().get_image_data(0, 0, 960, 80).unwrap();
        let px = bg.pixel(10, 40).unwrap();
        assert!(px.r < 20, "expected bottom half of the namecard, got {px:?}");
    }
}
