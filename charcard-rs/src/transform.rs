//! Portrait placement: cover scaling, zoom, pan and boundary clamping.

use crate::model::{Offset, PlacementMode, Size};

/// Viewport inflation applied to game art before cover scaling.
pub const GACHA_CROP_INFLATION: f32 = 1.55;

/// Multiplicative zoom step for zoom in/out.
pub const ZOOM_STEP: f32 = 1.05;

pub const DEFAULT_MIN_ZOOM: f32 = 1.0;
pub const GACHA_MIN_ZOOM: f32 = 0.64;

impl PlacementMode {
    /// Lowest zoom level this mode accepts.
    pub fn min_zoom(&self) -> f32 {
        match self {
            PlacementMode::Default => DEFAULT_MIN_ZOOM,
            PlacementMode::GachaCrop(_) => GACHA_MIN_ZOOM,
        }
    }

    /// Viewport the portrait is scaled to cover.
    pub fn effective_viewport(&self, viewport: Size) -> Size {
        match self {
            PlacementMode::Default => viewport,
            PlacementMode::GachaCrop(_) => viewport.scaled(GACHA_CROP_INFLATION),
        }
    }

    fn nudge(&self) -> Offset {
        match self {
            PlacementMode::Default => Offset::default(),
            PlacementMode::GachaCrop(framing) => framing.nudge,
        }
    }
}

/// Where and how large the portrait is drawn, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Pan that reproduces this placement once clamping is accounted for.
    pub pan: Offset,
}

impl Placement {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Smallest scale at which `natural` covers `viewport`.
pub fn cover_scale(natural: Size, viewport: Size) -> f32 {
    (viewport.width / natural.width).max(viewport.height / natural.height)
}

/// Compute the placement of an image of `natural` size inside `viewport`.
///
/// The result always covers the viewport: the scale never drops below the
/// plain cover scale and the position is clamped so no edge is exposed.
pub fn compute_transform(
    natural: Size,
    viewport: Size,
    mode: &PlacementMode,
    zoom: f32,
    pan: Option<Offset>,
) -> Placement {
    let effective = mode.effective_viewport(viewport);
    let zoom = zoom.max(mode.min_zoom());
    let scale = (cover_scale(natural, effective) * zoom).max(cover_scale(natural, viewport));
    let scaled = natural.scaled(scale);

    let pan = pan.unwrap_or_default();
    let unclamped = Offset::new(
        (effective.width - scaled.width) / 2.0,
        (effective.height - scaled.height) / 2.0,
    ) + mode.nudge()
        + pan;
    let (x, y) = clamp_position(unclamped, scaled, viewport);

    Placement {
        scale,
        x,
        y,
        width: scaled.width,
        height: scaled.height,
        pan: pan + Offset::new(x - unclamped.x, y - unclamped.y),
    }
}

/// Clamp a top-left position so that an image of `scaled` size covers `viewport`.
pub fn clamp_position(position: Offset, scaled: Size, viewport: Size) -> (f32, f32) {
    let overflow_x = (scaled.width - viewport.width).max(0.0);
    let overflow_y = (scaled.height - viewport.height).max(0.0);
    (
        position.x.min(0.0).max(-overflow_x),
        position.y.min(0.0).max(-overflow_y),
    )
}

/// Maximum pan magnitude per axis after a drag is released.
pub fn freedom_limits(mode: &PlacementMode, rendered: Size, viewport: Size) -> Offset {
    match mode {
        PlacementMode::Default => Offset::new(
            ((rendered.width - viewport.width) / 2.0).max(0.0),
            ((rendered.height - viewport.height) / 2.0).max(0.0),
        ),
        PlacementMode::GachaCrop(framing) => framing.freedom,
    }
}

/// Zoom level after one zoom-in step. Zooming in is unbounded.
pub fn zoom_in(zoom: f32) -> f32 {
    zoom * ZOOM_STEP
}

/// Zoom level after one zoom-out step.
///
/// If shrinking the rendered image by one step would expose the viewport, the
/// zoom is floored at the mode minimum instead.
pub fn zoom_out(zoom: f32, rendered: Size, viewport: Size, min_zoom: f32) -> f32 {
    if rendered.width / ZOOM_STEP < viewport.width || rendered.height / ZOOM_STEP < viewport.height
    {
        min_zoom
    } else {
        (zoom / ZOOM_STEP).max(min_zoom)
    }
}
