//! Drawing state, reset wholesale by `Canvas2dContext::reset`.

use crate::style::{CanvasFilter, CompositeOperation, FillStyle};
use tiny_skia::Transform;

#[derive(Debug, Clone)]
pub(crate) struct DrawingState {
    pub fill_style: FillStyle,
    pub global_composite_operation: CompositeOperation,
    pub filter: CanvasFilter,
    pub transform: Transform,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: FillStyle::default(),
            global_composite_operation: CompositeOperation::SourceOver,
            filter: CanvasFilter::None,
            transform: Transform::identity(),
        }
    }
}
