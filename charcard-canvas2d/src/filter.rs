//! Pixel filters applied to an offscreen layer before it is composited.

use crate::style::CanvasFilter;
use tiny_skia::{ColorU8, Pixmap};

/// Apply `filter` in place to every pixel of `pixmap`.
pub(crate) fn apply_filter(pixmap: &mut Pixmap, filter: CanvasFilter) {
    match filter {
        CanvasFilter::None => {}
        CanvasFilter::Contrast(amount) => apply_contrast(pixmap, amount),
    }
}

/// CSS `contrast()`: each straight-alpha channel c becomes (c - 0.5) * amount + 0.5.
fn apply_contrast(pixmap: &mut Pixmap, amount: f32) {
    // Lookup table over straight-alpha channel values
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let c = value as f32 / 255.0;
        let adjusted = ((c - 0.5) * amount + 0.5).clamp(0.0, 1.0);
        *slot = (adjusted * 255.0).round() as u8;
    }

    for pixel in pixmap.pixels_mut() {
        let a = pixel.alpha();
        if a == 0 {
            continue;
        }
        let straight = pixel.demultiply();
        let adjusted = ColorU8::from_rgba(
            lut[straight.red() as usize],
            lut[straight.green() as usize],
            lut[straight.blue() as usize],
            a,
        );
        *pixel = adjusted.premultiply();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(r: u8, g: u8, b: u8, a: u8) -> Pixmap {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        pixmap
    }

    #[test]
    fn test_contrast_spreads_channels_away_from_midpoint() {
        let mut pixmap = single_pixel(64, 128, 192, 255);
        apply_filter(&mut pixmap, CanvasFilter::Contrast(1.5));
        let px = pixmap.pixels()[0].demultiply();
        assert!(px.red() < 64);
        assert!(px.blue() > 192);
        // Midpoint stays close to the midpoint
        assert!((px.green() as i32 - 128).abs() <= 1);
        assert_eq!(px.alpha(), 255);
    }

    #[test]
    fn test_contrast_identity_and_transparent() {
        let mut pixmap = single_pixel(10, 20, 30, 255);
        apply_filter(&mut pixmap, CanvasFilter::Contrast(1.0));
        let px = pixmap.pixels()[0].demultiply();
        assert_eq!((px.red(), px.green(), px.blue()), (10, 20, 30));

        let mut clear = Pixmap::new(1, 1).unwrap();
        apply_filter(&mut clear, CanvasFilter::Contrast(3.0));
        assert_eq!(clear.pixels()[0].alpha(), 0);
    }
}
