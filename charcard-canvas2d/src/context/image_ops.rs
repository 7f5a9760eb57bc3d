//! Image drawing, pixel data, and PNG output operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::geometry::ImageData;
use crate::image::ImageBitmap;
use tiny_skia::PixmapRef;

impl Canvas2dContext {
    // --- Internal image drawing ---

    /// Internal: draw a premultiplied-alpha pixmap scaled into (dx, dy, dw, dh).
    fn draw_pixmap_scaled(&mut self, image: PixmapRef<'_>, dx: f32, dy: f32, dw: f32, dh: f32) {
        if dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let scale_x = dw / image.width() as f32;
        let scale_y = dh / image.height() as f32;

        // Translate to destination position, then scale
        let transform = self
            .state
            .transform
            .pre_translate(dx, dy)
            .pre_scale(scale_x, scale_y);
        self.render_layer(|target, blend_mode| {
            let paint = tiny_skia::PixmapPaint {
                opacity: 1.0,
                blend_mode,
                quality: tiny_skia::FilterQuality::Bilinear,
            };
            target.draw_pixmap(0, 0, image, &paint, transform, None);
        });
    }

    // --- Public draw image/canvas methods ---

    /// Draw a bitmap at its natural size.
    pub fn draw_image(&mut self, image: &ImageBitmap, dx: f32, dy: f32) {
        self.draw_image_scaled(image, dx, dy, image.width() as f32, image.height() as f32);
    }

    /// Draw a bitmap scaled to the specified dimensions.
    ///
    /// Drawing a bitmap that is not origin-clean taints this canvas.
    pub fn draw_image_scaled(&mut self, image: &ImageBitmap, dx: f32, dy: f32, dw: f32, dh: f32) {
        log::debug!(target: "canvas", "drawImage {}x{} at {} {} size {} {}", image.width(), image.height(), dx, dy, dw, dh);
        if !image.is_origin_clean() {
            self.origin_clean = false;
        }
        self.draw_pixmap_scaled(image.pixmap().as_ref(), dx, dy, dw, dh);
    }

    /// Draw another canvas at the specified position, at its natural size.
    ///
    /// A tainted source taints this canvas.
    pub fn draw_canvas(&mut self, source: &Canvas2dContext, dx: f32, dy: f32) {
        log::debug!(target: "canvas", "drawCanvas {}x{} at {} {}", source.width, source.height, dx, dy);
        if !source.origin_clean {
            self.origin_clean = false;
        }
        self.draw_pixmap_scaled(
            source.pixmap.as_ref(),
            dx,
            dy,
            source.width as f32,
            source.height as f32,
        );
    }

    // --- Image data ---

    /// Get image data for a region of the canvas, in device pixels.
    ///
    /// Pixels outside the canvas read as transparent black. Fails when the
    /// canvas has been tainted or when the region is empty.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Canvas2dResult<ImageData> {
        log::debug!(target: "canvas", "getImageData {} {} {} {}", x, y, width, height);
        if width == 0 || height == 0 {
            return Err(Canvas2dError::IndexSizeError { width, height });
        }
        if !self.origin_clean {
            return Err(Canvas2dError::SecurityError);
        }
        Ok(ImageData {
            width,
            height,
            data: self.read_pixels(x, y, width, height),
        })
    }

    /// Straight-alpha RGBA copy of a region; out-of-bounds pixels are zero.
    fn read_pixels(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; (width * height * 4) as usize];
        let pixels = self.pixmap.pixels();

        for dy in 0..height {
            for dx in 0..width {
                let src_x = x + dx as i32;
                let src_y = y + dy as i32;
                if src_x < 0
                    || src_x >= self.width as i32
                    || src_y < 0
                    || src_y >= self.height as i32
                {
                    continue;
                }

                let src_idx = (src_y as u32 * self.width + src_x as u32) as usize;
                let dst_idx = ((dy * width + dx) * 4) as usize;

                // Convert from premultiplied alpha to straight alpha
                let color = pixels[src_idx].demultiply();
                data[dst_idx..dst_idx + 4].copy_from_slice(&[
                    color.red(),
                    color.green(),
                    color.blue(),
                    color.alpha(),
                ]);
            }
        }

        data
    }

    /// Export the canvas as PNG data.
    ///
    /// # Arguments
    /// * `ppi` - Optional pixels per inch for PNG metadata. Defaults to 72 if not specified.
    pub fn to_png(&self, ppi: Option<f32>) -> Canvas2dResult<Vec<u8>> {
        let ppi = ppi.unwrap_or(72.0);

        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            // Set pixel density metadata (pixels per meter)
            let ppm = (ppi.max(0.0) / 0.0254).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));

            let mut writer = encoder.write_header()?;

            // Convert from premultiplied to straight alpha for PNG
            let data = self.read_pixels(0, 0, self.width, self.height);
            writer.write_image_data(&data)?;
        }
        Ok(buf)
    }
}
