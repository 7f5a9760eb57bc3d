//! Fetching and decoding portrait and background images.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use charcard_canvas2d::ImageBitmap;
use image::imageops::FilterType;
use image::ImageFormat;
use log::info;
use reqwest::{Client, StatusCode};
use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use crate::error::{CardError, CardResult};
use crate::model::{ImageRef, Size};
use crate::retry::RetryPolicy;

static CHARCARD_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    pub(crate) static ref REQWEST_CLIENT: Client = reqwest::ClientBuilder::new()
        .user_agent(CHARCARD_USER_AGENT)
        .build()
        .expect("Failed to construct reqwest client");
}

/// A slot that receives a decoded bitmap once its load completes.
///
/// Clones share the slot, so a load finishing on another task becomes
/// visible to a paint that is retrying on this one.
#[derive(Debug, Clone, Default)]
pub struct ImageHandle {
    slot: Arc<OnceLock<ImageBitmap>>,
}

impl ImageHandle {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(bitmap: ImageBitmap) -> Self {
        let handle = Self::default();
        handle.resolve(bitmap);
        handle
    }

    /// Store the bitmap. Returns false if the handle was already resolved.
    pub fn resolve(&self, bitmap: ImageBitmap) -> bool {
        self.slot.set(bitmap).is_ok()
    }

    pub fn get(&self) -> Option<&ImageBitmap> {
        self.slot.get()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }
}

/// Both loads of one generation, started together.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub portrait: ImageRef,
    pub background: ImageRef,
    pub portrait_handle: ImageHandle,
    pub background_handle: ImageHandle,
}

/// Outcome of a joint load. Each side either resolved its handle or failed.
#[derive(Debug)]
pub struct LoadedPair {
    pub generation: u64,
    pub portrait: CardResult<()>,
    pub background: CardResult<()>,
}

/// Loads images with bounded retries.
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    retry: RetryPolicy,
}

impl ResourceLoader {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Fetch and decode `source`, retrying transient failures.
    pub async fn load(&self, what: &str, source: &ImageRef) -> CardResult<ImageBitmap> {
        info!("Loading {} image from {}", what, source.describe());
        self.retry
            .run(&format!("{what} image load"), || fetch_and_decode(source))
            .await
    }

    /// Load `source` and resolve `handle` with the result.
    pub async fn load_into(
        &self,
        what: &str,
        source: &ImageRef,
        handle: &ImageHandle,
    ) -> CardResult<()> {
        let bitmap = self.load(what, source).await?;
        handle.resolve(bitmap);
        Ok(())
    }

    /// Load portrait and background concurrently; completes when both have settled.
    pub async fn load_pair(&self, ticket: &LoadTicket) -> LoadedPair {
        let (portrait, background) = tokio::join!(
            self.load_into("portrait", &ticket.portrait, &ticket.portrait_handle),
            self.load_into("background", &ticket.background, &ticket.background_handle),
        );
        LoadedPair {
            generation: ticket.generation,
            portrait,
            background,
        }
    }
}

async fn fetch_and_decode(source: &ImageRef) -> CardResult<ImageBitmap> {
    let bytes = fetch_bytes(source).await?;
    decode_bitmap(&bytes)
}

/// Raw encoded bytes of an image source.
pub async fn fetch_bytes(source: &ImageRef) -> CardResult<Vec<u8>> {
    match source {
        ImageRef::Bytes(bytes) => Ok(bytes.to_vec()),
        ImageRef::Url(url) if url.starts_with("data:") => decode_data_uri(url),
        ImageRef::Url(url) if url.starts_with("http://") || url.starts_with("https://") => {
            fetch_http(url).await
        }
        ImageRef::Url(url) => {
            let path = match url.strip_prefix("file://") {
                Some(path) => path,
                None if url.contains("://") => {
                    return Err(CardError::UnsupportedSource(url.clone()));
                }
                None => url.as_str(),
            };
            Ok(tokio::fs::read(path).await?)
        }
    }
}

async fn fetch_http(url: &str) -> CardResult<Vec<u8>> {
    let response = REQWEST_CLIENT.get(url).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(CardError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Decode the payload of a `data:` URI.
pub fn decode_data_uri(uri: &str) -> CardResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CardError::InvalidDataUri("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CardError::InvalidDataUri("missing ',' separator".to_string()))?;
    if meta.ends_with(";base64") {
        BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|err| CardError::InvalidDataUri(err.to_string()))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

/// Decode an encoded image into a CORS-clean bitmap.
pub fn decode_bitmap(bytes: &[u8]) -> CardResult<ImageBitmap> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageBitmap::from_rgba8(width, height, rgba.into_raw(), true)?)
}

/// Rescale a user upload so it covers `viewport` at `quality_factor` times its
/// logical size, and re-encode it as PNG.
pub fn compress_upload(bytes: &[u8], viewport: Size, quality_factor: f32) -> CardResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let natural = Size::new(img.width() as f32, img.height() as f32);
    let scale = crate::transform::cover_scale(natural, viewport) * quality_factor;
    let width = (natural.width * scale).round().max(1.0) as u32;
    let height = (natural.height * scale).round().max(1.0) as u32;
    info!(
        "Compressing upload from {}x{} to {}x{}",
        img.width(),
        img.height(),
        width,
        height
    );

    let resized = img.resize_exact(width, height, FilterType::Triangle);
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
