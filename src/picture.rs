use anyhow::{Context, Result};
use egui::ColorImage;

use crate::library::Fetch;

/// A downloaded catalog image, decoded for display.
#[derive(Clone)]
pub struct Picture {
    pub image: ColorImage,
    /// Bytes exactly as served, kept for "Save image".
    pub raw: Vec<u8>,
}

impl Picture {
    pub fn width(&self) -> usize {
        self.image.size[0]
    }

    pub fn height(&self) -> usize {
        self.image.size[1]
    }
}

/// Downloads and decodes the image at `photo_url`.
///
/// An empty URL means no description has been fetched yet; nothing is
/// requested and the result is `Ok(None)`. Bytes that do not decode also
/// give `Ok(None)`. Only transport and HTTP status failures are `Err`.
pub fn fetch_picture(fetcher: &impl Fetch, photo_url: &str) -> Result<Option<Picture>> {
    if photo_url.is_empty() {
        return Ok(None);
    }

    let raw = fetcher
        .fetch(photo_url)
        .with_context(|| format!("Failed downloading image from {photo_url}"))?;

    match decode_picture(&raw) {
        Ok(image) => {
            log::info!(
                "Decoded {}x{} image from {photo_url}",
                image.size[0],
                image.size[1]
            );
            Ok(Some(Picture { image, raw }))
        }
        Err(err) => {
            log::warn!("{err:#}");
            Ok(None)
        }
    }
}

pub fn decode_picture(bytes: &[u8]) -> Result<ColorImage> {
    let decoded = image::load_from_memory(bytes).with_context(|| {
        format!(
            "Downloaded {} bytes could not be decoded as an image",
            bytes.len()
        )
    })?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::library::tests::StubFetcher;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("should encode png");
        bytes
    }

    #[test]
    fn empty_photo_url_skips_network() {
        let fetcher = StubFetcher::default();
        let result = fetch_picture(&fetcher, "").expect("should not fail");
        assert!(result.is_none());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn decodes_png_at_natural_size() {
        let fetcher = StubFetcher::default().respond("http://img/3", &png_bytes(5, 3));
        let picture = fetch_picture(&fetcher, "http://img/3")
            .expect("should not fail")
            .expect("should decode");
        assert_eq!((picture.width(), picture.height()), (5, 3));
        assert_eq!(picture.raw, png_bytes(5, 3));
    }

    #[test]
    fn corrupt_bytes_are_absent_not_an_error() {
        let fetcher =
            StubFetcher::default().respond("http://img/9", b"<html>viewer error</html>");
        let result = fetch_picture(&fetcher, "http://img/9").expect("decode failure is recovered");
        assert!(result.is_none());
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn network_failure_is_reported() {
        let fetcher = StubFetcher::default().fail("http://img/9", "timed out");
        let err = fetch_picture(&fetcher, "http://img/9")
            .err()
            .expect("network failure should be an error");
        assert!(format!("{err:#}").contains("timed out"));
    }
}
