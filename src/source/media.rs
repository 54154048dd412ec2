use image::RgbaImage;

use super::PixelSource;

/// Already-decoded media element backed by an [`image::RgbaImage`].
#[derive(Debug, Clone)]
pub struct MediaSource {
    image: RgbaImage,
    locator: Option<String>,
}

impl MediaSource {
    /// Wrap a decoded image.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            locator: None,
        }
    }

    /// Attach the locator the image was decoded from.
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Borrow the decoded pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl PixelSource for MediaSource {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some(self.image.dimensions())
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }
}
