use super::PixelSource;

/// Placeholder for a resource an external loader resolves later.
///
/// Carries only the locator. Dimensions stay unknown until the loader
/// reports completion through
/// [`BaseResource::mark_loaded`](crate::BaseResource::mark_loaded).
#[derive(Debug, Clone)]
pub struct DeferredSource {
    locator: String,
}

impl DeferredSource {
    /// Tag a deferred source with the locator the loader will resolve.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }
}

impl PixelSource for DeferredSource {
    fn dimensions(&self) -> Option<(u32, u32)> {
        None
    }

    fn locator(&self) -> Option<&str> {
        Some(&self.locator)
    }
}
