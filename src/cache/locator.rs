//! Locator string helpers.

/// Parse the pixel-density suffix of a locator: `sprites@2x.png` maps to
/// `2.0`.
///
/// The suffix is `@<number>x` immediately before the extension (or at the
/// end of the string). Returns `None` when no well-formed suffix is present.
pub fn resolution_of_locator(locator: &str) -> Option<f64> {
    let at = locator.rfind('@')?;
    let rest = &locator[at + 1..];
    let x = rest.find('x')?;
    let tail = &rest[x + 1..];
    if !(tail.is_empty() || tail.starts_with('.')) {
        return None;
    }
    let value: f64 = rest[..x].parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}
