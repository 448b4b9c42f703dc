//! Pluralization utilities.

/// Return "s" suffix for plural counts
///
/// # Examples
///
/// - `plural_s(0)` -> `"s"` (0 tiles)
/// - `plural_s(1)` -> `""` (1 tile)
/// - `plural_s(5)` -> `"s"` (5 tiles)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// - `plural_count(1, "layer")` -> `"1 layer"`
/// - `plural_count(3, "layer")` -> `"3 layers"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}
