//! Pure calculation functions for image dimensions.

/// Scale `source` so its longer edge is at most `max_edge`, keeping the
/// aspect ratio. Images already within bounds are returned unchanged; this
/// never upscales.
///
/// # Examples
/// ```
/// # use gallery_manager::imaging::fit_within;
/// assert_eq!(fit_within((2400, 1600), 1200), (1200, 800));
/// assert_eq!(fit_within((800, 600), 1200), (800, 600));
/// ```
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return (w, h);
    }

    let ratio = max_edge as f64 / longer as f64;
    let scale = |edge: u32| ((edge as f64 * ratio).round() as u32).max(1);
    if w >= h {
        (max_edge, scale(h))
    } else {
        (scale(w), max_edge)
    }
}
