/// One slot in the rendered pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    /// Elided run of pages between a shortcut and the window.
    Gap,
}

const WINDOW_RADIUS: u32 = 2;

/// The ordered page links to render for the current position: a window of
/// ±2 around `current` clamped to bounds, with first/last shortcuts when
/// the window does not already reach them and a `Gap` when the hole to a
/// shortcut spans at least two pages. With one page or fewer there is
/// nothing to paginate and the strip is suppressed entirely.
pub fn window(current: u32, total: u32) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }

    let start = current.saturating_sub(WINDOW_RADIUS).max(1);
    let end = (current + WINDOW_RADIUS).min(total);

    let mut links = Vec::new();
    if start > 1 {
        links.push(PageLink::Page(1));
        if start > 2 {
            links.push(PageLink::Gap);
        }
    }
    for page in start..=end {
        links.push(PageLink::Page(page));
    }
    if end < total {
        if end < total - 1 {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::Page(total));
    }
    links
}
