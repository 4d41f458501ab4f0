//! Navigation highlighting, navbar scroll styling, and page URLs.

use crate::config::NavigationConfig;
use crate::dom::Document;
use crate::selector::SelectorError;
use crate::types::NodeId;

/// Site pages in nav-link order.
pub const PAGES: [&str; 6] = [
    "home",
    "services",
    "testimonials",
    "about",
    "careers",
    "contact",
];

pub const SCROLLED_CLASS: &str = "scrolled";

/// Position of `page` among the top-level nav links.
pub fn page_index(page: &str) -> Option<usize> {
    PAGES.iter().position(|p| *p == page)
}

/// Mark the nav link for `page` as the current page.
///
/// Every link under `.navbar-nav` loses `active` and `aria-current` first;
/// an unknown page (or a missing link) only does the clearing. Returns the
/// link that was activated.
pub fn set_active_page(doc: &mut Document, page: &str) -> Result<Option<NodeId>, SelectorError> {
    for link in doc.query_all(".navbar-nav .nav-link")? {
        doc.remove_class(link, "active");
        doc.remove_attr(link, "aria-current");
    }
    let Some(index) = page_index(page) else {
        return Ok(None);
    };
    let top_level = doc.query_all(".navbar-nav > .nav-item > .nav-link")?;
    let Some(&link) = top_level.get(index) else {
        return Ok(None);
    };
    doc.add_class(link, "active");
    doc.set_attr(link, "aria-current", "page");
    Ok(Some(link))
}

/// Point `#navLogo` at `logo_path`. Returns whether a logo was updated.
pub fn apply_logo(doc: &mut Document, logo_path: &str) -> bool {
    if logo_path.is_empty() {
        return false;
    }
    match doc.by_id("navLogo") {
        Some(logo) => {
            doc.set_attr(logo, "src", logo_path);
            true
        }
        None => false,
    }
}

/// Sync the navbar with the current scroll offset.
///
/// Past the threshold the navbar gets the `scrolled` class and the logo
/// shrinks; otherwise both return to their resting state. Returns whether
/// the page counts as scrolled.
pub fn update_navbar(
    doc: &mut Document,
    config: &NavigationConfig,
) -> Result<bool, SelectorError> {
    let scrolled = doc.viewport.scroll_y > config.scroll_threshold_px;
    if let Some(navbar) = doc.query_all(&config.navbar_selector)?.first().copied() {
        if scrolled {
            doc.add_class(navbar, SCROLLED_CLASS);
        } else {
            doc.remove_class(navbar, SCROLLED_CLASS);
        }
    }
    if let Some(logo) = doc.query_all(&config.logo_selector)?.first().copied() {
        let height = if scrolled {
            &config.logo_height_scrolled
        } else {
            &config.logo_height
        };
        doc.set_style(logo, "height", height);
    }
    Ok(scrolled)
}

pub fn page_url(base_path: &str, page: &str) -> String {
    format!("{base_path}{page}")
}

pub fn home_url(base_path: &str) -> String {
    page_url(base_path, "index.html")
}
