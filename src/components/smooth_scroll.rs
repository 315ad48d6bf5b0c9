use log::{debug, info};
use web_sys::{Document, HtmlElement, ScrollBehavior, ScrollToOptions, Window};

use crate::components::navbar::MobileMenuHandle;
use crate::config::Config;
use crate::dom::{self, Listener};
use crate::error::Result;

const IN_PAGE_ANCHOR: &str = "a[href^=\"#\"]";

/// Element id an in-page link points at; `None` for a bare `#`.
pub fn fragment_target(href: &str) -> Option<&str> {
    match href.strip_prefix('#') {
        Some(id) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Document offset that puts the target just under the nav bar.
pub fn scroll_destination(target_top: f64, page_offset: f64, navbar_height: f64, margin: f64) -> f64 {
    target_top + page_offset - navbar_height - margin
}

pub struct SmoothScroll {
    _listener: Listener,
}

impl SmoothScroll {
    pub fn install(
        window: &Window,
        document: &Document,
        config: &Config,
        menu: Option<MobileMenuHandle>,
    ) -> Result<Self> {
        let navbar: HtmlElement = dom::require_html(document, &config.selectors.navbar)?;
        let margin = config.scroll_margin;

        let win = window.clone();
        let doc = document.clone();
        let listener = Listener::new(document, "click", move |event| {
            let Some(anchor) = dom::event_element(&event)
                .and_then(|el| el.closest(IN_PAGE_ANCHOR).ok().flatten())
            else {
                return;
            };
            let href = anchor.get_attribute("href").unwrap_or_default();
            let Some(id) = fragment_target(&href) else {
                return;
            };
            let Some(target) = doc.get_element_by_id(id) else {
                debug!("no element with id `{}`, letting the link through", id);
                return;
            };
            event.prevent_default();

            // Close first so the nav bar is measured without the overlay.
            if let Some(menu) = &menu {
                menu.close();
            }

            let top = scroll_destination(
                target.get_bounding_client_rect().top(),
                win.scroll_y().unwrap_or(0.0),
                navbar.offset_height() as f64,
                margin,
            );
            let options = ScrollToOptions::new();
            options.set_top(top);
            options.set_behavior(ScrollBehavior::Smooth);
            win.scroll_to_with_scroll_to_options(&options);
        })?;

        info!("smooth scroll installed");
        Ok(Self {
            _listener: listener,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hash_is_not_a_target() {
        assert_eq!(fragment_target("#"), None);
        assert_eq!(fragment_target(""), None);
        assert_eq!(fragment_target("contact.html"), None);
    }

    #[test]
    fn fragment_names_the_id() {
        assert_eq!(fragment_target("#pricing"), Some("pricing"));
        assert_eq!(fragment_target("#how-it-works"), Some("how-it-works"));
    }

    #[test]
    fn destination_clears_the_nav_bar() {
        // Target 500px below the viewport top after scrolling 1200px,
        // under a 70px nav bar.
        assert_eq!(scroll_destination(500.0, 1200.0, 70.0, 20.0), 1610.0);
    }

    #[test]
    fn destination_can_go_negative_near_the_top() {
        assert_eq!(scroll_destination(10.0, 0.0, 70.0, 20.0), -80.0);
    }
}
