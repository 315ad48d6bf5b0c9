use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use stylist::GlobalStyle;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
};

use crate::config::Config;
use crate::dom;
use crate::error::{Result, SiteError};

pub const CANDIDATE_CLASS: &str = "animate-on-scroll";
pub const REVEALED_CLASS: &str = "animate-in";

const REVEAL_CSS: &str = r#"
    .animate-on-scroll {
        opacity: 0;
        transform: translateY(30px);
        transition: opacity 0.6s ease, transform 0.6s ease;
    }
    .animate-on-scroll.animate-in {
        opacity: 1;
        transform: translateY(0);
    }
    .animate-on-scroll:nth-child(2) { transition-delay: 0.1s; }
    .animate-on-scroll:nth-child(3) { transition-delay: 0.2s; }
    .animate-on-scroll:nth-child(4) { transition-delay: 0.3s; }
    .animate-on-scroll:nth-child(5) { transition-delay: 0.4s; }
    .animate-on-scroll:nth-child(6) { transition-delay: 0.5s; }
    .animate-on-scroll:nth-child(7) { transition-delay: 0.6s; }
"#;

/// One-shot reveal bookkeeping for a fixed set of elements.
#[derive(Debug, Clone)]
pub struct RevealTracker {
    threshold: f64,
    revealed: Vec<bool>,
}

impl RevealTracker {
    pub fn new(len: usize, threshold: f64) -> Self {
        Self {
            threshold,
            revealed: vec![false; len],
        }
    }

    #[cfg(test)]
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    /// Feeds one observation. Returns `true` only on the observation that
    /// reveals the element; later ones never un-reveal it.
    pub fn observe(&mut self, index: usize, intersecting: bool, ratio: f64) -> bool {
        let Some(revealed) = self.revealed.get_mut(index) else {
            return false;
        };
        if *revealed || !intersecting || ratio < self.threshold {
            return false;
        }
        *revealed = true;
        true
    }
}

pub struct ScrollReveal {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl ScrollReveal {
    pub fn install(document: &Document, config: &Config) -> Result<Self> {
        let selector = &config.selectors.reveal_candidates;
        let elements = dom::all(document, selector);
        if elements.is_empty() {
            return Err(SiteError::missing(selector));
        }

        if let Err(e) = GlobalStyle::new(REVEAL_CSS) {
            warn!("reveal styles not injected: {}", e);
        }

        let tracker = Rc::new(RefCell::new(RevealTracker::new(
            elements.len(),
            config.reveal_threshold,
        )));
        let elements = Rc::new(elements);

        let callback = {
            let elements = elements.clone();
            Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
                move |entries: js_sys::Array, observer: IntersectionObserver| {
                    for entry in entries.iter() {
                        let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                            continue;
                        };
                        let target = entry.target();
                        let Some(index) = elements.iter().position(|el| *el == target) else {
                            continue;
                        };
                        let reveal = tracker.borrow_mut().observe(
                            index,
                            entry.is_intersecting(),
                            entry.intersection_ratio(),
                        );
                        if reveal {
                            dom::add_class(&target, REVEALED_CLASS);
                            observer.unobserve(&target);
                        }
                    }
                },
            )
        };

        let options = IntersectionObserverInit::new();
        options.set_root_margin("0px");
        options.set_threshold(&JsValue::from_f64(config.reveal_threshold));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;

        for element in elements.iter() {
            arm(element, &observer);
        }

        info!("scroll reveal observing {} elements", elements.len());
        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for ScrollReveal {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn arm(element: &Element, observer: &IntersectionObserver) {
    dom::add_class(element, CANDIDATE_CLASS);
    observer.observe(element);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_does_not_reveal() {
        let mut tracker = RevealTracker::new(1, 0.1);
        assert!(!tracker.observe(0, true, 0.05));
        assert!(!tracker.observe(0, false, 0.0));
        assert!(!tracker.is_revealed(0));
    }

    #[test]
    fn reveals_once_at_threshold() {
        let mut tracker = RevealTracker::new(2, 0.1);
        assert!(tracker.observe(1, true, 0.1));
        assert!(tracker.is_revealed(1));
        assert!(!tracker.observe(1, true, 0.8));
        assert!(!tracker.is_revealed(0));
    }

    #[test]
    fn stays_revealed_after_leaving_the_viewport() {
        let mut tracker = RevealTracker::new(1, 0.1);
        tracker.observe(0, true, 0.5);
        tracker.observe(0, false, 0.0);
        assert!(tracker.is_revealed(0));
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut tracker = RevealTracker::new(1, 0.1);
        assert!(!tracker.observe(3, true, 1.0));
    }
}
