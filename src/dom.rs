use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Window};

use crate::error::{Result, SiteError};

pub const ACTIVE: &str = "active";

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| SiteError::Js("no global window".into()))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| SiteError::Js("window has no document".into()))
}

/// First match for `selector`, or `None` when absent or the selector is invalid.
pub fn optional(root: &Document, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn optional_in(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn require(root: &Document, selector: &str) -> Result<Element> {
    optional(root, selector).ok_or_else(|| SiteError::missing(selector))
}

pub fn require_html(root: &Document, selector: &str) -> Result<HtmlElement> {
    require(root, selector)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| SiteError::missing(selector))
}

pub fn all(root: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

pub fn add_class(element: &Element, class: &str) {
    let _ = element.class_list().add_1(class);
}

pub fn remove_class(element: &Element, class: &str) {
    let _ = element.class_list().remove_1(class);
}

pub fn set_class(element: &Element, class: &str, on: bool) {
    if on {
        add_class(element, class);
    } else {
        remove_class(element, class);
    }
}

pub fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property(property, value);
    }
}

pub fn set_display(element: &Element, value: &str) {
    set_style(element, "display", value);
}

/// Suspends or restores page scrolling through the body's overflow.
pub fn lock_scroll(document: &Document, locked: bool) {
    if let Some(body) = document.body() {
        let _ = body
            .style()
            .set_property("overflow", if locked { "hidden" } else { "" });
    }
}

/// The element an event was dispatched on, when it is one.
pub fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

/// An event listener that stays registered until dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}
