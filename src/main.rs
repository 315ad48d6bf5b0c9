use log::{debug, error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

mod config;
mod dom;
mod error;
mod timers;
mod components {
    pub mod counter;
    pub mod faq;
    pub mod modal;
    pub mod navbar;
    pub mod parallax;
    pub mod reveal;
    pub mod smooth_scroll;
    pub mod typing;
}

use components::{
    counter::CounterAnimation,
    faq::FaqAccordion,
    modal::ContactModal,
    navbar::{MobileMenu, NavBar},
    parallax::Parallax,
    reveal::ScrollReveal,
    smooth_scroll::SmoothScroll,
    typing::TypingEffect,
};
use config::Config;

/// Every installed component. A `None` is a feature whose markup is missing
/// on this page.
struct Site {
    _navbar: Option<NavBar>,
    _mobile_menu: Option<MobileMenu>,
    _faq: Option<FaqAccordion>,
    _modal: Option<ContactModal>,
    _reveal: Option<ScrollReveal>,
    _smooth_scroll: Option<SmoothScroll>,
    _counters: Option<CounterAnimation>,
    _typing: Option<TypingEffect>,
    _parallax: Option<Parallax>,
}

fn installed<T>(name: &str, result: error::Result<T>) -> Option<T> {
    match result {
        Ok(component) => Some(component),
        Err(e) => {
            debug!("{} disabled: {}", name, e);
            None
        }
    }
}

fn start() -> error::Result<Site> {
    let window = dom::window()?;
    let document = dom::document()?;
    let config = Config::load(&document);

    let mobile_menu = installed("mobile menu", MobileMenu::install(&window, &document, &config));
    let menu_handle = mobile_menu.as_ref().map(MobileMenu::handle);

    Ok(Site {
        _navbar: installed("navbar", NavBar::install(&window, &document, &config)),
        _faq: installed("faq", FaqAccordion::install(&document, &config)),
        _modal: installed("contact modal", ContactModal::install(&window, &document, &config)),
        _reveal: installed("scroll reveal", ScrollReveal::install(&document, &config)),
        _smooth_scroll: installed(
            "smooth scroll",
            SmoothScroll::install(&window, &document, &config, menu_handle),
        ),
        _counters: installed("counters", CounterAnimation::install(&document, &config)),
        _typing: installed("typing effect", TypingEffect::install(&document, &config)),
        _parallax: installed("parallax", Parallax::install(&window, &document, &config)),
        _mobile_menu: mobile_menu,
    })
}

fn run() {
    match start() {
        Ok(site) => {
            info!("site scripts ready");
            // Components live as long as the page does.
            std::mem::forget(site);
        }
        Err(e) => error!("site scripts failed to start: {}", e),
    }
}

fn main() {
    console_error_panic_hook::set_once();

    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting site scripts");

    let Ok(document) = dom::document() else {
        error!("no document to attach to");
        return;
    };

    if document.ready_state() == "loading" {
        let callback = Closure::once(run);
        if let Err(e) = document
            .add_event_listener_with_callback("DOMContentLoaded", callback.as_ref().unchecked_ref())
        {
            error!("could not wait for DOMContentLoaded: {:?}", e);
            return;
        }
        callback.forget();
    } else {
        run();
    }
}
