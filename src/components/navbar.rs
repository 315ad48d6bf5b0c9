use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use stylist::GlobalStyle;
use web_sys::{Document, Element, Window};
use yew::prelude::*;
use yew::AppHandle;

use crate::config::{Config, Selectors};
use crate::dom::{self, Listener, ACTIVE};
use crate::error::Result;

const MOBILE_MENU_CSS: &str = r#"
    .mobile-menu {
        position: fixed;
        top: 70px;
        left: 0;
        right: 0;
        bottom: 0;
        background: rgba(10, 10, 15, 0.98);
        backdrop-filter: blur(20px);
        z-index: 999;
        padding: 2rem;
        transform: translateX(100%);
        transition: transform 0.3s ease;
    }
    .mobile-menu.active {
        transform: translateX(0);
    }
    .mobile-menu-content {
        display: flex;
        flex-direction: column;
        gap: 1.5rem;
    }
    .mobile-menu-content a {
        font-size: 1.25rem;
        color: var(--color-text-secondary);
        transition: color 0.2s;
    }
    .mobile-menu-content a:hover {
        color: var(--color-primary);
    }
    .mobile-menu-actions {
        display: flex;
        flex-direction: column;
        gap: 1rem;
        margin-top: 2rem;
        padding-top: 2rem;
        border-top: 1px solid var(--color-border);
    }
    .mobile-menu-btn.active span:nth-child(1) {
        transform: rotate(45deg) translate(5px, 5px);
    }
    .mobile-menu-btn.active span:nth-child(2) {
        opacity: 0;
    }
    .mobile-menu-btn.active span:nth-child(3) {
        transform: rotate(-45deg) translate(5px, -5px);
    }
"#;

const MENU_SECTIONS: [(&str, &str); 4] = [
    ("features", "Features"),
    ("use-cases", "Use Cases"),
    ("how-it-works", "How it Works"),
    ("pricing", "Pricing"),
];

/// Section links on the contact page have to go back to the landing page.
pub fn menu_base_path(pathname: &str) -> &'static str {
    if pathname.contains("contact") {
        "index.html"
    } else {
        ""
    }
}

/// Whether the nav bar gets its solid background at this scroll offset.
pub fn solid_background(offset: f64, threshold: f64) -> bool {
    offset > threshold
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    built: bool,
    open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuToggle {
    pub build: bool,
    pub open: bool,
    pub lock_scroll: bool,
}

impl MenuState {
    pub fn prebuilt() -> Self {
        Self {
            built: true,
            open: false,
        }
    }

    pub fn toggle(&mut self) -> MenuToggle {
        let build = !self.built;
        self.built = true;
        self.open = !self.open;
        MenuToggle {
            build,
            open: self.open,
            lock_scroll: self.open,
        }
    }

    /// Undoes the toggle that asked for a build, so the next click retries.
    pub fn build_failed(&mut self) {
        self.built = false;
        self.open = false;
    }

    /// Returns `true` if the menu was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }
}

#[derive(Properties, PartialEq)]
pub struct MobileMenuProps {
    pub base_path: AttrValue,
}

#[function_component(MobileMenuLinks)]
pub fn mobile_menu_links(props: &MobileMenuProps) -> Html {
    html! {
        <div class="mobile-menu-content">
            { for MENU_SECTIONS.iter().map(|(anchor, label)| html! {
                <a href={format!("{}#{}", &*props.base_path, anchor)}>{*label}</a>
            }) }
            <div class="mobile-menu-actions">
                <a href="contact.html" class="btn-primary btn-full">{"Get Started"}</a>
            </div>
        </div>
    }
}

/// Scroll-driven nav bar background.
pub struct NavBar {
    _listener: Listener,
}

impl NavBar {
    pub fn install(window: &Window, document: &Document, config: &Config) -> Result<Self> {
        let navbar = dom::require(document, &config.selectors.navbar)?;

        let listener = {
            let threshold = config.navbar_threshold;
            let win = window.clone();
            let solid = config.navbar_background_solid.clone();
            let translucent = config.navbar_background_translucent.clone();
            Listener::new(window, "scroll", move |_| {
                let offset = win.scroll_y().unwrap_or(0.0);
                let background = if solid_background(offset, threshold) {
                    &solid
                } else {
                    &translucent
                };
                dom::set_style(&navbar, "background", background);
            })?
        };

        info!("navbar scroll effect installed");
        Ok(Self {
            _listener: listener,
        })
    }
}

struct MenuInner {
    document: Document,
    button: Element,
    selector: String,
    base_path: &'static str,
    state: RefCell<MenuState>,
    container: RefCell<Option<Element>>,
    view: RefCell<Option<AppHandle<MobileMenuLinks>>>,
}

/// Cloneable handle other components use to shut the menu.
#[derive(Clone)]
pub struct MobileMenuHandle(Rc<MenuInner>);

impl MobileMenuHandle {
    pub fn close(&self) {
        let inner = &self.0;
        if !inner.state.borrow_mut().close() {
            return;
        }
        if let Some(container) = inner.container.borrow().as_ref() {
            dom::remove_class(container, ACTIVE);
        }
        dom::remove_class(&inner.button, ACTIVE);
        dom::lock_scroll(&inner.document, false);
        debug!("mobile menu closed");
    }

    fn toggle(&self) {
        let inner = &self.0;
        let step = inner.state.borrow_mut().toggle();

        if step.build {
            if let Err(e) = self.build() {
                warn!("mobile menu could not be built: {}", e);
                inner.state.borrow_mut().build_failed();
                return;
            }
        }
        dom::set_class(&inner.button, ACTIVE, step.open);
        if let Some(container) = inner.container.borrow().as_ref() {
            dom::set_class(container, ACTIVE, step.open);
        }
        dom::lock_scroll(&inner.document, step.lock_scroll);
    }

    fn build(&self) -> Result<()> {
        let inner = &self.0;
        if let Err(e) = GlobalStyle::new(MOBILE_MENU_CSS) {
            warn!("mobile menu styles not injected: {}", e);
        }

        let container = inner.document.create_element("div")?;
        container.set_class_name(inner.selector.trim_start_matches('.'));
        if let Some(body) = inner.document.body() {
            body.append_child(&container)?;
        }

        let handle = yew::Renderer::<MobileMenuLinks>::with_root_and_props(
            container.clone(),
            MobileMenuProps {
                base_path: inner.base_path.into(),
            },
        )
        .render();

        *inner.view.borrow_mut() = Some(handle);
        *inner.container.borrow_mut() = Some(container);
        info!("mobile menu built");
        Ok(())
    }
}

/// Toggle button plus the lazily built full-screen menu.
pub struct MobileMenu {
    handle: MobileMenuHandle,
    _listener: Listener,
}

impl MobileMenu {
    pub fn install(window: &Window, document: &Document, config: &Config) -> Result<Self> {
        let Selectors {
            mobile_menu_button,
            mobile_menu,
            ..
        } = &config.selectors;
        let button = dom::require(document, mobile_menu_button)?;

        let pathname = window.location().pathname().unwrap_or_default();
        let existing = dom::optional(document, mobile_menu);
        let state = if existing.is_some() {
            MenuState::prebuilt()
        } else {
            MenuState::default()
        };

        let handle = MobileMenuHandle(Rc::new(MenuInner {
            document: document.clone(),
            button: button.clone(),
            selector: mobile_menu.clone(),
            base_path: menu_base_path(&pathname),
            state: RefCell::new(state),
            container: RefCell::new(existing),
            view: RefCell::new(None),
        }));

        let listener = {
            let handle = handle.clone();
            Listener::new(&button, "click", move |_| handle.toggle())?
        };

        info!("mobile menu toggle installed");
        Ok(Self {
            handle,
            _listener: listener,
        })
    }

    pub fn handle(&self) -> MobileMenuHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_threshold_is_strict() {
        assert!(!solid_background(0.0, 100.0));
        assert!(!solid_background(100.0, 100.0));
        assert!(solid_background(100.5, 100.0));
    }

    #[test]
    fn first_toggle_builds_and_opens() {
        let mut menu = MenuState::default();
        assert_eq!(menu.toggle(), MenuToggle { build: true, open: true, lock_scroll: true });
        assert_eq!(menu.toggle(), MenuToggle { build: false, open: false, lock_scroll: false });
        assert_eq!(menu.toggle(), MenuToggle { build: false, open: true, lock_scroll: true });
    }

    #[test]
    fn scroll_lock_follows_the_open_state() {
        let mut menu = MenuState::prebuilt();
        for _ in 0..4 {
            let step = menu.toggle();
            assert_eq!(step.lock_scroll, step.open);
        }
    }

    #[test]
    fn failed_build_is_retried_on_next_toggle() {
        let mut menu = MenuState::default();
        assert!(menu.toggle().build);
        menu.build_failed();
        assert!(!menu.close());
        assert_eq!(menu.toggle(), MenuToggle { build: true, open: true, lock_scroll: true });
    }

    #[test]
    fn prebuilt_menu_is_never_rebuilt() {
        let mut menu = MenuState::prebuilt();
        assert!(!menu.toggle().build);
    }

    #[test]
    fn close_reports_whether_it_was_open() {
        let mut menu = MenuState::default();
        assert!(!menu.close());
        menu.toggle();
        assert!(menu.close());
        assert!(!menu.close());
        assert_eq!(menu.toggle(), MenuToggle { build: false, open: true, lock_scroll: true });
    }

    #[test]
    fn contact_page_links_point_home() {
        assert_eq!(menu_base_path("/contact.html"), "index.html");
        assert_eq!(menu_base_path("/"), "");
        assert_eq!(menu_base_path("/index.html"), "");
    }
}
