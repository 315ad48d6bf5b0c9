use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use web_sys::{Document, Element};

use crate::config::Config;
use crate::dom::{self, Listener, ACTIVE};
use crate::error::{Result, SiteError};

/// Exclusive-open accordion state: at most one item open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accordion {
    len: usize,
    open: Option<usize>,
}

impl Accordion {
    pub fn new(len: usize) -> Self {
        Self { len, open: None }
    }

    #[cfg(test)]
    pub fn open_item(&self) -> Option<usize> {
        self.open
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }

    /// Closes everything, then opens `index` unless it was the open one.
    pub fn click(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        let was_open = self.is_open(index);
        self.open = None;
        if !was_open {
            self.open = Some(index);
        }
    }
}

pub struct FaqAccordion {
    _listeners: Vec<Listener>,
}

impl FaqAccordion {
    pub fn install(document: &Document, config: &Config) -> Result<Self> {
        let selectors = &config.selectors;
        let items = dom::all(document, &selectors.faq_item);
        if items.is_empty() {
            return Err(SiteError::missing(&selectors.faq_item));
        }

        // Markup may ship with an item already expanded.
        let mut accordion = Accordion::new(items.len());
        if let Some(index) = items.iter().position(|item| dom::has_class(item, ACTIVE)) {
            accordion.click(index);
        }
        let state = Rc::new(RefCell::new(accordion));
        let items: Rc<Vec<Element>> = Rc::new(items);
        render(&items, &state.borrow());

        let mut listeners = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let Some(question) = dom::optional_in(item, &selectors.faq_question) else {
                continue;
            };
            let state = state.clone();
            let items = items.clone();
            listeners.push(Listener::new(&question, "click", move |_| {
                let mut accordion = state.borrow_mut();
                accordion.click(index);
                render(&items, &accordion);
            })?);
        }

        info!("faq accordion installed over {} items", items.len());
        Ok(Self {
            _listeners: listeners,
        })
    }
}

fn render(items: &[Element], accordion: &Accordion) {
    for (index, item) in items.iter().enumerate() {
        dom::set_class(item, ACTIVE, accordion.is_open(index));
    }
}
