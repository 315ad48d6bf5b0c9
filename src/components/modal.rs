use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::Request;
use log::{debug, error, info};
use serde::Deserialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, FormData, HtmlButtonElement, HtmlFormElement, KeyboardEvent, Window};

use crate::config::{Config, Selectors};
use crate::dom::{self, Listener, ACTIVE};
use crate::error::{Result, SiteError};
use crate::timers::{self, CancelGuard, PendingTimeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Success,
}

/// Open/closed, which sub-view is showing, and whether a submission is in
/// flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    open: bool,
    view: View,
    busy: bool,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            open: false,
            view: View::Form,
            busy: false,
        }
    }
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Page scrolling is suspended exactly while the dialog is open.
    pub fn scroll_locked(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
        self.view = View::Form;
    }

    /// Returns `true` if the dialog was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Runs after the close transition. Does not look at `open`, so a
    /// reopen inside the delay is reset too.
    pub fn reset(&mut self) {
        self.view = View::Form;
    }

    /// Returns `false` while an earlier submission is still in flight.
    pub fn begin_submit(&mut self) -> bool {
        !std::mem::replace(&mut self.busy, true)
    }

    pub fn finish_submit<T>(&mut self, outcome: &Result<T>) {
        self.busy = false;
        if outcome.is_ok() {
            self.view = View::Success;
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayErrors {
    #[serde(default)]
    errors: Vec<RelayError>,
}

#[derive(Debug, Deserialize)]
struct RelayError {
    #[serde(default)]
    field: Option<String>,
    message: String,
}

/// Human readable messages from a form relay error body, if it has any.
pub fn relay_error_messages(body: &str) -> Vec<String> {
    serde_json::from_str::<RelayErrors>(body)
        .map(|parsed| {
            parsed
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("{}: {}", field, e.message),
                    None => e.message,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `application/x-www-form-urlencoded` body for the given fields.
pub fn encode_form(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn collect_fields(form: &HtmlFormElement) -> Result<Vec<(String, String)>> {
    let data = FormData::new_with_form(form)?;
    let entries = js_sys::try_iter(&data)?.ok_or_else(|| SiteError::Js("form data is not iterable".into()))?;

    let mut fields = Vec::new();
    for entry in entries {
        let entry: js_sys::Array = entry?.unchecked_into();
        // File inputs carry no text value.
        if let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) {
            fields.push((name, value));
        }
    }
    Ok(fields)
}

async fn post_to_relay(endpoint: &str, body: String) -> Result<()> {
    let response = Request::post(endpoint)
        .header("Accept", "application/json")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    if response.ok() {
        return Ok(());
    }
    let status = response.status();
    let messages = response
        .text()
        .await
        .map(|text| relay_error_messages(&text))
        .unwrap_or_default();
    Err(SiteError::Rejected { status, messages })
}

struct SubmitControl {
    button: HtmlButtonElement,
    text: Option<Element>,
    loading: Option<Element>,
}

impl SubmitControl {
    fn find(form: &HtmlFormElement, selectors: &Selectors) -> Option<Self> {
        let button = dom::optional_in(form, &selectors.submit_button)?
            .dyn_into::<HtmlButtonElement>()
            .ok()?;
        Some(Self {
            text: dom::optional_in(&button, &selectors.submit_text),
            loading: dom::optional_in(&button, &selectors.submit_loading),
            button,
        })
    }

    fn set_busy(&self, busy: bool) {
        if let Some(text) = &self.text {
            dom::set_display(text, if busy { "none" } else { "inline" });
        }
        if let Some(loading) = &self.loading {
            dom::set_display(loading, if busy { "flex" } else { "none" });
        }
        self.button.set_disabled(busy);
    }
}

struct ModalInner {
    window: Window,
    document: Document,
    dialog: Element,
    form_view: Option<Element>,
    success_view: Option<Element>,
    form: Option<HtmlFormElement>,
    selectors: Selectors,
    endpoint: String,
    failure_notice: String,
    reset_delay_ms: u32,
    state: RefCell<ModalState>,
    guard: CancelGuard,
    pending_reset: RefCell<Option<PendingTimeout>>,
}

impl ModalInner {
    /// Applies the current state's view and scroll lock to the page.
    fn render(&self) {
        let state = self.state.borrow();
        self.show_view(state.view());
        dom::lock_scroll(&self.document, state.scroll_locked());
    }

    fn show_view(&self, view: View) {
        if let Some(form_view) = &self.form_view {
            dom::set_display(form_view, if view == View::Form { "block" } else { "none" });
        }
        if let Some(success_view) = &self.success_view {
            dom::set_display(success_view, if view == View::Success { "block" } else { "none" });
        }
    }
}

/// Cloneable handle to the contact dialog.
#[derive(Clone)]
pub struct ModalHandle(Rc<ModalInner>);

impl ModalHandle {
    pub fn open(&self) {
        let inner = &self.0;
        inner.state.borrow_mut().open();
        inner.render();
        dom::add_class(&inner.dialog, ACTIVE);
        debug!("contact modal opened");
    }

    pub fn close(&self) {
        let inner = &self.0;
        inner.state.borrow_mut().close();
        dom::remove_class(&inner.dialog, ACTIVE);
        dom::lock_scroll(&inner.document, inner.state.borrow().scroll_locked());

        // An earlier pending reset is left to fire as well.
        let handle = self.clone();
        let pending = timers::after(inner.reset_delay_ms, &inner.guard, move || handle.reset());
        *inner.pending_reset.borrow_mut() = Some(pending);
        debug!("contact modal closed");
    }

    pub fn is_open(&self) -> bool {
        self.0.state.borrow().is_open()
    }

    fn reset(&self) {
        let inner = &self.0;
        if let Some(form) = &inner.form {
            form.reset();
        }
        inner.state.borrow_mut().reset();
        inner.show_view(inner.state.borrow().view());
    }

    fn submit(&self, form: &HtmlFormElement) {
        let inner = &self.0;
        if !inner.state.borrow_mut().begin_submit() {
            debug!("submission already in flight");
            return;
        }

        let control = SubmitControl::find(form, &inner.selectors);
        if let Some(control) = &control {
            control.set_busy(inner.state.borrow().is_busy());
        }

        let body = collect_fields(form).map(|fields| encode_form(&fields));
        let handle = self.clone();
        spawn_local(async move {
            let inner = &handle.0;
            let outcome = match body {
                Ok(body) => post_to_relay(&inner.endpoint, body).await,
                Err(e) => Err(e),
            };

            match &outcome {
                Ok(()) => info!("contact form submitted"),
                Err(e) => {
                    if let SiteError::Rejected { messages, .. } = e {
                        for message in messages {
                            error!("form relay: {}", message);
                        }
                    }
                    error!("contact form submission failed: {}", e);
                    let _ = inner.window.alert_with_message(&inner.failure_notice);
                }
            }

            inner.state.borrow_mut().finish_submit(&outcome);
            let state = inner.state.borrow();
            inner.show_view(state.view());
            if let Some(control) = &control {
                control.set_busy(state.is_busy());
            }
        });
    }
}

pub struct ContactModal {
    handle: ModalHandle,
    _listeners: Vec<Listener>,
    _globals: Vec<Closure<dyn Fn()>>,
}

impl ContactModal {
    pub fn install(window: &Window, document: &Document, config: &Config) -> Result<Self> {
        let selectors = &config.selectors;
        let dialog = dom::require(document, &selectors.modal)?;
        let form = dom::optional(document, &selectors.contact_form)
            .and_then(|el| el.dyn_into::<HtmlFormElement>().ok());
        let guard = CancelGuard::new();

        let handle = ModalHandle(Rc::new(ModalInner {
            window: window.clone(),
            document: document.clone(),
            form_view: dom::optional(document, &selectors.modal_form_view),
            success_view: dom::optional(document, &selectors.modal_success_view),
            dialog: dialog.clone(),
            form: form.clone(),
            selectors: selectors.clone(),
            endpoint: config.form_endpoint.clone(),
            failure_notice: config.failure_notice.clone(),
            reset_delay_ms: config.modal_reset_delay_ms,
            state: RefCell::new(ModalState::default()),
            guard: guard.clone(),
            pending_reset: RefCell::new(None),
        }));

        let mut listeners = Vec::new();

        // Delegated, so triggers added to the page later work too.
        {
            let handle = handle.clone();
            let trigger = selectors.open_modal_trigger.clone();
            listeners.push(Listener::new(document, "click", move |event| {
                let hit = dom::event_element(&event)
                    .and_then(|el| el.closest(&trigger).ok().flatten())
                    .is_some();
                if hit {
                    event.prevent_default();
                    handle.open();
                }
            })?);
        }

        if let Some(close) = dom::optional(document, &selectors.modal_close) {
            let handle = handle.clone();
            listeners.push(Listener::new(&close, "click", move |_| handle.close())?);
        }

        {
            let handle = handle.clone();
            let backdrop = dialog.clone();
            listeners.push(Listener::new(&dialog, "click", move |event| {
                if dom::event_element(&event).as_ref() == Some(&backdrop) {
                    handle.close();
                }
            })?);
        }

        {
            let handle = handle.clone();
            listeners.push(Listener::new(document, "keydown", move |event| {
                let escape = event
                    .dyn_ref::<KeyboardEvent>()
                    .map(|key| key.key() == "Escape")
                    .unwrap_or(false);
                if escape && handle.is_open() {
                    handle.close();
                }
            })?);
        }

        if let Some(form) = form {
            let handle = handle.clone();
            let target = form.clone();
            listeners.push(Listener::new(&form, "submit", move |event| {
                event.prevent_default();
                handle.submit(&target);
            })?);
        }

        let globals = register_globals(window, &handle)?;

        info!("contact modal installed");
        Ok(Self {
            handle,
            _listeners: listeners,
            _globals: globals,
        })
    }
}

impl Drop for ContactModal {
    fn drop(&mut self) {
        let inner = &self.handle.0;
        inner.guard.cancel();
        if let Some(pending) = inner.pending_reset.borrow_mut().take() {
            pending.cancel();
        }
    }
}

/// Exposes `openModal()` / `closeModal()` for inline handlers in the markup.
fn register_globals(window: &Window, handle: &ModalHandle) -> Result<Vec<Closure<dyn Fn()>>> {
    let open = {
        let handle = handle.clone();
        Closure::<dyn Fn()>::new(move || handle.open())
    };
    let close = {
        let handle = handle.clone();
        Closure::<dyn Fn()>::new(move || handle.close())
    };
    js_sys::Reflect::set(window, &JsValue::from_str("openModal"), open.as_ref())?;
    js_sys::Reflect::set(window, &JsValue::from_str("closeModal"), close.as_ref())?;
    Ok(vec![open, close])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_shows_the_form_view() {
        let mut state = ModalState::default();
        state.finish_submit(&Ok::<(), SiteError>(()));
        assert_eq!(state.view(), View::Success);
        state.open();
        assert!(state.is_open());
        assert_eq!(state.view(), View::Form);
    }

    #[test]
    fn close_then_reset_returns_to_the_form() {
        let mut state = ModalState::default();
        state.open();
        assert!(state.begin_submit());
        state.finish_submit(&Ok::<(), SiteError>(()));
        assert_eq!(state.view(), View::Success);

        assert!(state.close());
        assert!(!state.is_open());
        state.reset();
        assert_eq!(state.view(), View::Form);
    }

    #[test]
    fn open_then_close_restores_scrolling() {
        let mut state = ModalState::default();
        assert!(!state.scroll_locked());
        state.open();
        assert!(state.scroll_locked());
        state.close();
        assert!(!state.scroll_locked());
        state.reset();
        assert!(!state.scroll_locked());
    }

    #[test]
    fn closing_twice_reports_once() {
        let mut state = ModalState::default();
        state.open();
        assert!(state.close());
        assert!(!state.close());
    }

    #[test]
    fn network_failure_keeps_the_form_and_frees_the_button() {
        let mut state = ModalState::default();
        state.open();
        assert!(state.begin_submit());
        assert!(state.is_busy());
        state.finish_submit(&Err::<(), _>(SiteError::Network("offline".into())));
        assert!(!state.is_busy());
        assert_eq!(state.view(), View::Form);
    }

    #[test]
    fn second_submit_while_busy_is_refused() {
        let mut state = ModalState::default();
        assert!(state.begin_submit());
        assert!(!state.begin_submit());
        state.finish_submit(&Err::<(), _>(SiteError::Rejected {
            status: 500,
            messages: vec![],
        }));
        assert!(state.begin_submit());
    }

    #[test]
    fn reset_after_reopen_still_applies() {
        let mut state = ModalState::default();
        state.open();
        state.finish_submit(&Ok::<(), SiteError>(()));
        state.close();
        state.open();
        state.reset();
        assert!(state.is_open());
        assert_eq!(state.view(), View::Form);
    }

    #[test]
    fn form_fields_are_urlencoded() {
        let fields = vec![
            ("name".to_string(), "Ada Lovelace".to_string()),
            ("email".to_string(), "ada@example.com".to_string()),
            ("message".to_string(), "50% off & more?".to_string()),
        ];
        assert_eq!(
            encode_form(&fields),
            "name=Ada%20Lovelace&email=ada%40example.com&message=50%25%20off%20%26%20more%3F"
        );
    }

    #[test]
    fn empty_form_encodes_to_empty_body() {
        assert_eq!(encode_form(&[]), "");
    }

    #[test]
    fn relay_errors_are_extracted() {
        let body = r#"{"errors":[{"field":"email","code":"TYPE_EMAIL","message":"should be an email"},{"message":"form not found"}]}"#;
        assert_eq!(
            relay_error_messages(body),
            vec!["email: should be an email".to_string(), "form not found".to_string()]
        );
    }

    #[test]
    fn unreadable_relay_body_has_no_messages() {
        assert!(relay_error_messages("<html>502</html>").is_empty());
        assert!(relay_error_messages("{}").is_empty());
    }
}
