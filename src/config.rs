use log::{debug, warn};
use serde::Deserialize;
use web_sys::Document;

use crate::error::{Result, SiteError};

pub const CONFIG_ELEMENT_ID: &str = "site-config";

#[cfg(debug_assertions)]
pub fn log_level() -> log::Level {
    log::Level::Debug
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> log::Level {
    log::Level::Info
}

/// Selectors the scripts expect in the page markup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub navbar: String,
    pub mobile_menu_button: String,
    pub mobile_menu: String,
    pub faq_item: String,
    pub faq_question: String,
    pub modal: String,
    pub modal_form_view: String,
    pub modal_success_view: String,
    pub modal_close: String,
    pub contact_form: String,
    pub open_modal_trigger: String,
    pub submit_button: String,
    pub submit_text: String,
    pub submit_loading: String,
    pub reveal_candidates: String,
    pub stat_number: String,
    pub typing_text: String,
    pub hero_orb: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            navbar: ".navbar".into(),
            mobile_menu_button: ".mobile-menu-btn".into(),
            mobile_menu: ".mobile-menu".into(),
            faq_item: ".faq-item".into(),
            faq_question: ".faq-question".into(),
            modal: "#contactModal".into(),
            modal_form_view: "#modalForm".into(),
            modal_success_view: "#modalSuccess".into(),
            modal_close: ".modal-close".into(),
            contact_form: "#contactForm".into(),
            open_modal_trigger: "[data-open-modal]".into(),
            submit_button: "button[type=\"submit\"]".into(),
            submit_text: ".btn-text".into(),
            submit_loading: ".btn-loading".into(),
            reveal_candidates: ".use-case-card, .step-card, .feature-card, .testimonial-card, .pricing-card, .integration-item".into(),
            stat_number: ".stat-number".into(),
            typing_text: ".typing-text".into(),
            hero_orb: ".hero-orb".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub selectors: Selectors,
    pub form_endpoint: String,
    pub failure_notice: String,
    pub navbar_threshold: f64,
    pub navbar_background_solid: String,
    pub navbar_background_translucent: String,
    pub scroll_margin: f64,
    pub modal_reset_delay_ms: u32,
    pub reveal_threshold: f64,
    pub counter_duration_ms: f64,
    pub counter_frame_ms: f64,
    pub typing_phrases: Vec<String>,
    pub type_delay_ms: u32,
    pub delete_delay_ms: u32,
    pub hold_full_ms: u32,
    pub hold_empty_ms: u32,
    pub parallax_step: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            form_endpoint: "https://formspree.io/f/maqngkre".into(),
            failure_notice: "Something went wrong. Please try again or email us directly.".into(),
            navbar_threshold: 100.0,
            navbar_background_solid: "rgba(10, 10, 15, 0.95)".into(),
            navbar_background_translucent: "rgba(10, 10, 15, 0.8)".into(),
            scroll_margin: 20.0,
            modal_reset_delay_ms: 300,
            reveal_threshold: 0.1,
            counter_duration_ms: 2000.0,
            counter_frame_ms: 16.0,
            typing_phrases: vec![
                "recruitment screening".into(),
                "customer service".into(),
                "lead qualification".into(),
                "appointment setting".into(),
                "debt collection".into(),
            ],
            type_delay_ms: 100,
            delete_delay_ms: 50,
            hold_full_ms: 2000,
            hold_empty_ms: 500,
            parallax_step: 20.0,
        }
    }
}

impl Config {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        if config.typing_phrases.iter().any(|p| p.is_empty()) {
            return Err(SiteError::Config("typing phrases must not be empty".into()));
        }
        for (name, value) in [
            ("counter_duration_ms", config.counter_duration_ms),
            ("counter_frame_ms", config.counter_frame_ms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SiteError::Config(format!("{} must be a positive number", name)));
            }
        }
        Ok(config)
    }

    /// Reads the optional `<script type="application/json" id="site-config">`
    /// block. Anything unreadable falls back to the defaults.
    pub fn load(document: &Document) -> Self {
        let raw = match document.get_element_by_id(CONFIG_ELEMENT_ID) {
            Some(element) => element.text_content().unwrap_or_default(),
            None => {
                debug!("no #{} block, using default config", CONFIG_ELEMENT_ID);
                return Self::default();
            }
        };

        match Self::from_json(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}, using default config", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_site() {
        let config = Config::default();
        assert_eq!(config.form_endpoint, "https://formspree.io/f/maqngkre");
        assert_eq!(config.navbar_threshold, 100.0);
        assert_eq!(config.modal_reset_delay_ms, 300);
        assert_eq!(config.typing_phrases.len(), 5);
        assert_eq!(config.typing_phrases[0], "recruitment screening");
        assert_eq!(config.selectors.modal, "#contactModal");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = Config::from_json(
            r##"{"modal_reset_delay_ms": 10, "selectors": {"navbar": "#top"}}"##,
        )
        .unwrap();
        assert_eq!(config.modal_reset_delay_ms, 10);
        assert_eq!(config.selectors.navbar, "#top");
        assert_eq!(config.selectors.hero_orb, ".hero-orb");
        assert_eq!(config.type_delay_ms, 100);
    }

    #[test]
    fn empty_phrase_is_rejected() {
        let err = Config::from_json(r#"{"typing_phrases": ["ok", ""]}"#).unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));
    }

    #[test]
    fn zero_counter_frame_is_rejected() {
        let err = Config::from_json(r#"{"counter_frame_ms": 0}"#).unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));
        assert!(Config::from_json(r#"{"counter_duration_ms": -5}"#).is_err());
        assert!(Config::from_json(r#"{"counter_frame_ms": 8}"#).is_ok());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("not json").is_err());
    }
}
