use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("required element `{selector}` not found")]
    MissingElement { selector: String },

    #[error("javascript error: {0}")]
    Js(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("form relay rejected submission with status {status}")]
    Rejected { status: u16, messages: Vec<String> },

    #[error("invalid site config: {0}")]
    Config(String),
}

impl SiteError {
    pub fn missing(selector: &str) -> Self {
        SiteError::MissingElement {
            selector: selector.to_string(),
        }
    }
}

impl From<JsValue> for SiteError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        SiteError::Js(message)
    }
}

impl From<gloo_net::Error> for SiteError {
    fn from(err: gloo_net::Error) -> Self {
        SiteError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SiteError {
    fn from(err: serde_json::Error) -> Self {
        SiteError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_names_the_selector() {
        let err = SiteError::missing("#contactModal");
        assert_eq!(err.to_string(), "required element `#contactModal` not found");
    }

    #[test]
    fn rejected_reports_status() {
        let err = SiteError::Rejected {
            status: 422,
            messages: vec!["should be an email".to_string()],
        };
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn bad_json_becomes_config_error() {
        let err: SiteError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, SiteError::Config(_)));
    }
}
