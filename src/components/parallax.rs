use log::info;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, MouseEvent, Window};

use crate::config::Config;
use crate::dom::{self, Listener};
use crate::error::{Result, SiteError};

/// Pointer offset from the viewport center, each axis roughly in -0.5..0.5.
pub fn pointer_offset(client: (f64, f64), viewport: (f64, f64)) -> (f64, f64) {
    let (width, height) = viewport;
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    (client.0 / width - 0.5, client.1 / height - 0.5)
}

/// Later orbs in the set move further.
pub fn orb_translation(offset: (f64, f64), index: usize, step: f64) -> (f64, f64) {
    let speed = (index + 1) as f64 * step;
    (offset.0 * speed, offset.1 * speed)
}

pub fn transform(translation: (f64, f64)) -> String {
    format!("translate({}px, {}px)", translation.0, translation.1)
}

pub struct Parallax {
    _listener: Listener,
}

impl Parallax {
    pub fn install(window: &Window, document: &Document, config: &Config) -> Result<Self> {
        let orbs = dom::all(document, &config.selectors.hero_orb);
        if orbs.is_empty() {
            return Err(SiteError::missing(&config.selectors.hero_orb));
        }

        let step = config.parallax_step;
        let count = orbs.len();
        let win = window.clone();
        let listener = Listener::new(window, "mousemove", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let viewport = (
                dimension(win.inner_width()),
                dimension(win.inner_height()),
            );
            let offset = pointer_offset(
                (event.client_x() as f64, event.client_y() as f64),
                viewport,
            );
            for (index, orb) in orbs.iter().enumerate() {
                let value = transform(orb_translation(offset, index, step));
                dom::set_style(orb, "transform", &value);
            }
        })?;

        info!("parallax installed on {} orbs", count);
        Ok(Self { _listener: listener })
    }
}

fn dimension(value: std::result::Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pointer_is_zero_offset() {
        assert_eq!(pointer_offset((500.0, 300.0), (1000.0, 600.0)), (0.0, 0.0));
    }

    #[test]
    fn corners_hit_the_range_edges() {
        assert_eq!(pointer_offset((0.0, 0.0), (1000.0, 600.0)), (-0.5, -0.5));
        assert_eq!(pointer_offset((1000.0, 600.0), (1000.0, 600.0)), (0.5, 0.5));
    }

    #[test]
    fn speed_grows_with_index() {
        let offset = (0.5, -0.25);
        assert_eq!(orb_translation(offset, 0, 20.0), (10.0, -5.0));
        assert_eq!(orb_translation(offset, 2, 20.0), (30.0, -15.0));
    }

    #[test]
    fn transform_is_a_pixel_translate() {
        assert_eq!(transform((10.0, -5.5)), "translate(10px, -5.5px)");
    }

    #[test]
    fn zero_viewport_does_not_divide() {
        assert_eq!(pointer_offset((10.0, 10.0), (0.0, 600.0)), (0.0, 0.0));
    }
}
