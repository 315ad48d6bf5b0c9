use std::rc::Rc;

use log::{debug, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, IntersectionObserver, IntersectionObserverEntry};

use crate::config::Config;
use crate::dom;
use crate::error::{Result, SiteError};
use crate::timers::{self, CancelGuard};

/// Numeric text such as `250+` split into what gets counted and what
/// stays fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterPlan {
    original: String,
    target: f64,
    suffix: String,
    increment: f64,
}

impl CounterPlan {
    /// Returns `None` for text that does not start with a digit.
    pub fn parse(text: &str, duration_ms: f64, frame_ms: f64) -> Option<Self> {
        if !text.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let digits: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let suffix: String = text
            .chars()
            .filter(|c| !(c.is_ascii_digit() || *c == '.'))
            .collect();
        let target = leading_float(&digits)?;
        let steps = duration_ms / frame_ms;
        // A run must finish: anything but a finite step count is one frame.
        let steps = if steps.is_finite() && steps >= 1.0 { steps } else { 1.0 };

        Some(Self {
            original: text.to_string(),
            target,
            suffix,
            increment: target / steps,
        })
    }

    #[cfg(test)]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[cfg(test)]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// What the element shows before the animation starts.
    pub fn initial_text(&self) -> String {
        format!("0{}", self.suffix)
    }

    pub fn start(&self) -> CounterRun {
        CounterRun {
            plan: self.clone(),
            current: 0.0,
            done: false,
        }
    }
}

/// Longest prefix that parses as a float, the way `parseFloat` reads
/// `"1.2.3"` as `1.2`.
fn leading_float(digits: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in digits.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    digits[..end].trim_end_matches('.').parse().ok()
}

/// One pass of the count-up, computed a frame at a time.
pub struct CounterRun {
    plan: CounterPlan,
    current: f64,
    done: bool,
}

impl Iterator for CounterRun {
    type Item = String;

    /// Text for the next frame; the last item is always the original text.
    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        self.current += self.plan.increment;
        if self.current < self.plan.target {
            Some(format!("{}{}", self.current.floor(), self.plan.suffix))
        } else {
            self.done = true;
            Some(self.plan.original.clone())
        }
    }
}

pub struct CounterAnimation {
    guard: CancelGuard,
    observers: Vec<IntersectionObserver>,
    _callbacks: Vec<Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>>,
}

impl CounterAnimation {
    pub fn install(document: &Document, config: &Config) -> Result<Self> {
        let counters = dom::all(document, &config.selectors.stat_number);
        if counters.is_empty() {
            return Err(SiteError::missing(&config.selectors.stat_number));
        }

        let guard = CancelGuard::new();
        let mut observers = Vec::new();
        let mut callbacks = Vec::new();

        for counter in counters {
            let text = counter.text_content().unwrap_or_default();
            let Some(plan) =
                CounterPlan::parse(&text, config.counter_duration_ms, config.counter_frame_ms)
            else {
                debug!("counter `{}` is not numeric, leaving it alone", text);
                continue;
            };
            counter.set_text_content(Some(&plan.initial_text()));

            let (observer, callback) = observe_once(&counter, plan, guard.clone())?;
            observers.push(observer);
            callbacks.push(callback);
        }

        info!("counter animation armed for {} counters", observers.len());
        Ok(Self {
            guard,
            observers,
            _callbacks: callbacks,
        })
    }
}

impl Drop for CounterAnimation {
    fn drop(&mut self) {
        self.guard.cancel();
        for observer in &self.observers {
            observer.disconnect();
        }
    }
}

fn observe_once(
    counter: &Element,
    plan: CounterPlan,
    guard: CancelGuard,
) -> Result<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>)> {
    let element = counter.clone();
    let plan = Rc::new(plan);

    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            let intersecting = entries
                .get(0)
                .dyn_into::<IntersectionObserverEntry>()
                .map(|entry| entry.is_intersecting())
                .unwrap_or(false);
            if !intersecting {
                return;
            }
            observer.disconnect();
            animate(element.clone(), plan.clone(), &guard);
        },
    );

    let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
    observer.observe(counter);
    Ok((observer, callback))
}

fn animate(element: Element, plan: Rc<CounterPlan>, guard: &CancelGuard) {
    let mut run = plan.start();

    timers::frame_loop(guard, move || match run.next() {
        Some(text) => {
            element.set_text_content(Some(&text));
            true
        }
        None => false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(text: &str) -> Option<CounterPlan> {
        CounterPlan::parse(text, 2000.0, 16.0)
    }

    #[test]
    fn splits_number_and_suffix() {
        let plan = plan("250+").unwrap();
        assert_eq!(plan.target(), 250.0);
        assert_eq!(plan.suffix(), "+");
        assert_eq!(plan.initial_text(), "0+");
    }

    #[test]
    fn ends_on_the_exact_original_text() {
        let plan = plan("250+").unwrap();
        let frames: Vec<String> = plan.start().collect();
        assert_eq!(frames.last().unwrap(), "250+");
        assert!(frames.len() > 100);
    }

    #[test]
    fn intermediate_values_are_floored_and_increasing() {
        let plan = plan("99%").unwrap();
        let values: Vec<u32> = plan
            .start()
            .map(|t| t.trim_end_matches('%').parse::<f64>().unwrap() as u32)
            .collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(plan.start().all(|t| !t.contains('.') || t == "99%"));
    }

    #[test]
    fn decimal_targets_snap_back_to_the_original() {
        let plan = plan("4.9/5").unwrap();
        assert_eq!(plan.target(), 4.95);
        assert_eq!(plan.start().last().unwrap(), "4.9/5");
    }

    #[test]
    fn non_numeric_text_is_skipped() {
        assert!(plan("Free").is_none());
        assert!(plan("$10").is_none());
        assert!(plan("").is_none());
    }

    #[test]
    fn degenerate_frame_timing_still_finishes() {
        for (duration_ms, frame_ms) in [(2000.0, 0.0), (2000.0, -16.0), (f64::INFINITY, 16.0), (f64::NAN, 16.0)] {
            let plan = CounterPlan::parse("250+", duration_ms, frame_ms).unwrap();
            let frames: Vec<String> = plan.start().take(1_000).collect();
            assert_eq!(frames, vec!["250+".to_string()]);
        }
    }

    #[test]
    fn run_is_pulled_one_frame_at_a_time() {
        let plan = plan("250+").unwrap();
        let mut run = plan.start();
        assert_eq!(run.next().as_deref(), Some("2+"));
        assert_eq!(run.next().as_deref(), Some("4+"));
    }

    #[test]
    fn frame_count_does_not_change_the_final_text() {
        for frame_ms in [8.0, 16.0, 33.0, 500.0, 5000.0] {
            let plan = CounterPlan::parse("24/7", 2000.0, frame_ms).unwrap();
            assert_eq!(plan.start().last().unwrap(), "24/7");
        }
    }
}
