use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use web_sys::{Document, Element};

use crate::config::Config;
use crate::dom;
use crate::error::{Result, SiteError};
use crate::timers::{self, CancelGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Typing,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub type_ms: u32,
    pub delete_ms: u32,
    pub hold_full_ms: u32,
    pub hold_empty_ms: u32,
}

impl Delays {
    pub fn from_config(config: &Config) -> Self {
        Self {
            type_ms: config.type_delay_ms,
            delete_ms: config.delete_delay_ms,
            hold_full_ms: config.hold_full_ms,
            hold_empty_ms: config.hold_empty_ms,
        }
    }
}

/// Types each phrase out, holds it, deletes it, then moves to the next one
/// and wraps around forever.
#[derive(Debug, Clone)]
pub struct Typewriter {
    phrases: Vec<Vec<char>>,
    delays: Delays,
    phrase: usize,
    chars: usize,
    phase: Phase,
}

impl Typewriter {
    /// `None` when there is nothing to type.
    pub fn new(phrases: &[String], delays: Delays) -> Option<Self> {
        if phrases.is_empty() || phrases.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(Self {
            phrases: phrases.iter().map(|p| p.chars().collect()).collect(),
            delays,
            phrase: 0,
            chars: 0,
            phase: Phase::Typing,
        })
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn phrase_index(&self) -> usize {
        self.phrase
    }

    /// Advances one character and returns the text to show plus the delay
    /// before the next tick.
    pub fn tick(&mut self) -> (String, u32) {
        let current = &self.phrases[self.phrase];
        let mut delay = match self.phase {
            Phase::Deleting => {
                self.chars -= 1;
                self.delays.delete_ms
            }
            Phase::Typing => {
                self.chars += 1;
                self.delays.type_ms
            }
        };
        let text: String = current[..self.chars].iter().collect();

        if self.phase == Phase::Typing && self.chars == current.len() {
            delay = self.delays.hold_full_ms;
            self.phase = Phase::Deleting;
        } else if self.phase == Phase::Deleting && self.chars == 0 {
            delay = self.delays.hold_empty_ms;
            self.phase = Phase::Typing;
            self.phrase = (self.phrase + 1) % self.phrases.len();
        }

        (text, delay)
    }
}

pub struct TypingEffect {
    guard: CancelGuard,
}

impl TypingEffect {
    pub fn install(document: &Document, config: &Config) -> Result<Self> {
        let element = dom::require(document, &config.selectors.typing_text)?;
        let typewriter = Typewriter::new(&config.typing_phrases, Delays::from_config(config))
            .ok_or_else(|| SiteError::Config("no typing phrases".into()))?;

        let guard = CancelGuard::new();
        step(element, Rc::new(RefCell::new(typewriter)), guard.clone());

        info!("typing effect started with {} phrases", config.typing_phrases.len());
        Ok(Self { guard })
    }
}

impl Drop for TypingEffect {
    fn drop(&mut self) {
        self.guard.cancel();
    }
}

fn step(element: Element, typewriter: Rc<RefCell<Typewriter>>, guard: CancelGuard) {
    let (text, delay) = typewriter.borrow_mut().tick();
    element.set_text_content(Some(&text));

    let next_guard = guard.clone();
    timers::after(delay, &guard, move || step(element, typewriter, next_guard));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delays() -> Delays {
        Delays::from_config(&Config::default())
    }

    fn phrases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_tick_types_the_first_character() {
        let mut tw = Typewriter::new(&Config::default().typing_phrases, delays()).unwrap();
        assert_eq!(tw.tick(), ("r".to_string(), 100));
    }

    #[test]
    fn holds_the_full_phrase_then_deletes_one_character() {
        let mut tw = Typewriter::new(&phrases(&["abc", "de"]), delays()).unwrap();
        assert_eq!(tw.tick(), ("a".into(), 100));
        assert_eq!(tw.tick(), ("ab".into(), 100));
        assert_eq!(tw.tick(), ("abc".into(), 2000));
        assert_eq!(tw.phase(), Phase::Deleting);
        assert_eq!(tw.tick(), ("ab".into(), 50));
    }

    #[test]
    fn empties_then_moves_to_the_next_phrase() {
        let mut tw = Typewriter::new(&phrases(&["ab", "xy"]), delays()).unwrap();
        tw.tick();
        tw.tick();
        assert_eq!(tw.tick(), ("a".into(), 50));
        assert_eq!(tw.tick(), ("".into(), 500));
        assert_eq!(tw.phrase_index(), 1);
        assert_eq!(tw.phase(), Phase::Typing);
        assert_eq!(tw.tick(), ("x".into(), 100));
    }

    #[test]
    fn wraps_after_the_last_phrase() {
        let mut tw = Typewriter::new(&phrases(&["a", "b"]), delays()).unwrap();
        // a: type, delete; b: type, delete
        for _ in 0..4 {
            tw.tick();
        }
        assert_eq!(tw.phrase_index(), 0);
        assert_eq!(tw.tick(), ("a".into(), 2000));
    }

    #[test]
    fn handles_multibyte_phrases() {
        let mut tw = Typewriter::new(&phrases(&["héé"]), delays()).unwrap();
        tw.tick();
        assert_eq!(tw.tick(), ("hé".into(), 100));
    }

    #[test]
    fn nothing_to_type_is_rejected() {
        assert!(Typewriter::new(&[], delays()).is_none());
        assert!(Typewriter::new(&phrases(&["ok", ""]), delays()).is_none());
    }
}
