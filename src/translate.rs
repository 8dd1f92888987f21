//! Boundary to the name-translation collaborator.
//!
//! Translation is slow (network-backed, cached elsewhere), so the contract
//! is callback-style: `translate` must return immediately and deliver the
//! result later on the state thread. Only the interface lives here.

/// Sentinel the collaborator reports when source and target language are the
/// same. Display layers may substitute their own fallback text for it; it is
/// never stored into parameter state.
pub const SAME_LANGUAGE: &str = "PLEASE SELECT TWO DISTINCT LANGUAGES";

pub trait Translator {
    /// Translate `text`, invoking `on_done` with the result when available.
    /// Must not block the caller.
    fn translate(&self, text: &str, on_done: Box<dyn FnOnce(String)>);
}

/// Stand-in used when no real translation service is wired up: completes
/// immediately with the input text.
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str, on_done: Box<dyn FnOnce(String)>) {
        on_done(text.to_string());
    }
}
