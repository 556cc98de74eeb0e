use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque rich-text payload for prompts and choices.
///
/// The content is trusted and handed to the renderer verbatim. Equality is
/// plain string equality, which is also how answers are scored.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Markup {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Markup {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Markup({:?})", self.0)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
