//! Locator and fallback-chain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single strategy for finding an element in the page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Locator {
    /// Standard CSS selector evaluated with `querySelectorAll`.
    Css { selector: String },
    /// Match on trimmed element text, innermost element preferred.
    Text { content: String, exact: bool },
    /// ARIA role, explicit `[role=…]` or the implicit role of native
    /// elements, optionally narrowed by accessible name.
    Role { role: String, name: Option<String> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Substring text match.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            exact: false,
        }
    }

    /// Whole-text match after trimming.
    pub fn text_exact(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            exact: true,
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
        }
    }

    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    /// Short strategy tag used in logs and reports.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css { .. } => "css",
            Self::Text { .. } => "text",
            Self::Role { .. } => "role",
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css:{selector}"),
            Self::Text { content, exact } => {
                if *exact {
                    write!(f, "text:exact:'{content}'")
                } else {
                    write!(f, "text:'{content}'")
                }
            }
            Self::Role { role, name } => match name {
                Some(name) => write!(f, "role:{role}[name='{name}']"),
                None => write!(f, "role:{role}"),
            },
        }
    }
}

/// Ordered fallback list of locators. Consumers probe strategies in
/// declaration order and stop at the first one that matches; later entries
/// must never be evaluated once an earlier one has hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocatorChain {
    locators: Vec<Locator>,
}

impl LocatorChain {
    pub fn new(primary: Locator) -> Self {
        Self {
            locators: vec![primary],
        }
    }

    /// Append a lower-priority alternative.
    pub fn or(mut self, alternative: Locator) -> Self {
        self.locators.push(alternative);
        self
    }

    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.locators.iter()
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// The highest-priority strategy.
    pub fn primary(&self) -> Option<&Locator> {
        self.locators.first()
    }
}

impl From<Locator> for LocatorChain {
    fn from(locator: Locator) -> Self {
        Self::new(locator)
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, locator) in self.locators.iter().enumerate() {
            if idx > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{locator}")?;
        }
        Ok(())
    }
}

/// Viewport center of a matched, visible element.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementHit {
    pub x: f64,
    pub y: f64,
}

/// Result shape produced by a compiled probe expression.
#[derive(Clone, Debug, Deserialize)]
pub struct ProbeOutcome {
    pub status: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl ProbeOutcome {
    pub fn into_hit(self) -> Option<ElementHit> {
        if self.status == "found" {
            Some(ElementHit {
                x: self.x.unwrap_or(0.0),
                y: self.y.unwrap_or(0.0),
            })
        } else {
            None
        }
    }
}
