//! Element locator strategies for driving a browser UI.
//!
//! A [`Locator`] describes one way of finding an element (CSS selector, visible
//! text, ARIA role); a [`LocatorChain`] is an ordered fallback list where the
//! first strategy that matches wins. Locators compile to self-contained
//! JavaScript expressions evaluated in the page, so the crate stays free of any
//! browser dependency and the compilation is unit-testable on its own.

pub mod js;
pub mod types;

pub use types::{ElementHit, Locator, LocatorChain, ProbeOutcome};
