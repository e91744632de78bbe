//! Portal scenarios
//!
//! Flow definitions for the scheduling portal, assembled from seeded run
//! data and the locator chains in [`selectors`].

pub mod booking;
pub mod selectors;

pub use booking::booking_flow;
