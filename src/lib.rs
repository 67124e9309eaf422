//! feedview - a paginated view of feed entries that stays consistent with
//! its store.
//!
//! The [`view`] module holds the controller; [`storage`] the entry stores it
//! reads from; [`ui`] a terminal surface to draw it on.

pub mod config;
pub mod preferences;
pub mod storage;
pub mod ui;
pub mod util;
pub mod view;
