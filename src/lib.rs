//! mosaic — a terminal photo feed browser.
//!
//! An infinite-scrolling thumbnail grid over a remote photo feed service:
//! sorting, favoriting, long-press multi-select, batch album operations,
//! and a localhost image-proxy relay that every thumbnail loads through.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod grid;
pub mod image;
pub mod proxy;
pub mod theme;
pub mod ui;
pub mod util;
