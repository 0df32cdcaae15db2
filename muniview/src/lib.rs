//! A live map of SF Muni vehicles. Geographic layers resolve cache-then-
//! network and wait on the one layer that calibrates the projection; vehicle
//! positions poll from the NextBus feed with linear backoff; each poll is
//! reconciled into the scene by vehicle identity, so markers glide to their
//! new positions instead of being redrawn. Output is an SVG rewritten after
//! every applied update.

#[macro_use]
extern crate log;

pub mod app;
pub mod cache;
pub mod config;
pub mod download;
pub mod feed;
pub mod layers;
pub mod logger;
pub mod poller;
pub mod render;
pub mod routes;
