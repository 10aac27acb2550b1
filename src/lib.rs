//! Shared Interest - reactive core of the saliency inspection dashboard.
//!
//! A mounted dashboard is one [`controller::DashboardController`] built
//! from a [`controller::DashboardContext`]: the URL-addressable
//! [`state::QueryState`], an [`event_bus::EventBus`], a
//! [`api::Backend`] and a task spawner. The controller turns filter changes
//! into backend queries and keeps the result grid, histogram, confusion
//! matrix, annotation canvas and ranked predictions up to date.

pub mod api;
pub mod color_utils;
pub mod config;
pub mod confusion;
pub mod constants;
pub mod controller;
pub mod event_bus;
pub mod events;
pub mod figures;
pub mod histogram;
pub mod logging;
pub mod mask_editor;
pub mod options;
pub mod presets;
pub mod ranked;
pub mod results;
pub mod spawn;
pub mod state;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

pub use config::DashboardConfig;
pub use controller::{DashboardContext, DashboardController};
