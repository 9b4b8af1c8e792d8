//! Data layer for the DirtyWatts dashboard: fetches live and historical New
//! Zealand grid data, keeps it in reactive state for the UI and mirrors the
//! locally edited preview datapoint to the local server.

pub mod config;
pub mod hooks;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
