//! tilecache - a local slippy-map tile cache
//!
//! Downloads raster tiles covering an area of interest from a remote XYZ
//! provider into a `{z}/{x}/{y}.png` directory tree, and serves them back
//! over HTTP for offline map clients.
//!
//! - [`coord`]: Web Mercator tile math and coverage requests
//! - [`store`]: write-once on-disk tile store
//! - [`provider`]: remote tile providers
//! - [`scheduler`]: concurrent download jobs and the job manager
//! - [`server`]: HTTP tile server and job control API
//! - [`config`]: `~/.tilecache/config.ini`
//! - [`logging`]: tracing setup

pub mod config;
pub mod coord;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod server;
pub mod store;
