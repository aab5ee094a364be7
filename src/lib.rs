//! TankPump firmware library.
//!
//! Exposes the pump policy, ports, adapters and relay link for the
//! firmware binary and for integration testing. All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod pins;
pub mod schedule;

pub mod adapters;
pub mod drivers;
pub mod relay;
pub mod sensors;
