//! Home-control core library.
//!
//! Pin registry, blinds interlock controller and flow meter for one
//! master device, behind port traits so everything runs on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod blinds;
pub mod config;
pub mod error;
pub mod flow_meter;
pub mod pins;
pub mod registry;
pub mod status;
pub mod timer;
