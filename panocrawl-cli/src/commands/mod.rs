//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`assemble`] - Assemble one panorama to a JPEG file
//! - [`config`] - Configuration management (init, path)
//! - [`run`] - Full crawl over an area
//! - [`scan`] - Coverage phase only

pub mod assemble;
pub mod common;
pub mod config;
pub mod run;
pub mod scan;
