//! The library module for packer-teamcity.
//!
//! packer-teamcity reports machine images built by an image pipeline back to TeamCity:
//! it announces the image through TeamCity service messages,
//! and optionally points a TeamCity cloud profile at the new image.
//!
//! The binary is the primary interface; this library exists to support it and
//! to let pipeline hosts call [`post_process::PostProcessor`] directly.

#![deny(clippy::unwrap_used)]
#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod artifact;
pub mod config;
pub mod context;
pub mod debug;
pub mod doc;
pub mod ext;
pub mod notify;
pub mod post_process;
pub mod ui;
