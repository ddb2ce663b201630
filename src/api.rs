//! Interactions with remote services.

pub mod http;
pub mod teamcity;
