//! storefront-types: domain entities and outbound ports for the storefront.

pub mod domain;
pub mod ports;
