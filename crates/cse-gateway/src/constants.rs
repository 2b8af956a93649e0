use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Bound when [`GatewayOptions::default`][crate::options::GatewayOptions] is used as-is.
pub const DEFAULT_SOCKET_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

pub const HEADER_ORIGIN: &str = "X-M2M-Origin";
pub const HEADER_REQUEST_ID: &str = "X-M2M-RI";
pub const HEADER_RELEASE_VERSION: &str = "X-M2M-RVI";
pub const HEADER_RESPONSE_STATUS_CODE: &str = "X-M2M-RSC";
pub const HEADER_REQUEST_EXPIRATION: &str = "X-M2M-RET";
pub const HEADER_EVENT_CATEGORY: &str = "X-M2M-EC";
pub const HEADER_VENDOR_INFO: &str = "X-M2M-VSI";

/// Query parameter carrying the numeric resource type on `POST`, mirroring
/// the `ty=<n>` Content-Type parameter oneM2M HTTP bindings use in practice.
pub const QUERY_RESOURCE_TYPE: &str = "ty";
