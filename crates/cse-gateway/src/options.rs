//! Contains available options to configure the [`serve`][crate::serve] loop.
use std::net::{IpAddr, SocketAddr};

use crate::constants::DEFAULT_SOCKET_ADDRESS;

/// Specifies available gateway server options.
///
/// The [`Default`] implementation binds to `127.0.0.1:8080`.
#[derive(Clone, Debug)]
pub struct GatewayOptions {
    pub socket_addr: SocketAddr,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayOptions {
    pub fn builder() -> GatewayOptionsBuilder {
        GatewayOptionsBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct GatewayOptionsBuilder {
    socket_addr: Option<SocketAddr>,
}

impl GatewayOptionsBuilder {
    pub fn bind_address(mut self, bind_ip: impl Into<IpAddr>, bind_port: u16) -> Self {
        self.socket_addr = Some(SocketAddr::new(bind_ip.into(), bind_port));
        self
    }

    pub fn build(self) -> GatewayOptions {
        GatewayOptions {
            socket_addr: self.socket_addr.unwrap_or(DEFAULT_SOCKET_ADDRESS),
        }
    }
}
