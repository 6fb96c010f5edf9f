//! Start-up banner describing what a server exposes.

use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use crate::dispatch::DispatchTable;
use crate::protocol::AUXILIARY_COMMANDS;
use tether_config::Secret;

/// Unroutable address used to discover the outbound interface. Connecting a
/// UDP socket sends nothing.
const PROBE_ADDRESS: (Ipv4Addr, u16) = (Ipv4Addr::new(10, 254, 254, 254), 1);

pub(crate) struct Banner<'a> {
    pub(crate) address: SocketAddr,
    pub(crate) all_interfaces: bool,
    pub(crate) secret: Option<&'a Secret>,
    pub(crate) table: &'a DispatchTable,
}

impl Banner<'_> {
    pub(crate) fn render(&self) -> String {
        let host = if self.all_interfaces {
            public_address()
        } else {
            self.address.ip()
        };
        let port = self.address.port();
        let mut lines = vec![format!("Server listening on {}", self.address)];
        if let Some(secret) = self.secret {
            lines.push(format!("Secret: {}", secret.expose()));
        }
        lines.push(format!("Proxied classes: {:?}", self.table.class_names()));
        lines.push(format!("Registered calls: {:?}", self.table.calls()));
        lines.push(format!("Registered properties: {:?}", self.table.properties()));
        lines.push(format!("Auxiliary calls: {AUXILIARY_COMMANDS:?}"));
        lines.push(String::new());
        lines.push("Connect from another shell with:".to_owned());
        let secret_flag = self
            .secret
            .map(|secret| format!(" --secret {}", secret.expose()))
            .unwrap_or_default();
        lines.push(format!(
            "    tether --address {host} --port {port}{secret_flag} call <command> [args...]"
        ));
        lines.join("\n")
    }

    pub(crate) fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "{}", self.render())?;
        writer.flush()
    }
}

/// Address other hosts would use to reach this one, falling back to the
/// loopback address when no route exists.
fn public_address() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect(PROBE_ADDRESS)?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
