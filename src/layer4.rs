use std::io::{self, ErrorKind};
use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, Result};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::Packet;
use pnet::transport::{self, TransportChannelType, TransportReceiver};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::common::MAX_DATAGRAM;
use crate::config::Config;
use crate::detector::WakeDetector;
use crate::filter::TargetFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Something that hands out one captured IPv4 datagram at a time.
pub trait PacketSource {
    /// Copies the next datagram into `buf`. `Ok(None)` means nothing arrived
    /// within the poll interval.
    fn recv_into(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// Raw socket for IP protocol UDP, delivering datagrams with their IPv4 header.
pub struct RawUdpSource {
    rx: TransportReceiver,
}

impl RawUdpSource {
    pub fn open() -> io::Result<Self> {
        let (_tx, rx) = transport::transport_channel(
            MAX_DATAGRAM,
            TransportChannelType::Layer3(IpNextHeaderProtocols::Udp),
        )?;
        Ok(Self { rx })
    }
}

impl PacketSource for RawUdpSource {
    fn recv_into(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match transport::ipv4_packet_iter(&mut self.rx).next_with_timeout(POLL_INTERVAL)? {
            Some((pkt, _)) => {
                let bytes = pkt.packet();
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(Some(n))
            }
            None => Ok(None),
        }
    }
}

impl Drop for RawUdpSource {
    fn drop(&mut self) {
        log::trace!("[listener] closing raw socket");
    }
}

pub trait Action {
    fn fire(&mut self);
}

/// Runs a shell command on the tokio runtime without waiting for it.
pub struct ShellAction {
    command: String,
    handle: Handle,
}

impl ShellAction {
    pub fn new(command: String, handle: Handle) -> Self {
        Self { command, handle }
    }
}

impl Action for ShellAction {
    fn fire(&mut self) {
        let command = self.command.clone();
        self.handle.spawn(async move {
            match tokio::process::Command::new("sh").arg("-c").arg(&command).status().await {
                Ok(status) => log::debug!("[action] '{}' exited with {}", command, status),
                Err(e) => log::error!("[action] failed to run '{}': {}", command, e),
            }
        });
    }
}

/// Ties the filter, the edge trigger and the action together.
pub struct Listener<A: Action> {
    filter: TargetFilter,
    detector: WakeDetector,
    action: A,
}

impl<A: Action> Listener<A> {
    pub fn new(filter: TargetFilter, action: A) -> Self {
        Self { filter, detector: WakeDetector::new(), action }
    }

    /// Handles one datagram; returns `true` if the action was fired.
    pub fn process(&mut self, raw: &[u8]) -> bool {
        let source = self.filter.matches(raw);
        if !self.detector.observe(source.is_some()) {
            return false;
        }

        log::info!("wake-up packet from {}", source.unwrap_or(Ipv4Addr::UNSPECIFIED));
        self.action.fire();
        true
    }

    pub fn action(&self) -> &A {
        &self.action
    }
}

/// Pulls datagrams from `source` until `token` is cancelled.
pub fn run<S: PacketSource, A: Action>(source: &mut S, listener: &mut Listener<A>, token: &CancellationToken) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        if token.is_cancelled() { log::trace!("[listener] exit"); break; }

        let n = match source.recv_into(&mut buf) {
            Ok(Some(n)) => n,
            Ok(None) => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => continue,
            Err(e) => return Err(e).context("receiving from raw socket"),
        };

        listener.process(&buf[..n]);
    }

    Ok(())
}

pub fn l4_worker(cfg: Config, token: CancellationToken, handle: Handle) -> Result<()> {
    let mut source = RawUdpSource::open()
        .context("cannot open raw UDP socket (root or CAP_NET_RAW required)")?;

    log::info!("waiting for magic packets to {} on port {}", cfg.filter.mac, cfg.filter.port);
    if let Some(src) = cfg.filter.source {
        log::info!("accepting only packets from {}", Ipv4Addr::from(src));
    }

    let mut listener = Listener::new(cfg.filter, ShellAction::new(cfg.command, handle));
    run(&mut source, &mut listener, &token)
}
