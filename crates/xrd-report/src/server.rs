// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP server for inbound report datagrams.
//!
//! Each datagram is handed to its own task, so a slow sink never holds up
//! the receive loop; there is no application-level backpressure and excess
//! datagrams are dropped by the kernel, which is the accepted behavior for
//! this best-effort telemetry path.
//!
//! A datagram that is exactly `ping` is answered with `pong` and bypasses
//! the pipeline entirely; monitoring uses this as a liveness probe.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::config::ServerConfig;
use crate::pipeline::Pipeline;

/// Summary reports stay well under the maximum UDP payload, but a fleet of
/// busy servers can get close; size the receive buffer for the worst case.
const BUFFER_SIZE: usize = 65_536;

const PING: &str = "ping";
const PONG: &[u8] = b"pong";

// BufferReader abstracts the datagram source so the full pipeline can run
// in tests without a socket.
enum BufferReader {
    UdpSocket(Arc<UdpSocket>),

    /// Replays a fixed buffer once per read; test-only.
    #[allow(dead_code)]
    MirrorTest(Vec<u8>, SocketAddr),
}

impl BufferReader {
    async fn read(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        match self {
            BufferReader::UdpSocket(socket) => {
                let mut buf = [0; BUFFER_SIZE];
                let (amt, peer) = socket.recv_from(&mut buf).await?;
                Ok((buf[..amt].to_vec(), peer))
            }
            BufferReader::MirrorTest(data, peer) => Ok((data.clone(), *peer)),
        }
    }

    fn responder(&self) -> Option<Arc<UdpSocket>> {
        match self {
            BufferReader::UdpSocket(socket) => Some(Arc::clone(socket)),
            BufferReader::MirrorTest(..) => None,
        }
    }
}

/// Listener that drives one pipeline invocation per inbound datagram.
pub struct ReportServer {
    cancel_token: tokio_util::sync::CancellationToken,
    pipeline: Arc<Pipeline>,
    reader: BufferReader,
}

impl ReportServer {
    /// Bind the configured address and wrap it into a server.
    pub async fn bind(
        config: &ServerConfig,
        pipeline: Arc<Pipeline>,
        cancel_token: tokio_util::sync::CancellationToken,
    ) -> io::Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);
        let socket = UdpSocket::bind(&addr).await?;
        Ok(ReportServer {
            cancel_token,
            pipeline,
            reader: BufferReader::UdpSocket(Arc::new(socket)),
        })
    }

    /// Bound address, for callers that asked for an ephemeral port.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.reader {
            BufferReader::UdpSocket(socket) => socket.local_addr().ok(),
            BufferReader::MirrorTest(_, peer) => Some(*peer),
        }
    }

    /// Receive loop: runs until the cancellation token fires.
    pub async fn spin(self) {
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => break,
                received = self.reader.read() => match received {
                    Ok((buf, peer)) => {
                        self.consume(buf, peer);
                    }
                    Err(err) => error!("failed to receive datagram: {err}"),
                }
            }
        }
        debug!("report server stopped");
    }

    /// Handle one datagram. Returns the processing task's handle so tests
    /// can await completion; the serve loop does not.
    fn consume(&self, buf: Vec<u8>, peer: SocketAddr) -> Option<JoinHandle<()>> {
        let payload = match String::from_utf8(buf) {
            Ok(payload) => payload,
            Err(err) => {
                error!("datagram from {peer} is not valid UTF-8: {err}");
                return None;
            }
        };
        let payload = payload.trim();
        trace!("received {} bytes from {peer}", payload.len());

        if payload.is_empty() {
            debug!("empty datagram from {peer}");
            return None;
        }

        if payload == PING {
            if let Some(socket) = self.reader.responder() {
                return Some(tokio::spawn(async move {
                    if let Err(err) = socket.send_to(PONG, peer).await {
                        error!("failed to answer liveness probe from {peer}: {err}");
                    }
                }));
            }
            return None;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let payload = payload.to_string();
        Some(tokio::spawn(async move {
            if let Err(err) = pipeline.process(&payload).await {
                error!("dropping report from {peer}: {err}");
            }
        }))
    }
}
