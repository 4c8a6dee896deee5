//! Operator control server
//!
//! Accepts TCP clients and answers length-prefixed `Request` frames with
//! `Response` frames, in order, one request at a time per client.

use super::dispatcher::dispatch;
use crate::station::Station;
use anyhow::Result;
use skyfleet_shared::codec::{self, FrameDecoder};
use skyfleet_shared::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

pub struct ControlServer {
    listener: TcpListener,
    station: Arc<Station>,
}

impl ControlServer {
    pub async fn bind(addr: &str, station: Arc<Station>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("[CONTROL] Listening on {}", listener.local_addr()?);
        Ok(Self { listener, station })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until the listener fails
    pub async fn run(self) -> Result<()> {
        loop {
            let (socket, addr) = self.listener.accept().await?;
            info!("[CONTROL] Operator connected: {}", addr);

            let station = self.station.clone();
            tokio::spawn(async move {
                match serve_client(socket, &station).await {
                    Ok(()) => info!("[CONTROL] Operator disconnected: {}", addr),
                    Err(e) => error!("[CONTROL] Operator {} dropped: {}", addr, e),
                }
            });
        }
    }
}

async fn serve_client(socket: TcpStream, station: &Station) -> Result<()> {
    let (mut reader, mut writer) = socket.into_split();
    let mut decoder = FrameDecoder::<Request>::new();
    let mut buf = vec![0u8; 4096];

    loop {
        // Answer every complete frame before reading more
        loop {
            let request = match decoder.decode_next() {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(e) => {
                    warn!("[CONTROL] Malformed frame: {}", e);
                    return Err(e.into());
                }
            };

            let response = dispatch(station, request).await;
            writer.write_all(&codec::encode(&response)?).await?;
        }

        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        decoder.extend(&buf[..n]);
    }
}
