//! Minimal client used to check a running server by hand or from scripts.

use std::io;

use flakeid::{FlakeId, decode};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use crate::server::{
    error::{Error, Result},
    protocol::{Opcode, ProbeCodec},
};

/// Requests `count` IDs over a single connection.
///
/// All requests are written before the first reply is read, exercising the
/// server's pipelining.
pub async fn request_ids<A>(addr: A, count: usize) -> Result<Vec<FlakeId>>
where
    A: ToSocketAddrs,
{
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, ProbeCodec);

    for _ in 0..count {
        framed.feed(Opcode::Generate).await?;
    }
    framed.flush().await?;

    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        match framed.next().await {
            Some(id) => ids.push(id?),
            None => {
                return Err(Error::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("server closed the connection after {} of {count} IDs", ids.len()),
                )));
            }
        }
    }
    Ok(ids)
}

/// Seconds between the configured epoch and the moment `id` was minted.
pub fn seconds_since_epoch(id: FlakeId) -> f64 {
    decode(id.to_i64()) as f64 / 1000.0
}

pub async fn run(addr: &str, count: usize) -> Result<()> {
    for id in request_ids(addr, count).await? {
        println!("Received {id}");
        println!("Seconds since epoch: {}", seconds_since_epoch(id));
    }
    Ok(())
}
