//! Send and receive channel drivers for the transport protocol.
//!
//! [`sender::Framer`] and [`receiver::Reassembler`] own the async I/O loop
//! around the pure [`crate::buffer::PayloadBuffer`] / [`crate::buffer::ReassemblyStore`]
//! data models: reading records off the stream, applying them, and deciding
//! what to write back.

pub mod receiver;
pub mod sender;

pub use receiver::Reassembler;
pub use sender::Framer;

/// Reads whatever bytes are currently available on `stream` and appends
/// their UTF-8 decoding to `buf`. Returns `Ok(0)` on a clean EOF.
pub(crate) async fn read_more<S>(stream: &mut S, buf: &mut String) -> std::io::Result<usize>
where
    S: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut tmp = [0u8; 4096];
    let n = stream.read(&mut tmp).await?;
    if n > 0 {
        buf.push_str(&String::from_utf8_lossy(&tmp[..n]));
    }
    Ok(n)
}
