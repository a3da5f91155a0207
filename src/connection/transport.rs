use std::env;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use crate::buf::{padding_to, MAX_ARRAY_LENGTH, MAX_BODY_LENGTH};
use crate::error::{ErrorKind, Result};
use crate::frame::Frame;
use crate::protocol::Endianness;
use crate::sasl::{parse_response, Auth, SaslResponse};

const ENV_SESSION_BUS: &str = "DBUS_SESSION_BUS_ADDRESS";
const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
const ENV_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// A parsed bus address. Only `unix:path=` addresses are supported.
pub(crate) enum Address {
    Unix(String),
}

pub(crate) fn parse_address(address: &str) -> Result<Address> {
    match address.split_once('=') {
        Some(("unix:path", path)) => Ok(Address::Unix(path.to_owned())),
        _ => Err(ErrorKind::InvalidAddress(address.into()).into()),
    }
}

/// The address of the session bus.
///
/// Taken from `DBUS_SESSION_BUS_ADDRESS`, with `$XDG_RUNTIME_DIR/bus` as
/// the fallback.
pub(crate) fn session_bus_address() -> Result<String> {
    if let Some(address) = env::var_os(ENV_SESSION_BUS) {
        return address
            .into_string()
            .map_err(|_| ErrorKind::MissingBus.into());
    }

    match env::var_os(ENV_RUNTIME_DIR) {
        Some(dir) => match dir.into_string() {
            Ok(dir) => Ok(format!("unix:path={dir}/bus")),
            Err(_) => Err(ErrorKind::MissingBus.into()),
        },
        None => Err(ErrorKind::MissingBus.into()),
    }
}

/// The address of the system bus.
///
/// Taken from `DBUS_SYSTEM_BUS_ADDRESS`, with the well-known socket path as
/// the fallback.
pub(crate) fn system_bus_address() -> String {
    match env::var_os(ENV_SYSTEM_BUS).map(|v| v.into_string()) {
        Some(Ok(address)) => address,
        _ => DEFAULT_SYSTEM_BUS.to_owned(),
    }
}

/// A stream to the bus, up to and including the SASL exchange.
pub(crate) struct Transport {
    stream: UnixStream,
}

impl Transport {
    /// Open a transport to the given address.
    pub(crate) async fn connect(address: &str) -> Result<Self> {
        let Address::Unix(path) = parse_address(address)?;
        let stream = UnixStream::connect(path).await?;
        Ok(Self { stream })
    }

    pub(crate) fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Perform the client side of the SASL exchange.
    ///
    /// Sends the initial NUL byte and `AUTH EXTERNAL` with the hex-encoded
    /// uid of this process, requires an `OK` line back, then sends `BEGIN`
    /// and hands the stream over to the binary protocol.
    pub(crate) async fn authenticate(&mut self) -> Result<()> {
        let mut hex = [0u8; 32];
        let Auth::External(external) = Auth::external_from_uid(&mut hex);

        let mut line = Vec::with_capacity(64);
        line.push(0);
        line.extend_from_slice(b"AUTH EXTERNAL ");
        line.extend_from_slice(external);
        line.extend_from_slice(b"\r\n");

        self.stream.write_all(&line).await?;

        let response = self.read_line().await?;
        let SaslResponse::Ok(guid) = parse_response(&response)?;
        tracing::debug!(guid = ?guid, "authenticated");

        self.stream.write_all(b"BEGIN\r\n").await?;
        Ok(())
    }

    /// Read a single CRLF-terminated line.
    ///
    /// Reads byte by byte so nothing beyond the line is consumed; the bytes
    /// after it belong to the binary protocol.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::with_capacity(64);

        loop {
            let byte = self.stream.read_u8().await?;

            if byte == b'\n' {
                return Ok(line);
            }

            line.push(byte);

            if line.len() > 4096 {
                return Err(ErrorKind::InvalidSasl.into());
            }
        }
    }

    pub(crate) fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }
}

/// Read exactly `buf.len()` bytes, reporting the partial progress if the
/// stream ends early.
pub(crate) async fn read_exact_or_eof(stream: &mut OwnedReadHalf, buf: &mut [u8]) -> Result<()> {
    let mut read = 0;

    while read < buf.len() {
        let n = stream.read(&mut buf[read..]).await?;

        if n == 0 {
            return Err(ErrorKind::UnexpectedEof {
                read,
                requested: buf.len(),
            }
            .into());
        }

        read += n;
    }

    Ok(())
}

/// Read one complete message frame.
///
/// The fixed 16-byte prefix carries everything needed to size the rest of
/// the frame: the body length and the header-field array length, both
/// decoded with the endianness named by the first byte.
pub(crate) async fn read_frame(stream: &mut OwnedReadHalf) -> Result<Vec<u8>> {
    let mut fixed = [0u8; 16];
    read_exact_or_eof(stream, &mut fixed).await?;

    let Some(endianness) = Endianness::from_marker(fixed[0]) else {
        return Err(ErrorKind::InvalidEndianness(fixed[0]).into());
    };

    let body_length = u32::load_frame(&fixed[4..8], endianness);
    let fields_length = u32::load_frame(&fixed[12..16], endianness);

    if body_length > MAX_BODY_LENGTH {
        return Err(ErrorKind::BodyTooLong(body_length).into());
    }

    if fields_length > MAX_ARRAY_LENGTH {
        return Err(ErrorKind::ArrayTooLong(fields_length).into());
    }

    let fields_length = fields_length as usize;
    // The body starts past the 8-byte boundary that ends the header.
    let rest = fields_length + padding_to(16 + fields_length, 8) + body_length as usize;

    let mut frame = vec![0u8; 16 + rest];
    frame[..16].copy_from_slice(&fixed);
    read_exact_or_eof(stream, &mut frame[16..]).await?;

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::{parse_address, Address};

    #[test]
    fn addresses() {
        assert!(matches!(
            parse_address("unix:path=/run/user/1000/bus"),
            Ok(Address::Unix(path)) if path == "/run/user/1000/bus"
        ));
        assert!(parse_address("tcp:host=localhost,port=1234").is_err());
        assert!(parse_address("unix:abstract=/tmp/x").is_err());
        assert!(parse_address("").is_err());
    }
}
