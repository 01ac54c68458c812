//! Retrieval of a peer's certificate chain through a TLS handshake.

use log::debug;
use openssl::ssl::{SslConnector, SslMethod};
use openssl::x509::X509;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::CheckError;

/// Connects to `host:port`, completes a TLS handshake and returns the peer's
/// certificate chain in the order the server presented it (leaf first).
///
/// The handshake uses OpenSSL's default client settings, including the system
/// trust store and hostname verification. A peer the TLS stack refuses to trust
/// therefore fails here as [`CheckError::HandshakeFailed`].
///
/// `timeout` bounds the TCP connect as well as every read and write of the
/// handshake. With `None` the calls block for as long as the platform allows.
pub fn fetch_chain(
    host: &str,
    port: u16,
    timeout: Option<Duration>,
) -> Result<Vec<X509>, CheckError> {
    let address = format!("{}:{}", host, port);
    let socket_addrs = resolve(host, port)?;

    let tcp_stream = connect(&address, &socket_addrs, timeout)?;
    tcp_stream.set_read_timeout(timeout)?;
    tcp_stream.set_write_timeout(timeout)?;

    let connector = SslConnector::builder(SslMethod::tls())?.build();
    let mut stream = connector.connect(host, tcp_stream)?;
    debug!(
        "Handshake with {} completed using {}",
        address,
        stream.ssl().version_str()
    );

    let chain: Vec<X509> = stream
        .ssl()
        .peer_cert_chain()
        .map(|certs| certs.iter().map(|cert| cert.to_owned()).collect())
        .unwrap_or_default();

    // The stream is dropped below regardless; a failed close_notify is irrelevant.
    if let Err(e) = stream.shutdown() {
        debug!("TLS shutdown with {} failed: {}", address, e);
    }

    if chain.is_empty() {
        return Err(CheckError::CertificateError {
            reason: format!("{} presented no certificates", address),
        });
    }

    Ok(chain)
}

fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, CheckError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| CheckError::DnsResolution {
            hostname: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(CheckError::DnsResolution {
            hostname: host.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        });
    }

    debug!("Resolved {} to {:?}", host, addrs);
    Ok(addrs)
}

/// Tries each resolved address in turn and returns the first connected stream.
fn connect(
    address: &str,
    socket_addrs: &[SocketAddr],
    timeout: Option<Duration>,
) -> Result<TcpStream, CheckError> {
    let mut last_error = None;

    for socket_addr in socket_addrs {
        let attempt = match timeout {
            Some(t) => TcpStream::connect_timeout(socket_addr, t),
            None => TcpStream::connect(socket_addr),
        };
        match attempt {
            Ok(stream) => {
                debug!("Connected to {} via {}", address, socket_addr);
                return Ok(stream);
            }
            Err(e) => {
                debug!("Connection to {} via {} failed: {}", address, socket_addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(CheckError::ConnectionFailed {
        address: address.to_string(),
        source: last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no address to connect to")
        }),
    })
}
