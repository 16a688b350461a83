//! TLS handshake driver for chain capture.

use crate::capture::InsecureChainCapturer;
use crate::endpoint::HostEndpoint;
use crate::{ConnectionError, PinError};
use log::debug;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline for connecting and completing the handshake.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Perform one TLS handshake with `endpoint`, using `capturer` as the only
/// certificate verifier.
///
/// No trust roots are configured; the capturer accepts whatever is
/// presented and keeps it for [`InsecureChainCapturer::take_chain`]. The
/// handshake is driven to completion before returning, so on success the
/// chain has been recorded. The whole exchange (resolution excepted) must
/// finish within `timeout`. The socket is closed on every path out.
pub(crate) fn connect(
    endpoint: &HostEndpoint,
    capturer: &Arc<InsecureChainCapturer>,
    timeout: Duration,
) -> Result<(), PinError> {
    let wrap = |source| PinError::Connection {
        endpoint: endpoint.to_string(),
        source,
    };

    let config = client_config(capturer).map_err(|e| wrap(ConnectionError::Tls(e)))?;
    let server_name = ServerName::try_from(endpoint.hostname().to_owned())
        .map_err(|_| PinError::InvalidEndpoint(endpoint.to_string()))?;
    let mut session =
        ClientConnection::new(config, server_name).map_err(|e| wrap(ConnectionError::Tls(e)))?;

    let deadline = Instant::now() + timeout;
    let mut tcp = open_socket(endpoint, deadline, timeout).map_err(wrap)?;
    debug!("TCP connection to {} established", endpoint);

    let outcome = drive_handshake(&mut session, &mut tcp, deadline, timeout);
    if outcome.is_ok() {
        debug!(
            "TLS handshake with {} complete ({:?})",
            endpoint,
            session.protocol_version()
        );
        session.send_close_notify();
        let _ = session.write_tls(&mut tcp);
    }
    let _ = tcp.shutdown(Shutdown::Both);
    drop(tcp);

    outcome.map_err(wrap)
}

fn client_config(capturer: &Arc<InsecureChainCapturer>) -> Result<Arc<ClientConfig>, rustls::Error> {
    let config = ClientConfig::builder_with_provider(capturer.provider())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(capturer.clone())
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Time left before `deadline`, or a timeout error once it has passed.
fn remaining(deadline: Instant, timeout: Duration) -> Result<Duration, ConnectionError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
        .ok_or(ConnectionError::Timeout(timeout))
}

fn open_socket(
    endpoint: &HostEndpoint,
    deadline: Instant,
    timeout: Duration,
) -> Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = (endpoint.hostname(), endpoint.port())
        .to_socket_addrs()
        .map_err(ConnectionError::Resolve)?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        let budget = remaining(deadline, timeout)?;
        debug!("connecting to {} (budget {:?})", addr, budget);
        match TcpStream::connect_timeout(&addr, budget) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    match last_err {
        Some(e) => Err(io_error(e, timeout)),
        None => Err(ConnectionError::NoAddress),
    }
}

/// Step the handshake one socket operation at a time.
///
/// The deadline is re-checked before every write and every read, so a peer
/// trickling bytes cannot stretch the handshake past `timeout`.
fn drive_handshake(
    session: &mut ClientConnection,
    tcp: &mut TcpStream,
    deadline: Instant,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    loop {
        flush_pending(session, tcp, deadline, timeout)?;
        if !session.is_handshaking() {
            return Ok(());
        }

        let budget = remaining(deadline, timeout)?;
        tcp.set_read_timeout(Some(budget)).map_err(ConnectionError::Io)?;
        let read = session.read_tls(tcp).map_err(|e| io_error(e, timeout))?;
        if read == 0 {
            return Err(ConnectionError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed the connection during the handshake",
            )));
        }

        if let Err(e) = session.process_new_packets() {
            // Best effort: let the peer see the alert rustls queued.
            let _ = session.write_tls(tcp);
            return Err(ConnectionError::Tls(e));
        }
    }
}

fn flush_pending(
    session: &mut ClientConnection,
    tcp: &mut TcpStream,
    deadline: Instant,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    while session.wants_write() {
        let budget = remaining(deadline, timeout)?;
        tcp.set_write_timeout(Some(budget)).map_err(ConnectionError::Io)?;
        session.write_tls(tcp).map_err(|e| io_error(e, timeout))?;
    }
    Ok(())
}

/// Classify an I/O failure from the socket or from rustls.
fn io_error(e: io::Error, timeout: Duration) -> ConnectionError {
    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
        return ConnectionError::Timeout(timeout);
    }
    match e.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) {
        Some(tls) => ConnectionError::Tls(tls.clone()),
        None => ConnectionError::Io(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one handshake on loopback with a leaf + CA chain; returns the
    /// address, the chain as sent and the server thread.
    fn one_shot_server() -> (SocketAddr, Vec<CertificateDer<'static>>, thread::JoinHandle<()>) {
        let ca_key = rcgen::KeyPair::generate().unwrap();
        let mut ca_params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let ca = ca_params.self_signed(&ca_key).unwrap();
        let leaf_key = rcgen::KeyPair::generate().unwrap();
        let leaf = rcgen::CertificateParams::new(vec!["127.0.0.1".to_string()])
            .unwrap()
            .signed_by(&leaf_key, &ca, &ca_key)
            .unwrap();
        let sent = vec![leaf.der().clone(), ca.der().clone()];

        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der()));
        let config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(sent.clone(), key)
        .unwrap();
        let config = Arc::new(config);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let mut conn = rustls::ServerConnection::new(config).unwrap();
            while conn.is_handshaking() {
                if conn.complete_io(&mut stream).is_err() {
                    return;
                }
            }
            let _ = conn.complete_io(&mut stream);
        });
        (addr, sent, handle)
    }

    #[test]
    fn connect_fills_the_capturer_before_returning() {
        let (addr, sent, server) = one_shot_server();
        let endpoint = HostEndpoint::new(addr.ip().to_string(), addr.port()).unwrap();
        let capturer = Arc::new(InsecureChainCapturer::new(false));
        connect(&endpoint, &capturer, DEFAULT_TIMEOUT).unwrap();
        server.join().unwrap();

        let captured = capturer.take_chain().unwrap();
        let ders: Vec<&[u8]> = captured.iter().map(|c| c.der.as_slice()).collect();
        let sent: Vec<&[u8]> = sent.iter().map(|c| &c[..]).collect();
        assert_eq!(ders, sent);
    }

    #[test]
    fn socket_timeouts_are_classified_as_timeouts() {
        let t = Duration::from_secs(3);
        for kind in [io::ErrorKind::WouldBlock, io::ErrorKind::TimedOut] {
            assert!(matches!(
                io_error(io::Error::from(kind), t),
                ConnectionError::Timeout(d) if d == t
            ));
        }
    }

    #[test]
    fn wrapped_rustls_errors_are_tls_errors() {
        let e = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::General("boom".into()),
        );
        assert!(matches!(
            io_error(e, DEFAULT_TIMEOUT),
            ConnectionError::Tls(rustls::Error::General(_))
        ));
    }

    #[test]
    fn other_io_errors_stay_io_errors() {
        let e = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(matches!(io_error(e, DEFAULT_TIMEOUT), ConnectionError::Io(_)));
    }

    #[test]
    fn expired_deadline_is_a_timeout() {
        let past = Instant::now() - Duration::from_millis(5);
        assert!(matches!(
            remaining(past, DEFAULT_TIMEOUT),
            Err(ConnectionError::Timeout(_))
        ));
        assert!(remaining(Instant::now() + Duration::from_secs(5), DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn refused_connection_is_a_connection_error() {
        // Bind then drop to find a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = HostEndpoint::new("127.0.0.1", port).unwrap();
        let capturer = Arc::new(InsecureChainCapturer::new(false));
        let err = connect(&endpoint, &capturer, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, PinError::Connection { .. }));
        assert!(capturer.take_chain().is_none());
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(10));
    }
}
