//! libssh2-backed implementation of the SSH capability

use crate::{ConnectParams, SshChannel, SshError, SshLibrary, SshSession};
use ssh2::{CheckResult, DisconnectCode, KnownHostFileKind, KnownHosts, Session};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::OnceLock;
use tracing::debug;

/// Process-wide outcome of the one-time libssh2 initialisation
static LIBSSH2: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialise libssh2 once per process.
///
/// The first call performs the initialisation and probes that a session can
/// be allocated; every later call returns the recorded outcome.
pub fn load_libssh2() -> Result<(), SshError> {
    LIBSSH2
        .get_or_init(|| {
            ssh2::init();
            match Session::new() {
                Ok(_) => {
                    debug!("libssh2 initialised");
                    Ok(())
                }
                Err(e) => Err(format!("cannot allocate libssh2 session: {}", e)),
            }
        })
        .clone()
        .map_err(SshError::Unavailable)
}

/// Read the configured known_hosts file into a fresh collection
fn load_known_hosts(session: &Session, params: &ConnectParams) -> Result<KnownHosts, SshError> {
    let mut known_hosts = session.known_hosts()?;
    known_hosts
        .read_file(&params.known_hosts, KnownHostFileKind::OpenSSH)
        .map_err(|e| SshError::KnownHosts {
            host: params.host.clone(),
            port: params.port,
            message: format!("{}: {}", params.known_hosts.display(), e),
        })?;
    Ok(known_hosts)
}

/// Map a known_hosts lookup onto the host key verdict
fn host_key_status(result: CheckResult, params: &ConnectParams) -> Result<(), SshError> {
    match result {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(SshError::HostKeyUnknown {
            host: params.host.clone(),
            port: params.port,
        }),
        CheckResult::Mismatch => Err(SshError::HostKeyMismatch {
            host: params.host.clone(),
            port: params.port,
        }),
        CheckResult::Failure => Err(SshError::KnownHosts {
            host: params.host.clone(),
            port: params.port,
            message: "lookup failed".to_string(),
        }),
    }
}

/// The libssh2 capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Libssh2;

/// A libssh2 channel that remembers whether we already closed it
pub struct Libssh2Channel {
    inner: ssh2::Channel,
    closed: bool,
}

impl Libssh2Channel {
    fn new(inner: ssh2::Channel) -> Self {
        Self { inner, closed: false }
    }
}

impl Read for Libssh2Channel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for Libssh2Channel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl SshChannel for Libssh2Channel {
    fn is_open(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) -> Result<(), SshError> {
        self.closed = true;
        self.inner.close()?;
        Ok(())
    }
}

impl SshSession for Session {
    fn disconnect(&mut self) -> Result<(), SshError> {
        Session::disconnect(self, Some(DisconnectCode::ByApplication), "closing", None)?;
        Ok(())
    }
}

impl SshLibrary for Libssh2 {
    type Session = Session;
    type Channel = Libssh2Channel;

    fn load(&self) -> Result<(), SshError> {
        load_libssh2()
    }

    fn connect(&self, params: &ConnectParams) -> Result<Session, SshError> {
        let addrs = (params.host.as_str(), params.port)
            .to_socket_addrs()
            .map_err(|source| SshError::Connect {
                host: params.host.clone(),
                port: params.port,
                source,
            })?;

        let mut last_error = None;
        let mut stream = None;
        for addr in addrs {
            let attempt = if params.timeout.is_zero() {
                TcpStream::connect(addr)
            } else {
                TcpStream::connect_timeout(&addr, params.timeout)
            };
            match attempt {
                Ok(tcp) => {
                    stream = Some(tcp);
                    break;
                }
                Err(e) => {
                    debug!("Connecting to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        let tcp = match (stream, last_error) {
            (Some(tcp), _) => tcp,
            (None, Some(source)) => {
                return Err(SshError::Connect {
                    host: params.host.clone(),
                    port: params.port,
                    source,
                })
            }
            (None, None) => {
                return Err(SshError::Resolve {
                    host: params.host.clone(),
                    port: params.port,
                })
            }
        };

        let mut session = Session::new()?;
        // libssh2 treats 0 as no timeout
        session.set_timeout(u32::try_from(params.timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session.handshake()?;

        debug!("SSH handshake with {}:{} complete", params.host, params.port);
        Ok(session)
    }

    fn verify_host_key(
        &self,
        session: &mut Session,
        params: &ConnectParams,
    ) -> Result<(), SshError> {
        let (key, _) = session.host_key().ok_or_else(|| SshError::MissingHostKey {
            host: params.host.clone(),
            port: params.port,
        })?;

        let known_hosts = load_known_hosts(session, params)?;
        host_key_status(known_hosts.check_port(&params.host, params.port, key), params)
    }

    fn authenticate(&self, session: &mut Session, params: &ConnectParams) -> Result<(), SshError> {
        let result =
            session.userauth_pubkey_file(&params.username, None, &params.private_key, None);
        if let Err(e) = result {
            debug!("Public key authentication as {} failed: {}", params.username, e);
            return Err(SshError::Authentication {
                user: params.username.clone(),
            });
        }

        if !session.authenticated() {
            return Err(SshError::Authentication {
                user: params.username.clone(),
            });
        }

        Ok(())
    }

    fn open_channel(&self, session: &mut Session) -> Result<Libssh2Channel, SshError> {
        let channel = session.channel_session()?;
        Ok(Libssh2Channel::new(channel))
    }

    fn request_subsystem(&self, channel: &mut Libssh2Channel, name: &str) -> Result<(), SshError> {
        channel.inner.subsystem(name).map_err(|e| SshError::Subsystem {
            name: name.to_string(),
            message: e.message().to_string(),
        })
    }
}
