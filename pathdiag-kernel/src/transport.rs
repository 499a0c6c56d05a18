/**
 * SESSION TRANSPORT - Sonde courte sur la console telnet d'un node
 *
 * ROLE : Ouvre une session TCP, envoie une ligne vide (réveil du prompt),
 * attend, envoie la commande, attend encore puis récupère ce qui est déjà
 * bufferisé, sans attendre de prompt.
 *
 * Une sonde ne remonte jamais d'erreur : tout échec (connexion, écriture,
 * lecture, délai global) devient `ProbeResult::failed()`.
 * La session est fermée à la sortie de `probe`, quelle que soit l'issue.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Upper bound on what one drain keeps from a console that never stops talking.
pub const MAX_CAPTURE: usize = 64 * 1024;

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

/// Raw console capture. `success == false` always comes with empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    pub text: String,
}

impl ProbeResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { success: true, text: text.into() }
    }

    pub fn failed() -> Self {
        Self { success: false, text: String::new() }
    }
}

/// Timing knobs for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

#[async_trait]
pub trait ConsoleTransport: Send + Sync {
    /// Send `command` to the console at `host:port` and capture the output.
    async fn probe(&self, host: &str, port: u16, command: &str, settle: Duration) -> ProbeResult;
}

/// Telnet console transport over tokio TCP.
#[derive(Debug, Clone)]
pub struct TelnetTransport {
    connect_timeout: Duration,
}

impl TelnetTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Hard upper bound for a single probe.
    pub fn deadline(&self, settle: Duration) -> Duration {
        self.connect_timeout + settle * 2
    }

    async fn session(&self, host: &str, port: u16, command: &str, settle: Duration) -> io::Result<String> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;

        stream.write_all(b"\n").await?;
        sleep(settle).await;
        stream.write_all(format!("{command}\n").as_bytes()).await?;
        sleep(settle).await;

        let raw = self.drain(&stream)?;
        let _ = stream.shutdown().await;
        Ok(decode_console(&raw))
    }

    /// Take whatever is buffered right now, never wait for more.
    fn drain(&self, stream: &TcpStream) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        while out.len() < MAX_CAPTURE {
            match stream.try_read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}

impl Default for TelnetTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl ConsoleTransport for TelnetTransport {
    async fn probe(&self, host: &str, port: u16, command: &str, settle: Duration) -> ProbeResult {
        debug!("probing {}:{} with {:?}", host, port, command);
        match timeout(self.deadline(settle), self.session(host, port, command, settle)).await {
            Ok(Ok(text)) => {
                debug!("{}:{} answered {} bytes", host, port, text.len());
                ProbeResult::ok(text)
            }
            Ok(Err(e)) => {
                debug!("probe {}:{} failed: {}", host, port, e);
                ProbeResult::failed()
            }
            Err(_) => {
                debug!("probe {}:{} exceeded its deadline", host, port);
                ProbeResult::failed()
            }
        }
    }
}

/// Strip telnet option negotiation and NUL padding, then decode lossily.
pub fn decode_console(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        if byte != IAC {
            if byte != 0 {
                out.push(byte);
            }
            i += 1;
            continue;
        }
        match raw.get(i + 1).copied() {
            Some(IAC) => {
                out.push(IAC);
                i += 2;
            }
            Some(WILL..=DONT) => i += 3,
            Some(SB) => {
                i += 2;
                while i < raw.len() && !(raw[i] == IAC && raw.get(i + 1) == Some(&SE)) {
                    i += 1;
                }
                i += 2;
            }
            Some(_) => i += 2,
            None => i += 1,
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
