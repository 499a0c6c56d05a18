/*!
Consoles simulées pour tester sans serveur GNS3

- `MockConsoleServer` : vrai listener TCP local qui répond aux commandes
  scriptées et enregistre tout ce qu'il reçoit.
- `ScriptedTransport` : implémentation en mémoire de `ConsoleTransport`,
  réponses par endpoint et compteur d'appels.
*/

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use pathdiag_kernel::{ConsoleEndpoint, ConsoleTransport, ProbeResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// IAC WILL ECHO, IAC WILL SUPPRESS-GO-AHEAD: what VPCS sends on connect.
const TELNET_GREETING: &[u8] = &[255, 251, 1, 255, 251, 3];

/// Behaviour of a simulated console.
#[derive(Debug, Clone)]
pub struct ConsoleScript {
    prompt: String,
    replies: HashMap<String, String>,
    negotiate: bool,
    silent: bool,
}

impl ConsoleScript {
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            replies: HashMap::new(),
            negotiate: false,
            silent: false,
        }
    }

    /// Réponse à une commande exacte
    pub fn reply<C: Into<String>, R: Into<String>>(mut self, command: C, output: R) -> Self {
        self.replies.insert(command.into(), output.into());
        self
    }

    /// Envoie une négociation telnet à la connexion
    pub fn with_negotiation(mut self) -> Self {
        self.negotiate = true;
        self
    }

    /// Accepte la connexion mais ne répond jamais
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Console telnet locale sur 127.0.0.1, port éphémère
pub struct MockConsoleServer {
    port: u16,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockConsoleServer {
    pub async fn start(script: ConsoleScript) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let task = {
            let received = received.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let script = script.clone();
                    let received = received.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve(socket, script, received).await {
                            log::debug!("[MOCK] console session ended: {}", e);
                        }
                    });
                }
            })
        };

        log::info!("📟 [MOCK] console listening on 127.0.0.1:{}", port);
        Ok(Self { port, received, connections, task })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> ConsoleEndpoint {
        ConsoleEndpoint { host: "127.0.0.1".into(), port: self.port }
    }

    /// Commandes non vides reçues, dans l'ordre
    pub fn received_commands(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockConsoleServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: TcpStream, script: ConsoleScript, received: Arc<Mutex<Vec<String>>>) -> Result<()> {
    let (reader, mut writer) = socket.into_split();
    if script.negotiate {
        writer.write_all(TELNET_GREETING).await?;
    }

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim_end_matches('\r').trim().to_string();
        if !command.is_empty() {
            received.lock().push(command.clone());
        }
        if script.silent {
            continue;
        }

        let mut out = String::new();
        if !command.is_empty() {
            out.push_str(&command);
            out.push('\n');
            match script.replies.get(&command) {
                Some(reply) => out.push_str(reply),
                None => out.push_str("Bad command"),
            }
            out.push('\n');
        }
        out.push_str(&script.prompt);
        writer.write_all(out.as_bytes()).await?;
    }
    Ok(())
}

/// `ConsoleTransport` en mémoire : réponse par (host, port), échec sinon
#[derive(Default)]
pub struct ScriptedTransport {
    answers: HashMap<(String, u16), ProbeResult>,
    calls: AtomicUsize,
    log: Mutex<Vec<(String, u16, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, endpoint: &ConsoleEndpoint, result: ProbeResult) -> Self {
        self.answers.insert((endpoint.host.clone(), endpoint.port), result);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ports sondés, dans l'ordre
    pub fn probed_ports(&self) -> Vec<u16> {
        self.log.lock().iter().map(|(_, port, _)| *port).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().iter().map(|(_, _, cmd)| cmd.clone()).collect()
    }
}

#[async_trait]
impl ConsoleTransport for ScriptedTransport {
    async fn probe(&self, host: &str, port: u16, command: &str, _settle: Duration) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push((host.to_string(), port, command.to_string()));
        self.answers
            .get(&(host.to_string(), port))
            .cloned()
            .unwrap_or_else(ProbeResult::failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathdiag_kernel::TelnetTransport;

    #[tokio::test]
    async fn test_mock_console_answers_scripted_command() {
        let server = MockConsoleServer::start(
            ConsoleScript::new("PC1> ")
                .with_negotiation()
                .reply("show ip", "IP/MASK     : 10.0.0.2/24\nGATEWAY     : 10.0.0.1"),
        )
        .await
        .unwrap();

        let transport = TelnetTransport::new(Duration::from_secs(1));
        let result = transport
            .probe("127.0.0.1", server.port(), "show ip", Duration::from_millis(50))
            .await;

        assert!(result.success);
        assert!(result.text.contains("GATEWAY     : 10.0.0.1"));
        assert!(!result.text.contains('\u{fffd}'));
        assert_eq!(server.received_commands(), vec!["show ip"]);
        assert_eq!(server.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_transport_counts_and_defaults_to_failure() {
        let known = ConsoleEndpoint { host: "10.0.0.9".into(), port: 5001 };
        let transport = ScriptedTransport::new().answer(&known, ProbeResult::ok("hello"));

        let hit = transport.probe("10.0.0.9", 5001, "show ip", Duration::ZERO).await;
        let miss = transport.probe("10.0.0.9", 5002, "show ip", Duration::ZERO).await;

        assert_eq!(hit, ProbeResult::ok("hello"));
        assert_eq!(miss, ProbeResult::failed());
        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.probed_ports(), vec![5001, 5002]);
    }
}
