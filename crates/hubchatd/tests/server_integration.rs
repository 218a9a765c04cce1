//! Integration tests for the TCP server.
//!
//! Each test starts a real `ChatServer` on a loopback port and talks to it
//! with plain `TcpStream`s, speaking the wire protocol byte for byte.
//!
//! Tests CAN use `.unwrap()` and `.expect()`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hubchatd::config::{HubConfig, SessionConfig};
use hubchatd::hub::{spawn_hub, HubHandle};
use hubchatd::server::ChatServer;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct TestServer {
    addr: SocketAddr,
    hub: HubHandle,
    cancel_token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(HubConfig::default(), SessionConfig::default()).await
    }

    async fn start_with(hub_config: HubConfig, session_config: SessionConfig) -> Self {
        let hub = spawn_hub(&hub_config);
        let cancel_token = CancellationToken::new();

        let server = ChatServer::bind("127.0.0.1:0", hub.clone(), session_config, cancel_token.clone())
            .await
            .expect("bind should succeed");
        let addr = server.local_addr().unwrap();

        let server = Arc::new(server);
        let task = tokio::spawn(async move {
            server.run().await.expect("server should run");
        });

        Self {
            addr,
            hub,
            cancel_token,
            task,
        }
    }

    async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        TestClient {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Connects and registers `handle`.
    async fn login(&self, handle: &str) -> TestClient {
        let mut client = self.connect().await;
        client.send(&format!("REG {handle}\n")).await;
        assert_eq!(client.line().await, "OK\n");
        client
    }

    /// Polls the hub until `handle` is no longer registered.
    async fn wait_until_gone(&self, handle: &str) {
        timeout(READ_TIMEOUT, async {
            loop {
                let users = self.hub.users().await.unwrap();
                if users.iter().all(|u| u.as_str() != handle) {
                    return;
                }
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .expect("client was never deregistered");
    }

    async fn stop(self) {
        self.cancel_token.cancel();
        timeout(READ_TIMEOUT, self.task)
            .await
            .expect("server should stop")
            .unwrap();
    }
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn send(&mut self, raw: &str) {
        self.send_bytes(raw.as_bytes()).await;
    }

    async fn send_bytes(&mut self, raw: &[u8]) {
        self.writer.write_all(raw).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        timeout(READ_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }

    /// A command/response round trip: after this returns, the hub has
    /// handled everything this client sent before it.
    async fn sync(&mut self) {
        self.send("USRS\n").await;
        let line = self.line().await;
        assert!(line.ends_with(" \n"), "unexpected USRS reply {line:?}");
    }

    async fn assert_silent(&mut self) {
        let mut buf = [0u8; 1];
        let read = timeout(Duration::from_millis(50), self.reader.read(&mut buf)).await;
        assert!(read.is_err(), "unexpected output");
    }
}

// ============================================================================
// Protocol Flow
// ============================================================================

#[tokio::test]
async fn test_register_and_duplicate() {
    let server = TestServer::start().await;

    let _alice = server.login("@alice").await;

    let mut imposter = server.connect().await;
    imposter.send("REG @alice\n").await;
    assert_eq!(imposter.line().await, "ERR username taken\n");

    imposter.send("REG @bob\n").await;
    assert_eq!(imposter.line().await, "OK\n");

    server.stop().await;
}

#[tokio::test]
async fn test_channel_message_to_three_members() {
    let server = TestServer::start().await;

    let mut alice = server.login("@alice").await;
    let mut bob = server.login("@bob").await;
    let mut carol = server.login("@carol").await;

    for client in [&mut alice, &mut bob, &mut carol] {
        client.send("JOIN #general\n").await;
        client.sync().await;
    }

    alice.send("SEND #general 5\r\nhello").await;

    assert_eq!(alice.line().await, "@alice: hello\n");
    assert_eq!(bob.line().await, "@alice: hello\n");
    assert_eq!(carol.line().await, "@alice: hello\n");

    server.stop().await;
}

#[tokio::test]
async fn test_direct_message() {
    let server = TestServer::start().await;

    let mut alice = server.login("@alice").await;
    let mut bob = server.login("@bob").await;

    alice.send("SEND @bob 5\r\nhello").await;
    assert_eq!(bob.line().await, "hello\n");

    alice.sync().await;
    alice.assert_silent().await;

    server.stop().await;
}

#[tokio::test]
async fn test_body_with_embedded_newlines() {
    let server = TestServer::start().await;

    let mut alice = server.login("@alice").await;
    alice.send("JOIN #room\n").await;
    alice.send("SEND #room 12\r\nline1\nline2\n").await;

    // Body bytes are delivered verbatim, newline included
    assert_eq!(alice.line().await, "@alice: line1\n");
    assert_eq!(alice.line().await, "line2\n");
    assert_eq!(alice.line().await, "\n");

    server.stop().await;
}

#[tokio::test]
async fn test_listings() {
    let server = TestServer::start().await;

    let mut bob = server.login("@bob").await;
    let _alice = server.login("@alice").await;

    bob.send("CHNS\n").await;
    assert_eq!(bob.line().await, "ERR no channels found\n");
    assert_eq!(bob.line().await, "\n");

    bob.send("JOIN #b\nJOIN #a\nCHNS\nUSRS\n").await;
    assert_eq!(bob.line().await, "#a , #b \n");
    assert_eq!(bob.line().await, "@alice , @bob \n");

    server.stop().await;
}

#[tokio::test]
async fn test_keyword_is_case_insensitive() {
    let server = TestServer::start().await;

    let mut client = server.connect().await;
    client.send("reg @lower\n").await;
    assert_eq!(client.line().await, "OK\n");

    server.stop().await;
}

// ============================================================================
// Disconnects
// ============================================================================

#[tokio::test]
async fn test_disconnect_releases_handle_and_memberships() {
    let server = TestServer::start().await;

    let mut alice = server.login("@alice").await;
    let mut bob = server.login("@bob").await;
    bob.send("JOIN #general\n").await;
    bob.sync().await;
    alice.send("JOIN #general\n").await;
    alice.sync().await;

    drop(bob);
    server.wait_until_gone("@bob").await;

    let members = server
        .hub
        .channel_members(hubchat_protocol::ChannelName::parse("#general").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].as_str(), "@alice");

    // The handle is free again
    let _new_bob = server.login("@bob").await;

    server.stop().await;
}

#[tokio::test]
async fn test_stop_does_not_drop_live_sessions() {
    let server = TestServer::start().await;
    let mut alice = server.login("@alice").await;

    let hub = server.hub.clone();
    server.stop().await;

    // Accepting has stopped, the existing session keeps working
    alice.send("USRS\n").await;
    assert_eq!(alice.line().await, "@alice \n");
    assert!(hub.is_connected());
}
