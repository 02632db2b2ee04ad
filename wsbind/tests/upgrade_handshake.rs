#![cfg(all(feature = "client", feature = "transport-tcp", feature = "tokio-runtime"))]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing_test::traced_test;
use wsbind::client::{ListenerHandlerFactory, WebSocketClient, WebSocketListener};
use wsbind::prelude::*;
use wsbind::transport::mock::{accept_response, read_head, MockConnector, MockEndpoint};

#[derive(Clone, Default)]
struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct ChatListener {
    events: Events,
}

impl WebSocketListener for ChatListener {
    fn capability(&self) -> MessageCapability {
        MessageCapability::Text
    }

    fn on_handshake(
        &mut self,
        request: &HandshakeRequestView,
        response: &HandshakeResponseView,
    ) -> std::result::Result<(), String> {
        self.events.push(format!(
            "handshake:{}:{}",
            request.uri().path(),
            response.subprotocol().unwrap_or("-")
        ));
        Ok(())
    }

    fn on_open(&mut self) {
        self.events.push("open");
    }

    fn on_text(&mut self, text: &str) {
        self.events.push(format!("text:{text}"));
    }
}

fn scenario_template() -> UpgradeRequestTemplate {
    UpgradeRequestTemplate::new()
        .header("X-Test", "1")
        .cookie(Cookie::new("a", "b"))
        .sub_protocol("chat")
        .timeout(Duration::from_millis(5000))
}

async fn tcp_client() -> (WebSocketClient, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = WebSocketClient::builder()
        .with_tcp()
        .user_agent("wsbind-tests")
        .build()
        .unwrap();
    (client, listener)
}

#[tokio::test]
#[traced_test]
async fn test_scenario_over_loopback_tcp() {
    let (client, listener) = tcp_client().await;
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let head = read_head(&mut socket).await.unwrap();
        let mut response =
            accept_response(&head, &[("Sec-WebSocket-Protocol", "chat")]).into_bytes();
        response.extend_from_slice(b"frame-bytes");
        socket.write_all(&response).await.unwrap();
        (head, socket)
    });

    let events = Events::default();
    let listener = ChatListener {
        events: events.clone(),
    };
    let target = format!("ws://{}/ws", addr);
    let mut session = client
        .connect(Some(&scenario_template()), &target, &ListenerHandlerFactory, listener)
        .await
        .unwrap();
    let (head, _socket) = server.await.unwrap();

    assert!(head.starts_with("GET /ws HTTP/1.1\r\n"));
    assert!(head.contains("x-test: 1\r\n"));
    assert!(head.contains("Cookie: a=b\r\n"));
    assert!(head.contains("Sec-WebSocket-Protocol: chat\r\n"));
    assert!(head.contains("user-agent: wsbind-tests\r\n"));

    assert_eq!(session.subprotocol(), Some("chat"));
    assert_eq!(session.request_view().sub_protocols(), &["chat"]);
    assert_eq!(events.all(), vec!["handshake:/ws:chat", "open"]);

    session.dispatch(Message::Text("hello".into())).unwrap();
    assert_eq!(events.all().last().map(String::as_str), Some("text:hello"));

    let mut endpoint = session.handler_mut().take_endpoint().unwrap();
    let mut buf = [0u8; 11];
    let mut read = 0;
    while read < buf.len() {
        read += endpoint.read(&mut buf[read..]).await.unwrap();
    }
    assert_eq!(&buf, b"frame-bytes");

    #[cfg(feature = "logging")]
    assert!(logs_contain("completed"));
}

#[tokio::test]
async fn test_scenario_request_for_secure_target() {
    let client = WebSocketClient::new(MockConnector::default());
    let upgrade = client
        .upgrade_request(
            Some(&scenario_template()),
            "wss://host/ws",
            &ListenerHandlerFactory,
            ChatListener {
                events: Events::default(),
            },
        )
        .unwrap();

    let view = upgrade.request_view();
    assert!(view.is_secure());
    assert_eq!(view.header("X-Test"), Some("1"));
    assert_eq!(view.cookies(), vec![Cookie::new("a", "b")]);
    assert_eq!(view.sub_protocols(), &["chat"]);
    assert_eq!(view.timeout(), Duration::from_millis(5000));
}

#[tokio::test]
async fn test_tcp_connector_refuses_tls_targets() {
    let (client, _listener) = tcp_client().await;
    let events = Events::default();

    let err = client
        .connect(
            None,
            "wss://127.0.0.1:1/ws",
            &ListenerHandlerFactory,
            ChatListener {
                events: events.clone(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::UnsupportedScheme(_))
    ));
    assert!(events.all().is_empty());
}

#[tokio::test]
async fn test_non_101_over_tcp_is_rejected() {
    let (client, listener) = tcp_client().await;
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_head(&mut socket).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
        socket
    });

    let events = Events::default();
    let err = client
        .connect(
            Some(&scenario_template()),
            &format!("ws://{}/missing", addr),
            &ListenerHandlerFactory,
            ChatListener {
                events: events.clone(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HandshakeRejected(RejectReason::UnexpectedStatus(404))
    ));
    assert!(events.all().is_empty());
}

#[tokio::test]
async fn test_unoffered_subprotocol_is_rejected() {
    let (endpoint, mut peer) = MockEndpoint::pair(4096);
    let probe = endpoint.probe();
    let client = WebSocketClient::new(MockConnector::new(endpoint));

    tokio::spawn(async move {
        let head = read_head(&mut peer).await.unwrap();
        let response = accept_response(&head, &[("Sec-WebSocket-Protocol", "superchat")]);
        peer.write_all(response.as_bytes()).await.unwrap();
        peer
    });

    let events = Events::default();
    let err = client
        .connect(
            Some(&scenario_template()),
            "ws://host/ws",
            &ListenerHandlerFactory,
            ChatListener {
                events: events.clone(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HandshakeRejected(RejectReason::UnofferedSubprotocol(ref p)) if p == "superchat"
    ));
    assert!(events.all().is_empty());
    assert!(probe.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_response_after_timeout() {
    let (endpoint, mut peer) = MockEndpoint::pair(4096);
    let probe = endpoint.probe();
    let client = WebSocketClient::new(MockConnector::new(endpoint));

    let server = tokio::spawn(async move {
        let head = read_head(&mut peer).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5500)).await;
        let _ = peer.write_all(accept_response(&head, &[]).as_bytes()).await;
    });

    let events = Events::default();
    let err = client
        .connect(
            Some(&scenario_template()),
            "ws://host/ws",
            &ListenerHandlerFactory,
            ChatListener {
                events: events.clone(),
            },
        )
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(err.is_timeout());
    assert!(probe.is_closed());
    assert!(events.all().is_empty());
}

#[tokio::test]
async fn test_cancel_handle_aborts_tcp_handshake() {
    let (client, listener) = tcp_client().await;
    let addr = listener.local_addr().unwrap();
    let events = Events::default();

    let upgrade = client
        .upgrade_request(
            None,
            &format!("ws://{}/ws", addr),
            &ListenerHandlerFactory,
            ChatListener {
                events: events.clone(),
            },
        )
        .unwrap();
    let cancel = upgrade.cancel_handle();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_head(&mut socket).await.unwrap();
        cancel.cancel();
        socket
    });

    let err = upgrade.send().await.unwrap_err();
    let _socket = server.await.unwrap();

    assert!(err.is_cancelled());
    assert!(events.all().is_empty());
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_template_loaded_from_json() {
    let template: UpgradeRequestTemplate = serde_json::from_str(
        r#"{
            "headers": [["X-Test", ["1"]]],
            "cookies": [{"name": "a", "value": "b"}],
            "sub_protocols": ["chat"],
            "timeout": {"secs": 5, "nanos": 0}
        }"#,
    )
    .unwrap();

    let client = WebSocketClient::new(MockConnector::default());
    let upgrade = client
        .upgrade_request(
            Some(&template),
            "wss://host/ws",
            &ListenerHandlerFactory,
            ChatListener {
                events: Events::default(),
            },
        )
        .unwrap();

    assert_eq!(upgrade.request_view().header("x-test"), Some("1"));
    assert_eq!(upgrade.request_view().timeout(), Duration::from_secs(5));
}
