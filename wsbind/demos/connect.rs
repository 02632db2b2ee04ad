//! Connect Demo
//!
//! Performs one WebSocket upgrade against the URI given on the command line
//! and prints what the server negotiated.
//!
//! ```text
//! cargo run -p wsbind --example connect -- ws://127.0.0.1:9000/ws chat
//! ```

use wsbind::prelude::*;

struct Printer;

impl WebSocketListener for Printer {
    fn capability(&self) -> MessageCapability {
        MessageCapability::TextAndBinary
    }

    fn on_handshake(
        &mut self,
        request: &HandshakeRequestView,
        response: &HandshakeResponseView,
    ) -> std::result::Result<(), String> {
        println!("GET {} -> {} {}", request.uri(), response.status(), response.reason());
        Ok(())
    }

    fn on_open(&mut self) {
        println!("Connection upgraded");
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let target = args
        .next()
        .unwrap_or_else(|| "ws://127.0.0.1:9000/ws".to_string());
    let template = args.fold(
        UpgradeRequestTemplate::new().timeout(Duration::from_secs(5)),
        |template, protocol| template.sub_protocol(protocol),
    );

    let client = WebSocketClient::builder()
        .with_tcp()
        .idle_timeout(Some(Duration::from_secs(30)))
        .build()?;

    let session = client
        .connect(Some(&template), &target, &ListenerHandlerFactory, Printer)
        .await?;

    println!("Sub-protocol: {:?}", session.subprotocol());
    for extension in session.extensions() {
        println!("Extension: {}", extension);
    }
    Ok(())
}
