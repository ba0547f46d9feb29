use futures_util::{SinkExt, StreamExt};
use policy_protocol::{ValidatingPolicyStreamRequest, ValidatingPolicyStreamResponse};
use tokio_tungstenite::tungstenite::protocol::Message;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A bare-bones stand-in for a listener, used to drive sender-side tests
/// without depending on the listener crate's reconnect/heartbeat logic.
pub struct MockListenerClient {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
}

impl MockListenerClient {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = ws_stream.split();
        Ok(Self { write, read })
    }

    /// Send a registration request, as a real listener would on (re)connect.
    pub async fn register(&mut self, client_address: &str) -> Result<(), Box<dyn std::error::Error>> {
        let req = ValidatingPolicyStreamRequest {
            client_address: client_address.to_owned(),
        };
        let json = serde_json::to_string(&req)?;
        self.write.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Receive the next policy snapshot, skipping pings.
    pub async fn recv_snapshot(
        &mut self,
    ) -> Result<ValidatingPolicyStreamResponse, Box<dyn std::error::Error>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) => return Err("connection closed by sender".into()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err("connection stream ended".into()),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}
