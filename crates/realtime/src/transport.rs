//! Socket transport abstraction.
//!
//! The client only ever sees [`Frame`]s through a boxed sink/stream pair, so
//! the production WebSocket can be swapped for an in-memory socket in tests.

use crate::error::RealtimeError;
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use std::pin::Pin;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tracing::debug;

/// Application-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame.
    Text(String),
    /// A close frame with its status code, if the peer sent one.
    Close(Option<u16>),
}

/// Outbound half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = RealtimeError> + Send>>;
/// Inbound half of a connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, RealtimeError>> + Send>>;

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `url` and returns the split connection.
    ///
    /// # Errors
    /// Returns an error if the handshake fails.
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream), RealtimeError>;
}

/// Production connector on tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream), RealtimeError> {
        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| RealtimeError::Transport(e.to_string()))
            .with(|frame: Frame| future::ready(Ok::<_, RealtimeError>(to_message(frame))));

        // Pings are answered by tungstenite itself; binary frames are not part of the protocol.
        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.to_string()))),
                Ok(Message::Close(frame)) => Some(Ok(Frame::Close(frame.map(|f| u16::from(f.code))))),
                Ok(_) => None,
                Err(e) => Some(Err(RealtimeError::Transport(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Close(code) => Message::Close(code.map(|code| CloseFrame {
            code: CloseCode::from(code),
            reason: String::new().into(),
        })),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_frame_mapping() {
        match to_message(Frame::Close(Some(1000))) {
            Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1000),
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(matches!(to_message(Frame::Close(None)), Message::Close(None)));
    }

    #[test]
    fn test_text_frame_mapping() {
        match to_message(Frame::Text("{}".into())) {
            Message::Text(text) => assert_eq!(text.as_str(), "{}"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
