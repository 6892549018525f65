//! Async driver for the command channel
//!
//! Runs [`CommandChannel`] on tokio: performs its actions over a
//! [`Connector`], owns the cancelable reconnect timer and feeds media events
//! of the playback surface into the same loop, so commands and time updates
//! are applied one at a time. Connect attempts are polled by that loop too;
//! a slow or unreachable server never holds back loop corrections.

use crate::channel::{ChannelAction, ChannelEvent, CommandChannel};
use crate::{ControlError, Result};
use dancecast_core::{MediaBackend, MediaEvent, PlaybackController};
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use std::collections::VecDeque;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep, Sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

/// Upper bound for opening a socket
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens connections to the channel endpoint
pub trait Connector {
    /// Connection type produced
    type Conn: Connection + Send + 'static;

    /// Open a connection
    fn connect(&mut self, url: &Url) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// One open duplex text connection
pub trait Connection {
    /// Send a text frame
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Next text frame; `None` once the connection closed
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;

    /// Close the connection
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// WebSocket connector
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

/// WebSocket connection
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&mut self, url: &Url) -> Result<WsConnection> {
        let (stream, _response) =
            tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(url.as_str()))
                .await
                .map_err(|_| ControlError::ConnectionLost("connect timed out".to_string()))??;
        Ok(WsConnection { stream })
    }
}

impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!("Close frame received: {:?}", frame);
                    return None;
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Error while closing socket: {}", e);
        }
    }
}

/// Owns the channel, the controller and the live connection
pub struct ChannelDriver<C: Connector, B: MediaBackend> {
    connector: C,
    channel: CommandChannel,
    controller: PlaybackController<B>,
    connection: Option<C::Conn>,
    connecting: Option<BoxFuture<'static, Result<C::Conn>>>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl<C, B> ChannelDriver<C, B>
where
    C: Connector + Clone + Send + 'static,
    B: MediaBackend,
{
    /// Create a driver; nothing happens until [`run`](Self::run)
    pub fn new(connector: C, channel: CommandChannel, controller: PlaybackController<B>) -> Self {
        Self {
            connector,
            channel,
            controller,
            connection: None,
            connecting: None,
            reconnect: None,
        }
    }

    /// Run until `shutdown` is notified.
    ///
    /// `media_events` carries runtime events of the playback surface.
    pub async fn run(
        mut self,
        mut media_events: mpsc::UnboundedReceiver<MediaEvent>,
        shutdown: Arc<Notify>,
    ) -> Self {
        let actions = self.channel.start();
        self.perform(actions).await;
        let mut media_open = true;

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    let actions = self.channel.shutdown();
                    self.perform(actions).await;
                    break;
                }
                frame = next_frame(&mut self.connection) => {
                    match frame {
                        Some(Ok(text)) => self.feed(ChannelEvent::Message(text)).await,
                        Some(Err(e)) => {
                            self.feed(ChannelEvent::TransportError(e.to_string())).await;
                            self.connection = None;
                            self.feed(ChannelEvent::Closed { reason: e.to_string() }).await;
                        }
                        None => {
                            self.connection = None;
                            self.feed(ChannelEvent::Closed { reason: "connection closed".to_string() }).await;
                        }
                    }
                }
                opened = pending_connect(&mut self.connecting) => {
                    self.connecting = None;
                    match opened {
                        Ok(conn) => {
                            self.connection = Some(conn);
                            self.feed(ChannelEvent::Opened).await;
                        }
                        Err(e) => {
                            warn!("Could not connect to {}: {}", self.channel.endpoint(), e);
                            self.feed(ChannelEvent::Closed { reason: e.to_string() }).await;
                        }
                    }
                }
                _ = timer(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.feed(ChannelEvent::ReconnectTimerFired).await;
                }
                event = media_events.recv(), if media_open => {
                    match event {
                        Some(event) => self.controller.handle_media_event(event),
                        None => {
                            debug!("Media event stream ended");
                            media_open = false;
                        }
                    }
                }
            }
        }

        info!("Channel driver stopped");
        self
    }

    async fn feed(&mut self, event: ChannelEvent) {
        let actions = self.channel.handle(event, &mut self.controller);
        self.perform(actions).await;
    }

    async fn perform(&mut self, actions: Vec<ChannelAction>) {
        let mut work: VecDeque<ChannelAction> = actions.into();
        while let Some(action) = work.pop_front() {
            let follow_up = match action {
                ChannelAction::Connect(url) => {
                    let mut connector = self.connector.clone();
                    self.connecting =
                        Some(async move { connector.connect(&url).await }.boxed());
                    Vec::new()
                }
                ChannelAction::Send(text) => {
                    let sent = match self.connection.as_mut() {
                        Some(conn) => conn.send_text(text).await,
                        None => continue,
                    };
                    match sent {
                        Ok(()) => Vec::new(),
                        Err(e) => {
                            self.connection = None;
                            let mut actions = self.channel.handle(
                                ChannelEvent::TransportError(e.to_string()),
                                &mut self.controller,
                            );
                            actions.extend(self.channel.handle(
                                ChannelEvent::Closed {
                                    reason: e.to_string(),
                                },
                                &mut self.controller,
                            ));
                            actions
                        }
                    }
                }
                ChannelAction::ScheduleReconnect(delay) => {
                    self.reconnect = Some(Box::pin(sleep(delay)));
                    Vec::new()
                }
                ChannelAction::CancelReconnect => {
                    self.reconnect = None;
                    Vec::new()
                }
                ChannelAction::Close => {
                    if self.connecting.take().is_some() {
                        debug!("Connect attempt abandoned");
                    }
                    if let Some(mut conn) = self.connection.take() {
                        conn.close().await;
                    }
                    Vec::new()
                }
            };
            work.extend(follow_up);
        }
    }

    /// The channel state machine
    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    /// Mutable access to the channel, e.g. to pin the status text
    pub fn channel_mut(&mut self) -> &mut CommandChannel {
        &mut self.channel
    }

    /// The playback controller
    pub fn controller(&self) -> &PlaybackController<B> {
        &self.controller
    }

    /// Mutable access to the playback controller
    pub fn controller_mut(&mut self) -> &mut PlaybackController<B> {
        &mut self.controller
    }
}

async fn next_frame<T: Connection>(connection: &mut Option<T>) -> Option<Result<String>> {
    match connection {
        Some(conn) => conn.next_text().await,
        None => pending().await,
    }
}

async fn pending_connect<T>(connecting: &mut Option<BoxFuture<'static, Result<T>>>) -> Result<T> {
    match connecting {
        Some(attempt) => attempt.as_mut().await,
        None => pending().await,
    }
}

async fn timer(reconnect: &mut Option<Pin<Box<Sleep>>>) {
    match reconnect {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
