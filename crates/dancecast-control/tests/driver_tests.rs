use dancecast_control::{
    ChannelDriver, CommandChannel, Connection, Connector, ConnectionState, ControlError, Result,
    IDLE_STATUS,
};
use dancecast_core::{MediaBackend, MediaError, MediaEvent, PlaybackController};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use url::Url;

const REGISTERED: &str = r#"{"type":"registered"}"#;
const REGISTER: &str = r#"{"type":"register","name":"Hall"}"#;

/// One scripted connection: frames delivered in order, then close unless kept open
struct Session {
    inbound: VecDeque<String>,
    stay_open: bool,
    connect_delay: Duration,
}

impl Session {
    fn new(frames: &[&str], stay_open: bool) -> Self {
        Self {
            inbound: frames.iter().map(|f| f.to_string()).collect(),
            stay_open,
            connect_delay: Duration::ZERO,
        }
    }

    /// Hold the connect attempt for `delay` before the socket opens
    fn slow(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

#[derive(Default)]
struct Script {
    sessions: VecDeque<Session>,
    sent: Vec<String>,
    connects: usize,
}

#[derive(Clone, Default)]
struct ScriptedConnector(Arc<Mutex<Script>>);

impl ScriptedConnector {
    fn with_sessions(sessions: Vec<Session>) -> Self {
        let connector = Self::default();
        connector.0.lock().sessions = sessions.into();
        connector
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
    session: Session,
}

impl Connector for ScriptedConnector {
    type Conn = ScriptedConnection;

    async fn connect(&mut self, _url: &Url) -> Result<ScriptedConnection> {
        let session = {
            let mut script = self.0.lock();
            script.connects += 1;
            script.sessions.pop_front()
        };
        match session {
            Some(session) => {
                if !session.connect_delay.is_zero() {
                    tokio::time::sleep(session.connect_delay).await;
                }
                Ok(ScriptedConnection {
                    script: self.0.clone(),
                    session,
                })
            }
            None => Err(ControlError::ConnectionLost("connection refused".to_string())),
        }
    }
}

impl Connection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.script.lock().sent.push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        tokio::task::yield_now().await;
        match self.session.inbound.pop_front() {
            Some(frame) => Some(Ok(frame)),
            None if self.session.stay_open => std::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) {
        self.session.stay_open = false;
    }
}

#[derive(Debug, Default)]
struct TestBackend {
    source: Option<String>,
    position: f64,
    seeks: Arc<Mutex<Vec<f64>>>,
}

impl MediaBackend for TestBackend {
    fn set_source(&mut self, url: Option<&str>) {
        self.source = url.map(str::to_string);
    }
    fn play(&mut self) -> std::result::Result<(), MediaError> {
        Ok(())
    }
    fn pause(&mut self) {}
    fn seek(&mut self, seconds: f64) {
        self.seeks.lock().push(seconds);
        self.position = seconds;
    }
    fn set_rate(&mut self, _rate: f64) {}
    fn position(&self) -> f64 {
        self.position
    }
    fn duration(&self) -> Option<f64> {
        None
    }
}

fn driver(connector: ScriptedConnector) -> ChannelDriver<ScriptedConnector, TestBackend> {
    driver_with(connector, TestBackend::default())
}

fn driver_with(
    connector: ScriptedConnector,
    backend: TestBackend,
) -> ChannelDriver<ScriptedConnector, TestBackend> {
    let channel = CommandChannel::new(
        Url::parse("ws://tv.local:8000/ws").unwrap(),
        "http://tv.local:8000",
        "Hall",
    );
    ChannelDriver::new(connector, channel, PlaybackController::new(backend))
}

#[tokio::test(start_paused = true)]
async fn test_forced_closes_reregister_once_per_connection() {
    let connector = ScriptedConnector::with_sessions(vec![
        Session::new(&[REGISTERED], false),
        Session::new(&[REGISTERED], false),
        Session::new(&[REGISTERED], false),
        Session::new(&[REGISTERED], true),
    ]);
    let script = connector.0.clone();
    let shutdown = Arc::new(Notify::new());
    let (_tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(driver(connector).run(rx, shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(20)).await;
    shutdown.notify_one();
    let driver = handle.await.unwrap();

    let script = script.lock();
    assert_eq!(script.connects, 4);
    assert_eq!(script.sent, vec![REGISTER.to_string(); 4]);
    assert_eq!(driver.channel().registrations(), 4);
    assert_eq!(driver.channel().state(), &ConnectionState::Shutdown);
    assert_eq!(driver.channel().status(), IDLE_STATUS);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_waits_for_fixed_delay() {
    let connector = ScriptedConnector::with_sessions(vec![
        Session::new(&[REGISTERED], false),
        Session::new(&[REGISTERED], true),
    ]);
    let script = connector.0.clone();
    let shutdown = Arc::new(Notify::new());
    let (_tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(driver(connector).run(rx, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(script.lock().connects, 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(script.lock().connects, 2);

    shutdown.notify_one();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_frames_and_media_events_share_one_loop() {
    let connector = ScriptedConnector::with_sessions(vec![Session::new(
        &[
            REGISTERED,
            r#"{"type":"LOAD","url":"/videos/a.mp4","loopStart":2,"loopEnd":4}"#,
            "garbage",
            r#"{"type":"STOP"}"#,
            r#"{"type":"SET_LOOP","a":1}"#,
            r#"{"type":"SEEK","time":3}"#,
        ],
        true,
    )]);
    let shutdown = Arc::new(Notify::new());
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(driver(connector).run(rx, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(MediaEvent::TimeUpdate { position: 4.2 }).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.notify_one();
    let driver = handle.await.unwrap();

    let backend = driver.controller().surface().backend();
    assert_eq!(backend.source.as_deref(), Some("http://tv.local:8000/videos/a.mp4"));
    assert_eq!(*backend.seeks.lock(), vec![3.0, 2.0]);
    assert_eq!(driver.channel().status(), "Playing");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_reconnect() {
    let connector = ScriptedConnector::default();
    let script = connector.0.clone();
    let shutdown = Arc::new(Notify::new());
    let (_tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(driver(connector).run(rx, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown.notify_one();
    let driver = handle.await.unwrap();

    assert_eq!(script.lock().connects, 1);
    assert!(!driver.channel().reconnect_scheduled());
    assert_eq!(driver.channel().state(), &ConnectionState::Shutdown);
    assert_eq!(
        driver.channel().status(),
        "Disconnected (Connection lost: connection refused). Reconnecting…"
    );
}

#[tokio::test(start_paused = true)]
async fn test_loop_corrected_while_reconnect_is_slow() {
    let connector = ScriptedConnector::with_sessions(vec![
        Session::new(
            &[
                REGISTERED,
                r#"{"type":"LOAD","url":"/videos/a.mp4","loopStart":2,"loopEnd":4}"#,
            ],
            false,
        ),
        Session::new(&[REGISTERED], true).slow(Duration::from_secs(8)),
    ]);
    let script = connector.0.clone();
    let backend = TestBackend::default();
    let seeks = backend.seeks.clone();
    let shutdown = Arc::new(Notify::new());
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(driver_with(connector, backend).run(rx, shutdown.clone()));

    // First session closed; the reconnect at 3 s is still waiting for the socket
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(script.lock().connects, 2);
    tx.send(MediaEvent::TimeUpdate { position: 4.5 }).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*seeks.lock(), vec![2.0]);

    // Shutdown abandons the pending connect instead of waiting it out
    shutdown.notify_one();
    let driver = handle.await.unwrap();
    assert_eq!(driver.channel().registrations(), 1);
    assert_eq!(driver.channel().state(), &ConnectionState::Shutdown);
    assert_eq!(driver.channel().status(), "Connecting…");
}
