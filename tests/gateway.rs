use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use procvisor::gateway::{Admission, Gateway, SECRET_HEADER};
use procvisor::{Supervisor, SupervisorConfig, SupervisorHandle, WorkerCommand};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SECRET: &str = "s3cret";
const TIMEOUT: Duration = Duration::from_secs(5);

const STOPPED: &str = r#"{"type":"STATUS","message":"stopped"}"#;
const STARTED: &str = r#"{"type":"STATUS","message":"started"}"#;
const UNAUTHORIZED: &str = r#"{"type":"ERROR","message":"Unauthorized"}"#;

struct Harness {
    addr: SocketAddr,
    supervisor: SupervisorHandle,
    stop: Option<oneshot::Sender<()>>,
}

impl Harness {
    async fn start(script: &str, secret: &str) -> Self {
        let cfg = SupervisorConfig::new(WorkerCommand::new("sh", ["-c", script]));
        let supervisor = Supervisor::spawn(cfg);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let gateway = Gateway::new(supervisor.clone(), Admission::new(secret));
        tokio::spawn(gateway.serve(listener, async {
            let _ = stopped.await;
        }));

        Self {
            addr,
            supervisor,
            stop: Some(stop),
        }
    }

    async fn connect_with_header(&self, secret: &str) -> Client {
        let mut req = format!("ws://{}/", self.addr).into_client_request().unwrap();
        req.headers_mut()
            .insert(SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
        let (ws, _) = tokio_tungstenite::connect_async(req).await.unwrap();
        ws
    }

    async fn connect_with_query(&self, secret: &str) -> Client {
        let url = format!("ws://{}/?secret={}", self.addr, secret);
        let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        ws
    }

    async fn connect_anonymous(&self) -> Client {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", self.addr))
            .await
            .unwrap();
        ws
    }

    async fn teardown(mut self) {
        self.supervisor.shutdown().await.unwrap();
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn next_text(ws: &mut Client) -> String {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send(ws: &mut Client, text: &str) {
    ws.send(Message::text(text)).await.unwrap();
}

async fn wait_members(sup: &SupervisorHandle, n: usize) {
    for _ in 0..100 {
        if sup.broadcaster().len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {n} members, found {}", sup.broadcaster().len());
}

#[tokio::test]
async fn missing_secret_is_rejected_and_closed() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut ws = h.connect_anonymous().await;

    assert_eq!(next_text(&mut ws).await, UNAUTHORIZED);
    let closing = tokio::time::timeout(TIMEOUT, ws.next()).await.unwrap();
    assert!(
        matches!(closing, Some(Ok(Message::Close(_))) | None | Some(Err(_))),
        "{closing:?}"
    );
    assert_eq!(h.supervisor.broadcaster().len(), 0);

    h.teardown().await;
}

#[tokio::test]
async fn wrong_secret_never_reaches_the_supervisor() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut ws = h.connect_with_header("nope").await;

    assert_eq!(next_text(&mut ws).await, UNAUTHORIZED);
    let _ = ws.send(Message::text("start")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snap = h.supervisor.snapshot().await.unwrap();
    assert_eq!(snap.pid, None);
    assert_eq!(h.supervisor.broadcaster().len(), 0);

    h.teardown().await;
}

#[tokio::test]
async fn admitted_connection_is_seeded_with_status() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut ws = h.connect_with_header(SECRET).await;
    assert_eq!(next_text(&mut ws).await, STOPPED);

    send(&mut ws, "status").await;
    assert_eq!(next_text(&mut ws).await, STOPPED);

    h.teardown().await;
}

#[tokio::test]
async fn secret_is_accepted_from_query_parameter() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut ws = h.connect_with_query(SECRET).await;
    assert_eq!(next_text(&mut ws).await, STOPPED);
    h.teardown().await;
}

#[tokio::test]
async fn empty_secret_admits_everyone() {
    let h = Harness::start("sleep 30", "").await;
    let mut ws = h.connect_anonymous().await;
    assert_eq!(next_text(&mut ws).await, STOPPED);
    h.teardown().await;
}

#[tokio::test]
async fn commands_and_output_reach_every_client() {
    let h = Harness::start("echo '  hello  '; sleep 30", SECRET).await;
    let mut a = h.connect_with_header(SECRET).await;
    let mut b = h.connect_with_header(SECRET).await;
    assert_eq!(next_text(&mut a).await, STOPPED);
    assert_eq!(next_text(&mut b).await, STOPPED);
    wait_members(&h.supervisor, 2).await;

    send(&mut a, "start").await;
    for ws in [&mut a, &mut b] {
        assert_eq!(next_text(ws).await, STARTED);
        assert_eq!(next_text(ws).await, r#"{"type":"LOG","message":"hello"}"#);
    }

    send(&mut b, "kill").await;
    assert_eq!(next_text(&mut a).await, STOPPED);
    assert_eq!(next_text(&mut b).await, STOPPED);

    h.teardown().await;
}

#[tokio::test]
async fn unknown_messages_are_ignored() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut ws = h.connect_with_header(SECRET).await;
    assert_eq!(next_text(&mut ws).await, STOPPED);

    send(&mut ws, "restart").await;
    send(&mut ws, "START").await;
    send(&mut ws, "status").await;
    assert_eq!(next_text(&mut ws).await, STOPPED);
    assert_eq!(h.supervisor.snapshot().await.unwrap().pid, None);

    h.teardown().await;
}

#[tokio::test]
async fn closed_client_leaves_the_connection_set() {
    let h = Harness::start("sleep 30", SECRET).await;
    let mut a = h.connect_with_header(SECRET).await;
    let mut b = h.connect_with_header(SECRET).await;
    assert_eq!(next_text(&mut a).await, STOPPED);
    assert_eq!(next_text(&mut b).await, STOPPED);
    wait_members(&h.supervisor, 2).await;

    a.close(None).await.unwrap();
    drop(a);
    wait_members(&h.supervisor, 1).await;

    send(&mut b, "status").await;
    assert_eq!(next_text(&mut b).await, STOPPED);

    h.teardown().await;
}
