use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use message_board::{
    board::Board,
    config::BoardConfig,
    entry::EntryBody,
    store::{Entries, JsonStore},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, UdpSocket},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const IO_TIMEOUT: Duration = Duration::from_secs(3);

struct RunningBoard {
    web: SocketAddr,
    relay: SocketAddr,
    store: JsonStore,
    scratch: PathBuf,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl RunningBoard {
    async fn start() -> Result<Self> {
        let scratch = std::env::temp_dir().join(format!("message-board-it-{}", nanoid::nanoid!()));
        let config = BoardConfig {
            web_addr: "127.0.0.1:0".parse()?,
            relay_addr: "127.0.0.1:0".parse()?,
            store_path: scratch.join("storage").join("data.json"),
            assets_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        };

        let board = Board::bind(&config).await?;
        let web = board.web_addr()?;
        let relay = board.relay_addr()?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(board.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        Ok(Self {
            web,
            relay,
            store: JsonStore::new(&config.store_path),
            scratch,
            shutdown,
            task,
        })
    }

    async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        timeout(IO_TIMEOUT, self.task)
            .await
            .context("board did not shut down")???;
        let _ = std::fs::remove_dir_all(&self.scratch);
        Ok(())
    }

    async fn wait_for_entries(&self, count: usize) -> Result<Entries> {
        timeout(IO_TIMEOUT, async {
            loop {
                let entries = self.store.load().await?;
                if entries.len() >= count {
                    return Ok::<_, anyhow::Error>(entries);
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .context("timed out waiting for stored entries")?
    }
}

struct RawResponse {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }
}

async fn send_http(addr: SocketAddr, request: String) -> Result<RawResponse> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request.as_bytes()).await?;

    let mut raw = Vec::new();
    timeout(IO_TIMEOUT, stream.read_to_end(&mut raw))
        .await
        .context("timed out reading response")??;

    let split = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or_else(|| anyhow!("response has no header terminator"))?;
    let head = String::from_utf8(raw[..split].to_vec())?;
    let status = head
        .split_whitespace()
        .nth(1)
        .context("missing status code")?
        .parse()?;

    Ok(RawResponse {
        status,
        head,
        body: raw[split + 4..].to_vec(),
    })
}

async fn get(addr: SocketAddr, path: &str) -> Result<RawResponse> {
    send_http(
        addr,
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
    .await
}

async fn post_form(addr: SocketAddr, path: &str, body: &str) -> Result<RawResponse> {
    send_http(
        addr,
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
    .await
}

fn static_page(name: &str) -> Vec<u8> {
    std::fs::read(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static").join(name))
        .expect("bundled page")
}

#[tokio::test]
async fn submission_is_redirected_then_stored() -> Result<()> {
    let board = RunningBoard::start().await?;

    let response = post_form(board.web, "/message.html", "username=alice&message=hello+world").await?;
    assert_eq!(response.status, 302);
    assert_eq!(response.header("location"), Some("/"));

    let entries = board.wait_for_entries(1).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.values().next(),
        Some(&EntryBody {
            username: "alice".into(),
            message: "hello world".into(),
        })
    );

    board.stop().await
}

#[tokio::test]
async fn pages_and_not_found() -> Result<()> {
    let board = RunningBoard::start().await?;

    let root = get(board.web, "/").await?;
    assert_eq!(root.status, 200);
    assert_eq!(root.body, static_page("index.html"));

    let alias = get(board.web, "/message.html").await?;
    assert_eq!(alias.status, 200);
    assert_eq!(alias.body, root.body);

    let css = get(board.web, "/style.css").await?;
    assert_eq!(css.status, 200);
    assert_eq!(css.header("content-type"), Some("text/css"));

    let missing = get(board.web, "/does-not-exist").await?;
    assert_eq!(missing.status, 404);
    assert_eq!(missing.body, static_page("error.html"));

    board.stop().await
}

#[tokio::test]
async fn malformed_submission_is_rejected_and_nothing_is_stored() -> Result<()> {
    let board = RunningBoard::start().await?;

    let response = post_form(board.web, "/message.html", "username=alice").await?;
    assert_eq!(response.status, 400);

    // A valid follow-up proves the pipeline is healthy, and that it is the only entry.
    post_form(board.web, "/message.html", "username=bob&message=ok").await?;
    let entries = board.wait_for_entries(1).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.values().next().map(|b| b.username.as_str()), Some("bob"));

    board.stop().await
}

#[tokio::test]
async fn listener_keeps_running_after_garbage_datagrams() -> Result<()> {
    let board = RunningBoard::start().await?;

    let raw = UdpSocket::bind("127.0.0.1:0").await?;
    raw.send_to(b"missing the delimiter", board.relay).await?;
    raw.send_to(&[0xc3, 0x28], board.relay).await?;

    post_form(board.web, "/message.html", "username=carol&message=12%3A30+works").await?;
    let entries = board.wait_for_entries(1).await?;
    let body = entries.values().next().context("one entry")?;
    assert_eq!(body.username, "carol");
    assert_eq!(body.message, "12:30 works");

    board.stop().await
}
