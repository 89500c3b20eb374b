use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use config::{Policy, Settings};
use futures::{SinkExt as _, StreamExt as _};
use mediakeys_engine::{Engine, FocusSignal, SinkSet, test_support::FixedFocus};
use mediakeys_protocol::{
    Command, MediaKey, Msg, Role, Source, StatusReport,
    codec::{decode, encode, frame_codec},
};
use mediakeysd::{
    client,
    hosts::HostRegistry,
    osascript::ScriptRunner,
    server::{ControlServer, Shared},
    sinks::{BrowserTabSink, ExtensionSink},
    site,
};
use tokio::{
    net::UnixStream,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_util::{
    codec::{Framed, LengthDelimitedCodec},
    sync::CancellationToken,
};

const WAIT: Duration = Duration::from_secs(5);

/// Never finds a tab.
struct NoBrowsers;

impl ScriptRunner for NoBrowsers {
    fn run(&self, _script: &str) -> Result<String, String> {
        Err("no browsers in tests".into())
    }
}

struct Daemon {
    engine: Engine,
    cancel: CancellationToken,
    task: JoinHandle<mediakeysd::Result<()>>,
    _dir: tempfile::TempDir,
    socket: PathBuf,
}

fn start() -> Daemon {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("run").join("mediakeyd.sock");
    let hosts = HostRegistry::new();
    let bandcamp = ExtensionSink::new(
        hosts.clone(),
        BrowserTabSink::new(&site::BANDCAMP, vec!["Safari".into()], Arc::new(NoBrowsers)),
    );
    let sinks = SinkSet::new().with(Source::Bandcamp, Arc::new(bandcamp));
    let engine = Engine::new(
        &Policy::default(),
        true,
        FixedFocus::new(FocusSignal::Neither),
        sinks,
    )
    .unwrap();
    let shared = Arc::new(Shared::new(
        engine.clone(),
        hosts,
        Settings::default(),
        dir.path().join("config.ron"),
    ));
    let server = ControlServer::bind(&socket, shared).unwrap();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(server.run(cancel.clone()));
    Daemon {
        engine,
        cancel,
        task,
        _dir: dir,
        socket,
    }
}

async fn host(socket: &Path) -> Framed<UnixStream, LengthDelimitedCodec> {
    let stream = UnixStream::connect(socket).await.unwrap();
    let mut conn = Framed::new(stream, frame_codec());
    conn.send(encode(&Msg::Hello { role: Role::Host }).unwrap())
        .await
        .unwrap();
    conn
}

async fn status(socket: &Path) -> StatusReport {
    match client::request(socket, &Msg::Status).await.unwrap() {
        Msg::StatusReport(r) => r,
        other => panic!("unexpected reply {other:?}"),
    }
}

async fn wait_for(socket: &Path, pred: impl Fn(&StatusReport) -> bool) -> StatusReport {
    timeout(WAIT, async {
        loop {
            let r = status(socket).await;
            if pred(&r) {
                return r;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn extension_round_trip() {
    let d = start();
    let mut h = host(&d.socket).await;
    h.send(
        encode(&Msg::Observation {
            source: Source::Bandcamp,
            available: true,
            playing: true,
        })
        .unwrap(),
    )
    .await
    .unwrap();
    wait_for(&d.socket, |r| {
        r.hosts == 1 && r.sources[Source::Bandcamp.index()].playing
    })
    .await;

    let reply = client::request(
        &d.socket,
        &Msg::Press {
            key: MediaKey::PlayPause,
        },
    )
    .await
    .unwrap();
    let Msg::StatusReport(r) = reply else {
        panic!("unexpected reply {reply:?}");
    };
    assert_eq!(r.last_target, Some(Source::Bandcamp));

    let frame = timeout(WAIT, h.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(
        decode::<Msg>(&frame).unwrap(),
        Msg::Action {
            action: Command::TogglePlayPause
        }
    );
    assert_eq!(d.engine.history().last_confirmed_success_at, None);

    h.send(
        encode(&Msg::CommandResult {
            source: Source::Bandcamp,
            success: true,
            message: None,
        })
        .unwrap(),
    )
    .await
    .unwrap();
    wait_for(&d.socket, |r| r.last_success_ms_ago.is_some()).await;

    drop(h);
    wait_for(&d.socket, |r| r.hosts == 0).await;

    d.cancel.cancel();
    d.task.await.unwrap().unwrap();
    assert!(!d.socket.exists());
}

#[tokio::test]
async fn toggle_over_the_socket() {
    let d = start();
    let Msg::StatusReport(r) = client::request(&d.socket, &Msg::Toggle).await.unwrap() else {
        panic!("expected status");
    };
    assert!(!r.enabled);
    assert!(!d.engine.is_enabled());

    let Msg::StatusReport(r) = client::request(&d.socket, &Msg::Press { key: MediaKey::Next })
        .await
        .unwrap()
    else {
        panic!("expected status");
    };
    assert_eq!(r.last_target, None);
    d.cancel.cancel();
    d.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn peers_must_say_hello() {
    let d = start();
    let stream = UnixStream::connect(&d.socket).await.unwrap();
    let mut conn = Framed::new(stream, frame_codec());
    conn.send(encode(&Msg::Status).unwrap()).await.unwrap();
    let frame = timeout(WAIT, conn.next()).await.unwrap().unwrap().unwrap();
    assert!(matches!(decode::<Msg>(&frame).unwrap(), Msg::Error { .. }));
    d.cancel.cancel();
    d.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn socket_is_rebindable_after_shutdown() {
    let d = start();
    d.cancel.cancel();
    d.task.await.unwrap().unwrap();
    assert!(!d.socket.exists());
    let engine = d.engine.clone();
    let shared = Arc::new(Shared::new(
        engine,
        HostRegistry::new(),
        Settings::default(),
        d.socket.with_file_name("config.ron"),
    ));
    let again = ControlServer::bind(&d.socket, shared).unwrap();
    drop(again);
    assert!(!d.socket.exists());
}
