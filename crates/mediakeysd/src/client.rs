//! One-shot control socket client used by the CLI subcommands.

use std::{fmt::Write as _, path::Path};

use futures::{SinkExt as _, StreamExt as _};
use mediakeys_protocol::{
    Msg, Role, StatusReport,
    codec::{decode, encode, frame_codec},
};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::{Error, Result};

/// Connect to the daemon at `socket`, send `request` and return the reply.
pub async fn request(socket: &Path, request: &Msg) -> Result<Msg> {
    let stream = UnixStream::connect(socket).await.map_err(|e| {
        Error::Ipc(format!(
            "cannot connect to {} ({}); is mediakeysd running?",
            socket.display(),
            e
        ))
    })?;
    let mut conn = Framed::new(stream, frame_codec());
    conn.send(encode(&Msg::Hello { role: Role::Cli })?).await?;
    conn.send(encode(request)?).await?;
    match conn.next().await {
        Some(frame) => Ok(decode(&frame?)?),
        None => Err(Error::Ipc("daemon closed the connection".into())),
    }
}

/// Human-readable status table.
pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    let ms = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| format!("{v}ms ago"));
    writeln!(
        out,
        "capture: {}",
        if report.enabled { "enabled" } else { "disabled" }
    )
    .ok();
    for s in &report.sources {
        writeln!(
            out,
            "  {:<9} available={:<5} playing={:<5} observed={}",
            s.source.as_str(),
            s.available,
            s.playing,
            ms(s.age_ms)
        )
        .ok();
    }
    writeln!(
        out,
        "last target: {} (dispatched {}, confirmed {})",
        report.last_target.map_or("-", |s| s.as_str()),
        ms(report.last_dispatch_ms_ago),
        ms(report.last_success_ms_ago)
    )
    .ok();
    write!(out, "extension hosts: {}", report.hosts).ok();
    out
}

#[cfg(test)]
mod tests {
    use mediakeys_protocol::{Source, SourceStatus};

    use super::*;

    #[test]
    fn status_rendering() {
        let report = StatusReport {
            enabled: false,
            sources: vec![SourceStatus {
                source: Source::Spotify,
                available: true,
                playing: false,
                age_ms: Some(120),
            }],
            last_target: Some(Source::Spotify),
            last_dispatch_ms_ago: Some(3000),
            last_success_ms_ago: None,
            hosts: 1,
        };
        let text = render_status(&report);
        assert!(text.starts_with("capture: disabled\n"));
        assert!(text.contains("spotify   available=true  playing=false observed=120ms ago"));
        assert!(text.contains("last target: spotify (dispatched 3000ms ago, confirmed -)"));
        assert!(text.ends_with("extension hosts: 1"));
    }

    #[tokio::test]
    async fn missing_daemon_is_an_ipc_error() {
        let d = tempfile::tempdir().unwrap();
        let err = request(&d.path().join("absent.sock"), &Msg::Status)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ipc(m) if m.contains("is mediakeysd running")));
    }
}
