use mockito::Server;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tikplay::api::ApiClient;
use tikplay::{config, ui};
use tracing_subscriber::EnvFilter;

fn capture(f: impl FnOnce(&mut Vec<u8>) -> tikplay::error::Result<()>) -> String {
    let mut out = Vec::new();
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn now_playing_shows_first_track() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/srv/v1.0/song")
        .with_body(r#"{"text": [{"artist": "Daft Punk", "title": "Da Funk", "time": 328}]}"#)
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    let out = capture(|out| ui::now_playing(&api, out));

    mock.assert();
    assert_eq!(out, "Now playing: Daft Punk - Da Funk (328 seconds)\n");
}

#[test]
fn now_playing_with_empty_queue() {
    let mut server = Server::new();
    server.mock("GET", "/srv/v1.0/song").with_body(r#"{"text": []}"#).create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    assert_eq!(capture(|out| ui::now_playing(&api, out)), "Nothing is playing\n");
}

#[test]
fn playlist_lists_entries() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/srv/v1.0/queue/3")
        .with_body(
            r#"{"text": [
                {"artist": "A", "title": "T", "time": 125},
                {"file": "upload.ogg"},
                {"title": "only a title", "time": 3725}
            ]}"#,
        )
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    let out = capture(|out| ui::playlist(&api, 3, out));

    mock.assert();
    assert_eq!(
        out,
        "Queue #0: A - T (2m 5s)\n\
         Queue #1: upload.ogg\n\
         Queue #2: unknown (1h 2m 5s)\n"
    );
}

#[test]
fn skip_and_clear_print_response_verbatim() {
    let mut server = Server::new();
    let skip = server
        .mock("DELETE", "/srv/v1.0/song")
        .with_body(r#"{"text":"Skipped"}"#)
        .create();
    let clear = server
        .mock("DELETE", "/srv/v1.0/queue")
        .with_body(r#"{"error":false}"#)
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    assert_eq!(capture(|out| ui::skip(&api, out)), "{\"text\":\"Skipped\"}\n");
    assert_eq!(capture(|out| ui::clear(&api, out)), "{\"error\":false}\n");
    skip.assert();
    clear.assert();
}

#[test]
fn invalid_json_is_echoed() {
    let mut server = Server::new();
    server
        .mock("GET", "/srv/v1.0/song")
        .with_status(500)
        .with_body("Internal Server Error")
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    assert_eq!(
        capture(|out| ui::now_playing(&api, out)),
        "Invalid JSON received: Internal Server Error\n"
    );
}

#[test]
fn every_command_survives_refused_connection() {
    let api = ApiClient::new("127.0.0.1:1").unwrap();

    let outputs = [
        capture(|out| ui::now_playing(&api, out)),
        capture(|out| ui::playlist(&api, 10, out)),
        capture(|out| ui::skip(&api, out)),
        capture(|out| ui::clear(&api, out)),
    ];

    for out in outputs {
        assert!(out.starts_with("Connection error: "), "got {:?}", out);
        assert_eq!(out.lines().count(), 1);
    }
}

#[test]
fn np_prints_message_envelope() {
    let mut server = Server::new();
    server
        .mock("GET", "/srv/v1.0/song")
        .with_body(r#"{"error": true, "text": "Nothing in queue"}"#)
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    assert_eq!(capture(|out| ui::now_playing(&api, out)), "Nothing in queue\n");
}

#[test]
fn playlist_prints_message_envelope() {
    let mut server = Server::new();
    server
        .mock("GET", "/srv/v1.0/queue/10")
        .with_body(r#"{"error": true, "text": "Queue unavailable"}"#)
        .create();
    let api = ApiClient::new(&server.host_with_port()).unwrap();

    assert_eq!(capture(|out| ui::playlist(&api, 10, out)), "Queue unavailable\n");
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn refused_connection_is_reported_once_by_default() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config::log_filter(false)))
        .with_writer(move || writer.clone())
        .finish();
    let api = ApiClient::new("127.0.0.1:1").unwrap();

    let out = tracing::subscriber::with_default(subscriber, || capture(|out| ui::skip(&api, out)));

    assert!(out.starts_with("Connection error: "));
    assert_eq!(out.lines().count(), 1);
    assert!(logs.0.lock().unwrap().is_empty());
}
