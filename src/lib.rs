// Library root
// -----------
// This crate exposes the pieces of the `tikplay` client. The binary
// (`main.rs`) parses arguments and wires them together.
//
// Module responsibilities:
// - `api`: the request gateway. Every HTTP call to the queue service goes
//   through it so transport and decode failures are reported in one place.
// - `submit`: the song submission protocol (existence check, upload,
//   enqueue) for local files and remote URIs.
// - `ui`: now playing / playlist / skip / clear and their display helpers.
// - `config`, `identity`, `error`: the configuration value, the `user@host`
//   identity and the error types shared by the above.
pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod submit;
pub mod ui;
