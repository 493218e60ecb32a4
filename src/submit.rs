//! Song submission.
//!
//! Local files are content-addressed: the client first offers the server
//! the SHA-1 fingerprint of the file and only uploads the bytes when the
//! server does not know them yet. Anything that is not an existing path is
//! passed to the server as a URI.

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::ui::write_text;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::multipart;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

const SONG_PATH: &str = "/song";
const FILE_PATH: &str = "/file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    RemoteUri,
    LocalFile,
}

/// What the server is asked to enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Uri(String),
    /// Hex SHA-1 of a local file that has not been uploaded.
    Fingerprint(String),
    /// Key the server issued for uploaded bytes.
    StorageKey(String),
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRef::Uri(uri) => f.write_str(uri),
            ContentRef::Fingerprint(digest) => write!(f, "sha1:{}", digest),
            ContentRef::StorageKey(key) => f.write_str(key),
        }
    }
}

/// One input item on its way to the queue.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    identity: String,
    kind: SourceKind,
    filename: Option<String>,
    content_ref: ContentRef,
}

impl SubmissionRequest {
    pub fn remote(identity: &str, uri: &str) -> Self {
        SubmissionRequest {
            identity: identity.to_string(),
            kind: SourceKind::RemoteUri,
            filename: None,
            content_ref: ContentRef::Uri(uri.to_string()),
        }
    }

    pub fn local(identity: &str, filename: String, digest: String) -> Self {
        SubmissionRequest {
            identity: identity.to_string(),
            kind: SourceKind::LocalFile,
            filename: Some(filename),
            content_ref: ContentRef::Fingerprint(digest),
        }
    }

    /// Swap the fingerprint for the key of the uploaded bytes. Only a
    /// not-yet-uploaded local file can make this transition.
    pub fn uploaded(self, key: String) -> Option<Self> {
        match self.content_ref {
            ContentRef::Fingerprint(_) => Some(SubmissionRequest {
                content_ref: ContentRef::StorageKey(key),
                ..self
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_ref(&self) -> &ContentRef {
        &self.content_ref
    }

    fn payload(&self) -> SongPayload<'_> {
        SongPayload {
            user: &self.identity,
            filename: self.filename.as_deref(),
            url: self.content_ref.to_string(),
        }
    }
}

#[derive(Serialize)]
struct SongPayload<'a> {
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct EnqueueResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    text: Value,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    saved: bool,
    key: Option<String>,
    #[serde(default)]
    text: Value,
}

/// Result of a raw bytes upload. `storage_key` is set iff `saved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub saved: bool,
    pub storage_key: Option<String>,
    pub message: String,
}

impl From<UploadResponse> for UploadOutcome {
    fn from(resp: UploadResponse) -> Self {
        let message = match resp.text {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let storage_key = resp.key.filter(|_| resp.saved);
        UploadOutcome {
            saved: storage_key.is_some(),
            storage_key,
            message,
        }
    }
}

/// How one input item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The enqueue call went through.
    Queued,
    /// The server already had the file's content; nothing was uploaded.
    AlreadyKnown,
    /// The enqueue call was answered with an error.
    Rejected,
    /// The upload was refused or got no answer.
    UploadFailed,
    /// No usable answer from the server.
    Unreachable,
    /// The local file could not be read.
    Unreadable,
}

/// Hex SHA-1 of everything `reader` yields.
pub fn fingerprint<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha1::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Name the file is uploaded under: `upload.` plus whatever follows the
/// last `.` of the input.
pub fn upload_name(input: &str) -> String {
    let ext = input.rsplit('.').next().unwrap_or(input);
    format!("upload.{}", ext)
}

pub struct SongSubmitter<'a> {
    api: &'a ApiClient,
    config: &'a Config,
    identity: &'a str,
}

impl<'a> SongSubmitter<'a> {
    pub fn new(api: &'a ApiClient, config: &'a Config, identity: &'a str) -> Self {
        SongSubmitter {
            api,
            config,
            identity,
        }
    }

    /// Submit every input in order, returning one outcome per input that
    /// was processed.
    ///
    /// A remote URI ends the batch: inputs after the first URI are not
    /// looked at.
    pub fn submit<S: AsRef<OsStr>>(&self, inputs: &[S], out: &mut dyn Write) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            let input = input.as_ref();
            let shown = input.to_string_lossy();
            if self.config.verbose {
                writeln!(out, "Checking filename/URI {}", shown)?;
            }

            let path = Path::new(input);
            if path.exists() {
                outcomes.push(self.submit_file(path, &shown, out)?);
            } else {
                outcomes.push(self.submit_uri(&shown, out)?);
                debug!(uri = %shown, "remote URI submitted, ending batch");
                break;
            }
        }
        Ok(outcomes)
    }

    fn submit_uri(&self, uri: &str, out: &mut dyn Write) -> Result<Outcome> {
        let request = SubmissionRequest::remote(self.identity, uri);
        self.enqueue_and_report(&request, out)
    }

    fn submit_file(&self, path: &Path, shown: &str, out: &mut dyn Write) -> Result<Outcome> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return unreadable(out, shown, &e),
        };
        let digest = match fingerprint(&mut file) {
            Ok(digest) => digest,
            Err(e) => return unreadable(out, shown, &e),
        };
        debug!(file = %shown, sha1 = %digest, "fingerprinted local file");

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| shown.to_string());
        let request = SubmissionRequest::local(self.identity, filename, digest);

        match self.enqueue(&request, out)? {
            None => {
                writeln!(
                    out,
                    "Could not check whether {} is already on the server, skipping",
                    shown
                )?;
                return Ok(Outcome::Unreachable);
            }
            Some(resp) if !resp.error => {
                write_text(out, &resp.text)?;
                return Ok(Outcome::AlreadyKnown);
            }
            Some(_) => {}
        }

        writeln!(out, "File not found on the server, sending")?;
        if let Err(e) = file.seek(SeekFrom::Start(0)) {
            return unreadable(out, shown, &e);
        }
        let outcome = self.upload(file, upload_name(shown), out)?;
        let request = match outcome.storage_key.and_then(|key| request.uploaded(key)) {
            Some(request) => request,
            None => {
                writeln!(out, "Error, file not saved: {}", outcome.message)?;
                return Ok(Outcome::UploadFailed);
            }
        };

        writeln!(out, "File sent successfully, adding to playlist")?;
        self.enqueue_and_report(&request, out)
    }

    fn enqueue(&self, request: &SubmissionRequest, out: &mut dyn Write) -> Result<Option<EnqueueResponse>> {
        debug!(
            kind = ?request.kind(),
            filename = ?request.filename(),
            url = %request.content_ref(),
            "enqueue"
        );
        self.api.post_json(out, SONG_PATH, &request.payload())
    }

    fn enqueue_and_report(&self, request: &SubmissionRequest, out: &mut dyn Write) -> Result<Outcome> {
        match self.enqueue(request, out)? {
            Some(resp) => {
                write_text(out, &resp.text)?;
                Ok(if resp.error {
                    Outcome::Rejected
                } else {
                    Outcome::Queued
                })
            }
            None => Ok(Outcome::Unreachable),
        }
    }

    /// Upload the file as multipart field `file`. The handle is consumed
    /// and closed once the request is done.
    fn upload(&self, file: File, name: String, out: &mut dyn Write) -> Result<UploadOutcome> {
        let part = match file.metadata() {
            Ok(meta) => multipart::Part::reader_with_length(file, meta.len()),
            Err(_) => multipart::Part::reader(file),
        };
        let form = multipart::Form::new().part("file", part.file_name(name));

        let spinner = upload_spinner();
        let response: Option<UploadResponse> = self.api.post_form(out, FILE_PATH, form)?;
        spinner.finish_and_clear();

        Ok(match response {
            Some(resp) => resp.into(),
            None => UploadOutcome {
                saved: false,
                storage_key: None,
                message: "no response from server".to_string(),
            },
        })
    }
}

fn unreadable(out: &mut dyn Write, shown: &str, e: &io::Error) -> Result<Outcome> {
    writeln!(out, "Error reading {}: {}", shown, e)?;
    Ok(Outcome::Unreadable)
}

fn upload_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Uploading...");
    spinner.tick();
    spinner
}
