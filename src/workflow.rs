// One workflow per menu action.
//
// Each method on `Orchestrator` runs a short, strictly linear pipeline of
// calls (resolution, then the action itself) and returns a single
// `WorkflowResult` describing what happened. Nothing is kept between
// commands.

use crate::api::{CallRequest, HttpTransport, Method, Transport};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::executor::{Executor, Sleeper, ThreadSleeper};
use crate::interpret::{interpret, WorkflowResult};
use crate::resolve::{parse_asset_id, resolve_all, resolved_keys, split_identifiers};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Folder in the service's bucket where text extraction jobs write results.
pub const TEXT_RESULTS_FOLDER: &str = "textract_jobs";

/// Id the service uses to say "no PDF was stored".
const PDF_ID_SENTINEL: i64 = -1;

/// Hooks for per-item progress inside a workflow.
pub trait ProgressReporter {
    /// A call is about to be issued.
    fn on_request(&self, _method: Method, _url: &str) {}
    /// An asset id was mapped to its storage key.
    fn on_resolved(&self, _asset_id: &str, _storage_key: &str) {}
    /// An asset id could not be mapped; the batch carries on.
    fn on_failed(&self, _asset_id: &str, _reason: &str) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct UploadRequest {
    pub assetname: String,
    /// Base64 encoded file bytes.
    pub data: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub assetid: i64,
}

/// One row of `GET /assets`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub assetid: i64,
    pub assetname: String,
    pub bucketkey: String,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub width: Option<i64>,
    /// `is_resized` or `is_compressed`, depending on the service flavour.
    #[serde(
        default,
        alias = "is_resized",
        alias = "is_compressed",
        deserialize_with = "flag_from_bool_or_int"
    )]
    pub processed: bool,
}

#[derive(Deserialize)]
struct AssetsResponse {
    data: Vec<AssetRecord>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest<'a> {
    pub images: &'a [String],
    pub pdf_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfReceipt {
    pub pdf_id: i64,
    pub pdf_url: String,
}

#[derive(Serialize, Debug)]
pub struct ExtractRequest {
    pub assetid: u64,
}

/// A text extraction job the service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractJob {
    pub assetid: u64,
    pub results_folder: &'static str,
}

/// Body of `GET /`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(rename = "uptime-in-secs")]
    pub uptime_secs: u64,
    #[serde(rename = "dbConnection", default)]
    pub db_connection: Value,
}

/// MySQL reports booleans as 0/1; accept either form.
fn flag_from_bool_or_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }
    Ok(match Flag::deserialize(d)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Null(()) => false,
    })
}

fn decode<T: DeserializeOwned>(body: Value, what: &str) -> WorkflowResult<T> {
    match serde_json::from_value(body) {
        Ok(v) => WorkflowResult::Success(v),
        Err(e) => WorkflowResult::Aborted(format!("unexpected {what} response from service: {e}")),
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────

/// Runs workflows against the configured web service.
pub struct Orchestrator<T, S = ThreadSleeper> {
    config: ClientConfig,
    executor: Executor<T, S>,
}

impl Orchestrator<HttpTransport, ThreadSleeper> {
    /// Build an orchestrator talking HTTP with the configured timeout.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Orchestrator {
            config,
            executor: Executor::new(transport),
        })
    }
}

impl<T: Transport, S: Sleeper> Orchestrator<T, S> {
    pub fn with_executor(config: ClientConfig, executor: Executor<T, S>) -> Self {
        Orchestrator { config, executor }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn call(&self, request: &CallRequest) -> WorkflowResult {
        interpret(self.executor.execute(request))
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> WorkflowResult {
        match CallRequest::post(self.config.url(path), body) {
            Ok(request) => self.call(&request),
            Err(e) => WorkflowResult::Aborted(format!("could not encode request: {e}")),
        }
    }

    /// Upload a local image file.
    pub fn upload(&self, path: &Path, width: u32, height: u32) -> WorkflowResult<UploadReceipt> {
        if let WorkflowResult::Aborted(m) = self.check_upload_path(path) {
            return WorkflowResult::Aborted(m);
        }
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(source) => {
                let err = ClientError::FileRead {
                    path: path.to_path_buf(),
                    source,
                };
                return WorkflowResult::Aborted(err.to_string());
            }
        };
        let assetname = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.upload_bytes(assetname, &bytes, width, height)
    }

    /// Fails when `path` is not an existing regular file.
    pub fn check_upload_path(&self, path: &Path) -> WorkflowResult<()> {
        if path.is_file() {
            WorkflowResult::Success(())
        } else {
            let err = ClientError::FileNotFound {
                path: path.to_path_buf(),
            };
            WorkflowResult::Aborted(err.to_string())
        }
    }

    /// Upload raw image bytes under `assetname`.
    pub fn upload_bytes(
        &self,
        assetname: String,
        bytes: &[u8],
        width: u32,
        height: u32,
    ) -> WorkflowResult<UploadReceipt> {
        debug!("uploading {} ({} bytes)", assetname, bytes.len());
        let body = UploadRequest {
            assetname,
            data: STANDARD.encode(bytes),
            width,
            height,
        };
        self.post("/image", &body)
            .and_then(|v| decode::<UploadReceipt>(v, "upload"))
    }

    /// List every asset the service knows about.
    pub fn list_assets(&self) -> WorkflowResult<Vec<AssetRecord>> {
        self.call(&CallRequest::get(self.config.url("/assets")))
            .and_then(|v| decode::<AssetsResponse>(v, "assets"))
            .map(|r| r.data)
    }

    /// Combine the images behind a comma-separated list of asset ids into one
    /// PDF. `pdf_name` is only consulted once at least one id resolved.
    pub fn convert_to_pdf<F>(
        &self,
        input: &str,
        reporter: &dyn ProgressReporter,
        pdf_name: F,
    ) -> WorkflowResult<PdfReceipt>
    where
        F: FnOnce() -> Option<String>,
    {
        let ids = split_identifiers(input);
        if ids.is_empty() {
            return WorkflowResult::Aborted("no valid identifiers".into());
        }
        let resolutions = resolve_all(&self.executor, &self.config, &ids, reporter);
        resolved_keys(&resolutions).and_then(|keys| {
            let name = match pdf_name() {
                Some(n) if !n.trim().is_empty() => n.trim().to_string(),
                _ => return WorkflowResult::Aborted("Invalid PDF name.".into()),
            };
            info!("requesting PDF '{}' from {} image(s)", name, keys.len());
            self.request_pdf(&keys, &name, reporter)
        })
    }

    /// Ask the service to build a PDF from already-resolved storage keys.
    pub fn request_pdf(
        &self,
        keys: &[String],
        pdf_name: &str,
        reporter: &dyn ProgressReporter,
    ) -> WorkflowResult<PdfReceipt> {
        let body = PdfRequest {
            images: keys,
            pdf_name,
        };
        reporter.on_request(Method::Post, &self.config.url("/image-to-pdf"));
        self.post("/image-to-pdf", &body).and_then(pdf_receipt)
    }

    /// Start a text extraction job for one asset.
    pub fn extract_text(&self, raw_id: &str) -> WorkflowResult<ExtractJob> {
        let Some(assetid) = parse_asset_id(raw_id) else {
            return WorkflowResult::Aborted("Invalid asset ID. It should be a number.".into());
        };
        let request = match CallRequest::post(
            self.config.url("/extract-text-from-image"),
            &ExtractRequest { assetid },
        ) {
            Ok(r) => r,
            Err(e) => return WorkflowResult::Aborted(format!("could not encode request: {e}")),
        };
        let outcome = self.executor.execute(&request);
        if outcome.status() == Some(404) {
            return WorkflowResult::NotFound(format!(
                "Asset ID {assetid} not found. Please enter a valid asset id"
            ));
        }
        interpret(outcome).map(|_| ExtractJob {
            assetid,
            results_folder: TEXT_RESULTS_FOLDER,
        })
    }

    /// Health of the web service.
    pub fn status(&self) -> WorkflowResult<ServiceStatus> {
        self.call(&CallRequest::get(self.config.url("/")))
            .and_then(|v| decode(v, "status"))
    }
}

/// A 200 from `/image-to-pdf` only counts when it names a URL and a real id.
fn pdf_receipt(body: Value) -> WorkflowResult<PdfReceipt> {
    let url = body
        .get("pdfUrl")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty());
    let id = body.get("pdfId").and_then(Value::as_i64);
    match (url, id) {
        (Some(url), Some(id)) if id != PDF_ID_SENTINEL => WorkflowResult::Success(PdfReceipt {
            pdf_id: id,
            pdf_url: url.to_string(),
        }),
        _ => WorkflowResult::Aborted(
            "Failed to create PDF. Server did not return a valid PDF URL.".into(),
        ),
    }
}
