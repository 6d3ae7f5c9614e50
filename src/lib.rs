// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) loads the configuration and hands an `Orchestrator` to the
// interactive menu in `ui`.
//
// Module responsibilities:
// - `api`: one HTTP call to the photoapp web service (`Transport`).
// - `executor`: bounded retry around a transport call.
// - `interpret`: turns a call outcome into a `WorkflowResult`.
// - `resolve`: maps asset ids to storage keys, one lookup per id.
// - `workflow`: upload, list, PDF conversion, text extraction, status.
// - `config` / `error`: start-up configuration and fatal errors.
// - `ui`: terminal menu built on `dialoguer`.
pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod interpret;
pub mod resolve;
pub mod ui;
pub mod workflow;

pub use api::{CallRequest, HttpTransport, Method, RawResponse, Transport, TransportError};
pub use config::{ClientConfig, ClientVariant};
pub use error::{ClientError, Result};
pub use executor::{CallOutcome, Executor, RetryPolicy, Sleeper, ThreadSleeper};
pub use interpret::{interpret, WorkflowResult};
pub use resolve::{resolve_all, AssetResolution};
pub use workflow::{Orchestrator, ProgressReporter, SilentReporter};
