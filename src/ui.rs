// UI layer: provides the interactive menu using `dialoguer`.
// Each menu entry runs one workflow and prints its single result.

use crate::api::{Method, Transport};
use crate::config::ClientVariant;
use crate::executor::Sleeper;
use crate::interpret::WorkflowResult;
use crate::workflow::{AssetRecord, Orchestrator, ProgressReporter};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy)]
enum Action {
    Upload,
    Assets,
    ConvertToPdf,
    ExtractText,
    Status,
    Exit,
}

const ACTIONS: [(Action, &str); 6] = [
    (Action::Upload, "Upload image"),
    (Action::Assets, "List assets"),
    (Action::ConvertToPdf, "Convert image(s) to PDF"),
    (Action::ExtractText, "Extract text from image"),
    (Action::Status, "Service status"),
    (Action::Exit, "Exit"),
];

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
///
/// A failed command is reported and the loop carries on; only terminal I/O
/// errors end it early.
pub fn main_menu<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) -> Result<()> {
    let items: Vec<&str> = ACTIONS.iter().map(|(_, label)| *label).collect();
    loop {
        println!();
        let selection = Select::new()
            .with_prompt("Enter a command")
            .items(&items)
            .default(0)
            .interact()?;
        match ACTIONS[selection].0 {
            Action::Upload => handle_upload(orch)?,
            Action::Assets => handle_assets(orch),
            Action::ConvertToPdf => handle_convert(orch)?,
            Action::ExtractText => handle_extract(orch)?,
            Action::Status => handle_status(orch),
            Action::Exit => break,
        }
    }
    println!();
    println!("** done **");
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a non-success result. Returns the payload on success.
fn report<T>(result: WorkflowResult<T>) -> Option<T> {
    match result {
        WorkflowResult::Success(v) => return Some(v),
        WorkflowResult::ClientError(m) => {
            println!("{} {}", "Request rejected by service (400):".red(), m)
        }
        WorkflowResult::ServerError(m) => {
            println!("{} {}", "Service failed (500):".red(), m)
        }
        WorkflowResult::NotFound(m) => println!("{}", m.yellow()),
        WorkflowResult::Aborted(m) => println!("{} {}", "Failed:".red(), m),
    }
    None
}

fn handle_upload<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) -> Result<()> {
    let path: String = Input::new().with_prompt("Local filename").interact_text()?;
    let path = PathBuf::from(path.trim());
    if report(orch.check_upload_path(&path)).is_none() {
        return Ok(());
    }
    let label = orch.config().variant.dimension_label();
    let width: u32 = Input::new()
        .with_prompt(format!("{label} width"))
        .interact_text()?;
    let height: u32 = Input::new()
        .with_prompt(format!("{label} height"))
        .interact_text()?;

    let pb = spinner("Uploading...");
    let result = orch.upload(&path, width, height);
    pb.finish_and_clear();
    if let Some(receipt) = report(result) {
        println!("{} asset id = {}", "Image uploaded,".green(), receipt.assetid);
    }
    Ok(())
}

fn handle_assets<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) {
    let pb = spinner("Fetching assets...");
    let result = orch.list_assets();
    pb.finish_and_clear();
    if let Some(assets) = report(result) {
        if assets.is_empty() {
            println!("No assets stored yet.");
        }
        for asset in &assets {
            print_asset(asset, orch.config().variant);
        }
    }
}

fn print_asset(asset: &AssetRecord, variant: ClientVariant) {
    println!("{}", asset.assetid.to_string().bold());
    println!("  {}", asset.assetname);
    println!("  {}", asset.bucketkey);
    if let (Some(w), Some(h)) = (asset.width, asset.height) {
        println!("  {w}x{h}");
    }
    if asset.processed {
        println!("  {}", variant.flag_label());
    }
}

/// Prints per-asset resolution lines above the spinner.
struct SpinnerReporter<'a>(&'a ProgressBar);

impl ProgressReporter for SpinnerReporter<'_> {
    fn on_request(&self, method: Method, url: &str) {
        self.0.set_message(format!("{method} {url}"));
    }

    fn on_resolved(&self, asset_id: &str, storage_key: &str) {
        self.0
            .println(format!("Asset ID {asset_id} mapped to storage key {storage_key}."));
    }

    fn on_failed(&self, asset_id: &str, reason: &str) {
        self.0.println(format!(
            "{} {}",
            format!("Failed to retrieve asset ID {asset_id}:").yellow(),
            reason
        ));
    }
}

fn handle_convert<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) -> Result<()> {
    let input: String = Input::new()
        .with_prompt("Asset ID(s) to include in PDF (separated by commas)")
        .interact_text()?;

    let pb = spinner("Resolving assets...");
    let reporter = SpinnerReporter(&pb);
    let result = orch.convert_to_pdf(&input, &reporter, || {
        let name = pb.suspend(|| {
            Input::<String>::new()
                .with_prompt("Name for the PDF (without extension)")
                .allow_empty(true)
                .interact_text()
        });
        prompted_name(name)
    });
    pb.finish_and_clear();
    if let Some(pdf) = report(result) {
        println!("{}", "PDF created successfully.".green());
        println!("PDF ID: {}", pdf.pdf_id);
        println!("PDF URL: {}", pdf.pdf_url);
    }
    Ok(())
}

/// A failed prompt counts as no name, but the cause is logged.
fn prompted_name(answer: std::io::Result<String>) -> Option<String> {
    match answer {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("reading PDF name failed: {}", e);
            None
        }
    }
}

fn handle_extract<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) -> Result<()> {
    let input: String = Input::new()
        .with_prompt("Asset ID to extract text from")
        .interact_text()?;

    let pb = spinner("Requesting text extraction...");
    let result = orch.extract_text(&input);
    pb.finish_and_clear();
    if let Some(job) = report(result) {
        println!(
            "{} Check the {} folder for the results of asset {}.",
            "Job submitted.".green(),
            job.results_folder,
            job.assetid
        );
    }
    Ok(())
}

fn handle_status<T: Transport, S: Sleeper>(orch: &Orchestrator<T, S>) {
    let pb = spinner("Contacting service...");
    let result = orch.status();
    pb.finish_and_clear();
    if let Some(status) = report(result) {
        println!("status: {}", status.status);
        println!("uptime: {}s", status.uptime_secs);
        println!("database: {}", status.db_connection);
    }
}
