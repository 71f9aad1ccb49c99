// UI layer: an interactive menu using `dialoguer`, mirroring the app's
// screens: remember a username, upload a blood test, then scan products.
// Every upload shows a spinner while in flight and offers a manual retry.

use crate::analysis::{AnalysisResult, ScoredAnalysis, Verdict};
use crate::api::UploadClient;
use crate::error::ClientResult;
use crate::image::{ImageReference, UploadKind};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_FILE: &str = ".label_scanner_user";

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
pub fn main_menu(mut api: UploadClient, json: bool) -> Result<()> {
    if api.config().username.is_none() {
        if let Some(name) = load_username(&user_file()) {
            api.set_username(Some(name));
        }
    }

    loop {
        if let Some(name) = &api.config().username {
            println!("Signed in as {}", name.clone().bold());
        }
        let items = vec!["Set username", "Upload blood test", "Scan product", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                let name = handle_username()?;
                save_username(&user_file(), &name)?;
                api.set_username(Some(name));
            }
            1 => {
                if let Some(result) = run_flow(&api, UploadKind::BloodTest)? {
                    print_result(&result, json)?;
                    println!("Your blood test has been uploaded and analyzed.");
                    let scan_now = Confirm::new()
                        .with_prompt("Start scanning products now?")
                        .default(true)
                        .interact()?;
                    if scan_now {
                        if let Some(result) = run_flow(&api, UploadKind::Barcode)? {
                            print_result(&result, json)?;
                        }
                    }
                }
            }
            2 => {
                if let Some(result) = run_flow(&api, UploadKind::Barcode)? {
                    print_result(&result, json)?;
                }
            }
            3 => break,
            _ => {}
        }
    }
    Ok(())
}

/// Collect a non-empty username.
fn handle_username() -> Result<String> {
    let name: String = Input::new()
        .with_prompt("Your name")
        .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
            if input.trim().is_empty() {
                Err("Name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(name.trim().to_string())
}

/// Pick an image, upload it, and let the user retry on failure. Returns
/// `None` when the user cancels.
fn run_flow(api: &UploadClient, kind: UploadKind) -> Result<Option<AnalysisResult>> {
    let image = match choose_image(kind)? {
        Some(image) => image,
        None => return Ok(None),
    };

    loop {
        match upload_with_spinner(api, &image) {
            Ok(result) => return Ok(Some(result)),
            Err(e) => {
                println!("{}", e.to_string().red());
                let choice = Select::new()
                    .items(&["Retry", "Cancel"])
                    .default(0)
                    .interact()?;
                if choice != 0 {
                    return Ok(None);
                }
            }
        }
    }
}

/// Run one upload while a spinner is shown.
pub fn upload_with_spinner(api: &UploadClient, image: &ImageReference) -> ClientResult<AnalysisResult> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(match image.kind() {
        UploadKind::BloodTest => "Uploading blood test...",
        UploadKind::Barcode => "Analyzing product...",
    });
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = match image.kind() {
        UploadKind::BloodTest => api.upload_blood_test(image),
        UploadKind::Barcode => api.analyze_barcode(image),
    };
    spinner.finish_and_clear();
    result
}

/// Ask for an image either through the native file dialog or a typed path.
fn choose_image(kind: UploadKind) -> Result<Option<ImageReference>> {
    let prompt = format!("Photo of the {}", kind);
    pick_image(&prompt, kind)
}

#[cfg(feature = "file-dialog")]
fn pick_image(prompt: &str, kind: UploadKind) -> Result<Option<ImageReference>> {
    let sources = vec!["Pick from files", "Enter path", "Cancel"];
    match Select::new().with_prompt(prompt).items(&sources).default(0).interact()? {
        0 => Ok(rfd::FileDialog::new()
            .set_title(prompt)
            .add_filter("Images", &["png", "jpg", "jpeg", "heic", "webp"])
            .pick_file()
            .map(|path| ImageReference::from_path(path, kind))),
        1 => typed_image(prompt, kind),
        _ => Ok(None),
    }
}

#[cfg(not(feature = "file-dialog"))]
fn pick_image(prompt: &str, kind: UploadKind) -> Result<Option<ImageReference>> {
    typed_image(prompt, kind)
}

// Typed input may be a `file://` URI, so it goes through `ImageReference::new`.
fn typed_image(prompt: &str, kind: UploadKind) -> Result<Option<ImageReference>> {
    let location: String = Input::new()
        .with_prompt(format!("{} (path or file:// URI, empty to cancel)", prompt))
        .allow_empty(true)
        .interact_text()?;
    let location = location.trim();
    Ok(if location.is_empty() {
        None
    } else {
        Some(ImageReference::new(location, kind))
    })
}

/// Print a result either as pretty JSON or as a coloured summary.
pub fn print_result(result: &AnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match result {
        AnalysisResult::Verdict(v) => print_verdict(v),
        AnalysisResult::Scored(s) => print_scored(s),
    }
    Ok(())
}

fn print_verdict(v: &Verdict) {
    if v.healthy {
        println!("{}", "HEALTHY".green().bold());
    } else {
        println!("{}", "NOT RECOMMENDED".red().bold());
    }
    println!("{} {}", "Why:".bold(), v.reasoning);
    println!("{} {}", "Recommendation:".bold(), v.recommendation);
}

fn print_scored(s: &ScoredAnalysis) {
    let score = format!("{}/{}", s.score, ScoredAnalysis::MAX_SCORE);
    let score = if s.score >= 4 {
        score.green().bold()
    } else if s.score == 3 {
        score.yellow().bold()
    } else {
        score.red().bold()
    };
    println!("{} {}", "Score:".bold(), score);

    let product = &s.product_info;
    println!("{} {} ({})", "Product:".bold(), product.name, product.brands);
    println!("{} {}", "Barcode:".bold(), product.barcode);
    if let Some(grade) = &product.nutri_score {
        println!("{} {}", "Nutri-Score:".bold(), grade.to_uppercase());
    }
    if let Some(url) = &product.image_url {
        println!("{} {}", "Image:".bold(), url);
    }
    println!("{} {}", "Why:".bold(), s.reasoning);
}

/// Location of the remembered username in the user's home directory.
pub fn user_file() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(USER_FILE)
}

/// Persist the username so the next session can reuse it.
pub fn save_username(path: &Path, name: &str) -> Result<()> {
    std::fs::write(path, name.trim())?;
    Ok(())
}

/// Load a previously saved username; missing or blank files yield `None`.
pub fn load_username(path: &Path) -> Option<String> {
    let data = std::fs::read_to_string(path).ok()?;
    let name = data.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(USER_FILE);

        save_username(&path, "  Ada Lovelace \n").unwrap();
        assert_eq!(load_username(&path).as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn missing_or_blank_user_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(USER_FILE);
        assert_eq!(load_username(&path), None);

        std::fs::write(&path, "   ").unwrap();
        assert_eq!(load_username(&path), None);
    }
}
