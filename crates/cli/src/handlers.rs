//! Command handlers for mediapilot CLI

use crate::wizard::run_init_wizard;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Shell};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use mediapilot_core::{
    config_exists, get_config_path, load_config, redact, resolve_config, sign_params,
    string_to_sign, validate_config, AdminResponse, DeleteOptions, MediaClient, ResourceType,
    SignatureAlgorithm, StorageType, UploadOptions, UploadResponse,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tabled::{Table, Tabled};

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Handle config commands
pub async fn handle_config(action: &str) -> Result<()> {
    match action {
        "show" => {
            println!("Current configuration:");
            println!();

            let config = resolve_config()?;
            if config_exists() {
                println!("Source: {}", get_config_path()?.display());
            } else {
                println!("Source: CLOUDINARY_URL environment variable");
            }
            println!();

            println!("Cloud:");
            println!("  Cloud name: {}", config.cloud.cloud_name);
            println!("  API key: {}", config.cloud.api_key);
            println!("  API secret: {}", redact(&config.cloud.api_secret));
            println!("  API base URL: {}", config.cloud.api_base_url);
            println!();

            let algorithm = config
                .upload
                .as_ref()
                .map(|u| u.signature_algorithm)
                .unwrap_or_default();
            println!("Upload:");
            println!("  Default preset: {}", config.default_preset().unwrap_or("(none)"));
            println!("  Default folder: {}", config.default_folder().unwrap_or("(none)"));
            println!("  Signature algorithm: {}", algorithm);

            if let Some(advanced) = &config.advanced {
                println!();
                println!("Advanced:");
                println!("  Timeout: {}s", advanced.timeout);
            }

            println!();
            println!("Logging:");
            println!("  Level: {}", config.log_level());

            Ok(())
        }
        "validate" => {
            println!("Validating configuration...");

            let config = resolve_config()?;
            validate_config(&config)?;
            println!("  ✅ Valid configuration format");

            let client = MediaClient::from_config(&config)?;
            println!("  ✅ Client ready for cloud '{}'", client.cloud_name());
            println!("  Upload endpoint: {}", client.endpoint("image/upload"));

            Ok(())
        }
        "edit" => {
            let config_path = get_config_path()?;
            if !config_path.exists() {
                return Err(anyhow::anyhow!(
                    "Configuration not found at {} (run 'mediapilot init')",
                    config_path.display()
                ));
            }

            println!("Opening editor...");
            println!("  File: {}", config_path.display());
            println!();

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let status = std::process::Command::new(editor)
                .arg(&config_path)
                .status()?;

            if status.success() {
                println!("  ✅ Configuration edited");

                // Validate after edit
                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");
            } else {
                println!("  ⚠️  Editor exited with error");
            }

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: show, edit, validate");
            Ok(())
        }
    }
}

/// Arguments of the upload command
#[derive(Debug)]
pub struct UploadRequest {
    pub file: String,
    pub unsigned: bool,
    pub preset: Option<String>,
    pub public_id: Option<String>,
    pub folder: Option<String>,
    pub tags: Option<String>,
    pub overwrite: bool,
    pub use_filename: bool,
    pub resource_type: ResourceType,
    pub storage_type: Option<StorageType>,
}

/// Handle upload command
pub async fn handle_upload(request: UploadRequest, output: &str) -> Result<()> {
    let config = resolve_config()?;
    validate_config(&config)?;
    let client = MediaClient::from_config(&config)?;

    let mut options = UploadOptions::new().with_resource_type(request.resource_type);
    if let Some(public_id) = request.public_id {
        options = options.with_public_id(public_id);
    }
    if let Some(folder) = request
        .folder
        .or_else(|| config.default_folder().map(str::to_string))
    {
        options = options.with_folder(folder);
    }
    if let Some(tags) = request.tags {
        options = options.with_tags(tags);
    }
    if let Some(storage_type) = request.storage_type {
        options = options.with_type(storage_type);
    }
    if request.overwrite {
        options = options.with_overwrite(true);
    }
    if request.use_filename {
        options = options.with_use_filename(true);
    }

    let pb = spinner(format!("Uploading {}...", request.file))?;

    let result = if request.unsigned {
        let preset = request
            .preset
            .or_else(|| config.default_preset().map(str::to_string))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "An upload preset is required for unsigned uploads.\n\
                     Pass --preset or set 'default_preset' in the [upload] section."
                )
            })?;
        client
            .unsigned_upload_image(&request.file, &preset, options)
            .await
    } else {
        if let Some(preset) = request.preset {
            options = options.with_upload_preset(preset);
        }
        client.upload_image(&request.file, options).await
    };

    pb.finish_and_clear();
    let response = result?;

    if !request.unsigned
        && !response.signature.is_empty()
        && !response.verify(&config.cloud.api_secret, client.signature_algorithm())
    {
        tracing::warn!(public_id = %response.public_id, "response signature does not match");
    }

    match output {
        "json" => println!("{}", response.to_json()?),
        _ => {
            println!("  ✅ Upload complete");
            println!();
            println!("{}", Table::new(upload_rows(&response)));
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct FieldRow {
    field: String,
    value: String,
}

fn upload_rows(response: &UploadResponse) -> Vec<FieldRow> {
    let mut rows = vec![
        ("public_id", response.public_id.clone()),
        ("version", response.version.to_string()),
        ("format", response.format.clone()),
        ("type", format!("{}/{}", response.resource_type, response.storage_type)),
        ("size", format_bytes(response.bytes)),
        ("created", format_date(&response.created_at)),
        ("url", response.secure_url.clone()),
    ];
    if response.width > 0 && response.height > 0 {
        rows.insert(3, ("dimensions", format!("{}x{}", response.width, response.height)));
    }
    if !response.tags.is_empty() {
        rows.push(("tags", response.tags.join(", ")));
    }

    rows.into_iter()
        .map(|(field, value)| FieldRow {
            field: field.to_string(),
            value,
        })
        .collect()
}

/// What a delete command targets
#[derive(Debug)]
pub enum DeleteTarget {
    Resources(Vec<String>),
    Prefix(String),
    Tag(String),
    All,
    Derived(Vec<String>),
    Transformation {
        public_ids: Vec<String>,
        transformations: Vec<String>,
    },
}

impl DeleteTarget {
    fn describe(&self, options: &DeleteOptions) -> String {
        let scope = format!("{}/{}", options.resource_type(), options.storage_type());
        match self {
            DeleteTarget::Resources(ids) => format!("{} {} asset(s)", ids.len(), scope),
            DeleteTarget::Prefix(prefix) => {
                format!("every {} asset starting with '{}'", scope, prefix)
            }
            DeleteTarget::Tag(tag) => {
                format!("every {} asset tagged '{}'", options.resource_type(), tag)
            }
            DeleteTarget::All => format!("ALL {} assets", scope),
            DeleteTarget::Derived(ids) => format!("{} derived asset(s)", ids.len()),
            DeleteTarget::Transformation {
                public_ids,
                transformations,
            } => format!(
                "derivatives '{}' of {} asset(s)",
                transformations.join("|"),
                public_ids.len()
            ),
        }
    }
}

/// Handle delete commands
pub async fn handle_delete(
    target: DeleteTarget,
    options: DeleteOptions,
    yes: bool,
    output: &str,
) -> Result<()> {
    let config = resolve_config()?;
    validate_config(&config)?;
    let client = MediaClient::from_config(&config)?;

    let description = target.describe(&options);
    if !yes {
        println!(
            "{}",
            style(format!("⚠️  Warning: you are about to delete {}", description)).yellow()
        );
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("❌ Deletion cancelled");
            return Ok(());
        }
    }

    let pb = spinner(format!("Deleting {}...", description))?;
    let result = match target {
        DeleteTarget::Resources(ids) => client.delete_resources(&ids, options).await,
        DeleteTarget::Prefix(prefix) => client.delete_resources_by_prefix(&prefix, options).await,
        DeleteTarget::Tag(tag) => client.delete_resources_by_tag(&tag, options).await,
        DeleteTarget::All => client.delete_all_resources(options).await,
        DeleteTarget::Derived(ids) => client.delete_derived_resources(&ids).await,
        DeleteTarget::Transformation {
            public_ids,
            transformations,
        } => {
            client
                .delete_derived_by_transformation(&public_ids, &transformations, options)
                .await
        }
    };
    pb.finish_and_clear();
    let response = result?;

    match output {
        "json" => println!("{}", response.to_json()?),
        _ => print_delete_result(&response),
    }

    Ok(())
}

fn print_delete_result(response: &AdminResponse) {
    #[derive(Tabled)]
    struct DeletedRow {
        id: String,
        status: String,
    }

    let rows: Vec<DeletedRow> = response
        .statuses()
        .into_iter()
        .map(|(id, status)| DeletedRow {
            id,
            status: format_status(&status),
        })
        .collect();

    if rows.is_empty() {
        println!("  No assets deleted");
    } else {
        println!("{}", Table::new(rows));
    }

    if response.partial {
        println!();
        println!("{}", style("  ⚠️  Deletion is partial, more assets remain").yellow());
        if let Some(cursor) = &response.next_cursor {
            println!("  Run the same command with --next-cursor {} to continue", cursor);
        }
    }
}

/// Format deletion status with emoji
fn format_status(status: &str) -> String {
    match status {
        "deleted" => "✅ deleted".to_string(),
        "not_found" => "⚠️  not found".to_string(),
        other => other.to_string(),
    }
}

/// Handle sign command
pub async fn handle_sign(
    params: &[String],
    secret: Option<&str>,
    algorithm: SignatureAlgorithm,
) -> Result<()> {
    let params = parse_params(params)?;

    let secret = match secret {
        Some(secret) => secret.to_string(),
        None => resolve_config()
            .map_err(|e| {
                anyhow::anyhow!("No API secret given (use --secret or run 'mediapilot init'): {}", e)
            })?
            .cloud
            .api_secret,
    };

    println!("String to sign: {}", string_to_sign(&params));
    println!("Signature ({}): {}", algorithm, sign_params(&params, &secret, algorithm));

    Ok(())
}

/// Parse `key=value` pairs; the last occurrence of a key wins
fn parse_params(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| anyhow::anyhow!("Invalid parameter '{}', expected key=value", pair))
        })
        .collect()
}

/// Handle doctor commands
pub async fn handle_doctor(action: &str) -> Result<()> {
    match action {
        "check" => {
            println!("Checking mediapilot installation...");

            println!("  ✅ mediapilot is installed");
            println!("  Version: {}", env!("CARGO_PKG_VERSION"));

            if config_exists() {
                println!("  ✅ Configuration found");

                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");
            } else if std::env::var("CLOUDINARY_URL").is_ok() {
                println!("  ✅ Using CLOUDINARY_URL");

                let config = resolve_config()?;
                validate_config(&config)?;
                println!("  ✅ Connection string valid");
            } else {
                println!("  ⚠️  Configuration not found (run 'mediapilot init' or set CLOUDINARY_URL)");
            }

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: check");
            Ok(())
        }
    }
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Format ISO date string to readable format
fn format_date(iso_date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(iso_date) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Handle shell completion generation
pub async fn handle_completion(shell: Shell, cmd: &mut Command) -> Result<()> {
    generate(shell, cmd, "mediapilot", &mut std::io::stdout());

    // Instructions go to stderr so the script can be piped
    eprintln!();
    eprintln!("Installation instructions:");
    match shell {
        Shell::Bash => {
            eprintln!("  # Add to your ~/.bashrc:");
            eprintln!("  source <(mediapilot completion bash)");
        }
        Shell::Zsh => {
            eprintln!("  mediapilot completion zsh > ~/.zsh/completion/_mediapilot");
            eprintln!("  # then add to ~/.zshrc:");
            eprintln!("  fpath=(~/.zsh/completion $fpath)");
            eprintln!("  autoload -U compinit && compinit");
        }
        Shell::Fish => {
            eprintln!("  mediapilot completion fish > ~/.config/fish/completions/mediapilot.fish");
        }
        Shell::PowerShell => {
            eprintln!("  mediapilot completion powershell | Out-String | Invoke-Expression");
        }
        _ => {}
    }

    Ok(())
}
