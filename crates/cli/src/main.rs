use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use color_eyre::config::HookBuilder;
use mediapilot_core::{DeleteOptions, ResourceType, SignatureAlgorithm, StorageType};
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// mediapilot - upload and manage media assets from your terminal
#[derive(Parser, Debug)]
#[command(name = "mediapilot")]
#[command(author = "Kev <kev@m7academy.com>")]
#[command(version)]
#[command(about = "CLI to upload and manage Cloudinary media assets", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Initial setup (interactive wizard)
    Init,

    /// Manage the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Upload an image from a local path or a remote URL
    Upload {
        /// Local file path or remote URL
        file: String,
        /// Upload without signing, using an upload preset
        #[arg(long)]
        unsigned: bool,
        /// Upload preset (defaults to the configured preset)
        #[arg(long)]
        preset: Option<String>,
        /// Public ID of the uploaded asset
        #[arg(long)]
        public_id: Option<String>,
        /// Destination folder (defaults to the configured folder)
        #[arg(short, long)]
        folder: Option<String>,
        /// Comma separated tags
        #[arg(short, long)]
        tags: Option<String>,
        /// Replace an existing asset with the same public ID
        #[arg(long)]
        overwrite: bool,
        /// Use the original file name as public ID
        #[arg(long)]
        use_filename: bool,
        /// Resource type (image, video, raw)
        #[arg(long, default_value = "image")]
        resource_type: ResourceType,
        /// Delivery type (upload, private, authenticated)
        #[arg(long = "type")]
        storage_type: Option<StorageType>,
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Delete assets through the admin API
    Delete {
        #[command(subcommand)]
        action: DeleteAction,
    },

    /// Compute a request signature offline
    Sign {
        /// Parameters as key=value pairs
        #[arg(required = true)]
        params: Vec<String>,
        /// API secret (defaults to the configured secret)
        #[arg(long, env = "MEDIAPILOT_API_SECRET", hide_env_values = true)]
        secret: Option<String>,
        /// Digest algorithm (sha1, sha256)
        #[arg(long, default_value = "sha1")]
        algorithm: SignatureAlgorithm,
    },

    /// Shell completion
    Completion {
        /// Shell type
        shell: Shell,
    },

    /// Diagnostics
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Edit the configuration in $EDITOR
    Edit,
    /// Validate the configuration
    Validate,
}

/// Flags shared by every delete command
#[derive(clap::Args, Debug)]
struct DeleteFlags {
    /// Resource type (image, video, raw)
    #[arg(long, default_value = "image")]
    resource_type: ResourceType,
    /// Delivery type (upload, private, authenticated)
    #[arg(long = "type", default_value = "upload")]
    storage_type: StorageType,
    /// Keep the original, only delete derived assets
    #[arg(long)]
    keep_original: bool,
    /// Invalidate CDN cached copies
    #[arg(long)]
    invalidate: bool,
    /// Continue a previous partial deletion
    #[arg(long)]
    next_cursor: Option<String>,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: String,
}

#[derive(clap::Subcommand, Debug)]
enum DeleteAction {
    /// Delete assets by public ID
    Resources {
        #[arg(required = true)]
        public_ids: Vec<String>,
        #[command(flatten)]
        flags: DeleteFlags,
    },
    /// Delete every asset whose public ID starts with a prefix
    Prefix {
        prefix: String,
        #[command(flatten)]
        flags: DeleteFlags,
    },
    /// Delete every asset carrying a tag
    Tag {
        tag: String,
        #[command(flatten)]
        flags: DeleteFlags,
    },
    /// Delete every asset of the resource and delivery type
    All {
        #[command(flatten)]
        flags: DeleteFlags,
    },
    /// Delete derived assets by their IDs
    Derived {
        #[arg(required = true)]
        derived_ids: Vec<String>,
        #[command(flatten)]
        flags: DeleteFlags,
    },
    /// Delete the derivatives of assets produced by given transformations
    Transformation {
        /// Public IDs whose derivatives are deleted
        #[arg(required = true)]
        public_ids: Vec<String>,
        /// Transformation, repeat for several (e.g. w_150,h_100,c_fill)
        #[arg(short = 'T', long = "transformation", required = true)]
        transformations: Vec<String>,
        #[command(flatten)]
        flags: DeleteFlags,
    },
}

#[derive(clap::Subcommand, Debug)]
enum DoctorAction {
    /// Check the installation and configuration
    Check,
}

/// Delete options from the command line; unset flags are left out of the request
fn delete_options(flags: &DeleteFlags) -> DeleteOptions {
    let mut options = DeleteOptions::new()
        .with_resource_type(flags.resource_type)
        .with_type(flags.storage_type);
    if flags.keep_original {
        options = options.with_keep_original(true);
    }
    if flags.invalidate {
        options = options.with_invalidate(true);
    }
    if let Some(cursor) = &flags.next_cursor {
        options = options.with_next_cursor(cursor.clone());
    }
    options
}

/// Set up the tracing subscriber. `RUST_LOG` wins over `-v` and the configured level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => mediapilot_core::load_config()
            .map(|config| config.log_level().to_string())
            .unwrap_or_else(|_| "warn".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Execute command
    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => {
            let action_str = match action {
                ConfigAction::Show => "show",
                ConfigAction::Edit => "edit",
                ConfigAction::Validate => "validate",
            };
            handlers::handle_config(action_str).await
        }
        Commands::Upload {
            file,
            unsigned,
            preset,
            public_id,
            folder,
            tags,
            overwrite,
            use_filename,
            resource_type,
            storage_type,
            output,
        } => {
            let request = handlers::UploadRequest {
                file,
                unsigned,
                preset,
                public_id,
                folder,
                tags,
                overwrite,
                use_filename,
                resource_type,
                storage_type,
            };
            handlers::handle_upload(request, &output).await
        }
        Commands::Delete { action } => {
            let (target, flags) = match action {
                DeleteAction::Resources { public_ids, flags } => {
                    (handlers::DeleteTarget::Resources(public_ids), flags)
                }
                DeleteAction::Prefix { prefix, flags } => {
                    (handlers::DeleteTarget::Prefix(prefix), flags)
                }
                DeleteAction::Tag { tag, flags } => (handlers::DeleteTarget::Tag(tag), flags),
                DeleteAction::All { flags } => (handlers::DeleteTarget::All, flags),
                DeleteAction::Derived { derived_ids, flags } => {
                    (handlers::DeleteTarget::Derived(derived_ids), flags)
                }
                DeleteAction::Transformation {
                    public_ids,
                    transformations,
                    flags,
                } => (
                    handlers::DeleteTarget::Transformation {
                        public_ids,
                        transformations,
                    },
                    flags,
                ),
            };

            let options = delete_options(&flags);
            handlers::handle_delete(target, options, flags.yes, &flags.output).await
        }
        Commands::Sign {
            params,
            secret,
            algorithm,
        } => handlers::handle_sign(&params, secret.as_deref(), algorithm).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(shell, &mut Cli::command()).await
        }
        Commands::Doctor { action } => {
            let action_str = match action {
                DoctorAction::Check => "check",
            };
            handlers::handle_doctor(action_str).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delete_transformation() {
        let cli = Cli::try_parse_from([
            "mediapilot",
            "delete",
            "transformation",
            "sample",
            "-T",
            "w_150,h_100,c_fill",
            "-T",
            "e_sepia",
            "--type",
            "private",
            "--yes",
        ])
        .unwrap();

        match cli.command {
            Commands::Delete {
                action:
                    DeleteAction::Transformation {
                        public_ids,
                        transformations,
                        flags,
                    },
            } => {
                assert_eq!(public_ids, vec!["sample"]);
                assert_eq!(transformations, vec!["w_150,h_100,c_fill", "e_sepia"]);
                assert_eq!(flags.storage_type, StorageType::Private);
                assert_eq!(flags.resource_type, ResourceType::Image);
                assert!(flags.yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn parse_delete_flags(args: &[&str]) -> DeleteFlags {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Delete {
                action: DeleteAction::Prefix { flags, .. },
            } => flags,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_delete_options_leave_unset_flags_out() {
        let flags = parse_delete_flags(&["mediapilot", "delete", "prefix", "avatars/"]);
        let options = delete_options(&flags);

        assert_eq!(options.invalidate, None);
        assert_eq!(options.keep_original, None);
        assert_eq!(options.next_cursor, None);
        assert_eq!(options.resource_type(), ResourceType::Image);
        assert_eq!(options.storage_type(), StorageType::Upload);
    }

    #[test]
    fn test_delete_options_carry_set_flags() {
        let flags = parse_delete_flags(&[
            "mediapilot",
            "delete",
            "prefix",
            "avatars/",
            "--invalidate",
            "--keep-original",
            "--next-cursor",
            "c2f9",
        ]);
        let options = delete_options(&flags);

        assert_eq!(options.invalidate, Some(true));
        assert_eq!(options.keep_original, Some(true));
        assert_eq!(options.next_cursor.as_deref(), Some("c2f9"));
    }

    #[test]
    fn test_parse_upload_rejects_unknown_resource_type() {
        let result = Cli::try_parse_from([
            "mediapilot",
            "upload",
            "photo.jpg",
            "--resource-type",
            "document",
        ]);
        assert!(result.is_err());
    }
}
