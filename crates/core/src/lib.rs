//! mediapilot-core - Core library for the mediapilot CLI
//!
//! Client for a Cloudinary-style media API: signed and unsigned image uploads,
//! request signing and admin resource deletion.

pub mod admin;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod signature;
pub mod upload;

// Re-export commonly used types
pub use admin::{AdminResponse, DeleteRequest, MAX_IDS_PER_REQUEST};
pub use client::{Credentials, MediaClient, DEFAULT_API_BASE_URL};
pub use config::{
    config_exists, get_config_path, load_config, redact, resolve_config, save_config,
    validate_config,
};
pub use config::{AdvancedConfig, CloudConfig, Config, ConfigFile, LoggingConfig, UploadConfig};
pub use error::{Error, Result};
pub use options::{DeleteOptions, ResourceType, StorageType, UploadOptions};
pub use signature::{sign_params, string_to_sign, SignatureAlgorithm};
pub use upload::{UploadForm, UploadResponse, UploadSource};
