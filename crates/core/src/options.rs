//! Typed request options and their mapping to form/query parameters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Parameters an unsigned upload is allowed to carry. Everything else must come
/// from the upload preset.
pub const UNSIGNED_UPLOAD_PARAMS: &[&str] = &[
    "public_id",
    "folder",
    "callback",
    "tags",
    "context",
    "face_coordinates",
    "custom_coordinates",
    "upload_preset",
];

/// Kind of asset, first path segment of upload and admin endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            "raw" => Ok(ResourceType::Raw),
            other => Err(Error::InvalidInput(format!(
                "unknown resource type '{}' (expected image, video or raw)",
                other
            ))),
        }
    }
}

/// Delivery/storage type of an asset (`upload`, `private`, `authenticated`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Upload,
    Private,
    Authenticated,
}

impl StorageType {
    pub fn as_str(&self) -> &str {
        match self {
            StorageType::Upload => "upload",
            StorageType::Private => "private",
            StorageType::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "upload" => Ok(StorageType::Upload),
            "private" => Ok(StorageType::Private),
            "authenticated" => Ok(StorageType::Authenticated),
            other => Err(Error::InvalidInput(format!(
                "unknown storage type '{}' (expected upload, private or authenticated)",
                other
            ))),
        }
    }
}

/// Optional upload parameters.
///
/// Unset fields are never sent. Field names serialize to the parameter names the
/// upload endpoint expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_formats: Option<String>,
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_tagging: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_removal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_coordinates: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard_original_filename: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager_notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidate: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_analysis: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_convert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_delete_token: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_filename: Option<bool>,
    /// Required for unsigned uploads, optional for signed ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_filename: Option<bool>,

    /// Selects the endpoint, never sent as a form field
    #[serde(skip)]
    pub resource_type: Option<ResourceType>,
}

impl UploadOptions {
    /// Create empty upload options
    pub fn new() -> Self {
        Self::default()
    }

    // === Identity & placement ===

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_upload_preset(mut self, upload_preset: impl Into<String>) -> Self {
        self.upload_preset = Some(upload_preset.into());
        self
    }

    pub fn with_use_filename(mut self, use_filename: bool) -> Self {
        self.use_filename = Some(use_filename);
        self
    }

    pub fn with_unique_filename(mut self, unique_filename: bool) -> Self {
        self.unique_filename = Some(unique_filename);
        self
    }

    pub fn with_discard_original_filename(mut self, discard: bool) -> Self {
        self.discard_original_filename = Some(discard);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    /// Endpoint family for the upload (`image` when unset)
    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    /// Delivery type of the stored asset, sent as `type`
    pub fn with_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = Some(storage_type);
        self
    }

    pub fn with_access_mode(mut self, access_mode: impl Into<String>) -> Self {
        self.access_mode = Some(access_mode.into());
        self
    }

    // === Metadata ===

    /// Comma separated list of tags
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Pipe separated `key=value` pairs
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_face_coordinates(mut self, coordinates: impl Into<String>) -> Self {
        self.face_coordinates = Some(coordinates.into());
        self
    }

    pub fn with_custom_coordinates(mut self, coordinates: impl Into<String>) -> Self {
        self.custom_coordinates = Some(coordinates.into());
        self
    }

    pub fn with_headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    // === Analysis ===

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_faces(mut self, faces: bool) -> Self {
        self.faces = Some(faces);
        self
    }

    pub fn with_quality_analysis(mut self, quality_analysis: bool) -> Self {
        self.quality_analysis = Some(quality_analysis);
        self
    }

    pub fn with_image_metadata(mut self, image_metadata: bool) -> Self {
        self.image_metadata = Some(image_metadata);
        self
    }

    pub fn with_exif(mut self, exif: bool) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn with_phash(mut self, phash: bool) -> Self {
        self.phash = Some(phash);
        self
    }

    /// Confidence threshold (0.0 - 1.0) for automatic tagging
    pub fn with_auto_tagging(mut self, threshold: f64) -> Self {
        self.auto_tagging = Some(threshold);
        self
    }

    pub fn with_categorization(mut self, categorization: impl Into<String>) -> Self {
        self.categorization = Some(categorization.into());
        self
    }

    pub fn with_detection(mut self, detection: impl Into<String>) -> Self {
        self.detection = Some(detection.into());
        self
    }

    pub fn with_ocr(mut self, ocr: impl Into<String>) -> Self {
        self.ocr = Some(ocr.into());
        self
    }

    pub fn with_moderation(mut self, moderation: impl Into<String>) -> Self {
        self.moderation = Some(moderation.into());
        self
    }

    pub fn with_background_removal(mut self, background_removal: impl Into<String>) -> Self {
        self.background_removal = Some(background_removal.into());
        self
    }

    pub fn with_raw_convert(mut self, raw_convert: impl Into<String>) -> Self {
        self.raw_convert = Some(raw_convert.into());
        self
    }

    // === Processing ===

    pub fn with_transformation(mut self, transformation: impl Into<String>) -> Self {
        self.transformation = Some(transformation.into());
        self
    }

    pub fn with_eager(mut self, eager: impl Into<String>) -> Self {
        self.eager = Some(eager.into());
        self
    }

    pub fn with_eager_async(mut self, eager_async: bool) -> Self {
        self.eager_async = Some(eager_async);
        self
    }

    pub fn with_eager_notification_url(mut self, url: impl Into<String>) -> Self {
        self.eager_notification_url = Some(url.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_allowed_formats(mut self, formats: impl Into<String>) -> Self {
        self.allowed_formats = Some(formats.into());
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn with_invalidate(mut self, invalidate: bool) -> Self {
        self.invalidate = Some(invalidate);
        self
    }

    pub fn with_return_delete_token(mut self, return_delete_token: bool) -> Self {
        self.return_delete_token = Some(return_delete_token);
        self
    }

    // === Delivery ===

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn with_notification_url(mut self, url: impl Into<String>) -> Self {
        self.notification_url = Some(url.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    // === Accessors ===

    pub fn public_id(&self) -> &str {
        self.public_id.as_deref().unwrap_or("")
    }

    pub fn upload_preset(&self) -> &str {
        self.upload_preset.as_deref().unwrap_or("")
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type.unwrap_or_default()
    }

    /// Render every set option as a text parameter, ordered by name
    pub fn to_params(&self) -> Result<BTreeMap<String, String>> {
        // serde_json turns NaN and infinities into null, which would drop the field
        if let Some(threshold) = self.auto_tagging {
            if !threshold.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "auto_tagging must be a finite number (got {})",
                    threshold
                )));
            }
        }

        let value = serde_json::to_value(self)?;
        let Value::Object(fields) = value else {
            return Err(Error::InvalidInput(
                "upload options did not serialize to an object".to_string(),
            ));
        };

        let mut params = BTreeMap::new();
        for (name, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => match n.as_f64() {
                    Some(f) if n.is_f64() => f.to_string(),
                    _ => n.to_string(),
                },
                other => other.to_string(),
            };
            params.insert(name, text);
        }

        Ok(params)
    }

    /// Parameters for an unsigned upload: only the allowed subset survives
    pub fn unsigned_params(&self) -> Result<BTreeMap<String, String>> {
        let mut params = self.to_params()?;
        params.retain(|name, _| {
            let allowed = UNSIGNED_UPLOAD_PARAMS.contains(&name.as_str());
            if !allowed {
                tracing::warn!(
                    parameter = %name,
                    "dropping parameter not allowed on unsigned uploads (set it in the upload preset)"
                );
            }
            allowed
        });
        Ok(params)
    }
}

/// Options shared by the admin delete operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub resource_type: Option<ResourceType>,
    pub storage_type: Option<StorageType>,
    pub keep_original: Option<bool>,
    pub invalidate: Option<bool>,
    pub next_cursor: Option<String>,
}

impl DeleteOptions {
    /// Create empty delete options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn with_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = Some(storage_type);
        self
    }

    /// Delete only derived assets and keep the originals
    pub fn with_keep_original(mut self, keep_original: bool) -> Self {
        self.keep_original = Some(keep_original);
        self
    }

    /// Invalidate CDN cached copies
    pub fn with_invalidate(mut self, invalidate: bool) -> Self {
        self.invalidate = Some(invalidate);
        self
    }

    /// Continue a partial deletion
    pub fn with_next_cursor(mut self, next_cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(next_cursor.into());
        self
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type.unwrap_or_default()
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type.unwrap_or_default()
    }

    pub fn keep_original(&self) -> bool {
        self.keep_original.unwrap_or(false)
    }
}
