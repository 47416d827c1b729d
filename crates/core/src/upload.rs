//! Image upload: source resolution, multipart form building and the upload calls

use crate::client::MediaClient;
use crate::error::{Error, Result};
use crate::options::UploadOptions;
use crate::signature::{self, SignatureAlgorithm};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Where the asset to upload comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// File on the local disk, streamed in the request body
    Local(PathBuf),
    /// HTTP(S)/FTP URL or data URI, fetched by the service
    Remote(String),
    /// `s3://bucket/key`
    S3(String),
    /// `gs://bucket/key`
    GoogleStorage(String),
}

impl UploadSource {
    /// Classify a user supplied file argument
    pub fn resolve(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidInput("invalid file".to_string()));
        }

        let lower = input.to_lowercase();
        let source = if lower.starts_with("s3://") {
            UploadSource::S3(input.to_string())
        } else if lower.starts_with("gs://") {
            UploadSource::GoogleStorage(input.to_string())
        } else if input.contains("://") || lower.starts_with("data:") {
            UploadSource::Remote(input.to_string())
        } else {
            UploadSource::Local(PathBuf::from(input))
        };

        Ok(source)
    }
}

/// How the upload request is authorized
#[derive(Debug, Clone)]
pub enum Signing<'a> {
    /// `api_key`, `timestamp` and `signature` fields are added
    Signed {
        api_key: &'a str,
        api_secret: &'a str,
        timestamp: String,
        algorithm: SignatureAlgorithm,
    },
    /// Authorized by the `upload_preset` alone
    Unsigned,
}

/// The `file` part of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePart {
    Local {
        path: PathBuf,
        file_name: String,
        mime_type: String,
        len: u64,
    },
    Remote(String),
}

/// A fully prepared upload body, before it is turned into a multipart stream
#[derive(Debug, Clone)]
pub struct UploadForm {
    fields: Vec<(String, String)>,
    file: FilePart,
}

impl UploadForm {
    /// Prepare the form fields for `source`.
    ///
    /// Local files are checked here (existence, not a directory) but only opened
    /// by [`UploadForm::into_multipart`].
    pub async fn build(
        source: UploadSource,
        options: &UploadOptions,
        signing: &Signing<'_>,
    ) -> Result<Self> {
        let file = match source {
            UploadSource::Local(path) => local_file_part(&path).await?,
            UploadSource::Remote(url) => FilePart::Remote(url),
            UploadSource::S3(uri) => {
                return Err(Error::UnsupportedSource(format!(
                    "uploading from Amazon S3 is not implemented ({})",
                    uri
                )))
            }
            UploadSource::GoogleStorage(uri) => {
                return Err(Error::UnsupportedSource(format!(
                    "uploading from Google Storage is not implemented ({})",
                    uri
                )))
            }
        };

        let fields = match signing {
            Signing::Signed {
                api_key,
                api_secret,
                timestamp,
                algorithm,
            } => {
                let mut params = options.to_params()?;
                params.insert("timestamp".to_string(), timestamp.clone());
                let signature = signature::sign_params(&params, api_secret, *algorithm);

                let mut fields: Vec<(String, String)> = params.into_iter().collect();
                fields.push(("api_key".to_string(), api_key.to_string()));
                fields.push(("signature".to_string(), signature));
                fields
            }
            Signing::Unsigned => {
                if options.upload_preset().trim().is_empty() {
                    return Err(Error::InvalidInput(
                        "upload_preset is required for unsigned uploading".to_string(),
                    ));
                }
                options.unsigned_params()?.into_iter().collect()
            }
        };

        Ok(Self { fields, file })
    }

    /// Text fields in the order they are written
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of a text field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self) -> &FilePart {
        &self.file
    }

    /// Turn the prepared fields into a streaming multipart body
    pub async fn into_multipart(self) -> Result<Form> {
        let mut form = Form::new();

        form = match self.file {
            FilePart::Remote(url) => form.text("file", url),
            FilePart::Local {
                path,
                file_name,
                mime_type,
                len,
            } => {
                let file = File::open(&path).await?;
                let body = Body::wrap_stream(ReaderStream::new(file));
                let part = Part::stream_with_length(body, len)
                    .file_name(file_name)
                    .mime_str(&mime_type)?;
                form.part("file", part)
            }
        };

        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        Ok(form)
    }
}

async fn local_file_part(path: &Path) -> Result<FilePart> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        Error::InvalidFile(format!("cannot read {}: {}", path.display(), e))
    })?;

    if metadata.is_dir() {
        return Err(Error::InvalidFile(
            "the asset to upload can't be a directory".to_string(),
        ));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Ok(FilePart::Local {
        path: path.to_path_buf(),
        file_name,
        mime_type,
        len: metadata.len(),
    })
}

/// Answer of the upload endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub public_id: String,
    pub version: i64,
    pub signature: String,
    pub width: i64,
    pub height: i64,
    pub format: String,
    pub resource_type: String,
    pub created_at: String,
    pub tags: Vec<String>,
    pub bytes: i64,
    #[serde(rename = "type")]
    pub storage_type: String,
    pub etag: String,
    pub placeholder: bool,
    pub url: String,
    pub secure_url: String,
    pub access_mode: String,
    pub original_filename: String,
}

impl UploadResponse {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that the response was produced by the service holding `api_secret`
    pub fn verify(&self, api_secret: &str, algorithm: SignatureAlgorithm) -> bool {
        signature::verify_response_signature(
            &self.public_id,
            self.version,
            &self.signature,
            api_secret,
            algorithm,
        )
    }
}

impl MediaClient {
    /// Signed upload.
    ///
    /// `file` may be a local path or a remote URL; the request carries
    /// `api_key`, `timestamp` and a `signature` computed with the API secret.
    pub async fn upload_image(&self, file: &str, options: UploadOptions) -> Result<UploadResponse> {
        let source = UploadSource::resolve(file)?;
        let signing = Signing::Signed {
            api_key: self.api_key(),
            api_secret: self.api_secret(),
            timestamp: signature::unix_timestamp()?,
            algorithm: self.signature_algorithm(),
        };
        let form = UploadForm::build(source, &options, &signing).await?;
        self.send_upload(form, &options).await
    }

    /// Unsigned upload authorized by `upload_preset`.
    ///
    /// Only the parameters listed in [`crate::options::UNSIGNED_UPLOAD_PARAMS`]
    /// are sent; `overwrite` is never sent.
    pub async fn unsigned_upload_image(
        &self,
        file: &str,
        upload_preset: &str,
        options: UploadOptions,
    ) -> Result<UploadResponse> {
        if file.trim().is_empty() {
            return Err(Error::InvalidInput("invalid file".to_string()));
        }
        if upload_preset.trim().is_empty() {
            return Err(Error::InvalidInput(
                "upload_preset is required for unsigned uploading".to_string(),
            ));
        }

        let source = UploadSource::resolve(file)?;
        let options = options.with_upload_preset(upload_preset);
        let form = UploadForm::build(source, &options, &Signing::Unsigned).await?;
        self.send_upload(form, &options).await
    }

    async fn send_upload(&self, form: UploadForm, options: &UploadOptions) -> Result<UploadResponse> {
        let url = self.endpoint(&format!("{}/upload", options.resource_type()));
        tracing::debug!(url = %url, fields = form.fields().len(), "sending upload request");

        let multipart = form.into_multipart().await?;
        let response = self.http_client().post(&url).multipart(multipart).send().await?;

        let uploaded: UploadResponse = self.handle_response(response).await?;
        tracing::info!(
            public_id = %uploaded.public_id,
            bytes = uploaded.bytes,
            "upload complete"
        );
        Ok(uploaded)
    }
}
