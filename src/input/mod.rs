//! Local input producers: uploaded files and typed text, validated before
//! anything is sent to the model.

use log::debug;
use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error;

use crate::llm::InlineData;

pub const TEXT_EXTENSIONS: &[&str] = &["txt", "csv"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("{0}")]
    Empty(&'static str),

    #[error("Unsupported file type '{}': expected one of {expected}", .path.display())]
    UnsupportedFileType {
        path: PathBuf,
        expected: String,
    },

    #[error("Could not read '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{value}' is not one of: {}", .options.join(", "))]
    NotAnOption {
        value: String,
        options: &'static [&'static str],
    },

    #[error("This page does not accept {0}")]
    NotAccepted(&'static str),
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn require_text<'a>(input: &'a str, message: &'static str) -> Result<&'a str, InputError> {
    if input.trim().is_empty() {
        return Err(InputError::Empty(message));
    }
    Ok(input)
}

pub fn require_option(
    value: &str,
    options: &'static [&'static str]
) -> Result<&'static str, InputError> {
    options
        .iter()
        .copied()
        .find(|o| o.eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| InputError::NotAnOption {
            value: value.to_string(),
            options,
        })
}

/// Reads a `.txt` or `.csv` upload as UTF-8 text.
pub fn read_text_file(path: &Path) -> Result<String, InputError> {
    match extension(path) {
        Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(InputError::UnsupportedFileType {
                path: path.to_path_buf(),
                expected: TEXT_EXTENSIONS.iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }

    let content = fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    require_text(&content, "Please upload a file.")?;
    Ok(content)
}

pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let mime = match extension(path)?.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => {
            return None;
        }
    };
    Some(mime)
}

/// Reads an image upload and encodes it for inline transfer.
pub fn read_image_file(path: &Path) -> Result<InlineData, InputError> {
    let mime_type = image_mime_type(path).ok_or_else(|| InputError::UnsupportedFileType {
        path: path.to_path_buf(),
        expected: "an image (png, jpg, gif, webp, heic)".to_string(),
    })?;
    let bytes = fs::read(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(InputError::Empty("Please upload an image first."));
    }
    Ok(InlineData::from_bytes(mime_type, &bytes))
}
