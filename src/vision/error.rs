use std::path::PathBuf;
use thiserror::Error;

/// The error type for template loading and screen matching.
///
/// `TemplateMissing` and `TemplateDecode` are configuration defects: the
/// matcher logs them and degrades to a permanent no-match for that name.
/// `ScreenDecode` is transient, a "no usable screenshot right now" condition.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Template file not found: {path:?}")]
    TemplateMissing { path: PathBuf },

    #[error("Failed to decode template {path:?}: {source}")]
    TemplateDecode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to decode screenshot: {source}")]
    ScreenDecode { source: image::ImageError },

    #[error("Template '{name}' ({tw}x{th}) is larger than the screen ({sw}x{sh})")]
    TemplateLargerThanScreen {
        name: String,
        tw: u32,
        th: u32,
        sw: u32,
        sh: u32,
    },
}
