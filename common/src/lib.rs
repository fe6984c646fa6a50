//! EasyImage Uploader Common Library
//!
//! 画像参照の検出・分類・置換。I/Oを持たない純粋なロジックのみ

pub mod types;
pub mod settings;
pub mod error;
pub mod scanner;
pub mod classifier;
pub mod path;
pub mod rewrite;

pub use types::{
    BatchResult, HostedImage, ImageKind, ImageMatch, ImageReference, ItemFailure, LocalPath,
};
pub use settings::{Settings, MAX_CONCURRENT_UPLOADS};
pub use error::{Error, Result};
pub use scanner::{detect, first_match};
pub use classifier::Classifier;
pub use path::{
    file_extension, generate_filename, is_absolute_path, is_web_url, normalize_path,
    resolve_relative_path,
};
pub use rewrite::{apply_replacements, Replacement};
