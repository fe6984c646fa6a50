//! EasyImage Uploader
//!
//! Markdown文書内の画像参照を検出し、EasyImageへアップロードしてリンクを書き換える

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod processor;
pub mod store;
pub mod uploader;

pub use error::{Result, UploaderError};
pub use processor::{ImageProcessor, ReferenceOutcome, SelectionOutcome};
