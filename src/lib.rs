//! fileshed - a small file-storage API.
//!
//! Users authenticate with Basic credentials, receive an opaque session
//! token, and use it to upload files and folders, list them, toggle
//! visibility, and download content. A background worker derives resized
//! copies of uploaded images.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod health;
pub mod sessions;
pub mod state;
pub mod storage;
pub mod thumbs;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
