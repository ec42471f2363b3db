pub mod client;
pub mod error;

pub use client::FlixsyncClient;
pub use error::{SdkError, SdkResult};
pub use flixsync_core::*;
