//! Ferry Transfer - relays a MEGA public link to Gofile.
//!
//! The [`Pipeline`] validates the link, fetches metadata, downloads the file
//! into a private scratch directory on a background task, uploads it on a
//! second background task, and reports coarse progress through a
//! [`StatusSink`]. The remote storage and upload host are reached through
//! the [`RemoteStorage`] and [`UploadHost`] traits; [`MegaClient`] and
//! [`GofileClient`] are the shipped implementations.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ferry_core::UserId;
//! use ferry_transfer::{GofileClient, MegaClient, Pipeline, PipelineOptions, TransferRequest};
//!
//! # async fn demo(sink: &dyn ferry_transfer::StatusSink) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(
//!     Arc::new(MegaClient::new()?),
//!     Arc::new(GofileClient::new()?),
//!     PipelineOptions::default(),
//! );
//! let request = TransferRequest::new("https://mega.nz/file/abc#key", UserId(42));
//! let result = pipeline.run(&request, sink).await?;
//! println!("{}", result.download_page);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod gofile;
pub mod host;
pub mod link;
pub mod mega;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod status;

#[cfg(feature = "test-support")]
pub mod testing;

pub use error::{TransferError, TransferResult};
pub use gofile::{GofileClient, GofileError};
pub use host::{UploadData, UploadHost, UploadReader, UploadResponse};
pub use link::{ACCEPTED_PREFIXES, validate_link};
pub use mega::{MegaClient, MegaError};
pub use pipeline::{Pipeline, PipelineOptions, TransferRequest, UploadResult};
pub use progress::{
    DEFAULT_BAR_WIDTH, Milestones, Phase, ProgressCell, percent_of, render_bar, render_default_bar,
};
pub use remote::{RemoteMetadata, RemoteStorage};
pub use status::{SinkError, StatusSink, StatusUpdate};
