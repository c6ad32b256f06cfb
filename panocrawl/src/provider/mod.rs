//! External panorama capabilities
//!
//! This module provides the traits the crawler consumes (coverage listing,
//! pyramid tile download, capture metadata) and the Street View
//! implementation of all three over an injectable HTTP client.
//!
//! ```ignore
//! use panocrawl::provider::{AsyncReqwestClient, StreetViewProvider};
//!
//! let client = AsyncReqwestClient::with_options(20, DEFAULT_USER_AGENT)?;
//! let provider = StreetViewProvider::new(client);
//! let tile = provider.fetch_tile("pano_id", 4, 1, 3).await?;
//! ```

mod http;
mod streetview;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use streetview::StreetViewProvider;
pub use types::{
    CoverageSource, HistoryEntry, ImageSize, MetadataSource, PanoramaLink, PanoramaMetadata,
    PanoramaRef, ProviderError, TileSource,
};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
