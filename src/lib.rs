//! `adtechmedia-http` is an async client for the AdTechMedia content
//! monetization API.
//!
//! Every call goes through [`ResilientJsonClient::request`], which retries
//! with exponential backoff until the response carries the expected fields:
//! - [`ResilientJsonClient`] — generic JSON request core
//! - [`AdtechmediaClient`] — typed property, content and account endpoints
//! - [`OptionStore`] — injected key-value storage for plugin settings

mod api;
mod client;
mod error;
mod options;
mod request;
mod settings;
mod store;
mod transport;
mod types;
mod wire;

#[cfg(test)]
mod test_support;

pub use api::AdtechmediaClient;
pub use client::ResilientJsonClient;
pub use error::{AtmError, AttemptFailure, TransportError};
pub use options::{ClientOptions, RetryPolicy};
pub use request::{HttpMethod, HttpRequest, JsonRequest};
pub use settings::PluginSettings;
pub use store::{MemoryStore, OptionStore, PrefixedStore};
pub use transport::{HttpResponse, ReqwestTransport, Sleep, TokioSleep, Transport};
pub use types::{
    ContentQuery, NewProperty, OffsetType, PledgedType, PropertyBuild, PropertyConfig, ThemeQuery,
};

pub type Result<T> = std::result::Result<T, AtmError>;
