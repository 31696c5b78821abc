//! Typed, retry-aware async client for the Moip v2 payments API.
//!
//! [`Client::init`](client::Client::init) exchanges application credentials for an access
//! token, then exposes three resource facades: [`order`](client::Client::order),
//! [`payment`](client::Client::payment), and [`escrow`](client::Client::escrow). Every facade
//! talks to the service through the narrow [`executor::Execute`] seam, which the default
//! [`executor::RequestExecutor`] implements with token attachment, 401 recovery, and bounded
//! exponential backoff.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod resource;

pub use client::{Client, ClientBuilder};
pub use config::{AuthConfig, ClientOptions, Environment};
pub use error::{Error, Result};

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
