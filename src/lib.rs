//! Async Passage client: JWKS-backed token validation plus app, user and session management for
//! Rust services.
//!
//! Start from [`Passage`] for the whole surface, or build [`TokenValidator`], [`App`], [`User`]
//! or [`Session`] individually from a [`TenantConfig`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod credentials;
pub mod http;
pub mod metrics;
pub mod resource;
pub mod security;
pub mod token;

mod client;
mod error;
mod normalize;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use chrono::{DateTime, Utc};
	pub use tokio::time::Instant;

	pub use crate::{Error, Result};
}

pub use crate::{
	cache::{KeySetCache, RefreshPolicy},
	client::Passage,
	config::{AuthStrategy, TenantConfig},
	credentials::Credentials,
	error::{ConfigError, Error, Result},
	normalize::Operation,
	resource::{
		App, AppOperations, Session, SessionOperations, User, UserOperations,
		model::{
			AppInfo, CreateUserRequest, UpdateUserRequest, UserInfo, UserStatus, UserSummary,
			WebAuthnDevice,
		},
	},
	security::ApiKey,
	token::{TokenValidator, ValidationPolicy, VerificationFailure},
};
#[cfg(feature = "prometheus")] pub use crate::metrics::install_default_exporter;
