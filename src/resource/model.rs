//! Projections of Passage applications and users.
//!
//! Every field tolerates absence so partial or empty payloads still decode.

// crates.io
use serde::{Deserialize, Serialize};
use serde_json::Value;
// self
use crate::_prelude::*;

/// Passage application settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
	/// Application identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Origin the hosted login is served from.
	pub auth_origin: String,
	/// Where users are sent after authenticating.
	pub redirect_url: String,
	/// Login page URL.
	pub login_url: String,
	/// Identifier kinds users may sign in with (`email`, `phone`, `both`).
	pub allowed_identifier: String,
	/// Identifier every user must provide.
	pub required_identifier: String,
	/// Whether email addresses must be verified.
	pub require_email_verification: bool,
	/// Whether anyone may register.
	pub public_signup: bool,
	/// Session lifetime, in seconds.
	pub session_timeout_length: i64,
	/// When the application was created.
	pub created_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
	/// Active user.
	Active,
	/// Deactivated user.
	Inactive,
	/// Registered but not yet confirmed.
	Pending,
	/// Status not known to this client.
	#[default]
	#[serde(other)]
	Unknown,
}

/// Registered passkey of a user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebAuthnDevice {
	/// Device identifier.
	pub id: String,
	/// Credential identifier.
	pub cred_id: String,
	/// Name chosen by the user.
	pub friendly_name: String,
	/// Authenticator kind, e.g. `platform`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Number of sign-ins with the device.
	pub usage_count: u64,
	/// When the device was registered.
	pub created_at: Option<DateTime<Utc>>,
	/// Last update of the device record.
	pub updated_at: Option<DateTime<Utc>>,
	/// Last sign-in with the device.
	pub last_login_at: Option<DateTime<Utc>>,
}

/// Full user record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
	/// User identifier.
	pub id: String,
	/// Email address, possibly empty.
	pub email: String,
	/// Whether the email address was verified.
	pub email_verified: bool,
	/// Phone number, possibly empty.
	pub phone: String,
	/// Whether the phone number was verified.
	pub phone_verified: bool,
	/// Lifecycle status.
	pub status: UserStatus,
	/// Identifier in an external system.
	pub external_id: String,
	/// Number of sign-ins.
	pub login_count: u64,
	/// Whether the user registered a passkey.
	pub webauthn: bool,
	/// Registered passkeys.
	pub webauthn_devices: Vec<WebAuthnDevice>,
	/// Application-defined metadata.
	pub user_metadata: Option<Value>,
	/// Creation time.
	pub created_at: Option<DateTime<Utc>>,
	/// Last update.
	pub updated_at: Option<DateTime<Utc>>,
	/// Last sign-in.
	pub last_login_at: Option<DateTime<Utc>>,
}
impl UserInfo {
	/// Whether the user may currently sign in.
	pub fn is_active(&self) -> bool {
		self.status == UserStatus::Active
	}
}

/// Entry of a user listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSummary {
	/// User identifier.
	pub id: String,
	/// Email address, possibly empty.
	pub email: String,
	/// Phone number, possibly empty.
	pub phone: String,
	/// Lifecycle status.
	pub status: UserStatus,
	/// Identifier in an external system.
	pub external_id: String,
	/// Number of sign-ins.
	pub login_count: u64,
	/// Creation time.
	pub created_at: Option<DateTime<Utc>>,
	/// Last sign-in.
	pub last_login_at: Option<DateTime<Utc>>,
}

/// Payload for creating a user; at least one identifier is expected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Phone number in E.164 format.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	/// Application-defined metadata.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_metadata: Option<Value>,
}
impl CreateUserRequest {
	/// Request for a user identified by email.
	pub fn with_email(email: impl Into<String>) -> Self {
		Self { email: Some(email.into()), ..Default::default() }
	}

	/// Request for a user identified by phone number.
	pub fn with_phone(phone: impl Into<String>) -> Self {
		Self { phone: Some(phone.into()), ..Default::default() }
	}
}

/// Payload for updating a user; unset fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
	/// New email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// New phone number.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	/// Replacement metadata.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_metadata: Option<Value>,
}
