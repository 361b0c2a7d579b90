//! Classification of management call failures into the crate taxonomy.

// std
use std::fmt::{Display, Formatter, Result as FmtResult};
// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, http::client::TransportError, metrics};

/// Operation a failure is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Fetch application details.
	GetApp,
	/// Fetch a user by id.
	GetUser,
	/// Look a user up by email address or phone number.
	GetUserByIdentifier,
	/// Create a user.
	CreateUser,
	/// Update a user's attributes.
	UpdateUser,
	/// Delete a user.
	DeleteUser,
	/// Activate a user.
	ActivateUser,
	/// Deactivate a user.
	DeactivateUser,
	/// Revoke every refresh token of a user.
	RevokeRefreshTokens,
	/// Validate a session token.
	ValidateToken,
}
impl Operation {
	/// Human readable failure message for the operation.
	pub fn message(self) -> &'static str {
		match self {
			Self::GetApp => "Unable to get app.",
			Self::GetUser => "Unable to get user.",
			Self::GetUserByIdentifier => "Unable to get user by identifier.",
			Self::CreateUser => "Unable to create user.",
			Self::UpdateUser => "Unable to update user.",
			Self::DeleteUser => "Unable to delete user.",
			Self::ActivateUser => "Unable to activate user.",
			Self::DeactivateUser => "Unable to deactivate user.",
			Self::RevokeRefreshTokens => "Unable to revoke refresh tokens.",
			Self::ValidateToken => "Unable to validate token.",
		}
	}

	/// Stable snake_case name, used in logs and metric labels.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::GetApp => "get_app",
			Self::GetUser => "get_user",
			Self::GetUserByIdentifier => "get_user_by_identifier",
			Self::CreateUser => "create_user",
			Self::UpdateUser => "update_user",
			Self::DeleteUser => "delete_user",
			Self::ActivateUser => "activate_user",
			Self::DeactivateUser => "deactivate_user",
			Self::RevokeRefreshTokens => "revoke_refresh_tokens",
			Self::ValidateToken => "validate_token",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure produced inside a management call, before classification.
#[derive(Debug)]
pub(crate) enum CallError {
	/// Already classified; passed through untouched.
	Passage(Error),
	/// Raw transport failure.
	Transport(TransportError),
}
impl From<Error> for CallError {
	fn from(err: Error) -> Self {
		Self::Passage(err)
	}
}
impl From<TransportError> for CallError {
	fn from(err: TransportError) -> Self {
		Self::Transport(err)
	}
}

/// Run `future` as `operation`, honouring `cancel` and classifying any failure.
///
/// Transport failures carrying a provider status become [`Error::RemoteApi`]; every other
/// transport failure becomes [`Error::Unexpected`]. Crate errors are returned as they are.
pub(crate) async fn call<T, F>(
	operation: Operation,
	cancel: &CancellationToken,
	future: F,
) -> Result<T>
where
	F: Future<Output = Result<T, CallError>>,
{
	let outcome = match race(operation, cancel, future).await {
		Ok(outcome) => outcome,
		Err(err) => {
			metrics::record_remote_call(operation.as_str(), "cancelled");

			return Err(err);
		},
	};

	match outcome {
		Ok(value) => {
			metrics::record_remote_call(operation.as_str(), "success");

			Ok(value)
		},
		Err(err) => {
			let err = classify(operation, err);

			metrics::record_remote_call(operation.as_str(), outcome_label(&err));
			tracing::warn!(%operation, error = %err, "management call failed");

			Err(err)
		},
	}
}

/// Run a local `future` as `operation`, honouring `cancel` only.
///
/// Records no management call metric and leaves failure logging to `future`.
pub(crate) async fn cancellable<T, F>(
	operation: Operation,
	cancel: &CancellationToken,
	future: F,
) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	race(operation, cancel, future).await?
}

async fn race<T, F>(operation: Operation, cancel: &CancellationToken, future: F) -> Result<T>
where
	F: Future<Output = T>,
{
	if cancel.is_cancelled() {
		return Err(cancelled(operation));
	}

	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(cancelled(operation)),
		outcome = future => Ok(outcome),
	}
}

fn classify(operation: Operation, err: CallError) -> Error {
	match err {
		CallError::Passage(err) => err,
		CallError::Transport(TransportError::Status { status, body }) =>
			Error::RemoteApi { operation, status, body },
		CallError::Transport(source) => match source.status() {
			Some(status) => Error::RemoteApi { operation, status, body: None },
			None => Error::Unexpected { operation, source },
		},
	}
}

fn cancelled(operation: Operation) -> Error {
	tracing::debug!(%operation, "call cancelled");

	Error::Cancelled { operation }
}

fn outcome_label(err: &Error) -> &'static str {
	match err {
		Error::RemoteApi { .. } => "remote_api",
		Error::Unexpected { .. } => "unexpected",
		Error::NotFound { .. } => "not_found",
		Error::Configuration(_) => "configuration",
		_ => "error",
	}
}
