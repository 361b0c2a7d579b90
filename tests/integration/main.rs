//! Integration tests for token validation and the management façades.

mod common;
mod resources;
mod token_validation;
