//! # authorizer
//!
//! Request-authorization and credential-issuance core.
//!
//! ## Components
//!
//! - **SecretStore:** Resolves and memoizes the signing secret from a [`SecretProvider`],
//!   falling back to a configured default when the backing store is unreachable.
//! - **TokenVerifier:** Turns a raw credential into an [`Identity`] through an ordered
//!   chain of accepted formats.
//! - **PolicyGenerator:** Turns a verification outcome into a stage-wide [`AccessDecision`].
//! - **TokenIssuer:** Mints signed credentials for identities proven upstream.
//! - **AuthorizationGateway:** Per-request orchestration that always answers with a decision.
//!
//! This crate is decoupled from HTTP; `authorizer-server` exposes it over axum.

pub mod claims;
pub mod error;
pub mod gateway;
pub mod issuer;
pub mod policy;
pub mod secret;
pub mod verifier;

pub use claims::{Claims, CredentialKind, Identity};
pub use error::{GatewayError, IssuanceError, RejectReason, SecretError};
pub use gateway::{ANONYMOUS_PRINCIPAL, AuthorizationGateway};
pub use issuer::{IssuedCredential, TOKEN_VALIDITY_DAYS, TokenIssuer};
pub use policy::{AccessDecision, Effect, MethodArn, PolicyGenerator};
pub use secret::{
    ExtensionSecretProvider, Secret, SecretProvider, SecretSource, SecretStore,
    StaticSecretProvider,
};
pub use verifier::{
    CredentialStrategy, LegacyEncodedStrategy, LegacyLiteralStrategy, SignedTokenStrategy,
    TokenVerifier,
};
