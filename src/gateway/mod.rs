//! Collaborator access: registration, registration lookup, and opportunity
//! listings.
//!
//! [`PlatformGateway`] is the transport seam and reports failures as
//! [`GatewayError`]. [`GatewayFacade`] wraps it for the menu engine and never
//! fails: every error degrades to a safe default.

pub mod facade;
pub mod http;
pub mod model;
pub mod retry;

use async_trait::async_trait;

use crate::error::GatewayError;

pub use facade::GatewayFacade;
pub use http::HttpGateway;
pub use model::{OpportunityDigest, OpportunityKind, RegistrationRequest};
pub use retry::RetryPolicy;

/// Calls to the user and opportunity services.
///
/// `session_id` is forwarded for downstream log correlation.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Submit a completed registration. Any non-success status is an error.
    async fn register_user(
        &self,
        request: &RegistrationRequest,
        session_id: &str,
    ) -> Result<(), GatewayError>;

    /// Whether a user with this canonical phone number exists.
    async fn is_registered(&self, phone: &str, session_id: &str) -> Result<bool, GatewayError>;

    /// Open opportunities of one kind.
    async fn fetch_opportunities(
        &self,
        kind: OpportunityKind,
        session_id: &str,
    ) -> Result<Vec<OpportunityDigest>, GatewayError>;
}
