//! The raw preferences endpoint, supplied by the host.

use std::future::Future;
use std::sync::Arc;

use shipsmind_retry::Failure;

/// Request methods the preferences endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read; the store creates defaults for a new user.
    Get,
    /// Create or replace.
    Post,
    /// Partial update; 404 when the user has no record yet.
    Patch,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// A response as it came off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for the signed-in user's preferences endpoint.
///
/// Authentication travels with the transport (a cookie, a bearer
/// header), so requests carry no user id. A request that never got a
/// response is a [`Failure::Network`]; any response, whatever its
/// status, is `Ok`.
pub trait PreferencesApi: Send + Sync + 'static {
    fn send(
        &self,
        method: Method,
        body: Option<String>,
    ) -> impl Future<Output = Result<RawResponse, Failure>> + Send;
}

impl<A: PreferencesApi> PreferencesApi for Arc<A> {
    fn send(
        &self,
        method: Method,
        body: Option<String>,
    ) -> impl Future<Output = Result<RawResponse, Failure>> + Send {
        (**self).send(method, body)
    }
}
