//! Typed requests on top of [`PreferencesApi`].

use shipsmind_retry::Failure;
use tracing::debug;

use crate::codec::{decode_response, encode_body};
use crate::{Method, Preferences, PreferencesApi, PreferencesUpdate};

/// One request per call, no caching and no retries. See
/// [`PreferencesService`](crate::PreferencesService) for those.
#[derive(Debug, Clone)]
pub struct PreferencesClient<A> {
    api: A,
}

impl<A: PreferencesApi> PreferencesClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Reads the user's preferences. If the store reports none (404),
    /// creates a default record and returns it.
    pub async fn fetch(&self) -> Result<Preferences, Failure> {
        let response = self.api.send(Method::Get, None).await?;
        if response.status == 404 {
            debug!("no stored preferences, creating defaults");
            return self.create(&Preferences::default().as_update()).await;
        }
        decode_response(&response)
    }

    /// Applies a partial update. A user with no record yet gets one
    /// created from the same fields.
    pub async fn update(&self, update: &PreferencesUpdate) -> Result<Preferences, Failure> {
        let body = encode_body(update)?;
        let response = self.api.send(Method::Patch, Some(body)).await?;
        if response.status == 404 {
            debug!("PATCH found no record, falling back to POST");
            return self.create(update).await;
        }
        decode_response(&response)
    }

    /// Creates (or replaces) the record.
    pub async fn create(&self, update: &PreferencesUpdate) -> Result<Preferences, Failure> {
        let body = encode_body(update)?;
        let response = self.api.send(Method::Post, Some(body)).await?;
        decode_response(&response)
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}
