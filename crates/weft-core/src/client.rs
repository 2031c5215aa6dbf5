//! gRPC client for the access manager credential service.
//!
//! [`AccessManagerClient`] is a stateless wrapper over the
//! `weft.access.v1.AccessManager` service: it translates a
//! [`CredentialRequest`] into the wire request verbatim, performs a single
//! unary call bounded by a deadline, and surfaces any transport or
//! application failure as [`Error::CredentialFetch`]. It never retries;
//! retry policy belongs to the caller.

use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

use weft_proto::v1::access_manager_client::AccessManagerClient as ProtoClient;
use weft_proto::v1::{ApplicationType, GetCredentialsRequest};

use crate::credentials::{CredentialRequest, CredentialSource, VendedCredentials};
use crate::error::{Error, Result};

/// Default per-call deadline for credential fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The fixed caller identity sent with every credential request.
const APPLICATION_TYPE: ApplicationType = ApplicationType::Engine;

/// Client for the access manager's `GetCredentials` RPC.
///
/// Safe to share across collections: the underlying channel multiplexes
/// requests and the client holds no per-request state.
#[derive(Debug, Clone)]
pub struct AccessManagerClient {
    inner: ProtoClient<Channel>,
    timeout: Duration,
}

impl AccessManagerClient {
    /// Creates a client over an already-configured channel.
    ///
    /// Channel concerns (TLS, connect retries, load balancing) are the
    /// embedding application's responsibility.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: ProtoClient::new(channel),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Creates a client whose channel connects on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if `endpoint` is not a valid URI.
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = Endpoint::from_shared(endpoint.into())
            .map_err(|err| Error::InvalidEndpoint(err.to_string()))?;
        Ok(Self::new(endpoint.connect_lazy()))
    }

    /// Overrides the per-call deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CredentialSource for AccessManagerClient {
    async fn fetch(&self, request: &CredentialRequest) -> Result<VendedCredentials> {
        let wire_request = GetCredentialsRequest {
            application_type: APPLICATION_TYPE as i32,
            collection_id: request.collection_id.as_str().to_string(),
            instance_name: request.instance_name.clone(),
            bucket_name: request.bucket_name.clone(),
            write_access: request.access.is_write(),
        };

        // Generated tonic clients take `&mut self`; clones share the channel.
        let mut client = self.inner.clone();

        let response = tokio::time::timeout(self.timeout, client.get_credentials(wire_request))
            .await
            .map_err(|_| {
                Error::credential_fetch(format!(
                    "deadline of {:?} exceeded waiting for access manager",
                    self.timeout
                ))
            })?
            .map_err(|status| {
                Error::credential_fetch(format!(
                    "{:?}: {}",
                    status.code(),
                    status.message()
                ))
            })?
            .into_inner();

        tracing::debug!(
            collection = %request.collection_id,
            expiration = %response.expiration_timestamp,
            "obtained vended credentials"
        );

        Ok(VendedCredentials {
            access_key_id: response.access_key_id,
            secret_access_key: response.secret_access_key,
            session_token: response.session_token,
            tenant_key_id: response.tenant_key_id,
            expiration_timestamp: response.expiration_timestamp,
        })
    }
}
