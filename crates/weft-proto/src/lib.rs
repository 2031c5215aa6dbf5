//! # weft-proto
//!
//! Wire contract for the weft credential vending service.
//!
//! This crate holds the protobuf message types and the gRPC client for the
//! `weft.access.v1.AccessManager` service. The proto source lives under
//! `proto/weft/access/v1/` and the generated code is vendored into this crate
//! (client only) so that building the workspace does not require `protoc`.
//!
//! ## Wire Format Guarantees
//!
//! - All messages follow protobuf evolution rules
//! - New fields are always optional or have defaults
//! - Field numbers are never reused
//!
//! ## Example
//!
//! ```rust
//! use weft_proto::v1::{ApplicationType, GetCredentialsRequest};
//!
//! let request = GetCredentialsRequest {
//!     application_type: ApplicationType::Engine as i32,
//!     collection_id: "col-1".to_string(),
//!     instance_name: "inst-a".to_string(),
//!     bucket_name: "b1".to_string(),
//!     write_access: false,
//! };
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
// Allow generated code patterns
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::default_trait_access)]

/// Version 1 of the weft access protocol.
pub mod v1 {
    /// Request for temporary collection-scoped storage credentials.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetCredentialsRequest {
        /// Identifies the calling application class.
        #[prost(enumeration = "ApplicationType", tag = "1")]
        pub application_type: i32,
        /// Logical collection identifier the credentials are scoped to.
        #[prost(string, tag = "2")]
        pub collection_id: ::prost::alloc::string::String,
        /// Deployment instance issuing the request.
        #[prost(string, tag = "3")]
        pub instance_name: ::prost::alloc::string::String,
        /// Bucket the credentials must grant access to.
        #[prost(string, tag = "4")]
        pub bucket_name: ::prost::alloc::string::String,
        /// Read-write when true, read-only otherwise.
        #[prost(bool, tag = "5")]
        pub write_access: bool,
    }

    /// Temporary storage credentials for one collection.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetCredentialsResponse {
        /// Access key identifier.
        #[prost(string, tag = "1")]
        pub access_key_id: ::prost::alloc::string::String,
        /// Access key secret.
        #[prost(string, tag = "2")]
        pub secret_access_key: ::prost::alloc::string::String,
        /// STS session token.
        #[prost(string, tag = "3")]
        pub session_token: ::prost::alloc::string::String,
        /// Tenant KMS key backing server-side encryption for this collection.
        #[prost(string, tag = "4")]
        pub tenant_key_id: ::prost::alloc::string::String,
        /// ISO-8601 UTC instant after which the credentials are invalid.
        #[prost(string, tag = "5")]
        pub expiration_timestamp: ::prost::alloc::string::String,
    }

    /// Identifies the calling application class.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum ApplicationType {
        /// Unknown caller; the service rejects this value.
        Unspecified = 0,
        /// Storage engine nodes performing segment reads and writes.
        Engine = 1,
        /// Index builder nodes.
        Indexer = 2,
    }

    impl ApplicationType {
        /// String value of the enum field names used in the ProtoBuf definition.
        ///
        /// The values are not transformed in any way and thus are considered stable
        /// (if the ProtoBuf definition does not change) and safe for programmatic use.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Unspecified => "APPLICATION_TYPE_UNSPECIFIED",
                Self::Engine => "APPLICATION_TYPE_ENGINE",
                Self::Indexer => "APPLICATION_TYPE_INDEXER",
            }
        }

        /// Creates an enum from field names used in the ProtoBuf definition.
        pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
            match value {
                "APPLICATION_TYPE_UNSPECIFIED" => Some(Self::Unspecified),
                "APPLICATION_TYPE_ENGINE" => Some(Self::Engine),
                "APPLICATION_TYPE_INDEXER" => Some(Self::Indexer),
                _ => None,
            }
        }
    }

    /// Generated client implementations.
    pub mod access_manager_client {
        #![allow(
            unused_variables,
            dead_code,
            missing_docs,
            clippy::wildcard_imports,
            clippy::let_unit_value
        )]
        use tonic::codegen::http::Uri;
        use tonic::codegen::*;

        /// Credential vending service for collection-scoped storage access.
        #[derive(Debug, Clone)]
        pub struct AccessManagerClient<T> {
            inner: tonic::client::Grpc<T>,
        }

        impl AccessManagerClient<tonic::transport::Channel> {
            /// Attempt to create a new client by connecting to a given endpoint.
            pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
            where
                D: TryInto<tonic::transport::Endpoint>,
                D::Error: Into<StdError>,
            {
                let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
                Ok(Self::new(conn))
            }
        }

        impl<T> AccessManagerClient<T>
        where
            T: tonic::client::GrpcService<tonic::body::BoxBody>,
            T::Error: Into<StdError>,
            T::ResponseBody: Body<Data = Bytes> + Send + 'static,
            <T::ResponseBody as Body>::Error: Into<StdError> + Send,
        {
            pub fn new(inner: T) -> Self {
                let inner = tonic::client::Grpc::new(inner);
                Self { inner }
            }

            pub fn with_origin(inner: T, origin: Uri) -> Self {
                let inner = tonic::client::Grpc::with_origin(inner, origin);
                Self { inner }
            }

            pub fn with_interceptor<F>(
                inner: T,
                interceptor: F,
            ) -> AccessManagerClient<InterceptedService<T, F>>
            where
                F: tonic::service::Interceptor,
                T::ResponseBody: Default,
                T: tonic::codegen::Service<
                    http::Request<tonic::body::BoxBody>,
                    Response = http::Response<
                        <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                    >,
                >,
                <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
                    Into<StdError> + Send + Sync,
            {
                AccessManagerClient::new(InterceptedService::new(inner, interceptor))
            }

            /// Compress requests with the given encoding.
            ///
            /// This requires the server to support it otherwise it might respond with an
            /// error.
            #[must_use]
            pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
                self.inner = self.inner.send_compressed(encoding);
                self
            }

            /// Enable decompressing responses.
            #[must_use]
            pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
                self.inner = self.inner.accept_compressed(encoding);
                self
            }

            /// Limits the maximum size of a decoded message.
            ///
            /// Default: `4MB`
            #[must_use]
            pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
                self.inner = self.inner.max_decoding_message_size(limit);
                self
            }

            /// Limits the maximum size of an encoded message.
            ///
            /// Default: `usize::MAX`
            #[must_use]
            pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
                self.inner = self.inner.max_encoding_message_size(limit);
                self
            }

            /// Issues temporary storage credentials for one collection.
            pub async fn get_credentials(
                &mut self,
                request: impl tonic::IntoRequest<super::GetCredentialsRequest>,
            ) -> std::result::Result<tonic::Response<super::GetCredentialsResponse>, tonic::Status>
            {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static(
                    "/weft.access.v1.AccessManager/GetCredentials",
                );
                let mut req = request.into_request();
                req.extensions_mut().insert(GrpcMethod::new(
                    "weft.access.v1.AccessManager",
                    "GetCredentials",
                ));
                self.inner.unary(req, path, codec).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::v1::*;
    use prost::Message;

    #[test]
    fn request_round_trips_through_wire_encoding() {
        let request = GetCredentialsRequest {
            application_type: ApplicationType::Engine as i32,
            collection_id: "col-1".to_string(),
            instance_name: "inst-a".to_string(),
            bucket_name: "b1".to_string(),
            write_access: true,
        };

        let bytes = request.encode_to_vec();
        let decoded = GetCredentialsRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(
            ApplicationType::try_from(decoded.application_type),
            Ok(ApplicationType::Engine)
        );
    }

    #[test]
    fn application_type_str_names_are_stable() {
        assert_eq!(
            ApplicationType::Engine.as_str_name(),
            "APPLICATION_TYPE_ENGINE"
        );
        assert_eq!(
            ApplicationType::from_str_name("APPLICATION_TYPE_INDEXER"),
            Some(ApplicationType::Indexer)
        );
        assert_eq!(ApplicationType::from_str_name("nope"), None);
    }

    #[test]
    fn response_defaults_are_empty() {
        let response = GetCredentialsResponse::default();
        assert!(response.access_key_id.is_empty());
        assert!(response.expiration_timestamp.is_empty());
    }
}
