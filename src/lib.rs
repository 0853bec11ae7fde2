//! S3-Compatible Client Core
//!
//! Protocol-level building blocks for talking to Amazon S3 and S3-compatible
//! stores (MinIO, LocalStack, R2, etc.), with no transport attached.
//!
//! # Features
//!
//! - **AWS Signature V4**: canonical requests, header signing, presigned
//!   URLs, and the chunked streaming variant
//! - **Multipart planning**: part sizing, session state, and resumption of
//!   interrupted uploads by content hash
//! - **Policy algebra**: classify and rewrite anonymous-access bucket
//!   policies per (bucket, prefix)
//!
//! Every operation here is a pure computation over its inputs; the crate
//! performs no I/O, making it safe to call from any thread or executor.
//!
//! # Quick Start
//!
//! ```rust
//! use s3_compat::{Credentials, RequestDescriptor, RequestSigner};
//! use chrono::Utc;
//!
//! fn main() -> Result<(), s3_compat::S3Error> {
//!     let signer = RequestSigner::new(
//!         Credentials::new("AKIDEXAMPLE", "secret"),
//!         "us-east-1",
//!     );
//!     let request = RequestDescriptor::new("GET", "bucket.s3.amazonaws.com", "/key")?;
//!     let signed = signer.sign(&request, Utc::now())?;
//!
//!     println!("{}", signed.header("authorization").unwrap());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod multipart;
pub mod policy;
pub mod request;
pub mod signing;

// Re-export main types at crate root
pub use config::{CoreConfig, CoreConfigBuilder};
pub use credentials::{
    Credentials, EnvCredentialsProvider, ProvideCredentials, StaticCredentialsProvider,
};
pub use error::{
    ConfigurationError, CredentialsError, MultipartError, PolicyError, RequestError, S3Error,
    SigningError,
};
pub use multipart::{
    choose_plan, resume, verify_complete, MultipartSession, PartSlice, ResumeOutcome,
    SessionState, UploadPart, UploadPlan,
};
pub use policy::{
    classify, set_policy, BucketAccess, BucketPolicyDocument, CannedAcl, PolicyStatement,
};
pub use request::{Payload, RequestDescriptor};
pub use signing::{
    PresignedUrl, RequestSigner, SignedRequest, SigningKey, SigningScope, StreamingSignature,
};
