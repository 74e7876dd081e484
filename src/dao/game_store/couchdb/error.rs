//! Failures of the CouchDB game store.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias used throughout the CouchDB store.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Everything that can go wrong while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing or blank.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// Reaching the database itself failed (lookup or creation).
    #[error("failed to {action} CouchDB database `{database}`")]
    Database {
        database: String,
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB database `{database}` answered with status {status}")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    /// The request never got an answer.
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered `{path}` with status {status}")]
    UnexpectedStatus { path: String, status: StatusCode },
    /// The answer was not the JSON we expected.
    #[error("unreadable CouchDB response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed game document returned for `{path}`")]
    MalformedDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A stored document id does not carry a game UUID.
    #[error("invalid document ID `{doc_id}`: {kind}")]
    InvalidDocId { doc_id: String, kind: &'static str },
}
