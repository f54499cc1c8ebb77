//! Wire types for the line-delimited JSON protocol.
//!
//! Each record is one JSON object on one `\n`-terminated line. Clients
//! send `{"key": ..., "value": ...}`; the server answers with the same
//! pair plus the `id` assigned to the request.

use serde::{Deserialize, Serialize};

/// One decoded client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub key: String,
    pub value: String,
}

/// The reply for one successfully decoded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub key: String,
    pub value: String,
}
