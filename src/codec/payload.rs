//! Structured payloads carried as opaque blobs.
//!
//! Instead of general object-graph serialization the channel carries a
//! closed set of [`Payload`] variants. On the wire a payload is its type
//! name followed by a `bincode` body. Readers resolve the type name through
//! a [`PayloadResolver`], which lets a peer using a different naming scheme
//! map its names onto the same variants.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A payload value whose shape is not otherwise modeled by the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Free text.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// A numeric identifier or counter.
    Long(i64),
    /// An ordered list of strings.
    StringList(Vec<String>),
    /// String properties, ordered by key.
    Properties(BTreeMap<String, String>),
    /// A failure reported by the remote peer.
    RemoteError(RemoteError),
}

/// An error raised on the remote side of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Name of the remote error type.
    pub class_name: String,
    /// Error message, if any.
    pub message: Option<String>,
    /// Remote stack frames, outermost first.
    pub stack: Vec<String>,
}

/// The kind of a [`Payload`], independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// See [`Payload::Text`].
    Text,
    /// See [`Payload::Binary`].
    Binary,
    /// See [`Payload::Long`].
    Long,
    /// See [`Payload::StringList`].
    StringList,
    /// See [`Payload::Properties`].
    Properties,
    /// See [`Payload::RemoteError`].
    RemoteError,
}

impl PayloadKind {
    /// All payload kinds.
    pub const ALL: [PayloadKind; 6] = [
        PayloadKind::Text,
        PayloadKind::Binary,
        PayloadKind::Long,
        PayloadKind::StringList,
        PayloadKind::Properties,
        PayloadKind::RemoteError,
    ];

    /// The canonical type name written on the wire.
    pub fn type_name(self) -> &'static str {
        match self {
            PayloadKind::Text => "lexwire.Text",
            PayloadKind::Binary => "lexwire.Binary",
            PayloadKind::Long => "lexwire.Long",
            PayloadKind::StringList => "lexwire.StringList",
            PayloadKind::Properties => "lexwire.Properties",
            PayloadKind::RemoteError => "lexwire.RemoteError",
        }
    }
}

impl Payload {
    /// The kind of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text(_) => PayloadKind::Text,
            Payload::Binary(_) => PayloadKind::Binary,
            Payload::Long(_) => PayloadKind::Long,
            Payload::StringList(_) => PayloadKind::StringList,
            Payload::Properties(_) => PayloadKind::Properties,
            Payload::RemoteError(_) => PayloadKind::RemoteError,
        }
    }

    /// Serialize the variant content, without the variant itself.
    pub(crate) fn encode_body(&self) -> Result<Vec<u8>> {
        let body = match self {
            Payload::Text(v) => bincode::serialize(v)?,
            Payload::Binary(v) => bincode::serialize(v)?,
            Payload::Long(v) => bincode::serialize(v)?,
            Payload::StringList(v) => bincode::serialize(v)?,
            Payload::Properties(v) => bincode::serialize(v)?,
            Payload::RemoteError(v) => bincode::serialize(v)?,
        };
        Ok(body)
    }

    /// Deserialize a body written by [`encode_body`](Self::encode_body).
    pub(crate) fn decode_body(kind: PayloadKind, body: &[u8]) -> Result<Self> {
        let payload = match kind {
            PayloadKind::Text => Payload::Text(decode(body)?),
            PayloadKind::Binary => Payload::Binary(decode(body)?),
            PayloadKind::Long => Payload::Long(decode(body)?),
            PayloadKind::StringList => Payload::StringList(decode(body)?),
            PayloadKind::Properties => Payload::Properties(decode(body)?),
            PayloadKind::RemoteError => Payload::RemoteError(decode(body)?),
        };
        Ok(payload)
    }
}

/// Maps a wire type name onto a payload kind.
pub trait PayloadResolver: Send + Sync {
    /// Resolve `type_name`, or return `None` to defer to the default.
    fn resolve(&self, type_name: &str) -> Option<PayloadKind>;
}

/// Resolves the canonical type names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl PayloadResolver for DefaultResolver {
    fn resolve(&self, type_name: &str) -> Option<PayloadKind> {
        PayloadKind::ALL.into_iter().find(|kind| kind.type_name() == type_name)
    }
}

/// Resolves type names from a foreign namespace through an alias table.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    aliases: HashMap<String, PayloadKind>,
}

impl AliasResolver {
    /// Create an empty alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `type_name` to `kind`.
    pub fn alias(mut self, type_name: impl Into<String>, kind: PayloadKind) -> Self {
        self.aliases.insert(type_name.into(), kind);
        self
    }
}

impl PayloadResolver for AliasResolver {
    fn resolve(&self, type_name: &str) -> Option<PayloadKind> {
        self.aliases.get(type_name).copied()
    }
}

/// Deserialize a body, reporting malformed input as a decode error.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    bincode::deserialize(body).map_err(|e| Error::decode(format!("invalid payload body: {}", e)))
}
