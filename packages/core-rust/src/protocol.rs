//! Frames exchanged with an out-of-process operation module.
//!
//! Each frame body is `MsgPack` with named fields (`rmp_serde::to_vec_named`).
//! Framing (the length prefix) is the transport's concern. Session order:
//!
//! 1. host `init` -> module `ready`
//! 2. host `invoke` -> module `outcome` or `unknownOperation`, repeated
//! 3. host `shutdown` (or end of stream) ends the session

use serde::{Deserialize, Serialize};

use crate::bag::ArgumentBag;
use crate::context::ExecutionContext;
use crate::outcome::ResultHandle;

/// Frame sent from the host to the operation module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostFrame {
    Init { context: ExecutionContext },
    Invoke { operation: String, args: ArgumentBag },
    Shutdown,
}

/// Frame sent from the operation module back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModuleFrame {
    Ready,
    Outcome { handle: ResultHandle },
    UnknownOperation { name: String },
}

impl HostFrame {
    /// Frame name used in protocol diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            HostFrame::Init { .. } => "init",
            HostFrame::Invoke { .. } => "invoke",
            HostFrame::Shutdown => "shutdown",
        }
    }
}

impl ModuleFrame {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ModuleFrame::Ready => "ready",
            ModuleFrame::Outcome { .. } => "outcome",
            ModuleFrame::UnknownOperation { .. } => "unknownOperation",
        }
    }
}

/// Errors from encoding or decoding a frame body.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("frame decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Serialize a frame body.
///
/// # Errors
///
/// Returns `CodecError::Encode` if the value cannot be represented in `MsgPack`.
pub fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(frame)?)
}

/// Deserialize a frame body.
///
/// # Errors
///
/// Returns `CodecError::Decode` if `bytes` is not a valid frame of type `T`.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
