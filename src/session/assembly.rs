//! Replay assembly: one decodable byte stream per session.

use super::{Session, SessionId};
use crate::buffer::FragmentBuffer;

/// Media handed to the replay collaborator.
///
/// The collaborator must treat `bytes` as a single container, not as
/// individually playable fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayMedia {
    pub session: SessionId,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Seconds of media preceding the session's first retained fragment
    /// (the prepended header, if any)
    pub lead_in: f64,
    pub fragment_count: usize,
}

impl ReplayMedia {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Concatenate a session's header (when its first fragment isn't the
/// header) followed by every retained fragment payload, in order.
pub fn assemble(session: &Session, buffer: &FragmentBuffer) -> ReplayMedia {
    let fragments: Vec<_> = session
        .fragments
        .iter()
        .filter_map(|&id| buffer.get(id))
        .collect();

    let starts_with_header = fragments.first().is_some_and(|f| f.is_header);
    let mut bytes = Vec::with_capacity(fragments.iter().map(|f| f.payload_len()).sum());
    let mut lead_in = 0.0;

    if !starts_with_header {
        if let Some(header) = &session.header {
            bytes.extend_from_slice(&header.bytes);
            lead_in = header.duration;
        }
    }

    for fragment in &fragments {
        if let Some(payload) = &fragment.payload {
            bytes.extend_from_slice(payload);
        }
    }

    ReplayMedia {
        session: session.id,
        bytes,
        mime_type: session.mime_type.clone(),
        lead_in,
        fragment_count: fragments.len(),
    }
}
