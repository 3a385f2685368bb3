//! Wire codec for benchmark messages.
//!
//! The harness only ever exchanges two messages: a one-time introduction
//! sent by a client right after connecting, and the zero-payload action the
//! load generators use to produce measurable traffic. Both encode to a
//! single tag byte.

use thiserror::Error;

/// Errors from wire encoding/decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("empty frame")]
    Empty,
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),
    #[error("trailing bytes after message tag")]
    TrailingBytes,
}

const TAG_JOIN: u8 = 0x01;
const TAG_ACTION: u8 = 0x02;

/// A benchmark message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Introduction sent once per client session after a successful connect.
    Join,
    /// Zero-argument no-op action; exists only to generate traffic.
    Action,
}

impl Message {
    /// Encode the message into a frame payload.
    pub fn encode(self) -> Vec<u8> {
        match self {
            Self::Join => vec![TAG_JOIN],
            Self::Action => vec![TAG_ACTION],
        }
    }

    /// Decode a frame payload back into a message.
    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        match frame {
            [] => Err(WireError::Empty),
            [TAG_JOIN] => Ok(Self::Join),
            [TAG_ACTION] => Ok(Self::Action),
            [TAG_JOIN | TAG_ACTION, ..] => Err(WireError::TrailingBytes),
            [tag, ..] => Err(WireError::UnknownTag(*tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_tags() {
        assert_eq!(Message::decode(&Message::Join.encode()).unwrap(), Message::Join);
        assert_eq!(
            Message::decode(&Message::Action.encode()).unwrap(),
            Message::Action
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(Message::decode(&[]), Err(WireError::Empty)));
        assert!(matches!(
            Message::decode(&[0x7f]),
            Err(WireError::UnknownTag(0x7f))
        ));
        assert!(matches!(
            Message::decode(&[0x01, 0x00]),
            Err(WireError::TrailingBytes)
        ));
    }
}
