//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use super::{CodecError, CodecResult};
use byteorder::{ByteOrder, LittleEndian};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Size of the length prefix preceding every payload, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound on a single payload (1 MiB).
///
/// A telemetry record is a few hundred bytes of JSON; anything near this
/// bound means the stream is desynchronized and the length word is garbage.
pub const MAX_FRAME_LENGTH: usize = 1_048_576;

/// A codec for the length-prefixed telemetry framing used by the onboard
/// data-acquisition units.
///
/// `FrameCodec` deframes `[u32 little-endian length][payload]` units from a
/// byte stream and emits each payload whole, in arrival order. It never
/// emits a partial payload: the length word is consumed only together with
/// the complete payload it announces, so a decode that returns `None` leaves
/// the buffer positioned exactly at the current frame boundary.
///
/// This struct is typically paired with [`Framed`](tokio_util::codec::Framed)
/// to manage stream I/O for a connection.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_length: usize,
}

impl FrameCodec {
    /// Creates a new `FrameCodec` with the default maximum payload length.
    pub fn new() -> FrameCodec {
        FrameCodec::default()
    }

    /// Creates a new `FrameCodec` with a custom maximum payload length.
    ///
    /// A length word announcing a larger payload fails decoding with
    /// [`CodecError::FrameTooLarge`].
    pub fn with_max_frame_length(max_frame_length: usize) -> FrameCodec {
        FrameCodec { max_frame_length }
    }

    /// The configured maximum payload length in bytes.
    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        FrameCodec {
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    /// Decodes the next complete payload from `src`, if one is buffered.
    ///
    /// # Returns
    /// - `Ok(Some(payload))`: A full frame was buffered; its length prefix
    ///   and payload have been consumed and the payload is returned.
    /// - `Ok(None)`: Not enough bytes yet for a length word or for the
    ///   announced payload; nothing was consumed past the frame boundary.
    /// - `Err(CodecError::FrameTooLarge)`: The length word exceeds the
    ///   configured maximum. The buffer is left untouched; the caller is
    ///   expected to drop the connection.
    fn decode(&mut self, src: &mut BytesMut) -> CodecResult<Option<Bytes>> {
        if src.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        // Peek the length word without consuming it. It only leaves the
        // buffer together with its complete payload.
        let length = LittleEndian::read_u32(&src[..LENGTH_PREFIX_SIZE]) as usize;
        if length > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                length,
                max: self.max_frame_length,
            });
        }

        if src.len() < LENGTH_PREFIX_SIZE + length {
            // Reserve what the rest of the frame needs so the next read can
            // complete it in one pass.
            src.reserve(LENGTH_PREFIX_SIZE + length - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_SIZE);
        let payload = src.split_to(length).freeze();
        trace!(length, "deframed telemetry payload");
        Ok(Some(payload))
    }

    /// Decodes at end of stream, distinguishing a clean disconnect from a
    /// truncated frame.
    ///
    /// An empty buffer at EOF is a clean disconnect (`Ok(None)`). Any bytes
    /// stranded mid-length-word or mid-payload mean the peer vanished inside
    /// a frame, which surfaces as [`CodecError::TruncatedFrame`].
    fn decode_eof(&mut self, src: &mut BytesMut) -> CodecResult<Option<Bytes>> {
        match self.decode(src)? {
            Some(payload) => Ok(Some(payload)),
            None if src.is_empty() => Ok(None),
            None => Err(CodecError::TruncatedFrame {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CodecError;

    /// Encodes `payload` as a length-prefixed frame into `dst`.
    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> CodecResult<()> {
        if payload.len() > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                length: payload.len(),
                max: self.max_frame_length,
            });
        }
        dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
        dst.put_u32_le(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn decode_single_frame() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&frame(b"{\"voltage\":48.1}")[..]);

        let payload = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&payload[..], b"{\"voltage\":48.1}");
        assert!(buffer.is_empty());
    }

    #[test]
    fn decode_needs_more_data() {
        let mut codec = FrameCodec::new();

        // Half a length word
        let mut buffer = BytesMut::from(&[0x10u8, 0x00][..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert_eq!(buffer.len(), 2);

        // Full length word, partial payload
        let mut buffer = BytesMut::from(&frame(b"abcdef")[..7]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        // Length word still unconsumed, boundary intact
        assert_eq!(buffer.len(), 7);
    }

    #[test]
    fn decode_empty_payload() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&frame(b"")[..]);

        let payload = codec.decode(&mut buffer).unwrap().unwrap();
        assert!(payload.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn decode_rejects_oversized_length() {
        let mut codec = FrameCodec::with_max_frame_length(16);
        let mut buffer = BytesMut::from(&frame(&[0u8; 17])[..]);

        assert_eq!(
            codec.decode(&mut buffer),
            Err(CodecError::FrameTooLarge {
                length: 17,
                max: 16
            })
        );
    }

    #[test]
    fn decode_eof_clean_boundary() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&frame(b"last")[..]);

        assert!(codec.decode_eof(&mut buffer).unwrap().is_some());
        // Buffer drained, EOF on the boundary: clean disconnect
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn decode_eof_mid_frame() {
        let mut codec = FrameCodec::new();

        // EOF inside the payload
        let mut buffer = BytesMut::from(&frame(b"abcdef")[..8]);
        assert_eq!(
            codec.decode_eof(&mut buffer),
            Err(CodecError::TruncatedFrame { buffered: 8 })
        );

        // EOF inside the length word itself
        let mut buffer = BytesMut::from(&[0x06u8, 0x00, 0x00][..]);
        assert_eq!(
            codec.decode_eof(&mut buffer),
            Err(CodecError::TruncatedFrame { buffered: 3 })
        );
    }

    #[test]
    fn encode_round_trip() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Bytes::from_static(b"{\"rpm\":950.5}"), &mut buffer)
            .unwrap();
        assert_eq!(&buffer[..LENGTH_PREFIX_SIZE], &13u32.to_le_bytes());

        let payload = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&payload[..], b"{\"rpm\":950.5}");
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let mut codec = FrameCodec::with_max_frame_length(8);
        let mut buffer = BytesMut::new();

        let result = codec.encode(Bytes::from(vec![0u8; 9]), &mut buffer);
        assert_eq!(
            result,
            Err(CodecError::FrameTooLarge { length: 9, max: 8 })
        );
        assert!(buffer.is_empty());
    }
}
