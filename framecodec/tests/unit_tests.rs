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

//! Unit tests for the frame codec

use bytes::{Bytes, BytesMut};
use daqlink_framecodec::{CodecError, FrameCodec, LENGTH_PREFIX_SIZE};
use tokio_util::codec::{Decoder, Encoder};

// ============================================================================
// Helper Functions
// ============================================================================

fn encode_frames(payloads: &[&[u8]]) -> Vec<u8> {
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::new();
    for payload in payloads {
        codec
            .encode(Bytes::copy_from_slice(payload), &mut buffer)
            .unwrap();
    }
    buffer.to_vec()
}

fn decode_available(codec: &mut FrameCodec, buffer: &mut BytesMut) -> Vec<Bytes> {
    let mut payloads = Vec::new();
    while let Some(payload) = codec.decode(buffer).unwrap() {
        payloads.push(payload);
    }
    payloads
}

// ============================================================================
// Fragmentation Tests
// ============================================================================

/// Delivering the same frames with any read fragmentation must produce the
/// same payload sequence, byte for byte.
#[test]
fn fragmentation_is_invisible() {
    let payloads: Vec<&[u8]> = vec![
        br#"{"voltage":51.2,"rpm":880.0}"#,
        br#"{}"#,
        br#"{"rtk":{"latitude":42.2808,"longitude":-83.743}}"#,
        b"",
        br#"{"rpm":1000.0}"#,
    ];
    let wire = encode_frames(&payloads);

    // Chunk sizes chosen to split inside length words, on boundaries, and
    // inside payloads.
    for chunk_size in 1..=wire.len() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::new();
        let mut decoded = Vec::new();

        for chunk in wire.chunks(chunk_size) {
            buffer.extend_from_slice(chunk);
            decoded.extend(decode_available(&mut codec, &mut buffer));
        }

        assert_eq!(decoded.len(), payloads.len(), "chunk_size={}", chunk_size);
        for (got, want) in decoded.iter().zip(payloads.iter()) {
            assert_eq!(&got[..], *want, "chunk_size={}", chunk_size);
        }
        assert!(buffer.is_empty(), "chunk_size={}", chunk_size);
    }
}

#[test]
fn byte_at_a_time_delivery() {
    let wire = encode_frames(&[br#"{"voltage":48.0}"#]);
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::new();

    for (i, byte) in wire.iter().enumerate() {
        buffer.extend_from_slice(&[*byte]);
        let result = codec.decode(&mut buffer).unwrap();
        if i + 1 < wire.len() {
            assert!(result.is_none(), "emitted a frame early at byte {}", i);
        } else {
            assert_eq!(&result.unwrap()[..], &b"{\"voltage\":48.0}"[..]);
        }
    }
}

#[test]
fn back_to_back_frames_in_one_read() {
    let wire = encode_frames(&[b"one", b"two", b"three"]);
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::from(&wire[..]);

    let decoded = decode_available(&mut codec, &mut buffer);
    assert_eq!(decoded.len(), 3);
    assert_eq!(&decoded[0][..], b"one");
    assert_eq!(&decoded[1][..], b"two");
    assert_eq!(&decoded[2][..], b"three");
}

// ============================================================================
// End-of-stream Tests
// ============================================================================

#[test]
fn eof_on_frame_boundary_is_clean() {
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::new();
    assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
}

#[test]
fn eof_inside_length_word_is_truncation() {
    let wire = encode_frames(&[b"payload"]);
    let mut codec = FrameCodec::new();

    for cut in 1..LENGTH_PREFIX_SIZE {
        let mut buffer = BytesMut::from(&wire[..cut]);
        assert_eq!(
            codec.decode_eof(&mut buffer),
            Err(CodecError::TruncatedFrame { buffered: cut }),
            "cut={}",
            cut
        );
    }
}

#[test]
fn eof_inside_payload_is_truncation() {
    let wire = encode_frames(&[b"payload"]);
    let mut codec = FrameCodec::new();

    for cut in LENGTH_PREFIX_SIZE..wire.len() {
        let mut buffer = BytesMut::from(&wire[..cut]);
        assert_eq!(
            codec.decode_eof(&mut buffer),
            Err(CodecError::TruncatedFrame { buffered: cut }),
            "cut={}",
            cut
        );
    }
}

#[test]
fn eof_after_complete_frame_drains_then_ends() {
    let wire = encode_frames(&[b"tail"]);
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::from(&wire[..]);

    assert_eq!(&codec.decode_eof(&mut buffer).unwrap().unwrap()[..], b"tail");
    assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
}

// ============================================================================
// Length Word Tests
// ============================================================================

#[test]
fn length_word_is_little_endian() {
    let mut wire = vec![0x03, 0x00, 0x00, 0x00];
    wire.extend_from_slice(b"abc");

    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::from(&wire[..]);
    assert_eq!(&codec.decode(&mut buffer).unwrap().unwrap()[..], b"abc");
}

#[test]
fn oversized_length_word_fails_before_buffering_payload() {
    // Announce 2 MiB with no payload behind it; the guard must fire on the
    // length word alone.
    let wire = (2_097_152u32).to_le_bytes();

    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::from(&wire[..]);
    assert_eq!(
        codec.decode(&mut buffer),
        Err(CodecError::FrameTooLarge {
            length: 2_097_152,
            max: 1_048_576,
        })
    );
}
