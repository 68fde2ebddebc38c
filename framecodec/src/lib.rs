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

//! # Daqlink Frame Codec
//!
//! This crate implements the wire framing used by the onboard data-acquisition
//! units. Each unit sends a plain byte stream of frames over TCP:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (length bytes)   │
//! │ Little-endian u32│ UTF-8 JSON record        │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! There is no magic number, no version field, and no checksum. The length
//! word is read before, and independently of, the payload; a frame is never
//! surfaced partially.
//!
//! ## Core Components
//!
//! ### [`FrameCodec`]
//!
//! The codec structure implementing the [`Decoder`] and [`Encoder`] traits
//! from `tokio_util::codec`. Pair it with
//! [`Framed`](tokio_util::codec::Framed) to turn a `TcpStream` into a stream
//! of complete payloads. The decoder is restartable: construct a fresh codec
//! per connection, no state carries across sessions.
//!
//! ### End-of-stream semantics
//!
//! The units disconnect by closing the socket. An EOF that lands exactly on a
//! frame boundary is a clean disconnect and ends the stream normally. An EOF
//! that lands inside a length word or inside a payload is a protocol
//! violation and surfaces as [`CodecError::TruncatedFrame`] — the two cases
//! are deliberately distinguishable to the caller.
//!
//! ## Usage Example
//!
//! ```rust
//! use daqlink_framecodec::{FrameCodec, CodecError};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::{Bytes, BytesMut};
//!
//! # fn example() -> Result<(), CodecError> {
//! let mut codec = FrameCodec::new();
//!
//! // Encoding a record
//! let mut buffer = BytesMut::new();
//! codec.encode(Bytes::from_static(b"{\"rpm\":1200.0}"), &mut buffer)?;
//!
//! // Decoding it back
//! let frame = codec.decode(&mut buffer)?;
//! assert_eq!(frame.as_deref(), Some(&b"{\"rpm\":1200.0}"[..]));
//! # Ok(())
//! # }
//! ```

mod codec;
mod result;

pub use crate::codec::{FrameCodec, LENGTH_PREFIX_SIZE, MAX_FRAME_LENGTH};
pub use crate::result::{CodecError, CodecResult};
