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

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Represents possible errors that can occur while framing or deframing the
/// telemetry byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// An I/O error occurred while reading from or writing to the underlying
    /// stream.
    ///
    /// Contains the error kind; the original error is not kept so the type
    /// stays comparable in tests.
    IoError {
        /// The kind of I/O error that occurred
        kind: std::io::ErrorKind,
    },

    /// The stream ended in the middle of a frame.
    ///
    /// The peer closed the connection after a length word was started (or
    /// fully read) but before the announced payload arrived. This is a
    /// protocol violation, distinct from a clean disconnect on a frame
    /// boundary.
    TruncatedFrame {
        /// Number of bytes left stranded in the buffer at end of stream
        buffered: usize,
    },

    /// A length word announced a payload larger than the configured maximum.
    ///
    /// Almost always indicates a desynchronized or corrupt stream rather
    /// than a genuinely huge record.
    FrameTooLarge {
        /// The announced payload length
        length: usize,
        /// The configured maximum payload length
        max: usize,
    },
}

impl std::error::Error for CodecError {}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::IoError { kind } => {
                write!(f, "I/O error on telemetry stream: {:?}", kind)
            }
            CodecError::TruncatedFrame { buffered } => {
                write!(
                    f,
                    "stream ended mid-frame with {} byte(s) unconsumed",
                    buffered
                )
            }
            CodecError::FrameTooLarge { length, max } => {
                write!(
                    f,
                    "frame length {} exceeds maximum of {} bytes",
                    length, max
                )
            }
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::IoError { kind: err.kind() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::TruncatedFrame { buffered: 3 };
        assert_eq!(err.to_string(), "stream ended mid-frame with 3 byte(s) unconsumed");

        let err = CodecError::FrameTooLarge {
            length: 2_000_000,
            max: 1_048_576,
        };
        assert_eq!(
            err.to_string(),
            "frame length 2000000 exceeds maximum of 1048576 bytes"
        );
    }

    #[test]
    fn error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = CodecError::from(io);
        assert_eq!(
            err,
            CodecError::IoError {
                kind: std::io::ErrorKind::ConnectionReset
            }
        );
    }
}
