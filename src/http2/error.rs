// Copyright 2017 ThetaSinner
//
// This file is part of Osmium.

// Osmium is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Osmium is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Osmium. If not, see <http://www.gnu.org/licenses/>.

// std
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    ConnectionError(ErrorCode, ErrorName),
    StreamError(ErrorCode, ErrorName)
}

impl HttpError {
    pub fn get_error_code(&self) -> ErrorCode {
        match *self {
            HttpError::ConnectionError(code, _) => code,
            HttpError::StreamError(code, _) => code
        }
    }

    pub fn get_error_name(&self) -> ErrorName {
        match *self {
            HttpError::ConnectionError(_, name) => name,
            HttpError::StreamError(_, name) => name
        }
    }

    pub fn is_connection_error(&self) -> bool {
        match *self {
            HttpError::ConnectionError(_, _) => true,
            HttpError::StreamError(_, _) => false
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HttpError::ConnectionError(code, name) => {
                write!(f, "connection error {:?}: {}", code, name.get_description())
            },
            HttpError::StreamError(code, name) => {
                write!(f, "stream error {:?}: {}", code, name.get_description())
            }
        }
    }
}

impl StdError for HttpError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // The associated condition is not a result of an error. For example, a GOAWAY might include this code to indicate graceful shutdown of a connection.
    NoError,
    // The endpoint detected an unspecific protocol error. This error is for use when a more specific error code is not available.
    ProtocolError,
    // The endpoint encountered an unexpected internal error.
    InternalError,
    // The endpoint detected that its peer violated the flow-control protocol.
    FlowControlError,
    // The endpoint sent a SETTINGS frame but did not receive a response in a timely manner.
    SettingsTimeout,
    // The endpoint received a frame after a stream was half-closed.
    StreamClosed,
    // The endpoint received a frame with an invalid size.
    FrameSizeError,
    // The endpoint refused the stream prior to performing any application processing.
    RefusedStream,
    // Used by the endpoint to indicate that the stream is no longer needed.
    Cancel,
    // The endpoint is unable to maintain the header compression context for the connection.
    CompressionError,
    // The connection established in response to a CONNECT request was reset or abnormally closed.
    ConnectError,
    // The endpoint detected that its peer is exhibiting a behavior that might be generating excessive load.
    EnhanceYourCalm,
    // The underlying transport has properties that do not meet minimum security requirements.
    InadequateSecurity,
    // The endpoint requires that HTTP/1.1 be used instead of HTTP/2.
    Http11Required
}

impl From<ErrorCode> for u32 {
    fn from(error_code: ErrorCode) -> u32 {
        match error_code {
            ErrorCode::NoError => 0x0,
            ErrorCode::ProtocolError => 0x1,
            ErrorCode::InternalError => 0x2,
            ErrorCode::FlowControlError => 0x3,
            ErrorCode::SettingsTimeout => 0x4,
            ErrorCode::StreamClosed => 0x5,
            ErrorCode::FrameSizeError => 0x6,
            ErrorCode::RefusedStream => 0x7,
            ErrorCode::Cancel => 0x8,
            ErrorCode::CompressionError => 0x9,
            ErrorCode::ConnectError => 0xa,
            ErrorCode::EnhanceYourCalm => 0xb,
            ErrorCode::InadequateSecurity => 0xc,
            ErrorCode::Http11Required => 0xd
        }
    }
}

pub fn to_error_code(error_code: u32) -> Option<ErrorCode> {
    match error_code {
        0x0 => Some(ErrorCode::NoError),
        0x1 => Some(ErrorCode::ProtocolError),
        0x2 => Some(ErrorCode::InternalError),
        0x3 => Some(ErrorCode::FlowControlError),
        0x4 => Some(ErrorCode::SettingsTimeout),
        0x5 => Some(ErrorCode::StreamClosed),
        0x6 => Some(ErrorCode::FrameSizeError),
        0x7 => Some(ErrorCode::RefusedStream),
        0x8 => Some(ErrorCode::Cancel),
        0x9 => Some(ErrorCode::CompressionError),
        0xa => Some(ErrorCode::ConnectError),
        0xb => Some(ErrorCode::EnhanceYourCalm),
        0xc => Some(ErrorCode::InadequateSecurity),
        0xd => Some(ErrorCode::Http11Required),
        _ => None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorName {
    NoErrorShutdown,
    StreamAlreadyRegistered,
    FrameOnUnregisteredStream,
    FrameAfterEndOfStream,
    StreamsOutstandingAtTermination,
    ConnectionTerminated,
    ZeroWindowSizeIncrement,
    WindowSizeIncrementOverflow,
    ConnectionFlowControlWindowNotRespected
}

impl ErrorName {
    pub fn get_description(&self) -> &'static str {
        match *self {
            ErrorName::NoErrorShutdown => {
                "the connection was shut down without error"
            },
            ErrorName::StreamAlreadyRegistered => {
                "a stream with this identifier is already registered on the connection"
            },
            ErrorName::FrameOnUnregisteredStream => {
                "a frame was received for a stream which is not registered on the connection"
            },
            ErrorName::FrameAfterEndOfStream => {
                "a frame was received after the end of the stream"
            },
            ErrorName::StreamsOutstandingAtTermination => {
                "streams were still registered when the connection was terminated"
            },
            ErrorName::ConnectionTerminated => {
                "the connection has been terminated"
            },
            ErrorName::ZeroWindowSizeIncrement => {
                "zero window size increment"
            },
            ErrorName::WindowSizeIncrementOverflow => {
                "window size increment would take the window above the maximum flow control window size"
            },
            ErrorName::ConnectionFlowControlWindowNotRespected => {
                "connection flow control window not respected"
            }
        }
    }
}

// The debug data which accompanies an error code on a GOAWAY frame.
impl From<ErrorName> for Vec<u8> {
    fn from(error_name: ErrorName) -> Vec<u8> {
        error_name.get_description().as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpError, ErrorCode, ErrorName, to_error_code};

    #[test]
    fn error_code_round_trips_through_wire_value() {
        let code: u32 = ErrorCode::FlowControlError.into();

        assert_eq!(0x3, code);
        assert_eq!(Some(ErrorCode::FlowControlError), to_error_code(code));
        assert_eq!(None, to_error_code(0xe));
    }

    #[test]
    fn connection_error_accessors() {
        let err = HttpError::ConnectionError(ErrorCode::ProtocolError, ErrorName::FrameOnUnregisteredStream);

        assert!(err.is_connection_error());
        assert_eq!(ErrorCode::ProtocolError, err.get_error_code());
        assert_eq!(ErrorName::FrameOnUnregisteredStream, err.get_error_name());
        assert!(format!("{}", err).starts_with("connection error ProtocolError"));
    }

    #[test]
    fn error_name_becomes_debug_data() {
        let debug_data: Vec<u8> = ErrorName::ZeroWindowSizeIncrement.into();

        assert_eq!(b"zero window size increment".to_vec(), debug_data);
    }
}
