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

// The frames in this module have already been through the codec. Incoming frames have been
// decoded (and their header blocks decompressed), outgoing frames are waiting to be encoded.

// bytes
use bytes::Bytes;

// osmium
use http2::error::ErrorCode;
use http2::header::HeaderList;
use http2::stream::StreamId;

pub const FRAME_HEADER_SIZE: usize = 9;

// promised stream id (6.6)
const PUSH_PROMISE_FIXED_SIZE: usize = 4;
// window size increment (6.9)
const WINDOW_UPDATE_FIXED_SIZE: usize = 4;
// last stream id and error code (6.8)
const GO_AWAY_FIXED_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub stream_id: StreamId,
    pub end_stream: bool
}

impl FrameHeader {
    pub fn new(stream_id: StreamId, end_stream: bool) -> Self {
        FrameHeader {
            stream_id: stream_id,
            end_stream: end_stream
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataFrame {
    pub header: FrameHeader,
    pub payload: Bytes
}

impl DataFrame {
    pub fn new(stream_id: StreamId, payload: Bytes, end_stream: bool) -> Self {
        DataFrame {
            header: FrameHeader::new(stream_id, end_stream),
            payload: payload
        }
    }

    pub fn get_length(&self) -> usize {
        self.payload.len()
    }
}

#[derive(Debug, Clone)]
pub struct HeadersFrame {
    pub header: FrameHeader,
    pub headers: HeaderList
}

impl HeadersFrame {
    pub fn new(stream_id: StreamId, headers: HeaderList, end_stream: bool) -> Self {
        HeadersFrame {
            header: FrameHeader::new(stream_id, end_stream),
            headers: headers
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushPromiseFrame {
    pub header: FrameHeader,
    pub headers: HeaderList,
    pub promised_stream_id: StreamId
}

impl PushPromiseFrame {
    pub fn new(stream_id: StreamId, headers: HeaderList, promised_stream_id: StreamId) -> Self {
        PushPromiseFrame {
            // (6.6) PUSH_PROMISE does not define an END_STREAM flag.
            header: FrameHeader::new(stream_id, false),
            headers: headers,
            promised_stream_id: promised_stream_id
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingFrame {
    Headers {
        stream_id: StreamId,
        headers: HeaderList,
        end_stream: bool
    },
    Data {
        stream_id: StreamId,
        payload: Bytes,
        end_stream: bool
    },
    PushPromise {
        stream_id: StreamId,
        headers: HeaderList,
        promised_stream_id: StreamId,
        end_stream: bool
    },
    WindowUpdate {
        stream_id: StreamId,
        window_size_increment: u32
    },
    GoAway {
        last_stream_id: StreamId,
        error_code: ErrorCode,
        debug_data: Vec<u8>
    }
}

impl OutgoingFrame {
    pub fn get_stream_id(&self) -> StreamId {
        match *self {
            OutgoingFrame::Headers { stream_id, .. } => stream_id,
            OutgoingFrame::Data { stream_id, .. } => stream_id,
            OutgoingFrame::PushPromise { stream_id, .. } => stream_id,
            OutgoingFrame::WindowUpdate { stream_id, .. } => stream_id,
            // (6.8) GOAWAY always applies to the connection.
            OutgoingFrame::GoAway { .. } => 0x0
        }
    }

    /// Payload length, estimated for frames carrying a header block because compression
    /// happens later.
    pub fn get_length(&self) -> usize {
        match *self {
            OutgoingFrame::Headers { ref headers, .. } => headers.get_octet_size(),
            OutgoingFrame::Data { ref payload, .. } => payload.len(),
            OutgoingFrame::PushPromise { ref headers, .. } => PUSH_PROMISE_FIXED_SIZE + headers.get_octet_size(),
            OutgoingFrame::WindowUpdate { .. } => WINDOW_UPDATE_FIXED_SIZE,
            OutgoingFrame::GoAway { ref debug_data, .. } => GO_AWAY_FIXED_SIZE + debug_data.len()
        }
    }

    pub fn is_end_stream(&self) -> bool {
        match *self {
            OutgoingFrame::Headers { end_stream, .. } => end_stream,
            OutgoingFrame::Data { end_stream, .. } => end_stream,
            OutgoingFrame::PushPromise { end_stream, .. } => end_stream,
            _ => false
        }
    }
}
