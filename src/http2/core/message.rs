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

// bytes
use bytes::Bytes;

// osmium
use http2::header::HeaderList;
use http2::stream::{StreamId, PushedStream};

#[derive(Debug, Clone, PartialEq)]
pub struct HeadersMessage {
    pub stream_id: StreamId,
    pub headers: HeaderList,
    pub end_stream: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub stream_id: StreamId,
    pub bytes: Bytes,
    pub end_stream: bool
}

impl DataMessage {
    // Only the tail keeps the end of stream flag.
    pub fn split_at(self, at: usize) -> (DataMessage, DataMessage) {
        let mut tail = self.bytes;
        let head = tail.split_to(at);

        (
            DataMessage {
                stream_id: self.stream_id,
                bytes: head,
                end_stream: false
            },
            DataMessage {
                stream_id: self.stream_id,
                bytes: tail,
                end_stream: self.end_stream
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushPromiseMessage {
    pub stream_id: StreamId,
    pub headers: HeaderList,
    pub promised_stream_id: StreamId,
    pub pushed_stream: PushedStream,
    pub end_stream: bool
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Headers(HeadersMessage),
    Data(DataMessage),
    PushPromise(PushPromiseMessage)
}

impl Message {
    pub fn headers(stream_id: StreamId, headers: HeaderList, end_stream: bool) -> Self {
        Message::Headers(HeadersMessage {
            stream_id: stream_id,
            headers: headers,
            end_stream: end_stream
        })
    }

    pub fn data(stream_id: StreamId, bytes: Bytes, end_stream: bool) -> Self {
        Message::Data(DataMessage {
            stream_id: stream_id,
            bytes: bytes,
            end_stream: end_stream
        })
    }

    pub fn push_promise(stream_id: StreamId, headers: HeaderList, pushed_stream: PushedStream, end_stream: bool) -> Self {
        Message::PushPromise(PushPromiseMessage {
            stream_id: stream_id,
            headers: headers,
            promised_stream_id: pushed_stream.get_stream_id(),
            pushed_stream: pushed_stream,
            end_stream: end_stream
        })
    }

    pub fn get_stream_id(&self) -> StreamId {
        match *self {
            Message::Headers(ref message) => message.stream_id,
            Message::Data(ref message) => message.stream_id,
            Message::PushPromise(ref message) => message.stream_id
        }
    }

    pub fn is_end_stream(&self) -> bool {
        match *self {
            Message::Headers(ref message) => message.end_stream,
            Message::Data(ref message) => message.end_stream,
            Message::PushPromise(ref message) => message.end_stream
        }
    }

    pub fn get_data_length(&self) -> usize {
        match *self {
            Message::Data(ref message) => message.bytes.len(),
            _ => 0
        }
    }
}
