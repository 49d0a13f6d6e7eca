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
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

// bytes
use bytes::Bytes;

// osmium
use http2::core::signal::{Signal, SignalSender};
use http2::error::ErrorCode;
use http2::frame::{self as framing, OutgoingFrame};
use http2::header::HeaderList;
use http2::settings::FlowSettings;
use http2::stream::StreamId;

pub trait FrameWriter {
    fn write_headers_frame(&mut self, stream_id: StreamId, headers: HeaderList, end_stream: bool);

    fn write_data_frame(&mut self, stream_id: StreamId, payload: Bytes, end_stream: bool);

    fn write_push_promise_frame(&mut self, stream_id: StreamId, headers: HeaderList, promised_stream_id: StreamId, end_stream: bool);

    fn write_window_update_frame(&mut self, stream_id: StreamId, window_size_increment: u32);

    fn write_go_away_frame(&mut self, last_stream_id: StreamId, error_code: ErrorCode, debug_data: Vec<u8>);

    fn is_backpressured(&self) -> bool;
}

impl<T: FrameWriter> FrameWriter for Rc<RefCell<T>> {
    fn write_headers_frame(&mut self, stream_id: StreamId, headers: HeaderList, end_stream: bool) {
        self.borrow_mut().write_headers_frame(stream_id, headers, end_stream)
    }

    fn write_data_frame(&mut self, stream_id: StreamId, payload: Bytes, end_stream: bool) {
        self.borrow_mut().write_data_frame(stream_id, payload, end_stream)
    }

    fn write_push_promise_frame(&mut self, stream_id: StreamId, headers: HeaderList, promised_stream_id: StreamId, end_stream: bool) {
        self.borrow_mut().write_push_promise_frame(stream_id, headers, promised_stream_id, end_stream)
    }

    fn write_window_update_frame(&mut self, stream_id: StreamId, window_size_increment: u32) {
        self.borrow_mut().write_window_update_frame(stream_id, window_size_increment)
    }

    fn write_go_away_frame(&mut self, last_stream_id: StreamId, error_code: ErrorCode, debug_data: Vec<u8>) {
        self.borrow_mut().write_go_away_frame(last_stream_id, error_code, debug_data)
    }

    fn is_backpressured(&self) -> bool {
        self.borrow().is_backpressured()
    }
}

pub struct QueuedFrameWriter {
    send_frames: VecDeque<OutgoingFrame>,
    buffered_bytes: usize,
    high_water: usize,
    low_water: usize,
    backpressured: bool,
    drained_signal: SignalSender
}

impl QueuedFrameWriter {
    pub fn new(settings: &FlowSettings, drained_signal: SignalSender) -> Self {
        QueuedFrameWriter {
            send_frames: VecDeque::new(),
            buffered_bytes: 0,
            high_water: settings.get_write_buffer_high_water(),
            low_water: settings.get_write_buffer_low_water(),
            backpressured: false,
            drained_signal: drained_signal
        }
    }

    pub fn pull_frame(&mut self) -> Option<OutgoingFrame> {
        let frame = self.send_frames.pop_front()?;
        self.buffered_bytes -= framing::FRAME_HEADER_SIZE + frame.get_length();

        if self.backpressured && self.buffered_bytes <= self.low_water {
            trace!("Write buffer drained to {} bytes", self.buffered_bytes);
            self.backpressured = false;
            self.drained_signal.notify(Signal::WriteBufferDrained);
        }

        Some(frame)
    }

    pub fn get_buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    pub fn get_pending_frame_count(&self) -> usize {
        self.send_frames.len()
    }

    fn push_send_frame(&mut self, frame: OutgoingFrame) {
        log_write_frame!("Pushing frame for send", frame);

        self.buffered_bytes += framing::FRAME_HEADER_SIZE + frame.get_length();
        self.send_frames.push_back(frame);

        if !self.backpressured && self.buffered_bytes >= self.high_water {
            debug!("Write buffer is over its high water mark with {} bytes", self.buffered_bytes);
            self.backpressured = true;
        }
    }
}

impl FrameWriter for QueuedFrameWriter {
    fn write_headers_frame(&mut self, stream_id: StreamId, headers: HeaderList, end_stream: bool) {
        self.push_send_frame(OutgoingFrame::Headers {
            stream_id: stream_id,
            headers: headers,
            end_stream: end_stream
        });
    }

    fn write_data_frame(&mut self, stream_id: StreamId, payload: Bytes, end_stream: bool) {
        self.push_send_frame(OutgoingFrame::Data {
            stream_id: stream_id,
            payload: payload,
            end_stream: end_stream
        });
    }

    fn write_push_promise_frame(&mut self, stream_id: StreamId, headers: HeaderList, promised_stream_id: StreamId, end_stream: bool) {
        self.push_send_frame(OutgoingFrame::PushPromise {
            stream_id: stream_id,
            headers: headers,
            promised_stream_id: promised_stream_id,
            end_stream: end_stream
        });
    }

    fn write_window_update_frame(&mut self, stream_id: StreamId, window_size_increment: u32) {
        self.push_send_frame(OutgoingFrame::WindowUpdate {
            stream_id: stream_id,
            window_size_increment: window_size_increment
        });
    }

    fn write_go_away_frame(&mut self, last_stream_id: StreamId, error_code: ErrorCode, debug_data: Vec<u8>) {
        self.push_send_frame(OutgoingFrame::GoAway {
            last_stream_id: last_stream_id,
            error_code: error_code,
            debug_data: debug_data
        });
    }

    fn is_backpressured(&self) -> bool {
        self.backpressured
    }
}
