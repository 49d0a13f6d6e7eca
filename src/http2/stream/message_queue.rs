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
use std::collections::VecDeque;

// osmium
use http2::core::message::Message;
use http2::core::signal::{Signal, SignalSender};
use http2::settings::FlowSettings;
use super::{StreamConsumer, StreamId};

// Header blocks take no space against the limit, so a limit of zero stops everything except
// the first message.
#[derive(Debug)]
pub struct StreamMessageQueue {
    messages: VecDeque<Message>,
    buffered_bytes: usize,
    limit: usize,
    subscription: Option<(StreamId, SignalSender)>,
    end_stream_received: bool,
    finished: bool
}

impl StreamMessageQueue {
    pub fn new(limit: usize) -> Self {
        StreamMessageQueue {
            messages: VecDeque::new(),
            buffered_bytes: 0,
            limit: limit,
            subscription: None,
            end_stream_received: false,
            finished: false
        }
    }

    pub fn with_settings(settings: &FlowSettings) -> Self {
        StreamMessageQueue::new(settings.get_stream_buffer_limit())
    }

    pub fn pull_message(&mut self) -> Option<Message> {
        let was_backpressured = self.is_backpressured();

        let message = self.messages.pop_front()?;
        self.buffered_bytes -= message.get_data_length();

        if message.is_end_stream() {
            self.finished = true;
        }

        if was_backpressured && !self.is_backpressured() {
            self.notify_ready();
        }

        Some(message)
    }

    // Changing the limit can relieve backpressure without a message being pulled.
    pub fn set_limit(&mut self, limit: usize) {
        let was_backpressured = self.is_backpressured();
        self.limit = limit;

        if was_backpressured && !self.is_backpressured() {
            self.notify_ready();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get_buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    pub fn is_end_stream_received(&self) -> bool {
        self.end_stream_received
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn notify_ready(&self) {
        if let Some((stream_id, ref ready_signal)) = self.subscription {
            ready_signal.notify(Signal::StreamReady(stream_id));
        }
    }
}

impl StreamConsumer for StreamMessageQueue {
    fn enqueue_message(&mut self, message: Message) {
        if self.end_stream_received {
            warn!("Message delivered to stream {} after the end of the stream, it will be dropped", message.get_stream_id());
            return;
        }

        self.buffered_bytes += message.get_data_length();
        self.end_stream_received = message.is_end_stream();
        self.messages.push_back(message);
    }

    fn is_backpressured(&self) -> bool {
        !self.messages.is_empty() && self.buffered_bytes >= self.limit
    }

    fn subscribe(&mut self, stream_id: StreamId, ready_signal: SignalSender) {
        self.subscription = Some((stream_id, ready_signal));
    }

    fn unsubscribe(&mut self) {
        self.subscription = None;
    }
}
