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
use http2::core::flow_control::OutboundWindow;
use http2::core::message::Message;
use http2::core::signal::{Signal, SignalSender};
use http2::core::writer::FrameWriter;
use http2::settings::FlowSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendProgress {
    Idle,
    Yielded
}

// A DATA message larger than the window is split. The rest goes back to the front of the
// queue so that nothing overtakes it.
pub struct OutboundQueue<W, F> {
    messages: VecDeque<Message>,
    window: W,
    frame_writer: F,
    continue_signal: SignalSender,
    messages_per_turn: usize,
    continuation_scheduled: bool,
    terminated: bool
}

impl<W: OutboundWindow, F: FrameWriter> OutboundQueue<W, F> {
    pub fn new(window: W, frame_writer: F, continue_signal: SignalSender, settings: &FlowSettings) -> Self {
        OutboundQueue {
            messages: VecDeque::new(),
            window: window,
            frame_writer: frame_writer,
            continue_signal: continue_signal,
            messages_per_turn: settings.get_messages_per_turn(),
            continuation_scheduled: false,
            terminated: false
        }
    }

    pub fn enqueue(&mut self, message: Message) {
        if self.terminated {
            debug!("Outbound queue is terminated, dropping message for stream {}", message.get_stream_id());
            return;
        }

        log_outbound_message!("Enqueue message", message);

        self.messages.push_back(message);
        self.try_send_messages();
    }

    pub fn get_pending_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn resume(&mut self) -> SendProgress {
        self.continuation_scheduled = false;
        self.try_send_messages()
    }

    pub fn try_send_messages(&mut self) -> SendProgress {
        if self.terminated {
            return SendProgress::Idle;
        }

        let mut sent = 0;
        while sent < self.messages_per_turn && self.can_make_progress() {
            self.send_next_message();
            sent += 1;
        }

        if !self.can_make_progress() {
            return SendProgress::Idle;
        }

        // Give the rest of the connection a chance before carrying on.
        if !self.continuation_scheduled {
            self.continuation_scheduled = true;
            self.continue_signal.notify(Signal::ContinueSending);
        }

        SendProgress::Yielded
    }

    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }

        debug!("Terminating outbound queue, discarding {} messages", self.messages.len());

        self.terminated = true;
        self.messages.clear();
    }

    fn can_make_progress(&self) -> bool {
        if self.frame_writer.is_backpressured() {
            return false;
        }

        match self.messages.front() {
            // An empty DATA frame only carries the end of stream flag, which costs nothing.
            Some(&Message::Data(ref message)) => message.bytes.is_empty() || self.window.available() > 0,
            Some(_) => true,
            None => false
        }
    }

    fn send_next_message(&mut self) {
        let message = match self.messages.pop_front() {
            Some(message) => message,
            None => return
        };

        match message {
            Message::Headers(message) => {
                self.frame_writer.write_headers_frame(message.stream_id, message.headers, message.end_stream);
            },
            Message::PushPromise(message) => {
                self.frame_writer.write_push_promise_frame(
                    message.stream_id,
                    message.headers,
                    message.promised_stream_id,
                    message.end_stream
                );
            },
            Message::Data(message) => {
                let available = self.window.available() as usize;

                if available >= message.bytes.len() {
                    self.window.decrease_window(message.bytes.len() as u32);
                    self.frame_writer.write_data_frame(message.stream_id, message.bytes, message.end_stream);
                }
                else {
                    let (head, tail) = message.split_at(available);
                    trace!("Fragmenting data for stream {}, sending {} of {} bytes", head.stream_id, available, available + tail.bytes.len());

                    self.window.decrease_window(head.bytes.len() as u32);
                    self.frame_writer.write_data_frame(head.stream_id, head.bytes, false);

                    // The remainder goes first next time so nothing on this stream overtakes it.
                    self.messages.push_front(Message::Data(tail));
                }
            }
        }
    }
}
