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

pub mod message_queue;

// std
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

// osmium
use http2::core::message::Message;
use http2::core::signal::SignalSender;

pub use self::message_queue::StreamMessageQueue;

pub type StreamId = u32;

pub const CONNECTION_CONTROL_STREAM_ID: StreamId = 0x0;

// Once a backpressured consumer has room again it must notify `Signal::StreamReady`,
// otherwise anything buffered for the stream stays buffered.
pub trait StreamConsumer {
    fn enqueue_message(&mut self, message: Message);

    fn is_backpressured(&self) -> bool;

    fn subscribe(&mut self, stream_id: StreamId, ready_signal: SignalSender);

    fn unsubscribe(&mut self);
}

impl<T: StreamConsumer> StreamConsumer for Rc<RefCell<T>> {
    fn enqueue_message(&mut self, message: Message) {
        self.borrow_mut().enqueue_message(message)
    }

    fn is_backpressured(&self) -> bool {
        self.borrow().is_backpressured()
    }

    fn subscribe(&mut self, stream_id: StreamId, ready_signal: SignalSender) {
        self.borrow_mut().subscribe(stream_id, ready_signal)
    }

    fn unsubscribe(&mut self) {
        self.borrow_mut().unsubscribe()
    }
}

#[derive(Clone)]
pub struct PushedStream {
    stream_id: StreamId,
    queue: Rc<RefCell<StreamMessageQueue>>
}

impl PushedStream {
    pub fn new(stream_id: StreamId, queue: Rc<RefCell<StreamMessageQueue>>) -> Self {
        PushedStream {
            stream_id: stream_id,
            queue: queue
        }
    }

    pub fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn get_queue(&self) -> Rc<RefCell<StreamMessageQueue>> {
        self.queue.clone()
    }
}

// The queue may well hold messages which refer back to this handle, so only the id is printed.
impl fmt::Debug for PushedStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PushedStream({})", self.stream_id)
    }
}

impl PartialEq for PushedStream {
    fn eq(&self, other: &PushedStream) -> bool {
        self.stream_id == other.stream_id && Rc::ptr_eq(&self.queue, &other.queue)
    }
}
