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
use std::collections::{VecDeque, HashMap};

// osmium
use http2::core::flow_control::InboundWindow;
use http2::core::message::{Message, PushPromiseMessage};
use http2::core::signal::SignalSender;
use http2::error;
use http2::frame as framing;
use http2::stream::{PushedStream, StreamConsumer, StreamId};

// Received bytes come off the connection window as soon as they arrive, but credit is only
// handed back once the bytes have been delivered, so a slow consumer limits the peer.
pub struct InboundDemultiplexer<W, C> {
    consumers: HashMap<StreamId, C>,
    pending_messages: HashMap<StreamId, VecDeque<Message>>,
    window: W,
    ready_signal: SignalSender,
    pending_count: usize,
    terminated: bool
}

impl<W: InboundWindow, C: StreamConsumer> InboundDemultiplexer<W, C> {
    pub fn new(window: W, ready_signal: SignalSender) -> Self {
        InboundDemultiplexer {
            consumers: HashMap::new(),
            pending_messages: HashMap::new(),
            window: window,
            ready_signal: ready_signal,
            pending_count: 0,
            terminated: false
        }
    }

    pub fn register_stream(&mut self, stream_id: StreamId, mut consumer: C) -> Result<(), error::HttpError> {
        if self.terminated {
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::InternalError,
                error::ErrorName::ConnectionTerminated
            ));
        }

        if self.consumers.contains_key(&stream_id) {
            warn!("Attempted to register stream {} more than once", stream_id);
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::InternalError,
                error::ErrorName::StreamAlreadyRegistered
            ));
        }

        consumer.subscribe(stream_id, self.ready_signal.clone());

        self.consumers.insert(stream_id, consumer);
        self.pending_messages.insert(stream_id, VecDeque::new());

        Ok(())
    }

    pub fn deregister_stream(&mut self, stream_id: StreamId) -> Option<C> {
        if let Some(pending) = self.pending_messages.remove(&stream_id) {
            if !pending.is_empty() {
                debug!("Stream {} deregistered with {} undelivered messages", stream_id, pending.len());
            }
            self.pending_count -= pending.len();
        }

        self.consumers.remove(&stream_id).map(|mut consumer| {
            consumer.unsubscribe();
            consumer
        })
    }

    pub fn is_registered(&self, stream_id: StreamId) -> bool {
        self.consumers.contains_key(&stream_id)
    }

    pub fn get_registered_streams(&self) -> Vec<StreamId> {
        self.consumers.keys().cloned().collect()
    }

    pub fn get_pending_count(&self) -> usize {
        self.pending_count
    }

    pub fn on_data_frame(&mut self, frame: framing::DataFrame) -> Result<(), error::HttpError> {
        self.window.got_data(frame.get_length() as u32)?;

        self.add_message(Message::data(frame.header.stream_id, frame.payload, frame.header.end_stream))
    }

    pub fn on_ignored_data_frame(&mut self, frame: &framing::DataFrame) -> Result<(), error::HttpError> {
        trace!("Ignoring {} bytes of data for stream {}", frame.get_length(), frame.header.stream_id);
        self.window.got_data(frame.get_length() as u32)
    }

    pub fn on_headers_frame(&mut self, frame: framing::HeadersFrame) -> Result<(), error::HttpError> {
        self.add_message(Message::headers(frame.header.stream_id, frame.headers, frame.header.end_stream))
    }

    pub fn on_push_promise_frame(&mut self, frame: framing::PushPromiseFrame, pushed_stream: PushedStream) -> Result<(), error::HttpError> {
        if pushed_stream.get_stream_id() != frame.promised_stream_id {
            warn!("Push promise for stream {} came with a handle for stream {}", frame.promised_stream_id, pushed_stream.get_stream_id());
        }

        self.add_message(Message::PushPromise(PushPromiseMessage {
            stream_id: frame.header.stream_id,
            headers: frame.headers,
            promised_stream_id: frame.promised_stream_id,
            pushed_stream: pushed_stream,
            end_stream: frame.header.end_stream
        }))
    }

    pub fn on_stream_ready(&mut self, stream_id: StreamId) -> Result<(), error::HttpError> {
        if !self.consumers.contains_key(&stream_id) {
            // The stream finished or was torn down after the signal was raised.
            trace!("Ready signal for stream {} which is no longer registered", stream_id);
            return Ok(());
        }

        self.try_dispatch(stream_id)
    }

    // Streams are torn down above this layer first, so there should be nothing left.
    pub fn terminate(&mut self) -> Result<(), error::HttpError> {
        if self.terminated {
            return Ok(());
        }

        self.terminated = true;

        if !self.consumers.is_empty() || !self.pending_messages.is_empty() {
            error!("Inbound demultiplexer terminated with {} streams still registered", self.consumers.len());
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::InternalError,
                error::ErrorName::StreamsOutstandingAtTermination
            ));
        }

        Ok(())
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn add_message(&mut self, message: Message) -> Result<(), error::HttpError> {
        if self.terminated {
            debug!("Inbound demultiplexer is terminated, dropping message for stream {}", message.get_stream_id());
            return Ok(());
        }

        let stream_id = message.get_stream_id();

        {
            let pending = match self.pending_messages.get_mut(&stream_id) {
                Some(pending) => pending,
                None => {
                    // (5.1) Frames other than PRIORITY on a closed or idle stream are a connection error
                    // of type PROTOCOL_ERROR.
                    return Err(error::HttpError::ConnectionError(
                        error::ErrorCode::ProtocolError,
                        error::ErrorName::FrameOnUnregisteredStream
                    ));
                }
            };

            if pending.back().map_or(false, |last| last.is_end_stream()) {
                return Err(error::HttpError::ConnectionError(
                    error::ErrorCode::ProtocolError,
                    error::ErrorName::FrameAfterEndOfStream
                ));
            }

            log_inbound_message!("Buffer message", message);

            pending.push_back(message);
            self.pending_count += 1;
        }

        self.try_dispatch(stream_id)
    }

    fn try_dispatch(&mut self, stream_id: StreamId) -> Result<(), error::HttpError> {
        let mut bytes_delivered = 0;
        let mut end_stream_delivered = false;

        {
            let consumer = match self.consumers.get_mut(&stream_id) {
                Some(consumer) => consumer,
                None => {
                    return Err(error::HttpError::ConnectionError(
                        error::ErrorCode::ProtocolError,
                        error::ErrorName::FrameOnUnregisteredStream
                    ));
                }
            };

            if let Some(pending) = self.pending_messages.get_mut(&stream_id) {
                while !consumer.is_backpressured() {
                    let message = match pending.pop_front() {
                        Some(message) => message,
                        None => break
                    };
                    self.pending_count -= 1;

                    log_inbound_message!("Deliver message", message);

                    bytes_delivered += message.get_data_length();
                    let end_stream = message.is_end_stream();

                    consumer.enqueue_message(message);

                    if end_stream {
                        end_stream_delivered = true;
                        break;
                    }
                }
            }
        }

        let mut result = Ok(());

        if end_stream_delivered {
            // The stream is finished, nothing more will be delivered to it.
            let undelivered = self.pending_messages.get(&stream_id).map_or(0, |pending| pending.len());
            self.deregister_stream(stream_id);

            if undelivered > 0 {
                result = Err(error::HttpError::ConnectionError(
                    error::ErrorCode::ProtocolError,
                    error::ErrorName::FrameAfterEndOfStream
                ));
            }
            else {
                trace!("Stream {} finished", stream_id);
            }
        }

        if bytes_delivered > 0 {
            self.window.data_processed(bytes_delivered as u32);
        }

        result
    }
}
