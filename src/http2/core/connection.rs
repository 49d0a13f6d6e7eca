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
use std::rc::Rc;

// futures
use futures::{task, Async, Future, Poll, Stream};

// osmium
use http2::core::flow_control::{OutboundWindow, OutgoingConnectionWindow, IncomingConnectionWindow};
use http2::core::inbound::InboundDemultiplexer;
use http2::core::message::Message;
use http2::core::outbound::OutboundQueue;
use http2::core::signal::{self, Signal, SignalReceiver};
use http2::core::writer::{FrameWriter, QueuedFrameWriter};
use http2::error;
use http2::frame::{self as framing, OutgoingFrame};
use http2::settings::FlowSettings;
use http2::stream::{PushedStream, StreamConsumer, StreamId};

type SharedOutgoingWindow = Rc<RefCell<OutgoingConnectionWindow>>;
type SharedFrameWriter = Rc<RefCell<QueuedFrameWriter>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Idle,
    Yielded,
    Finished
}

/// The flow controlled core of one HTTP/2 connection.
pub struct Connection<C> {
    outbound: OutboundQueue<SharedOutgoingWindow, SharedFrameWriter>,
    inbound: InboundDemultiplexer<IncomingConnectionWindow<SharedFrameWriter>, C>,

    outgoing_window: SharedOutgoingWindow,
    frame_writer: SharedFrameWriter,
    signal_rx: SignalReceiver,
    signals_per_turn: usize,

    highest_registered_stream_id: StreamId,

    shutdown_initiated: bool,
    shutdown_error: Option<error::HttpError>
}

impl<C: StreamConsumer> Connection<C> {
    pub fn new(settings: &FlowSettings) -> Connection<C> {
        let (signal_tx, signal_rx) = signal::channel();

        let outgoing_window = Rc::new(RefCell::new(OutgoingConnectionWindow::new(settings.get_initial_send_window(), signal_tx.clone())));
        let frame_writer = Rc::new(RefCell::new(QueuedFrameWriter::new(settings, signal_tx.clone())));

        let incoming_window = IncomingConnectionWindow::new(
            settings.get_initial_receive_window(),
            settings.get_window_update_threshold(),
            frame_writer.clone()
        );

        Connection {
            outbound: OutboundQueue::new(outgoing_window.clone(), frame_writer.clone(), signal_tx.clone(), settings),
            inbound: InboundDemultiplexer::new(incoming_window, signal_tx),
            outgoing_window: outgoing_window,
            frame_writer: frame_writer,
            signal_rx: signal_rx,
            signals_per_turn: settings.get_signals_per_turn(),
            highest_registered_stream_id: 0,
            shutdown_initiated: false,
            shutdown_error: None
        }
    }

    pub fn send(&mut self, message: Message) {
        if self.shutdown_initiated {
            info!("The connection is shutting down, so the message for stream {} will be discarded", message.get_stream_id());
            return;
        }

        self.outbound.enqueue(message);
    }

    pub fn register_stream(&mut self, stream_id: StreamId, consumer: C) -> Result<(), error::HttpError> {
        self.inbound.register_stream(stream_id, consumer)?;

        if stream_id > self.highest_registered_stream_id {
            self.highest_registered_stream_id = stream_id;
        }

        Ok(())
    }

    pub fn deregister_stream(&mut self, stream_id: StreamId) -> Option<C> {
        self.inbound.deregister_stream(stream_id)
    }

    pub fn recv_data_frame(&mut self, frame: framing::DataFrame) -> Result<(), error::HttpError> {
        if self.discard_after_shutdown() {
            return Ok(());
        }

        let result = self.inbound.on_data_frame(frame);
        self.check(result)
    }

    pub fn recv_ignored_data_frame(&mut self, frame: &framing::DataFrame) -> Result<(), error::HttpError> {
        if self.discard_after_shutdown() {
            return Ok(());
        }

        let result = self.inbound.on_ignored_data_frame(frame);
        self.check(result)
    }

    pub fn recv_headers_frame(&mut self, frame: framing::HeadersFrame) -> Result<(), error::HttpError> {
        if self.discard_after_shutdown() {
            return Ok(());
        }

        let result = self.inbound.on_headers_frame(frame);
        self.check(result)
    }

    pub fn recv_push_promise_frame(&mut self, frame: framing::PushPromiseFrame, pushed_stream: PushedStream) -> Result<(), error::HttpError> {
        if self.discard_after_shutdown() {
            return Ok(());
        }

        let result = self.inbound.on_push_promise_frame(frame, pushed_stream);
        self.check(result)
    }

    pub fn recv_window_update(&mut self, window_size_increment: u32) -> Result<(), error::HttpError> {
        if self.discard_after_shutdown() {
            return Ok(());
        }

        let result = self.outgoing_window.borrow_mut().process_window_update(window_size_increment);
        self.check(result)
    }

    pub fn pull_frame(&mut self) -> Option<OutgoingFrame> {
        self.frame_writer.borrow_mut().pull_frame()
    }

    pub fn get_outbound_pending_count(&self) -> usize {
        self.outbound.get_pending_count()
    }

    pub fn get_inbound_pending_count(&self) -> usize {
        self.inbound.get_pending_count()
    }

    pub fn get_send_window(&self) -> u32 {
        self.outgoing_window.available()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_initiated
    }

    pub fn handle_signal(&mut self, signal: Signal) -> Result<(), error::HttpError> {
        if self.shutdown_initiated {
            trace!("Ignoring {:?}, the connection is shutting down", signal);
            return Ok(());
        }

        match signal {
            Signal::PeerWindowOpened | Signal::WriteBufferDrained => {
                self.outbound.try_send_messages();
                Ok(())
            },
            Signal::ContinueSending => {
                self.outbound.resume();
                Ok(())
            },
            Signal::StreamReady(stream_id) => {
                let result = self.inbound.on_stream_ready(stream_id);
                self.check(result)
            }
        }
    }

    // Must be called from within a task, the receiver registers for wake up when idle.
    pub fn drive(&mut self) -> Result<Drive, error::HttpError> {
        for _ in 0..self.signals_per_turn {
            if self.shutdown_initiated {
                return self.finish();
            }

            match self.signal_rx.poll() {
                Ok(Async::Ready(Some(signal))) => {
                    if let Err(e) = self.handle_signal(signal) {
                        debug!("Handling {:?} failed: {}", signal, e);
                    }
                },
                Ok(Async::Ready(None)) | Err(_) => {
                    // The connection holds senders itself, so this only happens while tearing down.
                    debug!("Signal channel closed");
                    return Ok(Drive::Finished);
                },
                Ok(Async::NotReady) => {
                    return Ok(Drive::Idle);
                }
            }
        }

        if self.shutdown_initiated {
            return self.finish();
        }

        Ok(Drive::Yielded)
    }

    pub fn shutdown(&mut self) {
        self.do_shutdown(error::ErrorCode::NoError, error::ErrorName::NoErrorShutdown);
    }

    pub fn shutdown_connection(&mut self, http_error: error::HttpError) {
        if self.shutdown_initiated {
            return;
        }

        warn!("Shutting down connection: {}", http_error);

        self.do_shutdown(http_error.get_error_code(), http_error.get_error_name());
        self.shutdown_error = Some(http_error);
    }

    fn do_shutdown(&mut self, error_code: error::ErrorCode, error_name: error::ErrorName) {
        if self.shutdown_initiated {
            return;
        }

        // Frames which arrive from here on are discarded without processing.
        self.shutdown_initiated = true;

        // Streams are torn down before the engines see the termination.
        for stream_id in self.inbound.get_registered_streams() {
            self.inbound.deregister_stream(stream_id);
        }

        self.outbound.terminate();
        if let Err(e) = self.inbound.terminate() {
            error!("Inbound messages were not cleaned up before termination: {}", e);
        }

        // The GOAWAY goes straight to the writer, the outbound queue no longer accepts anything.
        self.frame_writer.borrow_mut().write_go_away_frame(
            self.highest_registered_stream_id,
            error_code,
            error_name.into()
        );
    }

    fn check(&mut self, result: Result<(), error::HttpError>) -> Result<(), error::HttpError> {
        if let Err(ref e) = result {
            if e.is_connection_error() {
                self.shutdown_connection(e.clone());
            }
        }

        result
    }

    fn discard_after_shutdown(&self) -> bool {
        if self.shutdown_initiated {
            info!("The connection is shutting down, so this frame will be discarded with no processing");
        }

        self.shutdown_initiated
    }

    fn finish(&mut self) -> Result<Drive, error::HttpError> {
        match self.shutdown_error.take() {
            Some(e) => Err(e),
            None => Ok(Drive::Finished)
        }
    }
}

impl<C: StreamConsumer> Future for Connection<C> {
    type Item = ();
    type Error = error::HttpError;

    fn poll(&mut self) -> Poll<(), error::HttpError> {
        match self.drive()? {
            Drive::Idle => Ok(Async::NotReady),
            Drive::Yielded => {
                // Let everything else on the event loop have a turn before carrying on.
                task::current().notify();
                Ok(Async::NotReady)
            },
            Drive::Finished => Ok(Async::Ready(()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bytes::Bytes;
    use futures::{future, Async, Future};

    use super::{Connection, Drive};
    use http2::core::message::Message;
    use http2::error::{ErrorCode, ErrorName, HttpError};
    use http2::frame::{DataFrame, HeadersFrame, OutgoingFrame};
    use http2::header::HeaderList;
    use http2::settings::FlowSettings;
    use http2::stream::StreamMessageQueue;
    use http2::support::init_test_logging;

    type TestConnection = Connection<Rc<RefCell<StreamMessageQueue>>>;

    fn drive_until_idle(connection: &mut TestConnection) -> Result<Drive, HttpError> {
        future::lazy(|| {
            loop {
                match connection.drive() {
                    Ok(Drive::Yielded) => continue,
                    other => return other
                }
            }
        }).wait()
    }

    fn pull_all(connection: &mut TestConnection) -> Vec<OutgoingFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = connection.pull_frame() {
            frames.push(frame);
        }
        frames
    }

    fn stream_queue(limit: usize) -> Rc<RefCell<StreamMessageQueue>> {
        Rc::new(RefCell::new(StreamMessageQueue::new(limit)))
    }

    #[test]
    fn window_update_resumes_blocked_data() {
        init_test_logging();
        let mut connection: TestConnection = Connection::new(&FlowSettings::default().set_initial_send_window(4000));

        connection.send(Message::data(1, Bytes::from(vec![7u8; 10000]), false));
        assert_eq!(1, pull_all(&mut connection).len());
        assert_eq!(1, connection.get_outbound_pending_count());

        connection.recv_window_update(6000).unwrap();
        assert_eq!(Ok(Drive::Idle), drive_until_idle(&mut connection));

        let frames = pull_all(&mut connection);
        assert_eq!(1, frames.len());
        assert_eq!(6000, frames[0].get_length());
        assert!(!frames[0].is_end_stream());
        assert_eq!(0, connection.get_send_window());
    }

    #[test]
    fn stream_ready_signal_dispatches_buffered_messages() {
        init_test_logging();
        let mut connection: TestConnection = Connection::new(&FlowSettings::default());
        let queue = stream_queue(4);
        connection.register_stream(5, queue.clone()).unwrap();

        connection.recv_headers_frame(HeadersFrame::new(5, HeaderList::new(), false)).unwrap();
        connection.recv_data_frame(DataFrame::new(5, Bytes::from_static(b"abcd"), false)).unwrap();
        connection.recv_data_frame(DataFrame::new(5, Bytes::from_static(b"efgh"), true)).unwrap();
        assert_eq!(1, connection.get_inbound_pending_count());

        // Credit for the first four bytes only.
        assert_eq!(
            vec![OutgoingFrame::WindowUpdate { stream_id: 0, window_size_increment: 4 }],
            pull_all(&mut connection)
        );

        queue.borrow_mut().pull_message();
        queue.borrow_mut().pull_message();
        assert_eq!(Ok(Drive::Idle), drive_until_idle(&mut connection));

        assert_eq!(0, connection.get_inbound_pending_count());
        assert_eq!(
            vec![OutgoingFrame::WindowUpdate { stream_id: 0, window_size_increment: 4 }],
            pull_all(&mut connection)
        );

        queue.borrow_mut().pull_message();
        assert!(queue.borrow().is_finished());
    }

    #[test]
    fn protocol_error_shuts_the_connection_down() {
        init_test_logging();
        let mut connection: TestConnection = Connection::new(&FlowSettings::default());
        let queue = stream_queue(1024);
        connection.register_stream(3, queue.clone()).unwrap();
        connection.send(Message::data(3, Bytes::from_static(b"response"), false));
        pull_all(&mut connection);

        let result = connection.recv_data_frame(DataFrame::new(9, Bytes::from_static(b"?"), false));
        assert_eq!(
            Err(HttpError::ConnectionError(ErrorCode::ProtocolError, ErrorName::FrameOnUnregisteredStream)),
            result
        );
        assert!(connection.is_shutdown());

        // Streams were torn down before the engines were terminated.
        assert!(connection.deregister_stream(3).is_none());
        assert_eq!(0, connection.get_inbound_pending_count());

        match pull_all(&mut connection).pop() {
            Some(OutgoingFrame::GoAway { last_stream_id, error_code, .. }) => {
                assert_eq!(3, last_stream_id);
                assert_eq!(ErrorCode::ProtocolError, error_code);
            },
            other => panic!("expected a GOAWAY, got {:?}", other)
        }

        // Nothing more goes out once shut down.
        connection.send(Message::data(3, Bytes::from_static(b"late"), true));
        assert!(connection.recv_headers_frame(HeadersFrame::new(3, HeaderList::new(), true)).is_ok());
        assert!(pull_all(&mut connection).is_empty());

        assert_eq!(
            Err(HttpError::ConnectionError(ErrorCode::ProtocolError, ErrorName::FrameOnUnregisteredStream)),
            drive_until_idle(&mut connection)
        );
        assert_eq!(Ok(Drive::Finished), drive_until_idle(&mut connection));
    }

    #[test]
    fn duplicate_registration_leaves_the_connection_running() {
        init_test_logging();
        let mut connection: TestConnection = Connection::new(&FlowSettings::default());

        connection.register_stream(1, stream_queue(10)).unwrap();
        assert!(connection.register_stream(1, stream_queue(10)).is_err());
        assert!(!connection.is_shutdown());
    }

    #[test]
    fn graceful_shutdown_resolves_the_future() {
        init_test_logging();
        let mut connection: TestConnection = Connection::new(&FlowSettings::default());
        connection.register_stream(1, stream_queue(10)).unwrap();

        connection.shutdown();

        match pull_all(&mut connection).pop() {
            Some(OutgoingFrame::GoAway { error_code, .. }) => assert_eq!(ErrorCode::NoError, error_code),
            other => panic!("expected a GOAWAY, got {:?}", other)
        }

        let polled = future::lazy(|| connection.poll()).wait();
        assert_eq!(Ok(Async::Ready(())), polled);
    }

    #[test]
    fn driver_yields_when_the_turn_budget_runs_out() {
        init_test_logging();
        let settings = FlowSettings::default().set_signals_per_turn(1).set_messages_per_turn(1);
        let mut connection: TestConnection = Connection::new(&settings.set_initial_send_window(0));

        connection.send(Message::data(1, Bytes::from_static(b"aa"), false));
        connection.send(Message::data(1, Bytes::from_static(b"bb"), false));
        connection.send(Message::data(1, Bytes::from_static(b"cc"), true));

        connection.recv_window_update(100).unwrap();

        // One window signal, then one continuation per remaining message.
        let turns = future::lazy(|| {
            let mut turns = Vec::new();
            loop {
                let turn = connection.drive();
                turns.push(turn.clone());
                if turn != Ok(Drive::Yielded) {
                    return Ok::<_, ()>(turns);
                }
            }
        }).wait().unwrap();

        assert_eq!(vec![Ok(Drive::Yielded), Ok(Drive::Yielded), Ok(Drive::Yielded), Ok(Drive::Idle)], turns);
        assert_eq!(3, pull_all(&mut connection).len());
    }
}
