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
// along with Osmium.  If not, see <http://www.gnu.org/licenses/>.

extern crate osmium_flow;
#[macro_use] extern crate log;
extern crate pretty_env_logger;
extern crate bytes;
extern crate futures;
extern crate tokio_core;

// std
use std::cell::RefCell;
use std::rc::Rc;

// bytes
use bytes::Bytes;

// futures
use futures::{future, Async};

// tokio
use tokio_core::reactor::Core;

// osmium
use osmium_flow::http2::core::{Connection, Drive};
use osmium_flow::http2::core::message::Message;
use osmium_flow::http2::error::{ErrorCode, HttpError};
use osmium_flow::http2::frame::{DataFrame, HeadersFrame, OutgoingFrame, PushPromiseFrame};
use osmium_flow::http2::header::{HeaderList, HeaderName, HeaderValue};
use osmium_flow::http2::settings::FlowSettings;
use osmium_flow::http2::stream::{PushedStream, StreamMessageQueue};

type SharedQueue = Rc<RefCell<StreamMessageQueue>>;

fn init_logging() {
    let _ = pretty_env_logger::init();
}

// Runs the connection on an event loop until it has nothing left to do.
fn run_until_idle(core: &mut Core, connection: &mut Connection<SharedQueue>) -> Result<(), HttpError> {
    core.run(future::poll_fn(|| {
        match connection.drive()? {
            Drive::Yielded => {
                futures::task::current().notify();
                Ok(Async::NotReady)
            },
            Drive::Idle | Drive::Finished => Ok(Async::Ready(()))
        }
    }))
}

fn pull_all(connection: &mut Connection<SharedQueue>) -> Vec<OutgoingFrame> {
    let mut frames = Vec::new();
    while let Some(frame) = connection.pull_frame() {
        frames.push(frame);
    }
    frames
}

fn data_lengths(frames: &[OutgoingFrame]) -> Vec<usize> {
    frames.iter()
        .filter(|frame| match **frame {
            OutgoingFrame::Data { .. } => true,
            _ => false
        })
        .map(|frame| frame.get_length())
        .collect()
}

#[test]
fn response_is_released_as_the_peer_grants_credit() {
    init_logging();
    let mut core = Core::new().unwrap();

    let settings = FlowSettings::default().set_initial_send_window(4000);
    let mut connection: Connection<SharedQueue> = Connection::new(&settings);

    let mut headers = HeaderList::new();
    headers.push(HeaderName::PseudoStatus, HeaderValue::Num(200));
    headers.push(HeaderName::ContentLength, HeaderValue::Num(10000));

    connection.send(Message::headers(1, headers, false));
    connection.send(Message::data(1, Bytes::from(vec![1u8; 10000]), true));

    let frames = pull_all(&mut connection);
    assert_eq!(2, frames.len());
    assert_eq!(vec![4000], data_lengths(&frames));
    assert!(!frames[1].is_end_stream());

    connection.recv_window_update(3000).unwrap();
    run_until_idle(&mut core, &mut connection).unwrap();
    let frames = pull_all(&mut connection);
    assert_eq!(vec![3000], data_lengths(&frames));
    assert!(!frames[0].is_end_stream());

    connection.recv_window_update(10000).unwrap();
    run_until_idle(&mut core, &mut connection).unwrap();
    let frames = pull_all(&mut connection);
    assert_eq!(vec![3000], data_lengths(&frames));
    assert!(frames[0].is_end_stream());

    assert_eq!(0, connection.get_outbound_pending_count());
    assert_eq!(7000, connection.get_send_window());
}

#[test]
fn request_body_is_credited_as_it_is_consumed() {
    init_logging();
    let mut core = Core::new().unwrap();

    let settings = FlowSettings::default()
        .set_initial_receive_window(1000)
        .set_window_update_threshold(500)
        .set_stream_buffer_limit(400);
    let mut connection: Connection<SharedQueue> = Connection::new(&settings);

    let queue = Rc::new(RefCell::new(StreamMessageQueue::with_settings(&settings)));
    connection.register_stream(1, queue.clone()).unwrap();

    connection.recv_headers_frame(HeadersFrame::new(1, HeaderList::new(), false)).unwrap();
    for _ in 0..4 {
        connection.recv_data_frame(DataFrame::new(1, Bytes::from(vec![0u8; 250]), false)).unwrap();
    }

    // Two chunks fill the queue and the rest wait in the connection.
    assert_eq!(2, connection.get_inbound_pending_count());

    let mut received = 0;
    loop {
        let message = queue.borrow_mut().pull_message();
        match message {
            Some(Message::Data(data)) => received += data.bytes.len(),
            Some(_) => {},
            None => break
        }
        run_until_idle(&mut core, &mut connection).unwrap();
    }

    assert_eq!(1000, received);
    assert_eq!(0, connection.get_inbound_pending_count());

    let updates: Vec<u32> = pull_all(&mut connection).into_iter()
        .filter_map(|frame| match frame {
            OutgoingFrame::WindowUpdate { stream_id: 0, window_size_increment } => Some(window_size_increment),
            _ => None
        })
        .collect();
    debug!("Window updates sent: {:?}", updates);

    assert_eq!(vec![500, 500], updates);

    // The peer has its full window back.
    connection.recv_data_frame(DataFrame::new(1, Bytes::from(vec![0u8; 1000]), true)).unwrap();
}

#[test]
fn oversized_update_threshold_still_returns_credit() {
    init_logging();
    let mut core = Core::new().unwrap();

    let settings = FlowSettings::default()
        .set_initial_receive_window(1000)
        .set_window_update_threshold(5000);
    let mut connection: Connection<SharedQueue> = Connection::new(&settings);

    let queue = Rc::new(RefCell::new(StreamMessageQueue::new(2000)));
    connection.register_stream(1, queue.clone()).unwrap();

    connection.recv_data_frame(DataFrame::new(1, Bytes::from(vec![0u8; 1000]), false)).unwrap();
    while queue.borrow_mut().pull_message().is_some() {}
    run_until_idle(&mut core, &mut connection).unwrap();

    assert_eq!(
        vec![OutgoingFrame::WindowUpdate { stream_id: 0, window_size_increment: 1000 }],
        pull_all(&mut connection)
    );

    // The peer can go on sending.
    connection.recv_data_frame(DataFrame::new(1, Bytes::from_static(b"x"), false)).unwrap();
    assert!(!connection.is_shutdown());
}

#[test]
fn pushed_response_is_read_from_the_promised_queue() {
    init_logging();
    let mut core = Core::new().unwrap();

    let settings = FlowSettings::default();
    let mut connection: Connection<SharedQueue> = Connection::new(&settings);

    let request_queue = Rc::new(RefCell::new(StreamMessageQueue::with_settings(&settings)));
    connection.register_stream(1, request_queue.clone()).unwrap();

    let pushed = PushedStream::new(2, Rc::new(RefCell::new(StreamMessageQueue::with_settings(&settings))));
    let mut promised_headers = HeaderList::new();
    promised_headers.push(HeaderName::PseudoPath, HeaderValue::Str("/style.css".to_owned()));
    connection.recv_push_promise_frame(PushPromiseFrame::new(1, promised_headers, 2), pushed).unwrap();

    // The application takes the promise and reads the pushed response from its queue.
    let promised = match request_queue.borrow_mut().pull_message() {
        Some(Message::PushPromise(promise)) => promise,
        other => panic!("expected a push promise, got {:?}", other)
    };
    assert_eq!(2, promised.promised_stream_id);

    let pushed_queue = promised.pushed_stream.get_queue();
    connection.register_stream(2, pushed_queue.clone()).unwrap();

    connection.recv_headers_frame(HeadersFrame::new(2, HeaderList::new(), false)).unwrap();
    connection.recv_data_frame(DataFrame::new(2, Bytes::from_static(b"body { }"), true)).unwrap();
    run_until_idle(&mut core, &mut connection).unwrap();

    let mut pushed_queue = pushed_queue.borrow_mut();
    assert!(pushed_queue.pull_message().is_some());
    match pushed_queue.pull_message() {
        Some(Message::Data(data)) => assert_eq!(Bytes::from_static(b"body { }"), data.bytes),
        other => panic!("expected data, got {:?}", other)
    }
    assert!(pushed_queue.is_finished());
}

#[test]
fn peer_overrunning_the_window_ends_the_connection() {
    init_logging();
    let mut core = Core::new().unwrap();

    let settings = FlowSettings::default().set_initial_receive_window(100);
    let mut connection: Connection<SharedQueue> = Connection::new(&settings);
    connection.register_stream(1, Rc::new(RefCell::new(StreamMessageQueue::new(1000)))).unwrap();

    let result = connection.recv_data_frame(DataFrame::new(1, Bytes::from(vec![0u8; 101]), false));
    assert_eq!(Some(ErrorCode::FlowControlError), result.err().map(|e| e.get_error_code()));

    match pull_all(&mut connection).pop() {
        Some(OutgoingFrame::GoAway { error_code, .. }) => assert_eq!(ErrorCode::FlowControlError, error_code),
        other => panic!("expected a GOAWAY, got {:?}", other)
    }

    let driven = run_until_idle(&mut core, &mut connection);
    assert_eq!(Some(ErrorCode::FlowControlError), driven.err().map(|e| e.get_error_code()));
}
