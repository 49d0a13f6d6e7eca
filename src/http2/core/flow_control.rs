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
use std::cmp;
use std::rc::Rc;

// osmium
use http2::core::signal::{Signal, SignalSender};
use http2::core::writer::FrameWriter;
use http2::error;
use http2::settings;
use http2::stream::CONNECTION_CONTROL_STREAM_ID;

pub trait OutboundWindow {
    fn available(&self) -> u32;

    fn decrease_window(&mut self, size: u32);
}

pub trait InboundWindow {
    // Bytes taken off the wire, whether or not they will ever be delivered.
    fn got_data(&mut self, size: u32) -> Result<(), error::HttpError>;

    // Bytes handed to a stream consumer. Only these earn the peer more credit.
    fn data_processed(&mut self, size: u32);
}

impl<T: OutboundWindow> OutboundWindow for Rc<RefCell<T>> {
    fn available(&self) -> u32 {
        self.borrow().available()
    }

    fn decrease_window(&mut self, size: u32) {
        self.borrow_mut().decrease_window(size)
    }
}

impl<T: InboundWindow> InboundWindow for Rc<RefCell<T>> {
    fn got_data(&mut self, size: u32) -> Result<(), error::HttpError> {
        self.borrow_mut().got_data(size)
    }

    fn data_processed(&mut self, size: u32) {
        self.borrow_mut().data_processed(size)
    }
}

pub struct OutgoingConnectionWindow {
    window_size: u32,
    opened_signal: SignalSender
}

impl OutgoingConnectionWindow {
    pub fn new(initial_window_size: u32, opened_signal: SignalSender) -> Self {
        OutgoingConnectionWindow {
            window_size: initial_window_size,
            opened_signal: opened_signal
        }
    }

    pub fn process_window_update(&mut self, window_size_increment: u32) -> Result<(), error::HttpError> {
        // (6.9) A receiver MUST treat the receipt of a WINDOW_UPDATE frame with a flow-control
        // window increment of 0 as a connection error of type PROTOCOL_ERROR.
        if window_size_increment == 0 {
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::ProtocolError,
                error::ErrorName::ZeroWindowSizeIncrement
            ));
        }

        // (6.9.1) If a sender receives a WINDOW_UPDATE that causes a flow-control window to exceed
        // this maximum, it MUST terminate the connection with FLOW_CONTROL_ERROR.
        let new_window_size = self.window_size as u64 + window_size_increment as u64;
        if new_window_size > settings::MAXIMUM_FLOW_CONTROL_WINDOW_SIZE as u64 {
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::FlowControlError,
                error::ErrorName::WindowSizeIncrementOverflow
            ));
        }

        let was_exhausted = self.window_size == 0;
        self.window_size = new_window_size as u32;

        if was_exhausted {
            self.opened_signal.notify(Signal::PeerWindowOpened);
        }

        Ok(())
    }
}

impl OutboundWindow for OutgoingConnectionWindow {
    fn available(&self) -> u32 {
        self.window_size
    }

    fn decrease_window(&mut self, size: u32) {
        // The outbound queue never writes more than it has been granted.
        assert!(size <= self.window_size, "attempted to send {} bytes with a window of {}", size, self.window_size);
        self.window_size -= size;
    }
}

pub struct IncomingConnectionWindow<F> {
    window_size: u32,
    unannounced_credit: u32,
    window_update_threshold: u32,
    frame_writer: F
}

impl<F: FrameWriter> IncomingConnectionWindow<F> {
    pub fn new(initial_window_size: u32, window_update_threshold: u32, frame_writer: F) -> Self {
        // Credit can never build up past the window, so a larger threshold would hold it back for good.
        if window_update_threshold > initial_window_size {
            debug!("Window update threshold {} is larger than the receive window, using {}", window_update_threshold, initial_window_size);
        }
        let window_update_threshold = cmp::min(window_update_threshold, initial_window_size);

        IncomingConnectionWindow {
            window_size: initial_window_size,
            unannounced_credit: 0,
            window_update_threshold: window_update_threshold,
            frame_writer: frame_writer
        }
    }

    pub fn get_window_size(&self) -> u32 {
        self.window_size
    }

    pub fn get_unannounced_credit(&self) -> u32 {
        self.unannounced_credit
    }
}

impl<F: FrameWriter> InboundWindow for IncomingConnectionWindow<F> {
    fn got_data(&mut self, size: u32) -> Result<(), error::HttpError> {
        // Check if the sender was allowed to send a payload this size.
        if size > self.window_size {
            return Err(error::HttpError::ConnectionError(
                error::ErrorCode::FlowControlError,
                error::ErrorName::ConnectionFlowControlWindowNotRespected
            ));
        }

        self.window_size -= size;
        Ok(())
    }

    fn data_processed(&mut self, size: u32) {
        self.unannounced_credit += size;

        if let Some(update_amount) = get_window_update_amount(self.unannounced_credit, self.window_update_threshold) {
            self.window_size += update_amount;
            self.unannounced_credit = 0;

            self.frame_writer.write_window_update_frame(CONNECTION_CONTROL_STREAM_ID, update_amount);
        }
    }
}

// Credit is handed back in one go once enough of it has built up, which keeps the number of
// WINDOW_UPDATE frames down when many small messages are being consumed.
pub fn get_window_update_amount(unannounced_credit: u32, window_update_threshold: u32) -> Option<u32> {
    if unannounced_credit > 0 && unannounced_credit >= window_update_threshold {
        Some(unannounced_credit)
    }
    else {
        None
    }
}
