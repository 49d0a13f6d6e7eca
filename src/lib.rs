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

//! Connection-level flow control and message multiplexing for HTTP/2.
//!
//! Application messages go out through `http2::core::outbound::OutboundQueue`, which
//! respects the peer's connection window and the transport's write backpressure.
//! Incoming frames come in through `http2::core::inbound::InboundDemultiplexer`, which
//! buffers per stream and only returns window credit once a message has been handed
//! to its stream consumer. `http2::core::Connection` ties the two together.

extern crate bytes;
extern crate futures;
#[macro_use] extern crate log;

#[cfg(test)]
extern crate pretty_env_logger;

pub mod http2;
