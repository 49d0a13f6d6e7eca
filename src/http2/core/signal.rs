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
use std::fmt;

// futures
use futures::unsync::mpsc as futures_mpsc;

// osmium
use http2::stream::StreamId;

// Signals are handled on a later turn of the connection driver, never from inside the call
// that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    PeerWindowOpened,
    WriteBufferDrained,
    StreamReady(StreamId),
    ContinueSending
}

pub type SignalReceiver = futures_mpsc::UnboundedReceiver<Signal>;

#[derive(Clone)]
pub struct SignalSender {
    signal_tx: futures_mpsc::UnboundedSender<Signal>
}

impl SignalSender {
    pub fn notify(&self, signal: Signal) {
        match self.signal_tx.unbounded_send(signal) {
            Ok(_) => {
                trace!("Queued signal {:?}", signal);
            },
            Err(e) => {
                debug!("Signal {:?} dropped, the connection driver has gone away", e.into_inner());
            }
        }
    }
}

impl fmt::Debug for SignalSender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SignalSender")
    }
}

pub fn channel() -> (SignalSender, SignalReceiver) {
    let (signal_tx, signal_rx) = futures_mpsc::unbounded();

    (SignalSender { signal_tx: signal_tx }, signal_rx)
}
