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

#[macro_export]
macro_rules! log_outbound_message {
    ( $msg:expr, $message:expr ) => {
        #[cfg(feature = "osmium_support")]
        {
            debug!("(outbound) {}: stream {}, [data {}] [end stream {}]", $msg, $message.get_stream_id(), $message.get_data_length(), $message.is_end_stream());
        }
    };
}

#[macro_export]
macro_rules! log_inbound_message {
    ( $msg:expr, $message:expr ) => {
        #[cfg(feature = "osmium_support")]
        {
            debug!("(inbound) {}: stream {}, [data {}] [end stream {}]", $msg, $message.get_stream_id(), $message.get_data_length(), $message.is_end_stream());
        }
    };
}

#[macro_export]
macro_rules! log_write_frame {
    ( $msg:expr, $frame:expr ) => {
        #[cfg(feature = "osmium_support")]
        {
            if $frame.get_length() < 100 {
                trace!("(writer) {}: {:?}", $msg, $frame);
            }
            else {
                trace!("(writer) {}: stream {}, [length {}] (payload too long to print)", $msg, $frame.get_stream_id(), $frame.get_length());
            }
        }
    };
}
