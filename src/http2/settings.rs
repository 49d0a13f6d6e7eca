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

pub const INITIAL_FLOW_CONTROL_WINDOW_SIZE: u32 = 0xFFFF;
pub const MAXIMUM_FLOW_CONTROL_WINDOW_SIZE: u32 = 0x7FFFFFFF;

const DEFAULT_WRITE_BUFFER_HIGH_WATER: usize = 64 * 1024;
const DEFAULT_WRITE_BUFFER_LOW_WATER: usize = 16 * 1024;
const DEFAULT_MESSAGES_PER_TURN: usize = 8;
const DEFAULT_SIGNALS_PER_TURN: usize = 32;

/// Tuning for the flow controlled parts of a connection.
///
/// None of these are negotiated with the peer. The window sizes are the
/// starting point for the connection windows and must agree with whatever
/// was exchanged during connection setup.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    initial_send_window: u32,
    initial_receive_window: u32,
    write_buffer_high_water: usize,
    write_buffer_low_water: usize,
    stream_buffer_limit: usize,
    messages_per_turn: usize,
    signals_per_turn: usize,
    window_update_threshold: u32
}

impl FlowSettings {
    pub fn get_initial_send_window(&self) -> u32 {
        self.initial_send_window
    }

    pub fn set_initial_send_window(mut self, initial_send_window: u32) -> Self {
        self.initial_send_window = initial_send_window;
        self
    }

    pub fn get_initial_receive_window(&self) -> u32 {
        self.initial_receive_window
    }

    pub fn set_initial_receive_window(mut self, initial_receive_window: u32) -> Self {
        self.initial_receive_window = initial_receive_window;
        self
    }

    pub fn get_write_buffer_high_water(&self) -> usize {
        self.write_buffer_high_water
    }

    pub fn get_write_buffer_low_water(&self) -> usize {
        self.write_buffer_low_water
    }

    /// The writer reports backpressure once `high_water` bytes are buffered, and
    /// signals that it has drained when the buffer falls back to `low_water`.
    pub fn set_write_buffer_water_marks(mut self, low_water: usize, high_water: usize) -> Self {
        assert!(low_water <= high_water, "write buffer low water mark must not exceed the high water mark");
        self.write_buffer_low_water = low_water;
        self.write_buffer_high_water = high_water;
        self
    }

    pub fn get_stream_buffer_limit(&self) -> usize {
        self.stream_buffer_limit
    }

    pub fn set_stream_buffer_limit(mut self, stream_buffer_limit: usize) -> Self {
        self.stream_buffer_limit = stream_buffer_limit;
        self
    }

    pub fn get_messages_per_turn(&self) -> usize {
        self.messages_per_turn
    }

    pub fn set_messages_per_turn(mut self, messages_per_turn: usize) -> Self {
        // A pass that can't send anything would never make progress.
        self.messages_per_turn = if messages_per_turn == 0 { 1 } else { messages_per_turn };
        self
    }

    pub fn get_signals_per_turn(&self) -> usize {
        self.signals_per_turn
    }

    pub fn set_signals_per_turn(mut self, signals_per_turn: usize) -> Self {
        self.signals_per_turn = if signals_per_turn == 0 { 1 } else { signals_per_turn };
        self
    }

    pub fn get_window_update_threshold(&self) -> u32 {
        self.window_update_threshold
    }

    pub fn set_window_update_threshold(mut self, window_update_threshold: u32) -> Self {
        self.window_update_threshold = window_update_threshold;
        self
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        FlowSettings {
            initial_send_window: INITIAL_FLOW_CONTROL_WINDOW_SIZE,
            initial_receive_window: INITIAL_FLOW_CONTROL_WINDOW_SIZE,
            write_buffer_high_water: DEFAULT_WRITE_BUFFER_HIGH_WATER,
            write_buffer_low_water: DEFAULT_WRITE_BUFFER_LOW_WATER,
            stream_buffer_limit: INITIAL_FLOW_CONTROL_WINDOW_SIZE as usize,
            messages_per_turn: DEFAULT_MESSAGES_PER_TURN,
            signals_per_turn: DEFAULT_SIGNALS_PER_TURN,
            window_update_threshold: 0
        }
    }
}
