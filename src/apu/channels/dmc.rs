//! Delta modulation channel
//!
//! Plays 1-bit delta-encoded samples fetched from cartridge space. The
//! channel itself is pure state; the APU performs the actual memory reads
//! through the mapper and hands bytes in via `load_sample`.

use crate::apu::constants::DMC_RATE_TABLE;
use serde::{Deserialize, Serialize};

/// DMC: sample reader + 8-bit shift register + 7-bit output level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmcChannel {
    /// Loop flag ($4010 bit 6)
    loop_flag: bool,
    /// Timer period from the rate table, counted in CPU cycles
    timer_period: u16,
    timer_counter: u16,

    /// Programmed sample start ($4012: $C000 + value * 64)
    sample_address: u16,
    /// Programmed sample length ($4013: value * 16 + 1)
    sample_length: u16,

    /// Read cursor into cartridge space
    current_address: u16,
    /// Bytes left in the current playback
    bytes_remaining: u16,
    /// Fetched byte waiting to enter the shift register
    sample_buffer: Option<u8>,

    /// Output unit
    shift_register: u8,
    bits_remaining: u8,
    silence: bool,
    /// 7-bit output level, stepped by +/-2 per sample bit
    output_level: u8,
}

impl DmcChannel {
    pub fn new() -> Self {
        Self {
            loop_flag: false,
            timer_period: DMC_RATE_TABLE[0],
            timer_counter: 0,
            sample_address: 0xC000,
            sample_length: 1,
            current_address: 0xC000,
            bytes_remaining: 0,
            sample_buffer: None,
            shift_register: 0,
            bits_remaining: 8,
            silence: true,
            output_level: 0,
        }
    }

    /// $4010: loop flag and rate select
    pub fn write_control(&mut self, data: u8) {
        self.loop_flag = data & 0x40 != 0;
        self.timer_period = DMC_RATE_TABLE[(data & 0x0F) as usize];
    }

    /// $4011: direct 7-bit load of the output level
    pub fn write_direct_load(&mut self, data: u8) {
        self.output_level = data & 0x7F;
    }

    /// $4012: sample start address
    pub fn write_sample_address(&mut self, data: u8) {
        self.sample_address = 0xC000 + data as u16 * 64;
    }

    /// $4013: sample length
    pub fn write_sample_length(&mut self, data: u8) {
        self.sample_length = data as u16 * 16 + 1;
    }

    /// $4015 enable bit
    ///
    /// Enabling restarts playback only when the previous sample finished;
    /// disabling drops the remaining bytes.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart_sample();
        }
    }

    fn restart_sample(&mut self) {
        self.current_address = self.sample_address;
        self.bytes_remaining = self.sample_length;
    }

    /// Whether the reader wants a byte from memory
    pub fn wants_sample(&self) -> bool {
        self.sample_buffer.is_none() && self.bytes_remaining > 0
    }

    /// Address the next fetch should read
    pub fn fetch_address(&self) -> u16 {
        self.current_address
    }

    /// Deliver a fetched byte and advance the reader
    ///
    /// The address wraps from $FFFF back to $8000; exhausting the sample
    /// restarts it when looping.
    pub fn load_sample(&mut self, byte: u8) {
        self.sample_buffer = Some(byte);
        self.current_address = if self.current_address == 0xFFFF {
            0x8000
        } else {
            self.current_address + 1
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 && self.loop_flag {
            self.restart_sample();
        }
    }

    /// Timer clock (every CPU cycle)
    pub fn clock_timer(&mut self) {
        if self.timer_counter > 0 {
            self.timer_counter -= 1;
            return;
        }
        self.timer_counter = self.timer_period.saturating_sub(1);
        self.clock_output_unit();
    }

    /// One output-unit step: slew the level by the current sample bit,
    /// then refill the shift register every eight bits
    fn clock_output_unit(&mut self) {
        if !self.silence {
            if self.shift_register & 1 != 0 {
                if self.output_level <= 125 {
                    self.output_level += 2;
                }
            } else if self.output_level >= 2 {
                self.output_level -= 2;
            }
        }
        self.shift_register >>= 1;
        self.bits_remaining -= 1;

        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.sample_buffer.take() {
                Some(byte) => {
                    self.shift_register = byte;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
    }

    /// Whether playback is still consuming bytes ($4015 status bit)
    pub fn is_active(&self) -> bool {
        self.bytes_remaining > 0
    }

    /// Current 7-bit output level
    pub fn output(&self) -> u8 {
        self.output_level
    }
}

impl Default for DmcChannel {
    fn default() -> Self {
        Self::new()
    }
}
