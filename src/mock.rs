//! Host-side stand-ins for the embedded-hal peripherals used in tests.
//!
//! [`Panel`] records every bus event and decodes CASET / RASET / RAMWR so
//! tests can look at the pixels a drawing call actually produced.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, Operation, SpiBus, SpiDevice};

use crate::ili9341::{Ili9341, Rotation};

pub type TestDisplay = Ili9341<MockSpi, MockPin, MockPin, MockPin>;

/// Initialized display on `panel`, with the bring-up traffic forgotten.
pub fn display(panel: &Panel, rotation: Rotation, w: i32, h: i32) -> TestDisplay {
    let mut delay = panel.delay();
    let d = Ili9341::new(panel.spi(), panel.cs(), panel.dc(), panel.rst(), &mut delay, rotation, w, h)
        .unwrap();
    panel.clear();
    d
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Select,
    Deselect,
    ResetLow,
    ResetHigh,
    Command(u8),
    Data(Vec<u8>),
    DelayMs(u32),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    transfer_sizes: Vec<usize>,
    dc_data: bool,
    fail_spi: bool,
    last_cmd: Option<u8>,
    params: Vec<u8>,
    col: (u16, u16),
    row: (u16, u16),
    cursor: (u16, u16),
    pending: Option<u8>,
    windows: Vec<(u16, u16, u16, u16)>,
    pixels: BTreeMap<(i32, i32), u16>,
    size: (u16, u16),
}

impl State {
    fn data(&mut self, bytes: &[u8]) {
        self.transfer_sizes.push(bytes.len());
        self.events.push(Event::Data(bytes.to_vec()));
        match self.last_cmd {
            Some(0x2A) | Some(0x2B) => {
                self.params.extend_from_slice(bytes);
                if self.params.len() >= 4 {
                    let p = &self.params;
                    let lo = u16::from_be_bytes([p[0], p[1]]);
                    let hi = u16::from_be_bytes([p[2], p[3]]);
                    if self.last_cmd == Some(0x2A) {
                        self.col = (lo, hi);
                    } else {
                        self.row = (lo, hi);
                    }
                }
            }
            Some(0x2C) => {
                for &b in bytes {
                    match self.pending.take() {
                        None => self.pending = Some(b),
                        Some(hi) => self.put_pixel(u16::from_be_bytes([hi, b])),
                    }
                }
            }
            _ => {}
        }
    }

    fn command(&mut self, cmd: u8) {
        self.events.push(Event::Command(cmd));
        self.last_cmd = Some(cmd);
        self.params.clear();
        self.pending = None;
        if cmd == 0x2C {
            self.cursor = (self.col.0, self.row.0);
            self.windows.push((self.col.0, self.row.0, self.col.1, self.row.1));
        }
    }

    fn put_pixel(&mut self, raw: u16) {
        let (x, y) = self.cursor;
        let (width, height) = self.size;
        assert!(x < width && y < height, "pixel ({}, {}) written outside the {}x{} panel", x, y, width, height);
        self.pixels.insert((x as i32, y as i32), raw);
        if x >= self.col.1 {
            self.cursor = (self.col.0, y + 1);
        } else {
            self.cursor = (x + 1, y);
        }
    }
}

/// Shared recording panel; hand out its parts with [`Panel::spi`] etc.
#[derive(Clone)]
pub struct Panel {
    state: Rc<RefCell<State>>,
}

impl Panel {
    /// Any window is accepted, but every pixel written must land inside
    /// `width x height`.
    pub fn new(width: u16, height: u16) -> Self {
        let state = State { size: (width, height), ..State::default() };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi { state: self.state.clone() }
    }

    pub fn cs(&self) -> MockPin {
        MockPin { state: self.state.clone(), role: Role::Cs }
    }

    pub fn dc(&self) -> MockPin {
        MockPin { state: self.state.clone(), role: Role::Dc }
    }

    pub fn rst(&self) -> MockPin {
        MockPin { state: self.state.clone(), role: Role::Rst }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { state: self.state.clone() }
    }

    pub fn fail_spi(&self, fail: bool) {
        self.state.borrow_mut().fail_spi = fail;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn transfer_sizes(&self) -> Vec<usize> {
        self.state.borrow().transfer_sizes.clone()
    }

    pub fn windows(&self) -> Vec<(u16, u16, u16, u16)> {
        self.state.borrow().windows.clone()
    }

    pub fn pixels(&self) -> BTreeMap<(i32, i32), u16> {
        self.state.borrow().pixels.clone()
    }

    pub fn painted(&self) -> BTreeSet<(i32, i32)> {
        self.state.borrow().pixels.keys().copied().collect()
    }

    pub fn commands(&self) -> Vec<u8> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.state.borrow().events.iter().filter(|e| *e == event).count()
    }

    /// Forget everything recorded so far (pixels included).
    pub fn clear(&self) {
        let mut s = self.state.borrow_mut();
        s.events.clear();
        s.transfer_sizes.clear();
        s.windows.clear();
        s.pixels.clear();
    }
}

pub struct MockSpi {
    state: Rc<RefCell<State>>,
}

impl spi::ErrorType for MockSpi {
    type Error = MockError;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        if s.fail_spi {
            return Err(MockError);
        }
        if s.dc_data {
            s.data(words);
        } else {
            for &w in words {
                s.command(w);
            }
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        read.fill(0);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)?;
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Role {
    Cs,
    Dc,
    Rst,
}

pub struct MockPin {
    state: Rc<RefCell<State>>,
    role: Role,
}

impl digital::ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        match self.role {
            Role::Cs => s.events.push(Event::Select),
            Role::Dc => s.dc_data = false,
            Role::Rst => s.events.push(Event::ResetLow),
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        match self.role {
            Role::Cs => s.events.push(Event::Deselect),
            Role::Dc => s.dc_data = true,
            Role::Rst => s.events.push(Event::ResetHigh),
        }
        Ok(())
    }
}

pub struct MockDelay {
    state: Rc<RefCell<State>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.state.borrow_mut().events.push(Event::DelayMs(ms));
    }
}

/// XPT2046 stand-in: answers every Y/X conversion with fixed raw values.
pub struct TouchSpi {
    pub raw_x: u16,
    pub raw_y: u16,
    pub transactions: usize,
    pub fail: bool,
}

impl TouchSpi {
    pub fn new(raw_x: u16, raw_y: u16) -> Self {
        Self { raw_x, raw_y, transactions: 0, fail: false }
    }
}

impl spi::ErrorType for TouchSpi {
    type Error = MockError;
}

impl SpiDevice<u8> for TouchSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.transactions += 1;
        let mut channel = 0u8;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(w) => channel = w[0],
                Operation::Transfer(read, _) => {
                    let v = if channel == 0xD0 { self.raw_x } else { self.raw_y };
                    read[..2].copy_from_slice(&v.to_be_bytes());
                }
                Operation::TransferInPlace(buf) | Operation::Read(buf) => {
                    let v = if channel == 0xD0 { self.raw_x } else { self.raw_y };
                    buf[..2].copy_from_slice(&v.to_be_bytes());
                }
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

/// Touch IRQ line: reads low ("pressed") for the first `presses` reads.
pub struct IrqPin {
    pub presses: usize,
}

impl digital::ErrorType for IrqPin {
    type Error = MockError;
}

impl InputPin for IrqPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_low()?)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        if self.presses == 0 {
            return Ok(false);
        }
        self.presses -= 1;
        Ok(true)
    }
}
