//! Recording doubles for the bus, pins, PWM and delay.
//!
//! All doubles created from one [`MockBus`] append to the same event log so
//! tests can check the ordering between pin changes, bus writes and delays.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use fugit::HertzU32;

use crate::bus::{ParallelBus, SystemClock};
use crate::framebuffer::{BackBuffer, Framebuffer};
use crate::BACK_BUFFER_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinEvent {
    Low(&'static str),
    High(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Pin(PinEvent),
    Write(Vec<u8>),
    Divisor(u16),
    FrameStarted,
    FrameFinished,
    Duty(u16),
    DelayMs(u32),
}

#[derive(Default)]
struct State {
    events: Vec<BusEvent>,
    in_flight: Option<&'static mut BackBuffer>,
    finished: Vec<Vec<u16>>,
    failing: Vec<&'static str>,
    last_divisor: Option<u16>,
    lose_frames: bool,
}

#[derive(Clone, Default)]
pub struct MockBus {
    state: Rc<RefCell<State>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: BusEvent) {
        self.state.borrow_mut().events.push(event);
    }

    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    /// Opcodes and their payloads, reassembled from the data/command line.
    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        let mut commands: Vec<(u8, Vec<u8>)> = Vec::new();
        let mut data_mode = true;
        for event in self.events() {
            match event {
                BusEvent::Pin(PinEvent::Low("dc")) => data_mode = false,
                BusEvent::Pin(PinEvent::High("dc")) => data_mode = true,
                BusEvent::Write(bytes) if !data_mode => {
                    commands.extend(bytes.iter().map(|&op| (op, Vec::new())));
                }
                BusEvent::Write(bytes) => {
                    if let Some((_, payload)) = commands.last_mut() {
                        payload.extend(bytes);
                    }
                }
                _ => {}
            }
        }
        commands
    }

    pub fn delays(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::DelayMs(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    pub fn duties(&self) -> Vec<u16> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Duty(duty) => Some(duty),
                _ => None,
            })
            .collect()
    }

    pub fn last_divisor(&self) -> Option<u16> {
        self.state.borrow().last_divisor
    }

    /// Copy of the frame currently owned by the bus.
    pub fn streamed_frame(&self) -> Vec<u16> {
        let state = self.state.borrow();
        match state.in_flight.as_deref() {
            Some(frame) => frame.to_vec(),
            None => panic!("no frame in flight"),
        }
    }

    /// Snapshots of every frame that completed, in order.
    pub fn finished_frames(&self) -> Vec<Vec<u16>> {
        self.state.borrow().finished.clone()
    }

    pub fn fail_pin(&self, name: &'static str) {
        self.state.borrow_mut().failing.push(name);
    }

    /// Makes `wait_frame` drop the in-flight frame instead of returning it.
    pub fn lose_frames(&self) {
        self.state.borrow_mut().lose_frames = true;
    }

    fn is_failing(&self, name: &'static str) -> bool {
        self.state.borrow().failing.contains(&name)
    }
}

impl ParallelBus for MockBus {
    fn write_blocking(&mut self, bytes: &[u8]) {
        assert!(
            self.state.borrow().in_flight.is_none(),
            "bytes written while a frame is streaming"
        );
        self.push(BusEvent::Write(bytes.to_vec()));
    }

    fn set_clock_divisor(&mut self, divisor: u16) {
        self.state.borrow_mut().last_divisor = Some(divisor);
        self.push(BusEvent::Divisor(divisor));
    }

    fn start_frame(&mut self, frame: &'static mut BackBuffer) {
        let mut state = self.state.borrow_mut();
        assert!(state.in_flight.is_none(), "frame started while another is streaming");
        state.in_flight = Some(frame);
        state.events.push(BusEvent::FrameStarted);
    }

    fn wait_frame(&mut self) -> Option<&'static mut BackBuffer> {
        let mut state = self.state.borrow_mut();
        let frame = state.in_flight.take()?;
        if state.lose_frames {
            return None;
        }
        state.finished.push(frame.to_vec());
        state.events.push(BusEvent::FrameFinished);
        Some(frame)
    }
}

pub struct MockPin {
    bus: MockBus,
    name: &'static str,
}

impl MockPin {
    pub fn new(bus: &MockBus, name: &'static str) -> Self {
        Self {
            bus: bus.clone(),
            name,
        }
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.bus.is_failing(self.name) {
            return Err(digital::ErrorKind::Other);
        }
        self.bus.push(BusEvent::Pin(PinEvent::Low(self.name)));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.bus.is_failing(self.name) {
            return Err(digital::ErrorKind::Other);
        }
        self.bus.push(BusEvent::Pin(PinEvent::High(self.name)));
        Ok(())
    }
}

pub struct MockPwm {
    bus: MockBus,
}

impl MockPwm {
    pub fn new(bus: &MockBus) -> Self {
        Self { bus: bus.clone() }
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.bus.is_failing("backlight") {
            return Err(pwm::ErrorKind::Other);
        }
        self.bus.push(BusEvent::Duty(duty));
        Ok(())
    }
}

pub struct MockDelay {
    bus: MockBus,
}

impl MockDelay {
    pub fn new(bus: &MockBus) -> Self {
        Self { bus: bus.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.push(BusEvent::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.bus.push(BusEvent::DelayMs(ms));
    }
}

/// A system clock the test can retune between frames.
#[derive(Clone)]
pub struct MockClock {
    hz: Rc<Cell<HertzU32>>,
}

impl MockClock {
    pub fn new(hz: HertzU32) -> Self {
        Self {
            hz: Rc::new(Cell::new(hz)),
        }
    }

    pub fn set(&self, hz: HertzU32) {
        self.hz.set(hz);
    }
}

impl SystemClock for MockClock {
    fn system_clock(&self) -> HertzU32 {
        self.hz.get()
    }
}

pub fn leak_back_buffer() -> &'static mut BackBuffer {
    let frame: Box<BackBuffer> = vec![0u16; BACK_BUFFER_LEN]
        .into_boxed_slice()
        .try_into()
        .unwrap();
    Box::leak(frame)
}

pub fn leak_framebuffer() -> &'static mut Framebuffer {
    Box::leak(Box::new(Framebuffer::new()))
}
