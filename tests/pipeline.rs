use std::cell::RefCell;
use std::rc::Rc;

use embedded_graphics_core::pixelcolor::Rgb888;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use fugit::{HertzU32, RateExtU32};
use st7789_pio::{
    BackBuffer, Command, Config, Framebuffer, ParallelBus, St7789, BACK_BUFFER_LEN,
    FRAMEBUFFER_BYTES, HEIGHT, WIDTH,
};

/// Wire-level model of the panel side of the bus.
#[derive(Default)]
struct Wire {
    cs_low: bool,
    dc_high: bool,
    streaming: Option<&'static mut BackBuffer>,
    /// Opcodes in the order they reached the panel.
    opcodes: Vec<u8>,
    /// Number of bytes written while chip-select was released.
    stray_bytes: usize,
    frames: usize,
    duty: u16,
    slept_ms: u32,
}

#[derive(Clone, Default)]
struct Bus(Rc<RefCell<Wire>>);

impl ParallelBus for Bus {
    fn write_blocking(&mut self, bytes: &[u8]) {
        let mut wire = self.0.borrow_mut();
        assert!(wire.streaming.is_none(), "command overlaps a frame");
        if !wire.cs_low {
            wire.stray_bytes += bytes.len();
        }
        if !wire.dc_high {
            wire.opcodes.extend_from_slice(bytes);
        }
    }

    fn set_clock_divisor(&mut self, divisor: u16) {
        assert!(divisor >= 1);
    }

    fn start_frame(&mut self, frame: &'static mut BackBuffer) {
        let mut wire = self.0.borrow_mut();
        assert!(wire.cs_low && wire.dc_high, "pixels must follow RAMWR");
        assert!(wire.streaming.is_none());
        wire.streaming = Some(frame);
        wire.frames += 1;
    }

    fn wait_frame(&mut self) -> Option<&'static mut BackBuffer> {
        self.0.borrow_mut().streaming.take()
    }
}

struct Cs(Bus);
struct Dc(Bus);
struct Backlight(Bus);
struct Delay(Bus);

impl digital::ErrorType for Cs {
    type Error = core::convert::Infallible;
}

impl OutputPin for Cs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().cs_low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().cs_low = false;
        Ok(())
    }
}

impl digital::ErrorType for Dc {
    type Error = core::convert::Infallible;
}

impl OutputPin for Dc {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().dc_high = true;
        Ok(())
    }
}

impl pwm::ErrorType for Backlight {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for Backlight {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().duty = duty;
        Ok(())
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        (self.0).0.borrow_mut().slept_ms += ns / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        (self.0).0.borrow_mut().slept_ms += ms;
    }
}

type Display = St7789<Bus, Cs, Dc, Backlight, Delay, HertzU32>;

fn construct(bus: &Bus, config: Config) -> Display {
    let framebuffer: &'static mut Framebuffer = Box::leak(Box::new(Framebuffer::new()));
    let back_buffer: Box<BackBuffer> = vec![0u16; BACK_BUFFER_LEN]
        .into_boxed_slice()
        .try_into()
        .unwrap();
    St7789::new(
        config,
        bus.clone(),
        Cs(bus.clone()),
        Dc(bus.clone()),
        Backlight(bus.clone()),
        Delay(bus.clone()),
        125.MHz(),
        framebuffer,
        Box::leak(back_buffer),
    )
    .unwrap()
}

#[test]
fn solid_red_reaches_the_back_buffer_doubled() {
    let bus = Bus::default();
    let mut display = construct(&bus, Config::default());

    display.set_backlight(1.0).unwrap();
    display.update().unwrap();
    display.framebuffer().fill(Rgb888::new(255, 0, 0));
    display.update().unwrap();
    display.wait_idle().unwrap();

    let back_buffer = display.back_buffer().unwrap();
    assert_eq!(back_buffer.len(), WIDTH * HEIGHT * 2);
    assert!(back_buffer.iter().all(|&p| p == 0xF800));
    assert_eq!(display.clock_divisor(), 3);
    assert_eq!(bus.0.borrow().frames, 3);
}

#[test]
fn bytes_only_reach_the_panel_under_chip_select() {
    let bus = Bus::default();
    let mut display = construct(&bus, Config::default());
    display.set_backlight(0.0).unwrap();
    display.set_backlight(0.25).unwrap();
    display.set_display_enabled(false).unwrap();
    display.update().unwrap();
    display.release().unwrap();

    let wire = bus.0.borrow();
    assert_eq!(wire.stray_bytes, 0);
    assert!(!wire.cs_low, "chip-select left asserted after release");
}

#[test]
fn init_ends_awake_and_lit() {
    let bus = Bus::default();
    let display = construct(&bus, Config::default());

    let wire = bus.0.borrow();
    assert_eq!(wire.opcodes.first(), Some(&Command::SWRESET.opcode()));
    assert_eq!(wire.opcodes.last(), Some(&Command::RAMWR.opcode()));
    assert_eq!(wire.duty, u16::MAX);
    assert_eq!(wire.slept_ms, 250);
    assert!(!display.is_sleeping());
    assert!(display.is_display_on());
}

#[test]
fn sleep_round_trip_through_the_facade() {
    let bus = Bus::default();
    let mut display = construct(&bus, Config::default());
    let before = bus.0.borrow().opcodes.len();

    display.set_backlight(0.0).unwrap();
    assert!(display.is_sleeping());
    assert_eq!(bus.0.borrow().duty, 0);

    display.set_backlight(1.0).unwrap();
    assert!(!display.is_sleeping());
    assert_eq!(bus.0.borrow().duty, u16::MAX);

    display.set_backlight(1.0).unwrap();
    let wire = bus.0.borrow();
    assert_eq!(
        &wire.opcodes[before..],
        &[Command::SLPOUT.opcode(), Command::SLPOUT.opcode()]
    );
}

#[test]
fn framebuffer_view_has_the_advertised_size() {
    let bus = Bus::default();
    let mut display = construct(&bus, Config::default());

    assert_eq!(display.framebuffer_bytes().len(), FRAMEBUFFER_BYTES);
    assert_eq!(FRAMEBUFFER_BYTES, 76_800);
}
