use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::backlight::{gamma_duty, SleepTransition, SLEEP_ENTRY_DELAY_MS, SLEEP_EXIT_DELAY_MS};
use crate::bus::{ParallelBus, SystemClock};
use crate::command::Command;
use crate::config::Config;
use crate::framebuffer::{BackBuffer, Framebuffer};
use crate::sequence::{self, Step, DISPLAY_ON_DELAY_MS};
use crate::transfer::Transfer;
use crate::Error;

type Result = core::result::Result<(), Error>;

/// Everything handed back by [`St7789::release`].
pub struct Parts<BUS, CS, DC, BL, DELAY, CLK> {
    pub bus: BUS,
    pub cs: CS,
    pub dc: DC,
    pub backlight: BL,
    pub delay: DELAY,
    pub clock: CLK,
    pub framebuffer: &'static mut Framebuffer,
    pub back_buffer: &'static mut BackBuffer,
}

/// A 320x240 ST7789 on an 8-bit parallel bus, fed from a 160x120 framebuffer.
pub struct St7789<BUS, CS, DC, BL, DELAY, CLK> {
    transfer: Transfer<BUS, CS, DC, CLK>,
    backlight: BL,
    delay: DELAY,
    framebuffer: &'static mut Framebuffer,
    config: Config,
    display_on: bool,
    display_sleep: bool,
    brightness: u8,
}

impl<BUS, CS, DC, BL, DELAY, CLK> St7789<BUS, CS, DC, BL, DELAY, CLK>
where
    BUS: ParallelBus,
    CS: OutputPin,
    DC: OutputPin,
    BL: SetDutyCycle,
    DELAY: DelayNs,
    CLK: SystemClock,
{
    /// Resets and configures the panel, pushes the current framebuffer and
    /// turns the backlight on.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        bus: BUS,
        cs: CS,
        dc: DC,
        backlight: BL,
        delay: DELAY,
        clock: CLK,
        framebuffer: &'static mut Framebuffer,
        back_buffer: &'static mut BackBuffer,
    ) -> core::result::Result<Self, Error> {
        let transfer = Transfer::new(bus, cs, dc, clock, config.max_bus_clock, back_buffer)?;
        let mut display = Self {
            transfer,
            backlight,
            delay,
            framebuffer,
            config,
            display_on: false,
            display_sleep: false,
            brightness: 0,
        };
        display.init()?;
        Ok(display)
    }

    fn init(&mut self) -> Result {
        info!("st7789: init");

        // Keep the panel dark until the first frame is on it.
        self.apply_duty(0)?;

        for step in sequence::INIT {
            match *step {
                Step::Command(command, data) => self.transfer.command(command, data)?,
                Step::Delay(ms) => self.delay.delay_ms(ms),
            }
        }
        self.display_on = true;

        self.update()?;
        self.set_brightness(self.config.startup_brightness)?;

        info!("st7789: ready");
        Ok(())
    }

    /// Sends the framebuffer to the panel. Returns once the transfer is
    /// running; the next call waits for it to complete.
    pub fn update(&mut self) -> Result {
        if !self.display_on {
            self.transfer.command(Command::DISPON, &[])?;
            self.delay.delay_ms(DISPLAY_ON_DELAY_MS);
            self.display_on = true;
            debug!("st7789: display on");
        }
        self.transfer.start_frame(&*self.framebuffer)
    }

    /// Backlight level from `0.0` to `1.0`. Values outside that range saturate.
    pub fn set_backlight(&mut self, brightness: f32) -> Result {
        self.set_brightness((brightness * 255.0) as u8)
    }

    /// Linear backlight level. Zero puts the panel to sleep, any other level
    /// wakes it first.
    pub fn set_brightness(&mut self, brightness: u8) -> Result {
        match SleepTransition::for_request(brightness, self.display_sleep) {
            SleepTransition::Enter => {
                self.apply_duty(0)?;
                self.brightness = 0;
                self.transfer
                    .command(self.config.sleep_entry.command(), &[])?;
                self.delay.delay_ms(SLEEP_ENTRY_DELAY_MS);
                self.display_sleep = true;
                debug!("st7789: sleeping");
            }
            SleepTransition::Exit => {
                self.transfer.command(Command::SLPOUT, &[])?;
                self.delay.delay_ms(SLEEP_EXIT_DELAY_MS);
                self.display_sleep = false;
                debug!("st7789: awake");
                self.apply_duty(gamma_duty(brightness))?;
            }
            SleepTransition::None => self.apply_duty(gamma_duty(brightness))?,
        }
        self.brightness = brightness;
        Ok(())
    }

    /// Blanks or restores the panel output. A blanked panel is switched back
    /// on by the next [`update`](Self::update).
    pub fn set_display_enabled(&mut self, enabled: bool) -> Result {
        if enabled == self.display_on {
            return Ok(());
        }
        if enabled {
            self.transfer.command(Command::DISPON, &[])?;
            self.delay.delay_ms(DISPLAY_ON_DELAY_MS);
        } else {
            self.transfer.command(Command::DISPOFF, &[])?;
        }
        self.display_on = enabled;
        debug!("st7789: display enabled {}", enabled);
        Ok(())
    }

    /// Blocks until the last frame has been streamed.
    pub fn wait_idle(&mut self) -> Result {
        self.transfer.wait_idle()
    }

    pub fn framebuffer(&mut self) -> &mut Framebuffer {
        &mut *self.framebuffer
    }

    /// Raw `R, G, B, pad` bytes of the framebuffer.
    pub fn framebuffer_bytes(&mut self) -> &mut [u8] {
        self.framebuffer.as_bytes_mut()
    }

    /// The last converted frame, `None` while DMA is still reading it.
    pub fn back_buffer(&self) -> Option<&BackBuffer> {
        self.transfer.back_buffer()
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    pub fn is_sleeping(&self) -> bool {
        self.display_sleep
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn clock_divisor(&self) -> u16 {
        self.transfer.divisor()
    }

    /// Waits for the bus and gives back every peripheral and buffer.
    pub fn release(self) -> core::result::Result<Parts<BUS, CS, DC, BL, DELAY, CLK>, Error> {
        let (bus, cs, dc, clock, back_buffer) = self.transfer.free()?;
        Ok(Parts {
            bus,
            cs,
            dc,
            backlight: self.backlight,
            delay: self.delay,
            clock,
            framebuffer: self.framebuffer,
            back_buffer,
        })
    }

    fn apply_duty(&mut self, duty: u16) -> Result {
        self.backlight
            .set_duty_cycle_fraction(duty, u16::MAX)
            .map_err(|_| Error::Backlight)
    }
}
