#![no_std]
#![no_main]

mod clocks;

use embedded_graphics_core::pixelcolor::Rgb888;
use embedded_hal::digital::OutputPin;
use hal::fugit::RateExtU32;
use panic_probe as _;
use rp235x_hal as hal;
use rp235x_hal::uart::{DataBits, StopBits, UartConfig};
use rp235x_hal::Clock;
use st7789_pio::hardware::PioParallelBus;
use st7789_pio::{
    clock_divisor, BackBuffer, Config, Framebuffer, SleepEntry, St7789, BACK_BUFFER_LEN, HEIGHT,
    WIDTH,
};
use static_cell::{ConstStaticCell, StaticCell};

use hal::dma::DMAExt;
use hal::pio::PIOExt;

/// Tell the Boot ROM about our application
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

static SERIAL: StaticCell<
    rp235x_hal::uart::UartPeripheral<
        rp235x_hal::uart::Enabled,
        rp235x_hal::pac::UART0,
        (
            rp235x_hal::gpio::Pin<
                rp235x_hal::gpio::bank0::Gpio0,
                rp235x_hal::gpio::FunctionUart,
                rp235x_hal::gpio::PullDown,
            >,
            rp235x_hal::gpio::Pin<
                rp235x_hal::gpio::bank0::Gpio1,
                rp235x_hal::gpio::FunctionUart,
                rp235x_hal::gpio::PullDown,
            >,
        ),
    >,
> = StaticCell::new();

static FRAMEBUFFER: ConstStaticCell<Framebuffer> = ConstStaticCell::new(Framebuffer::new());
static BACK_BUFFER: ConstStaticCell<BackBuffer> = ConstStaticCell::new([0u16; BACK_BUFFER_LEN]);

#[const_env::from_env]
const STARTUP_BRIGHTNESS: u8 = 255;
#[const_env::from_env]
const SLEEP_WITH_SLPIN: bool = false;
#[const_env::from_env]
const OVERCLOCK: bool = false;

// Board wiring: chip-select and data/command on plain GPIO, write strobe and
// the eight data lines on PIO0.
const PIN_WR: u8 = 12;
const PIN_DATA_BASE: u8 = 14;

#[hal::entry]
fn main() -> ! {
    let mut pac = hal::pac::Peripherals::take().unwrap();

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    let clocks = if OVERCLOCK {
        clocks::configure_overclock(
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
    } else {
        clocks::configure_normal(
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
    }
    .ok()
    .unwrap();

    let timer = hal::Timer::new_timer0(pac.TIMER0, &mut pac.RESETS, &clocks);

    ///////////////////UART!
    let uart0_pins = (pins.gpio0.into_function(), pins.gpio1.into_function());
    let uart0 = hal::uart::UartPeripheral::new(pac.UART0, uart0_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(115200.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();
    defmt_serial::defmt_serial(SERIAL.init(uart0));

    defmt::info!(
        "Console Start, system clock {} MHz",
        clocks.system_clock.freq().to_MHz()
    );

    let config = Config::new()
        .with_startup_brightness(STARTUP_BRIGHTNESS)
        .with_sleep_entry(if SLEEP_WITH_SLPIN {
            SleepEntry::SleepIn
        } else {
            SleepEntry::LeaveSleep
        });

    //SCREEN
    let cs = pins.gpio10.into_push_pull_output();
    let dc = pins.gpio11.into_push_pull_output();
    // Read strobe is never used, keep it inactive.
    let mut rd = pins.gpio13.into_push_pull_output();
    rd.set_high().unwrap();

    let _ = pins.gpio12.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio14.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio15.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio16.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio17.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio18.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio19.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio20.into_function::<hal::gpio::FunctionPio0>();
    let _ = pins.gpio21.into_function::<hal::gpio::FunctionPio0>();

    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut pwm = pwm_slices.pwm1;
    pwm.set_top(u16::MAX - 1);
    pwm.enable();
    let mut backlight = pwm.channel_a;
    backlight.output_to(pins.gpio2);

    let (mut pio_0, sm0_0, sm0_1, _, _) = pac.PIO0.split(&mut pac.RESETS);
    let dma = pac.DMA.split(&mut pac.RESETS);

    let command_scratch: &'static mut [u8] = cortex_m::singleton!(: [u8; 64] = [0u8; 64])
        .unwrap()
        .as_mut_slice();

    let bus = PioParallelBus::new(
        clock_divisor(clocks.system_clock.freq(), config.max_bus_clock),
        &mut pio_0,
        sm0_0,
        sm0_1,
        dma.ch0,
        dma.ch1,
        command_scratch,
        PIN_DATA_BASE,
        PIN_WR,
    );

    let mut display = St7789::new(
        config,
        bus,
        cs,
        dc,
        backlight,
        timer,
        clocks.system_clock,
        FRAMEBUFFER.take(),
        BACK_BUFFER.take(),
    )
    .unwrap();

    defmt::info!("Display ready, bus divisor {}", display.clock_divisor());

    let mut frame: u32 = 0;
    loop {
        let start_time = timer.get_counter();

        draw_bars(display.framebuffer(), frame);
        display.update().unwrap();

        // After a warm-up, fade the backlight to dark and back every 512 frames.
        let phase = (frame / 4) % 128;
        if frame % 4 == 0 && frame >= 512 {
            let level = if phase < 64 { 63 - phase } else { phase - 64 };
            display.set_brightness((level * 4) as u8).unwrap();
        }

        let end_time = timer.get_counter();
        if frame % 120 == 0 {
            let diff = end_time - start_time;
            defmt::info!(
                "Frame: {}, prepared in {} us, brightness {}",
                frame,
                diff.to_micros(),
                display.brightness()
            );
        }
        frame = frame.wrapping_add(1);
    }
}

/// Eight vertical colour bars scrolling one pixel per frame.
fn draw_bars(framebuffer: &mut Framebuffer, frame: u32) {
    const BARS: [Rgb888; 8] = [
        Rgb888::new(255, 255, 255),
        Rgb888::new(255, 255, 0),
        Rgb888::new(0, 255, 255),
        Rgb888::new(0, 255, 0),
        Rgb888::new(255, 0, 255),
        Rgb888::new(255, 0, 0),
        Rgb888::new(0, 0, 255),
        Rgb888::new(0, 0, 0),
    ];
    let shift = frame as usize % WIDTH;
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let bar = ((x + shift) % WIDTH) * BARS.len() / WIDTH;
            framebuffer.set(x, y, BARS[bar]);
        }
    }
}

/// Program metadata for `picotool info`
#[link_section = ".bi_entries"]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"ST7789 parallel display pipeline"),
    hal::binary_info::rp_program_build_attribute!(),
];
