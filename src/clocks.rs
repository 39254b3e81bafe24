use rp235x_hal as hal;

use fugit::{HertzU32, RateExtU32};
use hal::clocks::{ClocksManager, InitError};
use hal::{pac, Watchdog};

/// External high-speed crystal on the Raspberry Pi Pico 2 board is 12 MHz.
pub const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;

/// 1200 MHz VCO / 6 = 200 MHz system clock.
pub const PLL_SYS_200MHZ: hal::pll::PLLConfig = hal::pll::PLLConfig {
    vco_freq: HertzU32::Hz(1_200_000_000),
    refdiv: 1,
    post_div1: 6,
    post_div2: 1,
};

/// Stock 150 MHz clock tree.
pub fn configure_normal(
    xosc_dev: pac::XOSC,
    clocks_dev: pac::CLOCKS,
    pll_sys_dev: pac::PLL_SYS,
    pll_usb_dev: pac::PLL_USB,
    resets: &mut pac::RESETS,
    watchdog: &mut Watchdog,
) -> Result<ClocksManager, InitError> {
    hal::clocks::init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        xosc_dev,
        clocks_dev,
        pll_sys_dev,
        pll_usb_dev,
        resets,
        watchdog,
    )
}

/// System clock at 200 MHz. The bus divisor follows on the next frame.
pub fn configure_overclock(
    xosc_dev: pac::XOSC,
    clocks_dev: pac::CLOCKS,
    pll_sys_dev: pac::PLL_SYS,
    pll_usb_dev: pac::PLL_USB,
    resets: &mut pac::RESETS,
    watchdog: &mut Watchdog,
) -> Result<ClocksManager, InitError> {
    let xosc = hal::xosc::setup_xosc_blocking(xosc_dev, XOSC_CRYSTAL_FREQ.Hz())
        .map_err(InitError::XoscErr)?;

    watchdog.enable_tick_generation((XOSC_CRYSTAL_FREQ / 1_000_000) as u16);

    let mut clocks = ClocksManager::new(clocks_dev);

    let pll_sys = hal::pll::setup_pll_blocking(
        pll_sys_dev,
        xosc.operating_frequency(),
        PLL_SYS_200MHZ,
        &mut clocks,
        resets,
    )
    .map_err(InitError::PllError)?;

    let pll_usb = hal::pll::setup_pll_blocking(
        pll_usb_dev,
        xosc.operating_frequency(),
        hal::pll::common_configs::PLL_USB_48MHZ,
        &mut clocks,
        resets,
    )
    .map_err(InitError::PllError)?;

    clocks
        .init_default(&xosc, &pll_sys, &pll_usb)
        .map_err(InitError::ClockError)?;

    Ok(clocks)
}
