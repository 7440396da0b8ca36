use core::time::Duration;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use dimmer_core::config::{DEFAULT_DEBOUNCE, DEFAULT_TRIGGER_WIDTH};
use dimmer_core::{ChannelConfig, DimmerConfig, DimmerMode, SharedDimmer};
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::gate::HardwareGateDriver;
use crate::instant::FirmwareInstant;

mod button_task;
mod console_task;
mod gate_task;
mod telemetry_task;
mod zero_cross_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

const AC_FREQUENCY_HZ: u16 = 50;
const LAMP_RAMP_MS: u64 = 1_500;
const LAMP_RAMP: Duration = Duration::from_millis(LAMP_RAMP_MS);
const LAMP_INITIAL_LEVEL: u8 = 25;
const LAMP_MINIMUM_LEVEL: u8 = 10;

/// Gate outputs wired on the board.
pub(super) const GATE_COUNT: usize = 1;

pub(super) type FirmwareDimmer = SharedDimmer<FirmwareInstant>;
pub(super) type FirmwareGates = HardwareGateDriver<'static, GATE_COUNT>;

pub(super) static DIMMER: FirmwareDimmer =
    SharedDimmer::new(DimmerConfig::new(DEFAULT_DEBOUNCE, DEFAULT_TRIGGER_WIDTH));

/// Wakes the gate task after a crossing armed new pulses.
pub(super) static GATE_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        EXTI0,
        PA1,
        PA5,
        PA6,
        PB0,
        PB1,
        USART5,
        ..
    } = hal::init(config);

    let zero_cross = ExtiInput::new(PA0, EXTI0, Pull::None);
    let button = Input::new(PA1, Pull::Up);
    let status_led = Output::new(PA5, Level::Low, Speed::Low);
    let gates = HardwareGateDriver::new([Output::new(PA6, Level::Low, Speed::VeryHigh)]);

    let lamp = DIMMER
        .register(ChannelConfig::new(
            DimmerMode::PhaseControl,
            AC_FREQUENCY_HZ,
            LAMP_RAMP,
        ))
        .expect("lamp channel registration");
    DIMMER
        .begin(lamp, LAMP_INITIAL_LEVEL)
        .expect("lamp channel start");
    DIMMER
        .set_minimum(lamp, LAMP_MINIMUM_LEVEL)
        .expect("lamp minimum");
    DIMMER.off(lamp).expect("lamp off");
    defmt::info!(
        "dimmer: {} at {} Hz, min={} ramp={}ms",
        lamp.raw(),
        AC_FREQUENCY_HZ,
        LAMP_MINIMUM_LEVEL,
        LAMP_RAMP_MS
    );

    spawner
        .spawn(gate_task::run(gates))
        .expect("failed to spawn gate task");
    spawner
        .spawn(zero_cross_task::run(zero_cross))
        .expect("failed to spawn zero-cross task");
    spawner
        .spawn(button_task::run(button, status_led, lamp))
        .expect("failed to spawn button task");
    spawner
        .spawn(console_task::run(USART5, PB0, PB1))
        .expect("failed to spawn console task");
    spawner
        .spawn(telemetry_task::run())
        .expect("failed to spawn telemetry task");

    core::future::pending::<()>().await;
}
