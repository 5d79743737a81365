//! Stylus - Pen Plotter Motion Firmware
//!
//! Main firmware binary for RP2040-based two-axis pen plotters. The host
//! streams text commands over UART; the motion engine turns them into
//! step pulses on a fixed 25 kHz tick.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use heapless::spsc::Queue;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stylus_core::controller::Controller;
use stylus_core::engine::{Engine, SharedEngine};
use stylus_core::queue::CommandRing;
use stylus_drivers::stepper::{AxisPins, StepDirOutput};

use crate::channels::QUEUE_SLOTS;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Command queue and the engine that drains it
static COMMAND_RING: StaticCell<CommandRing<QUEUE_SLOTS>> = StaticCell::new();
static ENGINE: StaticCell<SharedEngine<'static, QUEUE_SLOTS>> = StaticCell::new();

/// High-priority executor for the engine tick
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stylus firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Command queue: the controller produces, the engine consumes
    let ring = COMMAND_RING.init(Queue::new());
    let (producer, consumer) = ring.split();
    let engine: &'static SharedEngine<'static, QUEUE_SLOTS> = ENGINE.init(SharedEngine::new(
        Engine::new(consumer, config.motion.tick_hz),
    ));

    let controller = unwrap!(Controller::new(producer, config));
    info!("Controller ready, queue depth {}", controller.queue().depth());

    // Setup UART for the host link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for host communication");

    // Stepper drivers, step/dir mode
    // Pin assignments are board-specific (SKR Pico X: STEP=GPIO11, DIR=GPIO10,
    // ENABLE=GPIO12; Y: STEP=GPIO6, DIR=GPIO5, ENABLE=GPIO7)
    let motor1 = AxisPins::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        false,
    );
    let motor2 = AxisPins::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        false,
    );
    let out = StepDirOutput::new(motor1, motor2);

    // Drivers enable on a low level
    let enables = [
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_7, Level::Low),
    ];

    info!("Stepper outputs initialized");

    // Engine tick on the interrupt executor, above everything in thread mode
    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner
        .spawn(tasks::engine_task(engine, out, enables, config.motion.tick_hz))
        .unwrap();

    spawner
        .spawn(tasks::host_task(rx, tx, engine, controller))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat, {} engine ticks", channels::ticks());
    }
}
