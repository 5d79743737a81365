//! Motion engine tick task
//!
//! Runs on the high-priority interrupt executor so that a busy host task
//! never delays a step pulse.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};
use portable_atomic::Ordering;

use stylus_core::engine::SharedEngine;
use stylus_drivers::stepper::StepDirOutput;

use crate::channels::{ENGINE_FAULT, QUEUE_SLOTS, TICK_COUNT};

/// Step/dir pins of both motors
pub type PlotterOutput =
    StepDirOutput<Output<'static>, Output<'static>, Output<'static>, Output<'static>>;

/// Engine task - advances the engine once per tick period
///
/// `_enables` holds the driver enable pins low for as long as the task runs.
#[embassy_executor::task]
pub async fn engine_task(
    engine: &'static SharedEngine<'static, QUEUE_SLOTS>,
    mut out: PlotterOutput,
    _enables: [Output<'static>; 2],
    tick_hz: u32,
) {
    info!("Engine task started at {} Hz", tick_hz);

    let mut ticker = Ticker::every(Duration::from_hz(u64::from(tick_hz)));

    loop {
        ticker.next().await;

        let outcome = engine.tick(&mut out);
        TICK_COUNT.fetch_add(1, Ordering::Relaxed);

        if let Some(fault) = outcome.fault {
            ENGINE_FAULT.signal(fault);
        }
        if outcome.completed {
            trace!("Command complete");
        }
    }
}
