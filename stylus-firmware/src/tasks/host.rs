//! Host UART task
//!
//! Assembles command lines from the host link, hands each one to the
//! controller and writes the reply back.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use stylus_core::controller::Controller;
use stylus_core::engine::{SharedEngine, SharedLink};
use stylus_protocol::LineAssembler;

use crate::channels::{self, ENGINE_FAULT, QUEUE_SLOTS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Host task - receives lines, runs the controller, sends replies
#[embassy_executor::task]
pub async fn host_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    engine: &'static SharedEngine<'static, QUEUE_SLOTS>,
    mut controller: Controller<'static, QUEUE_SLOTS>,
) {
    info!("Host task started");

    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match select(rx.read(&mut buf), ENGINE_FAULT.wait()).await {
            Either::First(Ok(n)) => n,
            Either::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
            Either::Second(fault) => {
                warn!("Engine fault at tick {}: {:?}", channels::ticks(), fault);
                continue;
            }
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            let reply = match assembler.feed(byte) {
                Ok(Some(line)) => {
                    debug!("Line: {}", line.as_str());
                    // Blocking waits sleep until the next interrupt; the
                    // engine tick preempts this task from its own executor
                    let mut link = SharedLink::new(engine, cortex_m::asm::wfi);
                    controller.handle_line(line.as_str(), &mut link)
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("Line error: {:?}", e);
                    controller.handle_line_error(e)
                }
            };

            if reply.is_empty() {
                continue;
            }
            if let Err(e) = tx.write_all(reply.as_bytes()).await {
                warn!("UART write error: {:?}", e);
            }
        }
    }
}
