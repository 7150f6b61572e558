//! Bridge serial link
//!
//! The broker session runs over a buffered UART to a serial-to-TCP bridge.
//! Transmit blocks on the interrupt-driven buffer; receive takes only what
//! the buffer already holds.

use core::task::Poll;

use autoblind_hal::uart::{ErrorType, UartRx, UartTx};
use embassy_futures::{block_on, poll_once};
use embedded_io_async::{Read, Write};

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

/// Function of a UART pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartRole {
    Tx,
    Rx,
}

/// Determine which UART and direction a GPIO can serve
pub fn gpio_to_uart(gpio: u8) -> Option<(UartId, UartRole)> {
    // UART0: 0/1, 12/13, 16/17, 28/29
    // UART1: 4/5, 8/9, 20/21, 24/25
    match gpio {
        0 | 12 | 16 | 28 => Some((UartId::Uart0, UartRole::Tx)),
        1 | 13 | 17 | 29 => Some((UartId::Uart0, UartRole::Rx)),
        4 | 8 | 20 | 24 => Some((UartId::Uart1, UartRole::Tx)),
        5 | 9 | 21 | 25 => Some((UartId::Uart1, UartRole::Rx)),
        _ => None,
    }
}

/// UART shared by a TX/RX pin pair, if they form one
pub fn uart_for_pins(tx: u8, rx: u8) -> Option<UartId> {
    match (gpio_to_uart(tx)?, gpio_to_uart(rx)?) {
        ((a, UartRole::Tx), (b, UartRole::Rx)) if a == b => Some(a),
        _ => None,
    }
}

/// Adapts an embassy buffered UART to the polled link traits
pub struct BridgeUart<T> {
    inner: T,
}

impl<T> BridgeUart<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: embedded_io::ErrorType> ErrorType for BridgeUart<T> {
    type Error = T::Error;
}

impl<T: Write> UartTx for BridgeUart<T> {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        block_on(self.inner.write_all(data))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        block_on(self.inner.flush())
    }
}

impl<T: Read> UartRx for BridgeUart<T> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        // A pending read means the RX buffer is empty
        match poll_once(self.inner.read(buf)) {
            Poll::Ready(result) => result,
            Poll::Pending => Ok(0),
        }
    }
}
