use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::info;

use crate::config::SerialConfig;
use crate::error::{BackendError, Result};

/// Byte stream to the controller.
///
/// Reads must not block longer than the link's read timeout; a timeout is
/// reported as `TimedOut` or `WouldBlock`, or as a zero-length read.
pub trait SerialLink: Read + Write + Send + 'static {}

impl<T: Read + Write + Send + 'static> SerialLink for T {}

/// Open the serial device at 8N1 without flow control.
pub fn open_serial(config: &SerialConfig) -> Result<Box<dyn serialport::SerialPort>> {
    let port = serialport::new(&config.device, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout())
        .open()
        .map_err(|e| {
            BackendError::initialization_failed(format!("cannot open {}: {e}", config.device))
        })?;

    info!(
        device = %config.device,
        baud_rate = config.baud_rate,
        "Opened serial link to AVR"
    );
    Ok(port)
}

/// Read one byte, mapping a read timeout to `None`.
pub(crate) fn read_byte<L: SerialLink>(link: &mut L) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match link.read(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Pause used between reads while waiting for an echo.
pub(crate) const ECHO_POLL: Duration = Duration::from_millis(1);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }

    impl Write for TimingOut {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_byte() {
        let mut link = Cursor::new(vec![b'R']);
        assert_eq!(read_byte(&mut link).unwrap(), Some(b'R'));
        assert_eq!(read_byte(&mut link).unwrap(), None);
    }

    #[test]
    fn test_read_timeout_is_not_an_error() {
        assert_eq!(read_byte(&mut TimingOut).unwrap(), None);
    }
}
