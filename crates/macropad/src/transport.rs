//! Keypad transport setup: device discovery and opening.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tokio::io::{self, AsyncRead, AsyncWrite};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Directory scanned for keypad devices.
pub const DEVICE_DIR: &str = "/dev";

/// Device name prefixes of USB CDC serial ports (macOS, then Linux).
pub const PORT_PREFIXES: &[&str] = &["tty.usbmodem", "ttyACM"];

/// Line speed requested when opening a device. USB CDC keypads ignore it.
pub const BAUD_RATE: u32 = 9600;

/// Inbound half of a transport.
pub type Reader = Box<dyn AsyncRead + Send + Unpin>;
/// Outbound half of a transport.
pub type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Where the keypad is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Standard input and output, for bench testing without hardware.
    Stdio,
    /// A device node.
    Device(PathBuf),
}

/// Choose the transport: stdio if requested, else an explicit port (CLI over
/// config), else the first matching device in [`DEVICE_DIR`].
pub fn select(stdio: bool, cli_port: Option<&Path>, config_port: Option<&Path>) -> Result<Source> {
    if stdio {
        return Ok(Source::Stdio);
    }
    if let Some(p) = cli_port.or(config_port) {
        return Ok(Source::Device(p.to_path_buf()));
    }
    find_port(Path::new(DEVICE_DIR)).map(Source::Device)
}

/// Find the first device in `dir` whose name starts with one of [`PORT_PREFIXES`].
///
/// Prefixes are tried in order; within a prefix the lexically smallest name wins.
pub fn find_port(dir: &Path) -> Result<PathBuf> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    for prefix in PORT_PREFIXES {
        if let Some(name) = names.iter().find(|n| n.starts_with(prefix)) {
            let path = dir.join(name);
            debug!(path = %path.display(), "port_found");
            return Ok(path);
        }
    }
    Err(Error::NoPort {
        dir: dir.to_path_buf(),
        patterns: PORT_PREFIXES.join(", "),
    })
}

/// Open `source` and split it into reader and writer halves.
///
/// Devices are opened as raw serial ports, so a write can proceed while the
/// reader waits for the next key event.
pub fn open(source: &Source) -> Result<(Reader, Writer)> {
    match source {
        Source::Stdio => {
            info!("transport_stdio");
            Ok((Box::new(io::stdin()), Box::new(io::stdout())))
        }
        Source::Device(path) => {
            let port = tokio_serial::new(path.to_string_lossy(), BAUD_RATE)
                .open_native_async()
                .map_err(|source| Error::OpenPort {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), baud = BAUD_RATE, "transport_device");
            Ok(split(port))
        }
    }
}

/// Split an open serial port into boxed halves.
fn split(port: SerialStream) -> (Reader, Writer) {
    let (r, w) = io::split(port);
    (Box::new(r), Box::new(w))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
        time,
    };

    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").expect("create device stub");
    }

    #[test]
    fn stdio_and_explicit_ports_win() {
        assert_eq!(select(true, None, None).unwrap(), Source::Stdio);
        let cli = Path::new("/dev/cu.cli");
        let cfg = Path::new("/dev/cu.cfg");
        assert_eq!(
            select(false, Some(cli), Some(cfg)).unwrap(),
            Source::Device(cli.to_path_buf())
        );
        assert_eq!(
            select(false, None, Some(cfg)).unwrap(),
            Source::Device(cfg.to_path_buf())
        );
    }

    #[test]
    fn finds_first_matching_device() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ttyS0");
        touch(dir.path(), "ttyACM1");
        touch(dir.path(), "tty.usbmodem2");
        touch(dir.path(), "tty.usbmodem1421");
        let found = find_port(dir.path()).unwrap();
        assert_eq!(found, dir.path().join("tty.usbmodem1421"));
    }

    #[test]
    fn falls_back_to_linux_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ttyACM0");
        assert_eq!(find_port(dir.path()).unwrap(), dir.path().join("ttyACM0"));
    }

    #[test]
    fn no_device_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ttyS0");
        let err = find_port(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoPort { .. }));
        assert!(err.to_string().contains("tty.usbmodem"));
    }

    #[tokio::test]
    async fn write_proceeds_while_read_is_pending() {
        let (host, device) = SerialStream::pair().expect("pty pair");
        let (mut r, mut w) = split(host);
        let pending = tokio::spawn(async move {
            let mut byte = [0u8; 1];
            r.read(&mut byte).await.map(|n| (n, byte[0]))
        });
        time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        time::timeout(Duration::from_millis(500), async {
            w.write_all(b"K41\n").await?;
            w.flush().await
        })
        .await
        .expect("write blocked behind pending read")
        .unwrap();

        let (device_r, mut device_w) = io::split(device);
        let mut lines = BufReader::new(device_r).lines();
        let line = time::timeout(Duration::from_millis(500), lines.next_line())
            .await
            .expect("line reaches device")
            .unwrap()
            .unwrap();
        assert!(line.contains("K41"), "{line:?}");

        device_w.write_all(b"K10\n").await.unwrap();
        device_w.flush().await.unwrap();
        let (n, _) = time::timeout(Duration::from_millis(500), pending)
            .await
            .expect("pending read completes")
            .unwrap()
            .unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn missing_device_reports_path() {
        let err = open(&Source::Device(PathBuf::from("/nonexistent/tty.usbmodem0")))
            .err()
            .expect("open fails");
        assert!(err.to_string().contains("/nonexistent/tty.usbmodem0"));
    }
}
