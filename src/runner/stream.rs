use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Per-stream capture limit (10MB). Output past the limit is still echoed.
pub(super) const MAX_CAPTURE_SIZE: usize = 10 * 1024 * 1024;

const TRUNCATION_NOTE: &str = "\n[output truncated at 10MB]";

/// Where echoed child output goes.
#[derive(Debug, Clone, Copy)]
pub(super) enum Echo {
    Stdout,
    Stderr,
    Off,
}

impl Echo {
    fn write(&self, chunk: &[u8]) {
        // Echo failures (closed terminal, broken pipe) must not stop the capture.
        match self {
            Echo::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(chunk);
                let _ = out.flush();
            }
            Echo::Stderr => {
                let mut err = std::io::stderr().lock();
                let _ = err.write_all(chunk);
                let _ = err.flush();
            }
            Echo::Off => {}
        }
    }
}

/// Copy `stream` chunk by chunk to `echo` on a background thread while
/// capturing it. The receiver yields the captured text once the stream closes.
pub(super) fn tee<R: Read + Send + 'static>(stream: R, echo: Echo) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(copy_and_capture(stream, echo));
    });
    rx
}

/// Read until EOF, echoing every chunk as it arrives.
///
/// Captures at most [`MAX_CAPTURE_SIZE`] bytes; the stream is always drained
/// so the child never blocks on a full pipe.
pub(super) fn copy_and_capture<R: Read>(mut stream: R, echo: Echo) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                echo.write(&chunk[..n]);
                let remaining = MAX_CAPTURE_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&chunk[..to_copy]);
                if to_copy < n {
                    truncated = true;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(error = %e, "stopped reading child output");
                break;
            }
        }
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str(TRUNCATION_NOTE);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn captures_small_input() {
        let text = copy_and_capture(Cursor::new(b"Test 1: PASS\n".to_vec()), Echo::Off);
        assert_eq!(text, "Test 1: PASS\n");
    }

    #[test]
    fn captures_empty_input() {
        assert_eq!(copy_and_capture(Cursor::new(Vec::new()), Echo::Off), "");
    }

    #[test]
    fn truncates_past_limit() {
        let data = vec![b'x'; MAX_CAPTURE_SIZE + 1000];
        let text = copy_and_capture(Cursor::new(data), Echo::Off);
        assert!(text.ends_with(TRUNCATION_NOTE));
        assert_eq!(text.len(), MAX_CAPTURE_SIZE + TRUNCATION_NOTE.len());
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        let data = vec![b'y'; MAX_CAPTURE_SIZE];
        let text = copy_and_capture(Cursor::new(data), Echo::Off);
        assert!(!text.contains("[output truncated"));
        assert_eq!(text.len(), MAX_CAPTURE_SIZE);
    }

    #[test]
    fn tee_delivers_captured_text() {
        let rx = tee(Cursor::new(b"running 3 tests\n".to_vec()), Echo::Off);
        assert_eq!(rx.recv().unwrap(), "running 3 tests\n");
    }
}
