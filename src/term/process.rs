//! Real process terminal on Unix.

#![cfg(unix)]

use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use libc::c_int;
use signal_hook::iterator::Signals;

use crate::config::EnvConfig;

use super::terminal::{sequences, Terminal};

/// How long to wait after a lone ESC before treating it as the Escape key.
const ESCAPE_DISAMBIGUATE_MS: i32 = 50;
/// How long to wait for the rest of a partially read sequence.
const SEQUENCE_CONTINUATION_MS: i32 = 10;

/// Terminal backed by the process's stdin/stdout.
///
/// Raw mode is scoped: the original termios is captured on
/// [`Terminal::set_raw_mode`] and restored on [`Terminal::restore_mode`], on
/// drop, and from a SIGINT/SIGTERM cleanup thread, so no exit path leaves
/// the shell in raw mode.
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    raw: bool,
    write_log: Option<PathBuf>,
    write_log_failed: bool,
    signal_guard: Option<SignalCleanupGuard>,
}

impl ProcessTerminal {
    pub fn new() -> Self {
        let config = EnvConfig::from_env();
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            raw: false,
            write_log: config.write_log.map(PathBuf::from),
            write_log_failed: false,
            signal_guard: None,
        }
    }
}

impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ProcessTerminal {
    fn write(&mut self, data: &str) -> io::Result<()> {
        write_fd(self.stdout_fd, data.as_bytes())?;

        if self.write_log_failed {
            return Ok(());
        }
        if let Some(path) = self.write_log.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if result.is_err() {
                self.write_log_failed = true;
            }
        }
        Ok(())
    }

    fn read_sequence(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        if !self.raw {
            return Ok(None);
        }

        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        if !poll_readable(self.stdin_fd, timeout_ms) {
            return Ok(None);
        }

        let mut data: Vec<u8> = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            let read_len =
                unsafe { libc::read(self.stdin_fd, byte.as_mut_ptr() as *mut _, 1) };
            if read_len < 0 {
                if data.is_empty() {
                    return Err(io::Error::last_os_error());
                }
                break;
            }
            if read_len == 0 {
                break;
            }
            data.push(byte[0]);

            if is_complete_chunk(&data) {
                break;
            }

            let follow_ms = if data == [0x1b] {
                ESCAPE_DISAMBIGUATE_MS
            } else {
                SEQUENCE_CONTINUATION_MS
            };
            if !poll_readable(self.stdin_fd, follow_ms) {
                break;
            }
        }

        if data.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&data).into_owned()))
        }
    }

    fn size(&self) -> (u16, u16) {
        read_winsize(self.stdout_fd).unwrap_or((80, 24))
    }

    fn set_raw_mode(&mut self) -> io::Result<()> {
        if self.raw {
            return Ok(());
        }

        let original = get_termios(self.stdin_fd)?;
        self.original_termios = Some(original);

        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)?;
        self.raw = true;

        self.signal_guard = Some(install_signal_cleanup(
            self.stdin_fd,
            self.stdout_fd,
            original,
        )?);
        Ok(())
    }

    fn restore_mode(&mut self) -> io::Result<()> {
        if !self.raw {
            return Ok(());
        }
        self.signal_guard = None;

        // Flush pending input first so buffered bytes do not leak into the
        // shell once canonical mode is back.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        self.raw = false;
        Ok(())
    }
}

impl Drop for ProcessTerminal {
    fn drop(&mut self) {
        let _ = self.restore_mode();
    }
}

fn is_complete_chunk(data: &[u8]) -> bool {
    let Some(&first) = data.first() else {
        return false;
    };

    if first != 0x1b {
        // Plain text: complete once it forms whole UTF-8 scalars.
        return std::str::from_utf8(data).is_ok();
    }
    if data.len() == 1 {
        // Lone ESC is resolved by the follow-up poll timeout.
        return false;
    }

    match data[1] {
        // CSI: ends on a final byte in 0x40..=0x7E after at least one byte
        // past the introducer.
        b'[' => data.len() >= 3 && (0x40..=0x7e).contains(data.last().unwrap()),
        // SS3: ESC O plus exactly one byte.
        b'O' => data.len() >= 3,
        // OSC/APC/DCS: BEL- or ST-terminated strings.
        b']' | b'_' | b'P' => {
            data.last() == Some(&0x07) || data.ends_with(&[0x1b, b'\\'])
        }
        // Alt+key: ESC plus one complete scalar.
        _ => std::str::from_utf8(&data[1..]).is_ok(),
    }
}

fn write_fd(fd: c_int, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        let result = unsafe {
            libc::write(
                fd,
                bytes[written..].as_ptr() as *const libc::c_void,
                bytes.len() - written,
            )
        };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "terminal write"));
        }
        written += result as usize;
    }
    Ok(())
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

struct SignalCleanupGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalCleanupGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Restore the terminal and exit on fatal signals. SIGINT normally arrives
/// as `0x03` input while raw (ISIG is off); this covers SIGTERM and SIGINT
/// delivered from outside the terminal.
fn install_signal_cleanup(
    stdin_fd: c_int,
    stdout_fd: c_int,
    original: libc::termios,
) -> io::Result<SignalCleanupGuard> {
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();

    let thread = std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            let _ = write_fd(stdout_fd, sequences::SHOW_CURSOR.as_bytes());
            let _ = set_termios(stdin_fd, &original);
            std::process::exit(128 + signal);
        }
    });

    Ok(SignalCleanupGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::is_complete_chunk;

    #[test]
    fn plain_bytes_complete_immediately() {
        assert!(is_complete_chunk(b"a"));
        assert!(is_complete_chunk("é".as_bytes()));
    }

    #[test]
    fn utf8_lead_byte_waits_for_continuation() {
        assert!(!is_complete_chunk(&[0xc3]));
        assert!(is_complete_chunk(&[0xc3, 0xa9]));
    }

    #[test]
    fn csi_waits_for_final_byte() {
        assert!(!is_complete_chunk(b"\x1b["));
        assert!(!is_complete_chunk(b"\x1b[1;5"));
        assert!(is_complete_chunk(b"\x1b[1;5C"));
        assert!(is_complete_chunk(b"\x1b[A"));
        assert!(is_complete_chunk(b"\x1b[97;5u"));
    }

    #[test]
    fn ss3_is_three_bytes() {
        assert!(!is_complete_chunk(b"\x1bO"));
        assert!(is_complete_chunk(b"\x1bOP"));
    }

    #[test]
    fn string_sequences_end_on_bel_or_st() {
        assert!(!is_complete_chunk(b"\x1b]8;;x"));
        assert!(is_complete_chunk(b"\x1b]8;;x\x07"));
        assert!(is_complete_chunk(b"\x1b]8;;x\x1b\\"));
    }

    #[test]
    fn alt_key_is_escape_plus_scalar() {
        assert!(is_complete_chunk(b"\x1bx"));
        assert!(!is_complete_chunk(b"\x1b"));
    }
}
