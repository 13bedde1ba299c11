//! Decoder behavior over a live byte stream: one event per call, fatal EOF.

use core_events::Key;
use core_input::{InputError, KeyDecoder};
use std::io::{self, Cursor, Read};

#[test]
fn consecutive_reads_yield_one_event_each() {
    // Each chunk below arrives as its own read in raw mode; Cursor hands the
    // decoder everything at once, which exercises the greedy 4-byte read the
    // same way a fast typist's buffered arrows would.
    let mut decoder = KeyDecoder::new(Cursor::new(b"\x1b[3~".to_vec()));
    assert_eq!(decoder.read_key().unwrap(), Key::Delete);
    assert!(matches!(decoder.read_key(), Err(InputError::Closed)));
}

#[test]
fn literal_bytes_stream_through() {
    let mut decoder = KeyDecoder::new(Cursor::new(b"h".to_vec()));
    assert_eq!(decoder.read_key().unwrap(), Key::Byte(b'h'));
}

#[test]
fn end_of_stream_is_fatal_not_a_key() {
    let mut decoder = KeyDecoder::new(Cursor::new(Vec::new()));
    assert!(matches!(decoder.read_key(), Err(InputError::Closed)));
}

/// Reader that fails once, proving I/O errors propagate instead of decoding.
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("tty went away"))
    }
}

#[test]
fn read_errors_propagate_as_fatal() {
    let mut decoder = KeyDecoder::new(FailingReader);
    assert!(matches!(decoder.read_key(), Err(InputError::Io(_))));
}

/// Reader that delivers an escape sequence one byte per read, mimicking a
/// slow serial line: the first read sees a lone ESC and must resolve it
/// immediately rather than wait for more.
struct ByteAtATime {
    bytes: Vec<u8>,
    pos: usize,
}

impl Read for ByteAtATime {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.bytes.len() {
            return Ok(0);
        }
        buf[0] = self.bytes[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

#[test]
fn split_sequence_degrades_to_esc_then_literals() {
    let mut decoder = KeyDecoder::new(ByteAtATime {
        bytes: b"\x1b[A".to_vec(),
        pos: 0,
    });
    assert_eq!(decoder.read_key().unwrap(), Key::Esc);
    assert_eq!(decoder.read_key().unwrap(), Key::Byte(b'['));
    assert_eq!(decoder.read_key().unwrap(), Key::Byte(b'A'));
}
