//! Streaming parsers for the ESC/P-R command grammar
//!
//! Two sublanguages share one contract: given the bytes buffered since the
//! last command boundary, a parser either produces a command or reports how
//! many more bytes it wants ([`Progress`]). A short buffer is never an
//! error; the framer keeps feeding bytes until the frame completes, and only
//! end-of-input turns an incomplete frame into a failure.
//!
//! The buffers handed to [`parse_normal`] start at the byte *after* the
//! `ESC` opener (the framer consumes it). In remote mode the escape is part
//! of the buffer, because the mode's closing sentinel `ESC \x00\x00\x00`
//! contains it.

use std::io::BufRead;

use tracing::{debug, trace};

use crate::commands::{fixed_param_len, Command, EscCommand, RemoteCommand, ESC, RESTART_SEQUENCE};
use crate::error::DecodeError;

/// First stage of the enable handshake, matched as a line suffix.
const ENABLE_LINE_1: &[u8] = b"\x1b\x01@EJL 1284.4\n";
/// Second stage, matched as an exact line.
const ENABLE_LINE_2: &[u8] = b"@EJL\x20\x20\x20\x20\x20\n";
/// Final stage: the bare reset that arms the command loop.
const ENABLE_TAIL: &[u8] = b"\x1b@";

/// Outcome of feeding a buffer to a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The frame is incomplete; at least this many more bytes are required
    Need(usize),
    /// A complete command was recognized; the buffer is fully consumed
    Done(Command),
}

/// Parse a normal-mode command from a post-escape buffer.
#[must_use]
pub fn parse_normal(buf: &[u8]) -> Progress {
    if buf.ends_with(RESTART_SEQUENCE) {
        debug!("1284.4 re-initialization sequence recognized, treating as reset");
        return Progress::Done(Command::Normal(EscCommand::Reset));
    }
    let Some(&first) = buf.first() else {
        return Progress::Need(1);
    };
    if first == b'(' {
        if buf.len() < 4 {
            return Progress::Need(4 - buf.len());
        }
        let count = usize::from(u16::from_le_bytes([buf[2], buf[3]]));
        if buf.len() < 4 + count {
            return Progress::Need(4 + count - buf.len());
        }
        return Progress::Done(Command::Normal(EscCommand::classify(
            &buf[..2],
            &buf[4..4 + count],
        )));
    }
    let count = fixed_param_len(first);
    if buf.len() < 1 + count {
        return Progress::Need(1 + count - buf.len());
    }
    Progress::Done(Command::Normal(EscCommand::classify(
        &buf[..1],
        &buf[1..1 + count],
    )))
}

/// Parse a remote-mode record.
///
/// The buffer includes any escape byte, since the mode-ending sentinel is
/// the four bytes `ESC \x00\x00\x00`.
#[must_use]
pub fn parse_remote(buf: &[u8]) -> Progress {
    if buf.len() < 4 {
        return Progress::Need(4 - buf.len());
    }
    if buf == [ESC, 0, 0, 0] {
        return Progress::Done(Command::Remote(RemoteCommand::End));
    }
    let count = usize::from(u16::from_le_bytes([buf[2], buf[3]]));
    if buf.len() < 4 + count {
        return Progress::Need(4 + count - buf.len());
    }
    Progress::Done(Command::Remote(RemoteCommand::Record {
        name: [buf[0], buf[1]],
        params: buf[4..4 + count].to_vec(),
    }))
}

/// Skip everything up to and including the enable sequence.
///
/// Drivers open a job with EJL chatter that ends in three ordered stages:
/// a line whose suffix is `ESC \x01 @EJL 1284.4\n`, the exact line
/// `@EJL␣␣␣␣␣\n`, and the two bytes `ESC @`. Bytes before and between the
/// stages are discarded. `offset` is advanced past every byte consumed.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedPreamble`] when the input ends before all
/// three stages have matched.
pub fn skip_preamble<R: BufRead>(reader: &mut R, offset: &mut u64) -> Result<(), DecodeError> {
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(DecodeError::MalformedPreamble);
        }
        *offset += n as u64;
        if line.ends_with(ENABLE_LINE_1) {
            break;
        }
        trace!(skipped = n, "discarding pre-handshake line");
    }

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(DecodeError::MalformedPreamble);
        }
        *offset += n as u64;
        if line == ENABLE_LINE_2 {
            break;
        }
        trace!(skipped = n, "discarding line between handshake stages");
    }

    loop {
        let mut pair = [0u8; 2];
        if let Err(e) = reader.read_exact(&mut pair) {
            return if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Err(DecodeError::MalformedPreamble)
            } else {
                Err(DecodeError::Io(e))
            };
        }
        *offset += 2;
        if pair == ENABLE_TAIL {
            break;
        }
        trace!("discarding byte pair before ESC @");
    }

    debug!(offset, "enable sequence complete, printing armed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ColorMode, UnitCommand};
    use pretty_assertions::assert_eq;

    #[test]
    fn length_prefixed_frames_report_need() {
        assert_eq!(parse_normal(b"("), Progress::Need(3));
        assert_eq!(parse_normal(b"(v\x04\x00"), Progress::Need(4));
        assert_eq!(parse_normal(b"(v\x04\x00\x64\x00"), Progress::Need(2));
        assert_eq!(
            parse_normal(b"(v\x04\x00\x64\x00\x00\x00"),
            Progress::Done(Command::Normal(EscCommand::VerticalAdvance { feed: 100 }))
        );
    }

    #[test]
    fn single_letter_frames_use_the_length_table() {
        assert_eq!(
            parse_normal(b"@"),
            Progress::Done(Command::Normal(EscCommand::Reset))
        );
        assert_eq!(
            parse_normal(b"\r"),
            Progress::Done(Command::Normal(EscCommand::CarriageReturn))
        );
        assert_eq!(parse_normal(b"U"), Progress::Need(1));
        assert_eq!(
            parse_normal(b"U\x01"),
            Progress::Done(Command::Normal(EscCommand::PrintDirection {
                unidirectional: true
            }))
        );
        // Raster headers are seven bytes after the name.
        assert_eq!(parse_normal(b"i\x00\x01\x02"), Progress::Need(4));
        // Unknown letters wait for a conservative 99-byte payload.
        assert_eq!(parse_normal(b"q"), Progress::Need(99));
    }

    #[test]
    fn restart_suffix_acts_as_reset() {
        let mut buf = b"(K\x02\x00".to_vec();
        buf.extend_from_slice(RESTART_SEQUENCE);
        assert_eq!(
            parse_normal(&buf),
            Progress::Done(Command::Normal(EscCommand::Reset))
        );
    }

    #[test]
    fn parses_unit_and_color_commands() {
        assert_eq!(
            parse_normal(b"(U\x01\x00\x0a"),
            Progress::Done(Command::Normal(EscCommand::SetUnits(
                UnitCommand::Resolution { value: 10 }
            )))
        );
        assert_eq!(
            parse_normal(b"(K\x02\x00\x00\x02"),
            Progress::Done(Command::Normal(EscCommand::SetColorMode(ColorMode::Color(
                2
            ))))
        );
    }

    #[test]
    fn remote_sentinel_and_records() {
        assert_eq!(parse_remote(b"\x1b\x00"), Progress::Need(2));
        assert_eq!(
            parse_remote(b"\x1b\x00\x00\x00"),
            Progress::Done(Command::Remote(RemoteCommand::End))
        );
        assert_eq!(parse_remote(b"JE\x01\x00"), Progress::Need(1));
        assert_eq!(
            parse_remote(b"JE\x01\x00\x00"),
            Progress::Done(Command::Remote(RemoteCommand::Record {
                name: *b"JE",
                params: vec![0],
            }))
        );
    }

    #[test]
    fn preamble_skipper_stops_after_enable_tail() {
        let mut input = &b"\x1b\x01@EJL 1284.4\n@EJL\x20\x20\x20\x20\x20\n\x1b@REST"[..];
        let mut offset = 0;
        skip_preamble(&mut input, &mut offset).unwrap();
        assert_eq!(input, b"REST");
        assert_eq!(offset, 26);
    }

    #[test]
    fn preamble_skipper_discards_leading_garbage() {
        let mut input =
            &b"\x00\x00\x00\x1b\x01@EJL 1284.4\n@EJL\x20\x20\x20\x20\x20\n\x1b@\x1b(G"[..];
        let mut offset = 0;
        skip_preamble(&mut input, &mut offset).unwrap();
        assert_eq!(input, b"\x1b(G");
    }

    #[test]
    fn preamble_skipper_fails_on_truncated_handshake() {
        let mut input = &b"\x1b\x01@EJL 1284.4\n@EJL\x20\x20\x20\x20\x20\n"[..];
        let mut offset = 0;
        assert!(matches!(
            skip_preamble(&mut input, &mut offset),
            Err(DecodeError::MalformedPreamble)
        ));
    }
}
