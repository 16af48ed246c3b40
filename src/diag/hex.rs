//! Hex buffer codec for block transfers: a 16-bytes-per-line dump for reads
//! and a forgiving nibble-wise reader for write payloads.

use super::console::Console;
use crate::cprint;

pub const BYTES_PER_LINE: usize = 16;

/// Dumps `buf` as upper-case, space-separated hex pairs, 16 to a line.
pub fn print_hex(con: &mut Console<'_>, buf: &[u8]) {
    for (i, byte) in buf.iter().enumerate() {
        cprint!(con, "{byte:02X} ");
        if (i + 1) % BYTES_PER_LINE == 0 {
            cprint!(con, "\n");
        }
    }
    if !buf.is_empty() && !buf.len().is_multiple_of(BYTES_PER_LINE) {
        cprint!(con, "\n");
    }
}

/// Reads up to `num_bytes` bytes as hex digit pairs, one nibble at a time,
/// silently skipping anything that is not a hex digit (separators, line
/// breaks). Once the buffer is full the rest of the line is consumed so the
/// next prompt starts clean. Returns the buffer and the count actually
/// assembled, which falls short only when the input ends early.
pub fn read_hex(con: &mut Console<'_>, num_bytes: usize) -> (Vec<u8>, usize) {
    let mut data = vec![0_u8; num_bytes];
    let mut count = 0;
    while count < num_bytes {
        let Some(hi) = next_nibble(con) else {
            return (data, count);
        };
        let Some(lo) = next_nibble(con) else {
            return (data, count);
        };
        data[count] = (hi << 4) | lo;
        count += 1;
    }
    loop {
        match con.read_byte() {
            None | Some(b'\n') => break,
            Some(_) => {}
        }
    }
    (data, count)
}

fn next_nibble(con: &mut Console<'_>) -> Option<u8> {
    loop {
        let byte = con.read_byte()?;
        if let Some(digit) = (byte as char).to_digit(16) {
            return Some(digit as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dump_breaks_lines_every_sixteen_bytes() {
        let buf: Vec<u8> = (0_u8..20).collect();
        let mut input = Cursor::new(Vec::new());
        let mut output: Vec<u8> = Vec::new();
        {
            let mut con = Console::new(&mut input, &mut output);
            print_hex(&mut con, &buf);
        }
        let text = String::from_utf8(output).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "20 bytes should span two lines");
        assert!(lines[0].starts_with("00 01 02"), "got: {}", lines[0]);
        assert_eq!(lines[1].trim(), "10 11 12 13");
    }

    #[test]
    fn reader_skips_separators_and_stops_at_count() {
        let mut input = Cursor::new(b"DE AD-be:ef 99\n".to_vec());
        let mut output: Vec<u8> = Vec::new();
        let (data, count) = {
            let mut con = Console::new(&mut input, &mut output);
            read_hex(&mut con, 4)
        };
        assert_eq!(count, 4);
        assert_eq!(&data[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(
            input.position() as usize,
            input.get_ref().len(),
            "remainder of the line should be consumed"
        );
    }

    #[test]
    fn reader_reports_short_count_on_early_end() {
        let mut input = Cursor::new(b"AB C".to_vec());
        let mut output: Vec<u8> = Vec::new();
        let (data, count) = {
            let mut con = Console::new(&mut input, &mut output);
            read_hex(&mut con, 4)
        };
        assert_eq!(count, 1, "only one complete pair was available");
        assert_eq!(data[0], 0xAB);
    }
}
