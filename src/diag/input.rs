//! Numeric input validation for interactive prompts.
//!
//! Two entry points: [`read_number`] for free-form values (offsets, data,
//! byte counts) and [`read_menu_option`] for menu selections. A number
//! prompt is one-shot: any malformed or cancelled input aborts the caller's
//! operation. Menu selection is the only place where bad input is worth a
//! re-prompt, so it gets its own outcome variant.

use super::console::Console;
use crate::{cprint, cprintln};

/// Typing this character (alone or as the first character) cancels a
/// numeric prompt.
pub const CANCEL_CHAR: char = 'x';

/// Fixed menu option that exits the current menu level.
pub const EXIT_MENU: u64 = 99;

/// Outcome of a numeric prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumInput {
    Value(u64),
    Cancel,
}

/// Outcome of a menu selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    /// An in-range selection, 1-based.
    Choice(u64),
    Exit,
    /// Unparseable or out-of-range; the error has already been printed and
    /// the caller should re-prompt.
    Invalid,
}

/// Prompts for a number and validates it in one shot.
///
/// An empty line, the cancel character, or a parse failure yields
/// [`NumInput::Cancel`]. When `max > min` the value must fall inside
/// `min..=max`; a violation prints the range error and cancels. The value
/// must also fit in `width_bytes` bytes regardless of the range flag, so a
/// 16-bit register prompt cannot hand back a value that would be silently
/// truncated downstream.
pub fn read_number(
    con: &mut Console<'_>,
    prompt: &str,
    hex: bool,
    width_bytes: usize,
    min: u64,
    max: u64,
) -> NumInput {
    let prompt = if prompt.is_empty() { "Enter input" } else { prompt };
    cprint!(
        con,
        "{} (to cancel press '{}'): {}",
        prompt,
        CANCEL_CHAR,
        if hex { "0x" } else { "" }
    );
    con.flush();

    let Some(line) = con.read_line() else {
        return NumInput::Cancel;
    };
    let line = line.trim();
    if line.is_empty() {
        return NumInput::Cancel;
    }
    if line
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&CANCEL_CHAR))
    {
        return NumInput::Cancel;
    }

    let parsed = if hex {
        let digits = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line);
        u64::from_str_radix(digits, 16)
    } else {
        line.parse::<u64>()
    };
    let Ok(value) = parsed else {
        return NumInput::Cancel;
    };

    if max > min && (value < min || value > max) {
        print_range_error(con, hex, min, max);
        return NumInput::Cancel;
    }

    let cap = width_max(width_bytes);
    if value > cap {
        print_range_error(con, hex, 0, cap);
        return NumInput::Cancel;
    }

    NumInput::Value(value)
}

fn print_range_error(con: &mut Console<'_>, hex: bool, min: u64, max: u64) {
    if hex {
        cprintln!(con, "Invalid input: Input must be between 0x{min:X} and 0x{max:X}");
    } else {
        cprintln!(con, "Invalid input: Input must be between {min} and {max}");
    }
}

fn width_max(width_bytes: usize) -> u64 {
    match width_bytes {
        1 => u8::MAX as u64,
        2 => u16::MAX as u64,
        4 => u32::MAX as u64,
        _ => u64::MAX,
    }
}

/// Prompts for a menu selection in `1..=max`, with [`EXIT_MENU`] always
/// accepted. Out-of-range or unparseable input prints an error and yields
/// [`MenuInput::Invalid`]. End of input is treated as exit so a closed
/// stdin unwinds the menu stack.
pub fn read_menu_option(con: &mut Console<'_>, max: u64) -> MenuInput {
    cprint!(con, "Enter option: ");
    con.flush();

    let Some(line) = con.read_line() else {
        return MenuInput::Exit;
    };
    let Ok(option) = line.trim().parse::<u64>() else {
        cprintln!(con, "Invalid option\n");
        return MenuInput::Invalid;
    };
    if option == EXIT_MENU {
        return MenuInput::Exit;
    }
    if (1..=max).contains(&option) {
        return MenuInput::Choice(option);
    }
    if max == 1 {
        cprintln!(con, "Invalid option: Option must be 1, or {EXIT_MENU} to exit\n");
    } else {
        cprintln!(
            con,
            "Invalid option: Option must be between 1 - {max}, or {EXIT_MENU} to exit\n"
        );
    }
    MenuInput::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(script: &str, hex: bool, width: usize, min: u64, max: u64) -> (NumInput, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();
        let result = {
            let mut con = Console::new(&mut input, &mut output);
            read_number(&mut con, "Enter value", hex, width, min, max)
        };
        (result, String::from_utf8(output).expect("console output is utf-8"))
    }

    #[test]
    fn decimal_round_trip() {
        let value = 40_000_u64;
        let (result, _) = prompt(&format!("{value}\n"), false, 4, 0, 0);
        assert_eq!(result, NumInput::Value(value), "formatted value should parse back");
    }

    #[test]
    fn hex_round_trip_with_and_without_prefix() {
        let value = 0xDEAD_BEEF_u64;
        let (bare, _) = prompt(&format!("{value:X}\n"), true, 8, 0, 0);
        assert_eq!(bare, NumInput::Value(value));
        let (prefixed, _) = prompt(&format!("0x{value:X}\n"), true, 8, 0, 0);
        assert_eq!(prefixed, NumInput::Value(value));
    }

    #[test]
    fn cancel_character_always_cancels() {
        for script in ["x\n", "X\n", "xyz\n"] {
            let (result, _) = prompt(script, true, 8, 0, 0);
            assert_eq!(result, NumInput::Cancel, "input {script:?} should cancel");
        }
    }

    #[test]
    fn empty_line_and_garbage_cancel() {
        let (empty, _) = prompt("\n", false, 4, 0, 0);
        assert_eq!(empty, NumInput::Cancel);
        let (garbage, _) = prompt("not-a-number\n", false, 4, 0, 0);
        assert_eq!(garbage, NumInput::Cancel);
        let (eof, _) = prompt("", false, 4, 0, 0);
        assert_eq!(eof, NumInput::Cancel, "end of input should cancel");
    }

    #[test]
    fn range_violation_prints_error_and_cancels() {
        let (result, output) = prompt("9\n", false, 4, 1, 5);
        assert_eq!(result, NumInput::Cancel);
        assert!(
            output.contains("Input must be between 1 and 5"),
            "range error should be printed, got: {output}"
        );
    }

    #[test]
    fn value_wider_than_requested_width_is_rejected() {
        let (result, output) = prompt("0x1FF\n", true, 1, 0, 0);
        assert_eq!(result, NumInput::Cancel, "0x1FF does not fit in one byte");
        assert!(output.contains("0xFF"), "width bound should appear in the error");
    }

    #[test]
    fn menu_option_outcomes() {
        let run = |script: &str, max: u64| {
            let mut input = Cursor::new(script.as_bytes().to_vec());
            let mut output: Vec<u8> = Vec::new();
            let mut con = Console::new(&mut input, &mut output);
            read_menu_option(&mut con, max)
        };
        assert_eq!(run("3\n", 4), MenuInput::Choice(3));
        assert_eq!(run("99\n", 4), MenuInput::Exit);
        assert_eq!(run("7\n", 4), MenuInput::Invalid);
        assert_eq!(run("abc\n", 4), MenuInput::Invalid);
        assert_eq!(run("", 4), MenuInput::Exit, "end of input should exit");
    }
}
