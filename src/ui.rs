//! Console presentation: boxes, notices and amount/date formatting

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{self, Write};
use tracing::warn;

use crate::session::Renderer;
use crate::menu::{Notice, Screen};

pub const BOX_WIDTH: usize = 50;

/// `1234567.5` -> `1 234 567,50 Ar`; whole amounts drop the decimals.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::from(100)).trunc().to_u32().unwrap_or(0);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if cents == 0 {
        format!("{}{} Ar", sign, grouped)
    } else {
        format!("{}{},{:02} Ar", sign, grouped, cents)
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// Render a box with the title centered in the top border and each line centered.
pub fn draw_box(title: &str, lines: &[String]) -> String {
    let title = format!(" {} ", title);
    let title_len = title.chars().count();
    let width = BOX_WIDTH.max(title_len).max(lines.iter().map(|l| l.chars().count()).max().unwrap_or(0));
    let left = (width - title_len) / 2;

    let mut out = String::new();
    out.push('┌');
    out.push_str(&"─".repeat(left));
    out.push_str(&title);
    out.push_str(&"─".repeat(width - left - title_len));
    out.push_str("┐\n");

    for line in lines {
        let len = line.chars().count();
        let pad = (width - len) / 2;
        out.push('│');
        out.push_str(&" ".repeat(pad));
        out.push_str(line);
        out.push_str(&" ".repeat(width - len - pad));
        out.push_str("│\n");
    }

    out.push('└');
    out.push_str(&"─".repeat(width));
    out.push('┘');
    out
}

pub fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::Error(msg) => format!("❌ {}", msg),
        Notice::Success(msg) => format!("✅ {}", msg),
        Notice::Info(msg) => format!("ℹ️  {}", msg),
    }
}

/// Write a prompt with no trailing newline and flush it so it shows before the read.
pub fn write_prompt<W: Write>(out: &mut W, label: &str) -> io::Result<()> {
    out.write_all(label.as_bytes())?;
    out.flush()
}

/// Stdout renderer used by the binary
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn screen(&mut self, screen: &Screen) {
        println!("{}", draw_box(&screen.title, &screen.lines));
    }

    fn notice(&mut self, notice: &Notice) {
        println!("\n{}\n", format_notice(notice));
    }

    fn prompt(&mut self, label: &str) {
        if let Err(e) = write_prompt(&mut io::stdout().lock(), label) {
            warn!("Prompt not flushed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from(0)), "0 Ar");
        assert_eq!(format_amount(Decimal::from(500)), "500 Ar");
        assert_eq!(format_amount(Decimal::from(1000)), "1 000 Ar");
        assert_eq!(format_amount(Decimal::from(1_000_000)), "1 000 000 Ar");
        assert_eq!(format_amount(Decimal::new(12345, 1)), "1 234,50 Ar");
        assert_eq!(format_amount(Decimal::from(-2500)), "-2 500 Ar");
    }

    #[test]
    fn test_draw_box_alignment() {
        let drawn = draw_box("SOLDE", &["Solde: 1 000 Ar".to_string(), "1. Retour".to_string()]);
        let rows: Vec<&str> = drawn.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].contains(" SOLDE "));
        let widths: Vec<usize> = rows.iter().map(|r| r.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == BOX_WIDTH + 2));
    }

    #[test]
    fn test_draw_box_grows_for_long_lines() {
        let long = "x".repeat(70);
        let drawn = draw_box("T", &[long]);
        assert!(drawn.lines().all(|r| r.chars().count() == 72));
    }

    struct Unflushable(Vec<u8>);

    impl Write for Unflushable {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_prompt() {
        let mut out = Vec::new();
        write_prompt(&mut out, "Votre choix: ").unwrap();
        assert_eq!(out, b"Votre choix: ");

        let mut broken = Unflushable(Vec::new());
        let err = write_prompt(&mut broken, "Montant: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(broken.0, b"Montant: ");
    }

    #[test]
    fn test_notice_prefixes() {
        assert!(format_notice(&Notice::Error("boom".into())).starts_with("❌"));
        assert!(format_notice(&Notice::Success("ok".into())).starts_with("✅"));
    }
}
