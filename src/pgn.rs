//! PGN export of finished games.

use time::{format_description, OffsetDateTime};

use crate::game_runner::GameRecord;

const MAX_LINE_LEN: usize = 80;

/// Local date formatted for the `Date` tag, `????.??.??` if it cannot be formatted.
pub fn today() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_description::parse("[year].[month].[day]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| "????.??.??".to_string())
}

/// One PGN entry: tag pairs, a blank line, then the movetext ending with the result.
///
/// The entry ends with a newline. Entries in a file are separated by an extra blank line,
/// which is up to the writer.
pub fn to_pgn(record: &GameRecord) -> String {
    let mut out = String::new();
    let round = record.round.to_string();
    let plies = record.moves.len().to_string();
    let tags = [
        ("Event", record.event.as_str()),
        ("Site", "?"),
        ("Date", record.date.as_str()),
        ("Round", round.as_str()),
        ("White", record.white.as_str()),
        ("Black", record.black.as_str()),
        ("Result", record.result.token()),
        ("Termination", record.termination.pgn_tag()),
        ("PlyCount", plies.as_str()),
    ];
    for (name, value) in tags {
        out.push_str(&format!("[{name} \"{}\"]\n", escape(value)));
    }
    out.push('\n');
    out.push_str(&movetext(record));
    out.push('\n');
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn movetext(record: &GameRecord) -> String {
    let mut tokens = Vec::with_capacity(record.moves.len() * 3 / 2 + 1);
    for (ply, san) in record.moves.iter().enumerate() {
        if ply % 2 == 0 {
            tokens.push(format!("{}.", ply / 2 + 1));
        }
        tokens.push(san.clone());
    }
    tokens.push(record.result.token().to_string());

    let mut text = String::new();
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > MAX_LINE_LEN {
            text.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            text.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        text.push_str(&token);
    }
    text
}
