use encoding_rs::{Encoding, UTF_8, WINDOWS_1251, WINDOWS_1252};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Tried in order; the last one maps every byte and always succeeds on non-empty input.
pub const CANDIDATE_ENCODINGS: [&Encoding; 3] = [UTF_8, WINDOWS_1251, WINDOWS_1252];

/// Decodes one physical line. Never fails: when no candidate yields a non-empty
/// string the bytes are decoded as UTF-8 with replacement characters.
pub fn decode_line(bytes: &[u8]) -> String {
    for encoding in CANDIDATE_ENCODINGS {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            if !text.is_empty() {
                return text.into_owned();
            }
        }
    }

    let (text, _) = UTF_8.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Splits raw track-list bytes into decoded lines. CR, LF and CRLF all terminate a
/// line; a CRLF pair yields one extra empty line, which the parser skips as blank.
pub fn decode_lines(data: &[u8]) -> Vec<String> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    data.split(|byte| *byte == b'\n' || *byte == b'\r')
        .map(decode_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_first() {
        assert_eq!(decode_line("TITLE \"Café\"".as_bytes()), "TITLE \"Café\"");
    }

    #[test]
    fn falls_back_to_cyrillic_codepage() {
        let (bytes, _, had_errors) = WINDOWS_1251.encode("TITLE \"Привет\"");
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        assert_eq!(decode_line(&bytes), "TITLE \"Привет\"");
    }

    #[test]
    fn empty_input_decodes_to_empty_string() {
        assert_eq!(decode_line(b""), "");
    }

    #[test]
    fn splits_on_every_line_terminator_and_strips_bom() {
        let data = b"\xEF\xBB\xBFREM DATE 1999\r\nTITLE \"A\"\rPERFORMER \"B\"\n";
        let lines: Vec<String> = decode_lines(data)
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect();

        assert_eq!(lines, vec!["REM DATE 1999", "TITLE \"A\"", "PERFORMER \"B\""]);
    }
}
