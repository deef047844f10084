use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    // Leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// "1 device" / "3 devices"
pub(crate) fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_display("associated successfully", 10), "associat..");
        assert_eq!(truncate_display("short", 10), "short");
    }

    #[test]
    fn truncate_accented() {
        // Operator names from Brazilian spreadsheets
        assert_eq!(truncate_display("Operação Norte", 8), "Operaç..");
    }

    #[test]
    fn truncate_tiny_width() {
        assert_eq!(truncate_display("abc", 1), "a");
        assert_eq!(truncate_display("abc", 0), "");
    }

    #[test]
    fn pad_right_fills_and_cuts() {
        assert_eq!(pad_right("ok", 5), "ok   ");
        assert_eq!(pad_right("blocked-by-policy", 8), "blocke..");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "device"), "1 device");
        assert_eq!(plural(0, "device"), "0 devices");
        assert_eq!(plural(4, "row"), "4 rows");
    }
}
