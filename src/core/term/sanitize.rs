//! Plain-text view of PTY output
//!
//! Strips escape sequences and control bytes from a chunk so it can be
//! written to the log. Only LF and TAB survive. Each chunk is handled on its
//! own; a sequence split across chunks leaves its tail in the next one.

/// Remove escape sequences and control bytes except LF and TAB
pub fn sanitize(bytes: &[u8]) -> String {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;

        match byte {
            0x1B => i = skip_escape(bytes, i),
            b'\n' | b'\t' => out.push(byte),
            0x00..=0x1F | 0x7F => {}
            _ => out.push(byte),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Skip the body of an escape sequence starting after ESC; returns the index
/// of the first byte after it.
fn skip_escape(bytes: &[u8], mut i: usize) -> usize {
    let Some(&intro) = bytes.get(i) else {
        return i;
    };
    i += 1;

    match intro {
        b'[' => {
            while let Some(&b) = bytes.get(i) {
                i += 1;
                if (0x40..=0x7E).contains(&b) {
                    break;
                }
            }
        }
        b']' | b'P' | b'X' | b'^' | b'_' => {
            while let Some(&b) = bytes.get(i) {
                i += 1;
                if b == 0x07 {
                    break;
                }
                if b == 0x1B && bytes.get(i) == Some(&b'\\') {
                    i += 1;
                    break;
                }
            }
        }
        0x20..=0x2F => {
            // Intermediates then one final byte: ESC ( B
            while let Some(&b) = bytes.get(i) {
                i += 1;
                if !(0x20..=0x2F).contains(&b) {
                    break;
                }
            }
        }
        _ => {}
    }

    i
}
