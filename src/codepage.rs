//! Codepage table: language-driver-id byte <-> encoding name (spec 4.2).
//! Grounded on the teacher's `foxpro::cp_mapper`, generalized into a
//! bidirectional table that also accepts the long form of a codepage name.

use crate::error::{Result, XbaseError};
use encoding_rs::{Encoding, BIG5, EUC_KR, GBK, SHIFT_JIS, WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_874};

/// One entry: the header byte, the short codec name (as understood by
/// `encoding_rs`/the Windows codepage family), and a human label.
struct Entry {
    id: u8,
    short: &'static str,
    label: &'static str,
}

const TABLE: &[Entry] = &[
    Entry { id: 0x00, short: "ascii", label: "ASCII (no codepage)" },
    Entry { id: 0x01, short: "cp437", label: "U.S. MS-DOS" },
    Entry { id: 0x02, short: "cp850", label: "International MS-DOS" },
    Entry { id: 0x03, short: "cp1252", label: "Windows ANSI" },
    Entry { id: 0x04, short: "cp10000", label: "Standard Macintosh" },
    Entry { id: 100, short: "cp852", label: "Eastern European MS-DOS" },
    Entry { id: 101, short: "cp866", label: "Russian MS-DOS" },
    Entry { id: 102, short: "cp865", label: "Nordic MS-DOS" },
    Entry { id: 103, short: "cp861", label: "Icelandic MS-DOS" },
    Entry { id: 104, short: "cp895", label: "Kamenicky (Czech) MS-DOS" },
    Entry { id: 105, short: "cp620", label: "Mazovia (Polish) MS-DOS" },
    Entry { id: 106, short: "cp737", label: "Greek MS-DOS" },
    Entry { id: 107, short: "cp857", label: "Turkish MS-DOS" },
    Entry { id: 120, short: "cp950", label: "Traditional Chinese" },
    Entry { id: 121, short: "cp949", label: "Korean" },
    Entry { id: 122, short: "cp936", label: "Simplified Chinese" },
    Entry { id: 123, short: "cp932", label: "Japanese" },
    Entry { id: 124, short: "tis620", label: "Thai" },
    Entry { id: 125, short: "cp1255", label: "Hebrew" },
    Entry { id: 126, short: "cp1256", label: "Arabic" },
    Entry { id: 150, short: "cp10007", label: "Russian Macintosh" },
    Entry { id: 151, short: "cp10029", label: "Eastern European Macintosh" },
    Entry { id: 152, short: "cp10006", label: "Greek Macintosh" },
    Entry { id: 200, short: "cp1250", label: "Eastern European Windows" },
    Entry { id: 201, short: "cp1251", label: "Russian Windows" },
    Entry { id: 202, short: "cp1254", label: "Turkish Windows" },
    Entry { id: 203, short: "cp1253", label: "Greek Windows" },
];

/// Map a header byte 29 value to the short codepage name used elsewhere in
/// this crate (and accepted by `encoding_rs::Encoding::for_label`).
pub fn name_for_id(id: u8) -> Result<&'static str> {
    TABLE
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.short)
        .ok_or(XbaseError::MalformedHeader {
            detail: format!("unknown codepage id {}", id),
        })
}

/// Map a short codepage name back to its header byte.
pub fn id_for_name(name: &str) -> Result<u8> {
    let needle = name.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|e| e.short.eq_ignore_ascii_case(&needle) || e.label.eq_ignore_ascii_case(&needle))
        .map(|e| e.id)
        .ok_or_else(|| XbaseError::FieldSpec {
            detail: format!("unrecognized codepage '{}'", name),
        })
}

/// Human label for a codepage, by either its short or long form.
pub fn label_for_name(name: &str) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|e| e.short.eq_ignore_ascii_case(name) || e.label.eq_ignore_ascii_case(name))
        .map(|e| e.label)
}

/// Resolve a short codepage name to the `encoding_rs` static encoding used
/// to transcode Character/Memo fields. `encoding_rs` only ships the WHATWG
/// encoding set, so the legacy MS-DOS codepages (cp437, cp850, ...) map to
/// their nearest Windows codepage rather than their exact DOS glyph table --
/// every dialect this crate reads stores 8-bit text either way.
pub fn encoding_for_name(name: &str) -> Result<&'static Encoding> {
    let needle = name.to_ascii_lowercase();
    let encoding = match needle.as_str() {
        "ascii" | "cp437" | "cp850" | "cp1252" | "cp10000" | "cp852" | "cp895" | "cp620" => WINDOWS_1252,
        "cp866" | "cp10007" | "cp1251" => WINDOWS_1251,
        "cp865" | "cp861" => WINDOWS_1252,
        "cp737" | "cp10006" | "cp1253" => WINDOWS_1253,
        "cp857" | "cp1254" => WINDOWS_1254,
        "cp950" => BIG5,
        "cp949" => EUC_KR,
        "cp936" => GBK,
        "cp932" => SHIFT_JIS,
        "tis620" => WINDOWS_874,
        "cp1255" => WINDOWS_1255,
        "cp1256" => WINDOWS_1256,
        "cp1250" | "cp10029" => WINDOWS_1250,
        _ => {
            return Err(XbaseError::FieldSpec {
                detail: format!("no encoding mapping for codepage '{}'", name),
            })
        }
    };
    Ok(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrips_through_name() {
        for id in [0x01u8, 0x03, 100, 122, 203] {
            let name = name_for_id(id).unwrap();
            assert_eq!(id_for_name(name).unwrap(), id);
        }
    }

    #[test]
    fn unknown_id_is_error() {
        assert!(name_for_id(99).is_err());
    }

    #[test]
    fn encoding_for_name_resolves_ascii_and_cp1252() {
        assert_eq!(encoding_for_name("ascii").unwrap().name(), "windows-1252");
        assert_eq!(encoding_for_name("cp1252").unwrap().name(), "windows-1252");
    }

    #[test]
    fn encoding_for_name_rejects_unknown_name() {
        assert!(encoding_for_name("does-not-exist").is_err());
    }

    #[test]
    fn accepts_short_or_long_form() {
        assert_eq!(id_for_name("cp1252").unwrap(), 0x03);
        assert_eq!(id_for_name("Windows ANSI").unwrap(), 0x03);
        assert_eq!(id_for_name("CP1252").unwrap(), 0x03);
    }
}
