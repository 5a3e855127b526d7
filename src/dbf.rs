// Copyright 2018 The GeoRust Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! dBASE attribute tables (`.dbf`) of a Shapefile.

use crate::json::{JsonObject, JsonValue};
use crate::util::{expect_u16_le, expect_u32_le, expect_u8};

const FIELD_DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;

/// Text encoding of character fields, usually given by a `.cpg` file.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Encoding {
    /// The code page named by the `.cpg`.
    Known(&'static encoding_rs::Encoding),
    /// UTF-8 when valid, Windows-1252 otherwise.
    #[default]
    Detect,
}

impl Encoding {
    /// Resolve a `.cpg` label. ESRI writes either WHATWG-style names
    /// (`UTF-8`, `ISO-8859-1`) or bare Windows code page numbers (`1252`,
    /// `ANSI 1252`, `88591`).
    pub fn from_cpg(text: &str) -> Self {
        let label = text.trim();
        let upper = label.to_ascii_uppercase();
        let number = upper
            .strip_prefix("ANSI")
            .or_else(|| upper.strip_prefix("CP"))
            .unwrap_or(&upper)
            .trim();
        let resolved = match number.parse::<u32>() {
            Ok(code_page) => code_page_label(code_page)
                .and_then(|l| encoding_rs::Encoding::for_label(l.as_bytes())),
            Err(_) => encoding_rs::Encoding::for_label(label.as_bytes()),
        };
        resolved.map_or(Encoding::Detect, Encoding::Known)
    }

    fn decode(self, bytes: &[u8]) -> String {
        let encoding = match self {
            Encoding::Known(encoding) => encoding,
            Encoding::Detect => match std::str::from_utf8(bytes) {
                Ok(s) => return s.to_owned(),
                Err(_) => encoding_rs::WINDOWS_1252,
            },
        };
        encoding.decode_without_bom_handling(bytes).0.into_owned()
    }
}

fn code_page_label(code_page: u32) -> Option<String> {
    let label = match code_page {
        65001 => "utf-8".to_owned(),
        874 | 1250..=1258 => format!("windows-{}", code_page),
        866 => "ibm866".to_owned(),
        932 => "shift_jis".to_owned(),
        936 => "gbk".to_owned(),
        949 => "euc-kr".to_owned(),
        950 => "big5".to_owned(),
        20866 => "koi8-r".to_owned(),
        21866 => "koi8-u".to_owned(),
        28591..=28606 => format!("iso-8859-{}", code_page - 28590),
        88591..=88599 => format!("iso-8859-{}", code_page - 88590),
        _ => return None,
    };
    Some(label)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Field {
    name: String,
    kind: u8,
    offset: usize,
    len: usize,
    decimals: u8,
}

/// Column names and rows of a `.dbf` file.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<JsonObject>,
}

pub fn read_table(bytes: &[u8], encoding: Encoding) -> Result<Table, String> {
    let record_count = expect_u32_le(bytes, 4)? as usize;
    let header_len = expect_u16_le(bytes, 8)? as usize;
    let record_len = expect_u16_le(bytes, 10)? as usize;
    let fields = read_fields(bytes, header_len, record_len, encoding)?;

    let needed = record_count
        .checked_mul(record_len)
        .and_then(|n| n.checked_add(header_len))
        .ok_or_else(|| "record count overflows".to_owned())?;
    if needed > bytes.len() {
        return Err(format!(
            "{} records of {} bytes do not fit a {} byte file",
            record_count,
            record_len,
            bytes.len()
        ));
    }

    let rows = (0..record_count)
        .map(|i| {
            let start = header_len + i * record_len;
            let record = &bytes[start..start + record_len];
            fields
                .iter()
                .map(|f| {
                    let raw = &record[f.offset..f.offset + f.len];
                    (f.name.clone(), decode_value(f, raw, encoding))
                })
                .collect::<JsonObject>()
        })
        .collect();

    Ok(Table {
        columns: fields.into_iter().map(|f| f.name).collect(),
        rows,
    })
}

fn read_fields(
    bytes: &[u8],
    header_len: usize,
    record_len: usize,
    encoding: Encoding,
) -> Result<Vec<Field>, String> {
    let mut fields: Vec<Field> = Vec::new();
    // the deletion flag takes the first byte of every record
    let mut offset = 1;
    let mut at = 32;
    loop {
        if expect_u8(bytes, at)? == HEADER_TERMINATOR {
            break;
        }
        if at + FIELD_DESCRIPTOR_LEN > header_len {
            return Err("field descriptors run past the header".to_owned());
        }
        let descriptor = bytes
            .get(at..at + FIELD_DESCRIPTOR_LEN)
            .ok_or_else(|| format!("unexpected end of data in field descriptor at byte {}", at))?;
        let name_len = descriptor[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let base = encoding.decode(&descriptor[..name_len]).trim().to_owned();
        let mut name = base.clone();
        let mut n = 1;
        while fields.iter().any(|f| f.name == name) {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        let len = descriptor[16] as usize;
        fields.push(Field {
            name,
            kind: descriptor[11],
            offset,
            len,
            decimals: descriptor[17],
        });
        offset += len;
        at += FIELD_DESCRIPTOR_LEN;
    }
    if offset > record_len {
        return Err(format!(
            "fields need {} bytes but records are {} bytes",
            offset, record_len
        ));
    }
    Ok(fields)
}

fn decode_value(field: &Field, raw: &[u8], encoding: Encoding) -> JsonValue {
    let text = encoding.decode(raw);
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\0');
    match field.kind {
        b'C' => JsonValue::String(text.trim_end_matches([' ', '\0']).to_owned()),
        b'N' | b'F' => decode_number(trimmed, field.decimals),
        b'L' => match trimmed.chars().next() {
            Some('T' | 't' | 'Y' | 'y') => JsonValue::Bool(true),
            Some('F' | 'f' | 'N' | 'n') => JsonValue::Bool(false),
            _ => JsonValue::Null,
        },
        b'D' if trimmed.is_empty() => JsonValue::Null,
        b'D' if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) => {
            JsonValue::String(format!(
                "{}-{}-{}",
                &trimmed[..4],
                &trimmed[4..6],
                &trimmed[6..]
            ))
        }
        _ => JsonValue::String(trimmed.to_owned()),
    }
}

fn decode_number(text: &str, decimals: u8) -> JsonValue {
    if text.is_empty() || text.bytes().all(|b| b == b'*') {
        return JsonValue::Null;
    }
    if decimals == 0 {
        if let Ok(i) = text.parse::<i64>() {
            return JsonValue::from(i);
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(JsonValue::Null, JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::{read_table, Encoding};
    use crate::test_support::dbf;
    use serde_json::json;

    #[test]
    fn typed_columns() {
        let bytes = dbf(
            &[
                ("NAME", b'C', 10, 0),
                ("POP", b'N', 10, 0),
                ("AREA", b'N', 8, 2),
                ("CAPITAL", b'L', 1, 0),
                ("FOUNDED", b'D', 8, 0),
            ],
            &[
                &["Paris", "2140526", "105.40", "T", "19000101"],
                &["", "", "1.5", "?", ""],
            ],
            false,
        );
        let table = read_table(&bytes, Encoding::Detect).unwrap();
        assert_eq!(table.columns, vec!["NAME", "POP", "AREA", "CAPITAL", "FOUNDED"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["NAME"], json!("Paris"));
        assert_eq!(table.rows[0]["POP"], json!(2140526));
        assert_eq!(table.rows[0]["AREA"], json!(105.4));
        assert_eq!(table.rows[0]["CAPITAL"], json!(true));
        assert_eq!(table.rows[0]["FOUNDED"], json!("1900-01-01"));
        assert_eq!(table.rows[1]["NAME"], json!(""));
        assert_eq!(table.rows[1]["POP"], json!(null));
        assert_eq!(table.rows[1]["CAPITAL"], json!(null));
        assert_eq!(table.rows[1]["FOUNDED"], json!(null));
    }

    #[test]
    fn latin1_text() {
        let bytes = dbf(&[("NAME", b'C', 12, 0)], &[&["Zürich"]], true);
        let table = read_table(&bytes, Encoding::from_cpg("ISO-8859-1")).unwrap();
        assert_eq!(table.rows[0]["NAME"], json!("Zürich"));
        // invalid UTF-8 falls back to Latin-1 without a code page
        let table = read_table(&bytes, Encoding::Detect).unwrap();
        assert_eq!(table.rows[0]["NAME"], json!("Zürich"));
    }

    #[test]
    fn duplicate_names_are_suffixed() {
        let bytes = dbf(&[("A", b'C', 2, 0), ("A", b'C', 2, 0)], &[&["x", "y"]], false);
        let table = read_table(&bytes, Encoding::Known(encoding_rs::UTF_8)).unwrap();
        assert_eq!(table.columns, vec!["A", "A_2"]);
    }

    #[test]
    fn truncated_table_is_rejected() {
        let mut bytes = dbf(&[("NAME", b'C', 10, 0)], &[&["a"], &["b"]], false);
        bytes.truncate(bytes.len() - 8);
        assert!(read_table(&bytes, Encoding::Known(encoding_rs::UTF_8)).is_err());
    }

    #[test]
    fn windows_1252_punctuation() {
        let mut bytes = dbf(&[("NOTE", b'C', 6, 0)], &[&["Xbc"]], false);
        // header is 32 + 32 + 1 bytes, then the deletion flag
        assert_eq!(bytes[66], b'X');
        bytes[66] = 0x80;
        bytes[67] = 0x92;
        let table = read_table(&bytes, Encoding::from_cpg("1252")).unwrap();
        assert_eq!(table.rows[0]["NOTE"], json!("€’c"));
        let table = read_table(&bytes, Encoding::Detect).unwrap();
        assert_eq!(table.rows[0]["NOTE"], json!("€’c"));
    }

    #[test]
    fn header_longer_than_file_is_an_error() {
        let mut bytes = vec![0u8; 40];
        bytes[0] = 0x03;
        bytes[8..10].copy_from_slice(&200u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&10u16.to_le_bytes());
        bytes[32] = b'N';
        assert!(read_table(&bytes, Encoding::Detect).is_err());
    }

    #[test]
    fn code_pages() {
        assert_eq!(Encoding::from_cpg("UTF-8\n"), Encoding::Known(encoding_rs::UTF_8));
        assert_eq!(Encoding::from_cpg("65001"), Encoding::Known(encoding_rs::UTF_8));
        assert_eq!(Encoding::from_cpg("1252"), Encoding::Known(encoding_rs::WINDOWS_1252));
        assert_eq!(Encoding::from_cpg("ANSI 1251"), Encoding::Known(encoding_rs::WINDOWS_1251));
        assert_eq!(Encoding::from_cpg("88592"), Encoding::Known(encoding_rs::ISO_8859_2));
        assert_eq!(Encoding::from_cpg("KOI8-R"), Encoding::Known(encoding_rs::KOI8_R));
        assert_eq!(Encoding::from_cpg("nonsense"), Encoding::Detect);
    }
}
