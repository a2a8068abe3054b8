use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Decodes the ninth column, `key1=value1;key2=value2;...`.
///
/// Keys and values are trimmed and values are percent-decoded.
/// Segments without a `=` are skipped, as is a lone `.` column. A
/// repeated key keeps its last value.
pub fn parse_attributes(column: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    if column.trim() == "." {
        return attributes;
    }

    for segment in column.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let Some((key, value)) = segment.split_once('=') else {
            log::trace!("skipping attribute segment without `=`: {segment}");
            continue;
        };

        let value = percent_decode_str(value.trim()).decode_utf8_lossy();
        attributes.insert(key.trim().to_string(), value.into_owned());
    }

    attributes
}
