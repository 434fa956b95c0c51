// Key/value response codec.
//
// Every CGI read answers with `key=value` lines terminated by `\r\n`
// (`table.General.MachineName=Cam2`, `version=2.800...`). Error answers
// are bare lines such as `Error` / `Bad Request!`, which are kept as keys
// with empty values so callers can still count lines.

use std::collections::BTreeMap;

/// Flat key/value map decoded from a CGI response body.
pub type KeyValues = BTreeMap<String, String>;

/// Decode a CGI response body into a [`KeyValues`] map.
///
/// Each non-empty line is split at its first `=`; values may themselves
/// contain `=`. Duplicate keys keep the last value.
pub fn parse_key_values(body: &str) -> KeyValues {
    body.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('=') {
            Some((key, value)) => (key.trim().to_owned(), value.trim().to_owned()),
            None => (line.trim().to_owned(), String::new()),
        })
        .collect()
}

/// Merge `other` into `into`, overwriting on key collision.
pub fn merge_into(into: &mut KeyValues, other: KeyValues) {
    into.extend(other);
}
