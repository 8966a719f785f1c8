//! UTM parameter capture from a page URL.

use url::form_urlencoded;

use crate::error::Result;
use crate::record::{NewRecord, UtmField};

/// Extract UTM parameters from a raw query string (without the leading `?`).
///
/// Values are percent-decoded with `+` as space. When a parameter repeats,
/// the first occurrence wins. Returns `None` when no UTM parameter carries a
/// value, so plain dashboard visits are not recorded.
pub fn capture_from_query(query: &str) -> Result<Option<NewRecord>> {
    let mut record = NewRecord::default();

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        let Some(field) = UtmField::ALL.iter().find(|f| f.param_name() == key) else {
            continue;
        };
        if record.get(*field).is_none() {
            record.set(*field, Some(value.into_owned()));
        }
    }

    let record = record.checked()?;
    Ok(if record.is_empty() { None } else { Some(record) })
}

/// Extract UTM parameters from a full URL.
pub fn capture_from_url(url: &str) -> Result<Option<NewRecord>> {
    match url::Url::parse(url) {
        Ok(parsed) => capture_from_query(parsed.query().unwrap_or("")),
        Err(_) => Ok(None),
    }
}
