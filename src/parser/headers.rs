use http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::error::ParseError;

/// Headers of one multipart part with the commonly used fields pre-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHeaders {
    /// Raw header map as sent by the producer.
    pub map: HeaderMap,
    /// `name` parameter of `Content-Disposition`, when present.
    pub field_name: Option<String>,
    /// `filename` parameter of `Content-Disposition`, when present.
    pub file_name: Option<String>,
    /// Part content type, `text/plain` when absent per RFC 7578.
    pub content_type: mime::Mime,
}

/// Parses the header lines of a part, terminators already stripped.
pub fn parse_part_headers<'a, I>(lines: I) -> Result<PartHeaders, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map = HeaderMap::new();
    for line in lines {
        let Some((raw_name, raw_value)) = line.split_once(':') else {
            return Err(ParseError::new("invalid part header line"));
        };

        let name = raw_name
            .trim()
            .parse::<HeaderName>()
            .map_err(|_| ParseError::new("invalid part header name"))?;
        let value = HeaderValue::from_str(raw_value.trim())
            .map_err(|_| ParseError::new("invalid part header value"))?;
        map.append(name, value);
    }

    let (field_name, file_name) = match map.get(header::CONTENT_DISPOSITION) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| ParseError::new("Content-Disposition header must be ASCII"))?;
            (
                disposition_param(value, "name"),
                disposition_param(value, "filename"),
            )
        }
        None => (None, None),
    };

    let content_type = match map.get(header::CONTENT_TYPE) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<mime::Mime>().ok())
            .ok_or_else(|| ParseError::new("invalid part Content-Type header"))?,
        None => mime::TEXT_PLAIN,
    };

    Ok(PartHeaders {
        map,
        field_name,
        file_name,
        content_type,
    })
}

/// Looks up one parameter of a `Content-Disposition` value, unquoting it.
fn disposition_param(value: &str, key: &str) -> Option<String> {
    split_params(value).into_iter().skip(1).find_map(|segment| {
        let (raw_key, raw_value) = segment.split_once('=')?;
        if !raw_key.trim().eq_ignore_ascii_case(key) {
            return None;
        }

        let raw_value = raw_value.trim();
        Some(match raw_value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            Some(quoted) => unescape(quoted),
            None => raw_value.to_owned(),
        })
    })
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            _ => out.push(ch),
        }
    }
    out
}

fn split_params(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (index, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    segments.push(&value[start..]);
    segments
}
