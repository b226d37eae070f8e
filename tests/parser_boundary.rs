#![allow(missing_docs)]

use partbound::{BoundaryPattern, TrailerKind, extract_multipart_boundary};

#[test]
fn extracts_boundary_from_content_type() {
    let boundary = extract_multipart_boundary("multipart/form-data; boundary=abc123")
        .expect("boundary should parse");
    assert_eq!(boundary, "abc123");
}

#[test]
fn extracts_quoted_boundary_from_other_multipart_types() {
    let boundary = extract_multipart_boundary("multipart/mixed; boundary=\"my-boundary\"")
        .expect("quoted boundary should parse");
    assert_eq!(boundary, "my-boundary");
}

#[test]
fn rejects_non_multipart_content_type() {
    let err = extract_multipart_boundary("application/json").expect_err("must fail");
    assert_err_contains(&err.to_string(), "multipart media type");
}

#[test]
fn rejects_missing_boundary_parameter() {
    let err = extract_multipart_boundary("multipart/form-data").expect_err("must fail");
    assert_err_contains(&err.to_string(), "missing multipart boundary");
}

#[test]
fn rejects_invalid_boundary_characters() {
    let err = extract_multipart_boundary("multipart/form-data; boundary=abc@123")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "invalid");
}

#[test]
fn rejects_boundary_that_is_too_long() {
    let long_boundary = "a".repeat(71);
    let header = format!("multipart/form-data; boundary={long_boundary}");
    let err = extract_multipart_boundary(&header).expect_err("must fail");
    assert_err_contains(&err.to_string(), "cannot exceed 70");
}

#[test]
fn pattern_prefixes_token_with_dashes() {
    let pattern = BoundaryPattern::new("BOUNDARY").expect("token should be valid");
    assert_eq!(pattern.as_bytes(), b"--BOUNDARY");
    assert_eq!(pattern.min_lookahead(), 10);

    let delimiter =
        BoundaryPattern::with_leading_line_break("BOUNDARY").expect("token should be valid");
    assert_eq!(delimiter.as_bytes(), b"\r\n--BOUNDARY");
}

#[test]
fn rejects_empty_or_multiline_tokens() {
    let err = BoundaryPattern::new("").expect_err("must fail");
    assert_err_contains(&err.to_string(), "cannot be empty");

    let err = BoundaryPattern::new("a\r\nb").expect_err("must fail");
    assert_err_contains(&err.to_string(), "CRLF");
}

#[test]
fn skip_table_follows_horspool_construction() {
    let pattern = BoundaryPattern::new("abcd").expect("token should be valid");

    // "--abcd": last byte maps to 1, earlier bytes to their distance from the end.
    assert_eq!(pattern.skip(b'd'), 1);
    assert_eq!(pattern.skip(b'c'), 1);
    assert_eq!(pattern.skip(b'b'), 2);
    assert_eq!(pattern.skip(b'a'), 3);
    assert_eq!(pattern.skip(b'-'), 4);
    assert_eq!(pattern.skip(b'z'), 6);
}

#[test]
fn skip_table_keeps_rightmost_occurrence() {
    let pattern = BoundaryPattern::new("x-y").expect("token should be valid");

    // "--x-y": the dash at index 3 wins over the leading dashes.
    assert_eq!(pattern.skip(b'-'), 1);
    assert_eq!(pattern.skip(b'x'), 2);
    assert_eq!(pattern.skip(b'y'), 1);
}

#[test]
fn classifies_boundary_trailers() {
    let pattern = BoundaryPattern::new("B").expect("token should be valid");

    assert_eq!(pattern.classify_trailer("\r\n"), TrailerKind::Ordinary);
    assert_eq!(pattern.classify_trailer("  \t\r\n"), TrailerKind::Ordinary);
    assert_eq!(pattern.classify_trailer(""), TrailerKind::Ordinary);
    assert_eq!(pattern.classify_trailer("--\r\n"), TrailerKind::Final);
    assert_eq!(pattern.classify_trailer("--   \r\n"), TrailerKind::Final);
    assert_eq!(pattern.classify_trailer("--"), TrailerKind::Final);
    assert_eq!(pattern.classify_trailer("junk\r\n"), TrailerKind::Malformed);
    assert_eq!(pattern.classify_trailer("---\r\n"), TrailerKind::Malformed);
}

fn assert_err_contains(actual: &str, expected_fragment: &str) {
    assert!(
        actual.contains(expected_fragment),
        "expected `{actual}` to contain `{expected_fragment}`"
    );
}
