use super::{parse_response, Auth, SaslResponse};

#[test]
fn external_ascii_hex() {
    assert_eq!(
        Auth::external_from_u32_ascii_hex(&mut [0; 32], 1000),
        Auth::External(b"31303030")
    );
    assert_eq!(
        Auth::external_from_u32_ascii_hex(&mut [0; 32], 0),
        Auth::External(b"30")
    );
    assert_eq!(
        Auth::external_from_u32_ascii_hex(&mut [0; 32], u32::MAX),
        Auth::External(b"34323934393637323935")
    );
}

#[test]
fn response_ok() {
    let response = parse_response(b"OK 1234deadbeef\r\n").unwrap();
    let SaslResponse::Ok(guid) = response;
    assert_eq!(format!("{guid:?}"), "Guid(\"1234deadbeef\")");

    // The transport strips the trailing newline before handing the line
    // over.
    assert!(parse_response(b"OK 1234deadbeef\r").is_ok());
    assert!(parse_response(b"OK 1234deadbeef").is_ok());
}

#[test]
fn response_rejected() {
    let error = parse_response(b"REJECTED EXTERNAL\r\n").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Authentication rejected: REJECTED EXTERNAL"
    );
}

#[test]
fn response_malformed() {
    assert!(parse_response(b"OK\r\n").is_err());
    assert!(parse_response(b"").is_err());
}
