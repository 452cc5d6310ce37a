//! Human-readable request and response dumps for debug mode.

use std::collections::HashMap;
use std::fmt::Write as _;

use bytes::Bytes;
use roundtrip_core::{Request, Response};

/// `tracing` target of the dumps.
pub const DUMP_TARGET: &str = "roundtrip::dump";

fn write_headers(out: &mut String, headers: &HashMap<String, String>) {
    let mut sorted: Vec<_> = headers.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()));
    for (name, value) in sorted {
        let _ = writeln!(out, "{name}: {value}");
    }
}

fn write_body(out: &mut String, body: &[u8]) {
    if !body.is_empty() {
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(body));
    }
}

/// Request line, headers sorted by name, then the body.
#[must_use]
pub fn request(request: &Request<Bytes>) -> String {
    let mut out = format!("{} {}\n", request.method(), request.url());
    write_headers(&mut out, request.headers());
    write_body(&mut out, request.body().map_or(&[][..], |body| &body[..]));
    out
}

/// Status line, headers sorted by name, then the body.
#[must_use]
pub fn response(response: &Response<Bytes>) -> String {
    let mut out = format!("HTTP {}\n", response.status());
    write_headers(&mut out, response.headers());
    write_body(&mut out, response.body());
    out
}

#[cfg(test)]
mod tests {
    use roundtrip_core::Method;

    use super::*;

    #[test]
    fn request_dump() {
        let url = url::Url::parse("https://api.example.com/users?page=2").expect("valid URL");
        let request = Request::<Bytes>::builder(Method::Post, url)
            .header("User-Agent", "roundtrip/test")
            .json(&serde_json::json!({"name": "ferris"}))
            .expect("json")
            .build();

        assert_eq!(
            request_dump_lines(&super::request(&request)),
            vec![
                "POST https://api.example.com/users?page=2",
                "Content-Type: application/json",
                "User-Agent: roundtrip/test",
                "",
                r#"{"name":"ferris"}"#,
            ]
        );
    }

    #[test]
    fn response_dump_without_body() {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), "0".to_string());
        let response = Response::new(204, headers, Bytes::new());

        assert_eq!(super::response(&response), "HTTP 204\ncontent-length: 0\n");
    }

    fn request_dump_lines(dump: &str) -> Vec<&str> {
        dump.lines().collect()
    }
}
