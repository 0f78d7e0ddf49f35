//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::{Deserialize, Serialize};

    use crate::parser::{HttpRequest, Method, HttpVersion, Error, find_header_end, parse_request};

    fn request_with(headers: &[(&str, &str)], body: &[u8]) -> HttpRequest {
        let headers: HashMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HttpRequest::new(Method::POST, "/submit".to_string(), HttpVersion::Http11, headers)
            .with_body(body.to_vec())
    }

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /user/7 HTTP/1.1\r\nHost: x\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/user/7");
        assert_eq!(result.version, HttpVersion::Http11);
        assert_eq!(result.headers.len(), 1);
        assert_eq!(result.headers.get("Host").unwrap(), "x");
        assert!(result.body.is_empty());
    }

    #[test]
    fn test_parse_request_with_multiple_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test\r\nAccept: */*\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
        assert_eq!(result.headers.get("Accept").unwrap(), "*/*");
    }

    #[test]
    fn test_header_names_stored_as_sent_looked_up_case_insensitively() {
        let request = b"GET /index.html HTTP/1.1\r\ncontent-TYPE: text/plain\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.headers.contains_key("content-TYPE"));
        assert!(!result.headers.contains_key("Content-Type"));
        assert_eq!(result.get_header("Content-Type").unwrap(), "text/plain");
        assert!(result.has_header("CONTENT-TYPE"));
        assert!(!result.has_header("Host"));
    }

    #[test]
    fn test_host_header_not_required() {
        let request = b"GET /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_unknown_method_token_is_kept() {
        let request = b"PURGE /cache HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::Other("PURGE".to_string()));
        assert_eq!(result.method.to_string(), "PURGE");
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let request = b"get /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
    }

    #[test]
    fn test_invalid_method() {
        let request = b"G@T /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "G@T"));
    }

    #[test]
    fn test_invalid_http_version() {
        let request = b"GET /index.html HTTP/9.9\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == "HTTP/9.9"));
    }

    #[test]
    fn test_relative_path_rejected() {
        let request = b"GET index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidPath)));
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat)));
    }

    #[test]
    fn test_empty_request() {
        let result = parse_request(b"");
        assert!(matches!(result, Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_incomplete_request_line() {
        let result = parse_request(b"GET\r\n");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_empty_path() {
        let request = b"GET  HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_http10_version() {
        let request = b"GET /index.html HTTP/1.0\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.version, HttpVersion::Http10);
    }

    #[test]
    fn test_headers_with_multiple_colons() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: value:with:colons\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("X-Test").unwrap(), "value:with:colons");
    }

    #[test]
    fn test_headers_with_trailing_whitespace() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com  \r\nUser-Agent:  test  \r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_duplicate_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: value1\r\nX-Test: value2\r\n\r\n";
        let result = parse_request(request).unwrap();
        // The second value overwrites the first
        assert_eq!(result.headers.get("X-Test").unwrap(), "value2");
    }

    #[test]
    fn test_bytes_after_head_are_not_parsed() {
        let request = b"POST /submit HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let result = parse_request(request).unwrap();
        assert!(result.body.is_empty());
        assert_eq!(result.content_length().unwrap(), Some(3));
    }

    #[test]
    fn test_malformed_utf8_in_request() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: \xFF\xFF\xFF\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref s)) if s == "Invalid UTF-8"));
    }

    #[test]
    fn test_path_with_query_parameters() {
        let request = b"GET /search?q=test&flag&empty= HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path, "/search?q=test&flag&empty=");
        assert_eq!(result.route_path(), "/search");
        assert_eq!(result.get_query_param("q").unwrap(), "test");
        assert_eq!(result.get_query_param("flag").unwrap(), "");
        assert!(result.has_query_param("empty"));
        assert!(!result.has_query_param("missing"));
    }

    #[test]
    fn test_query_parameters_are_decoded() {
        let request = b"GET /search?q=hello%20world&name=a+b&q=second HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_query_param("q").map(String::as_str), Some("hello world"));
        assert_eq!(result.get_query_param("name").map(String::as_str), Some("a b"));
        assert_eq!(result.route_path(), "/search");
    }

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(18));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\nHost: x\r\n"), None);
        assert_eq!(find_header_end(b""), None);
    }

    #[test]
    fn test_content_length() {
        assert_eq!(request_with(&[], b"").content_length().unwrap(), None);
        assert_eq!(request_with(&[("content-length", "12")], b"").content_length().unwrap(), Some(12));

        let result = request_with(&[("Content-Length", "-1")], b"").content_length();
        assert!(matches!(result, Err(Error::InvalidContentLength(ref v)) if v == "-1"));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_json_parsing() {
        let body = br#"{"name":"John Doe","email":"john@example.com"}"#;
        let request = request_with(&[("Content-Type", "application/json")], body);
        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "john@example.com");

        let request = request_with(&[("Content-Type", "text/plain")], body);
        let result: Result<TestUser, _> = request.json();
        assert!(matches!(result, Err(Error::MissingHeader(_))));

        let request = request_with(&[("Content-Type", "application/json")], br#"{"name":"#);
        let result: Result<TestUser, _> = request.json();
        assert!(matches!(result, Err(Error::JsonError(_))));
    }

    #[test]
    fn test_form_parsing() {
        let request = request_with(
            &[("Content-Type", "application/x-www-form-urlencoded")],
            b"foo=bar&baz=42&baz=43&blank=&name=John+Doe%21",
        );
        let form = request.form();
        assert_eq!(form.get("foo").unwrap(), "bar");
        assert_eq!(form.get("baz").unwrap(), "42");
        assert_eq!(form.get("blank").unwrap(), "");
        assert_eq!(form.get("name").unwrap(), "John Doe!");
    }

    #[test]
    fn test_form_parsing_requires_form_content_type() {
        let request = request_with(&[("Content-Type", "application/json")], b"foo=bar");
        assert!(request.form().is_empty());

        let request = request_with(&[("Content-Type", "application/x-www-form-urlencoded")], b"");
        assert!(request.form().is_empty());

        let request = request_with(&[], b"foo=bar");
        assert!(request.form().is_empty());
    }
}
