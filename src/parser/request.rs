//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;
use serde::de::DeserializeOwned;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// The byte sequence that ends the header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as it appeared in the request line
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers, names kept as sent
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// Query parameters parsed from the path
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - The request target
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    ///
    /// # Returns
    ///
    /// A new HTTP request with an empty body
    pub fn new(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        // Query values are percent-decoded; the first of a repeated key wins
        let mut query_params = HashMap::new();
        if let Some((_, query)) = path.split_once('?') {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                query_params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
            }
        }

        Self {
            method,
            path,
            version,
            headers,
            body: Vec::new(),
            query_params,
        }
    }

    /// Replace the body of this request.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// The path used for routing: the request target without its query string.
    pub fn route_path(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Get a header value.
    ///
    /// Header names are stored as sent but looked up case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The declared body length, if the request carries a Content-Length header.
    pub fn content_length(&self) -> Result<Option<usize>, Error> {
        match self.get_header("Content-Length") {
            Some(value) => value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(value.clone())),
            None => Ok(None),
        }
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type_contains("application/json")
    }

    /// Parse an `application/x-www-form-urlencoded` body into a flat map.
    ///
    /// Only the first value of a repeated key is kept. Returns an empty map
    /// when the content type is different or the body is empty.
    pub fn form(&self) -> HashMap<String, String> {
        let mut form = HashMap::new();
        if !self.content_type_contains("application/x-www-form-urlencoded") || self.body.is_empty() {
            return form;
        }

        for (key, value) in url::form_urlencoded::parse(&self.body) {
            form.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        form
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    fn content_type_contains(&self, mime: &str) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|value| value.to_ascii_lowercase().contains(mime))
    }
}

/// Find the end of the header block in a buffer.
///
/// # Returns
///
/// The index just past the terminating `CRLFCRLF`, or `None` if the
/// terminator has not arrived yet
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Parse an HTTP request head (request line and headers) from a byte slice.
///
/// Parsing stops at the first empty line; any bytes after it are ignored.
/// The returned request has an empty body.
///
/// # Arguments
///
/// * `input` - A byte slice containing the HTTP request head to parse
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let head = match find_header_end(input) {
        Some(end) => &input[..end],
        None => input,
    };

    let input_str = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    let mut lines = input_str.lines();

    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    // METHOD SP PATH SP VERSION
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let path = parts[1].to_string();
    if !path.starts_with('/') && path != "*" {
        return Err(Error::InvalidPath);
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidHeaderFormat);
        }

        headers.insert(name.to_string(), value.trim().to_string());
    }

    Ok(HttpRequest::new(method, path, version, headers))
}
