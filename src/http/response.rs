use crate::session::SessionId;

/// HTTP status codes the server emits.
///
/// - `Ok` (200): Resource served or session updated
/// - `BadRequest` (400): Malformed or oversized request
/// - `NotFound` (404): Missing resource or session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use cookie_server::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// A response ready to be serialized.
///
/// Headers keep insertion order. For file responses the body stays empty and
/// `Content-Length` carries the file size; the file is streamed after the
/// head by the writer.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they go on the wire
    pub headers: Vec<(String, String)>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(b"<p>hi</p>".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header, keeping its original position on replace.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Every response closes the connection, so `Connection: close` is put in
    /// front. `Content-Length` follows from the body unless already set.
    pub fn build(mut self) -> Response {
        if !self.has_header("Connection") {
            self.headers
                .insert(0, ("Connection".to_string(), "close".to_string()));
        }
        if !self.has_header("Content-Length") {
            let len = self.body.len().to_string();
            self.headers.insert(1, ("Content-Length".to_string(), len));
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }

    fn has_header(&self, key: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

impl Response {
    /// Head of a 200 response for a resource of `content_length` bytes. The
    /// resource itself is streamed separately.
    pub fn resource(
        content_length: u64,
        content_type: &str,
        cookie: Option<(&SessionId, u64)>,
    ) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", content_length.to_string())
            .header("Content-Type", content_type);

        if let Some((id, max_age)) = cookie {
            builder = builder.header("Set-Cookie", format!("id={}; Max-Age={}", id, max_age));
        }

        builder.build()
    }

    /// 200 with an empty body.
    pub fn ok_empty() -> Self {
        ResponseBuilder::new(StatusCode::Ok).build()
    }

    /// Creates the fixed 400 Bad Request response.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .body(b"Bad Request".to_vec())
            .build()
    }

    /// Creates the fixed 404 Not Found response.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .body(b"Not Found".to_vec())
            .build()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
