use crate::session::SessionId;

/// HTTP request methods.
///
/// Only the two methods the server dispatches on are represented; any other
/// request line is rejected while framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Append data to a session
    POST,
}

impl Method {
    /// Matches the literal request-line prefix (`GET /` or `POST /`).
    ///
    /// # Example
    ///
    /// ```
    /// # use cookie_server::http::request::Method;
    /// assert_eq!(Method::from_prefix(b"GET / HTTP/1.1"), Some(Method::GET));
    /// assert_eq!(Method::from_prefix(b"PUT / HTTP/1.1"), None);
    /// ```
    pub fn from_prefix(buf: &[u8]) -> Option<Self> {
        if buf.starts_with(Self::GET.prefix()) {
            Some(Method::GET)
        } else if buf.starts_with(Self::POST.prefix()) {
            Some(Method::POST)
        } else {
            None
        }
    }

    /// The request-line prefix this method is recognized by, including the
    /// leading slash of the path.
    pub fn prefix(&self) -> &'static [u8] {
        match self {
            Method::GET => b"GET /",
            Method::POST => b"POST /",
        }
    }
}

/// A fully framed request.
///
/// Holds owned copies of the pieces of the receive buffer the handler needs;
/// the buffer itself is never mutated while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// GET or POST
    pub method: Method,
    /// The raw request path, e.g. "/index.html"
    pub path: String,
    /// Identifier from a `Cookie: id=` header, if one was sent
    pub session: Option<SessionId>,
    /// Exactly `Content-Length` bytes following the header terminator (POST only)
    pub body: Vec<u8>,
}
