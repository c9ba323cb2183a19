use crate::http::request::{Method, Request};
use crate::session::SessionId;

/// Upper bound on the bytes buffered for a single request, body included.
pub const MAX_REQUEST_SIZE: usize = 2048;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const COOKIE_PREFIX: &[u8] = b"Cookie: id=";
const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length: ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request is not complete yet")]
    Incomplete,
    #[error("request exceeds {} bytes", MAX_REQUEST_SIZE)]
    TooLarge,
    #[error("request line is neither `GET /` nor `POST /`")]
    InvalidMethod,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("cookie value is not terminated")]
    UnterminatedCookie,
    #[error("invalid session identifier")]
    InvalidSession,
    #[error("missing Content-Length on POST")]
    MissingContentLength,
    #[error("invalid Content-Length")]
    InvalidContentLength,
}

/// Frames and parses one request out of `buf`.
///
/// Returns the request together with the number of bytes it spans.
/// `ParseError::Incomplete` means more bytes are needed; every other error is
/// a framing error the client should get a 400 for.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    // Keep the terminator in view so the last header line still ends in CR.
    let head = &buf[..headers_end + HEADER_TERMINATOR.len()];
    let body_start = head.len();

    let method = Method::from_prefix(head).ok_or(ParseError::InvalidMethod)?;
    let path = request_path(head, method)?;
    let session = find_session(head)?;

    let (body, consumed) = match method {
        Method::GET => (Vec::new(), body_start),
        Method::POST => {
            let content_length = content_length(head)?;
            let body_end = body_start
                .checked_add(content_length)
                .ok_or(ParseError::InvalidContentLength)?;
            if body_end > MAX_REQUEST_SIZE {
                return Err(ParseError::TooLarge);
            }
            if buf.len() < body_end {
                return Err(ParseError::Incomplete);
            }
            (buf[body_start..body_end].to_vec(), body_end)
        }
    };

    let request = Request {
        method,
        path,
        session,
        body,
    };

    Ok((request, consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    find(buf, HEADER_TERMINATOR)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

/// The request-line token starting at the method's slash, up to the next
/// space or CR.
fn request_path(head: &[u8], method: Method) -> Result<String, ParseError> {
    let start = method.prefix().len() - 1;
    let rest = &head[start..];
    let len = rest
        .iter()
        .position(|&b| b == b' ' || b == b'\r')
        .ok_or(ParseError::InvalidRequestLine)?;

    std::str::from_utf8(&rest[..len])
        .map(str::to_string)
        .map_err(|_| ParseError::InvalidRequestLine)
}

fn find_session(head: &[u8]) -> Result<Option<SessionId>, ParseError> {
    let Some(at) = find(head, COOKIE_PREFIX) else {
        return Ok(None);
    };
    let value = &head[at + COOKIE_PREFIX.len()..];
    let len = value
        .iter()
        .position(|&b| b == b'\r')
        .ok_or(ParseError::UnterminatedCookie)?;

    let token = std::str::from_utf8(&value[..len]).map_err(|_| ParseError::InvalidSession)?;
    SessionId::parse(token)
        .map(Some)
        .ok_or(ParseError::InvalidSession)
}

fn content_length(head: &[u8]) -> Result<usize, ParseError> {
    let at = find(head, CONTENT_LENGTH_PREFIX).ok_or(ParseError::MissingContentLength)?;
    let value = &head[at + CONTENT_LENGTH_PREFIX.len()..];
    let digits = value.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || value.get(digits) != Some(&b'\r') {
        return Err(ParseError::InvalidContentLength);
    }

    std::str::from_utf8(&value[..digits])
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or(ParseError::InvalidContentLength)
}
