//! Executing `HttpRequest`s.
//!
//! # Design
//! `Transport` is the one seam where I/O happens. The client never calls it
//! directly; `VideoApi` runs build → send → parse through whatever transport
//! it is given. Transports must hand back every status as data, including
//! 3xx (media endpoints answer with a redirect the caller wants to see) and
//! 4xx/5xx, so status interpretation stays in `VideoClient`.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

#[cfg(feature = "ureq")]
pub use blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::fmt;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport on a shared `ureq` agent.
    ///
    /// The agent neither follows redirects nor turns error statuses into
    /// `Err`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UreqTransport").finish_non_exhaustive()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .max_redirects(0)
                .max_redirects_will_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let result = match method {
                HttpMethod::Get => with_headers(self.agent.get(&url), &headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(&url), &headers).call(),
                HttpMethod::Post => {
                    let builder = with_headers(self.agent.post(&url), &headers);
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(|e| ApiError::transport(format!("{} {url}: {e}", method.as_str())))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::transport(format!("reading response body: {e}")))?;

            Ok(HttpResponse { status, headers, body })
        }
    }

    fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}
