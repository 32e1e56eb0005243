use {
    crate::capture::Handle,
    bytes::Bytes,
    http::{
        header::{AsHeaderName, HeaderValue},
        Response, StatusCode,
    },
    std::fmt,
};

/// The snapshot of artifacts produced by the pipeline for a single request.
#[derive(Debug)]
pub struct RequestResult {
    response: Response<()>,
    body: Bytes,
    response_text: String,
    action_executed: Option<Handle>,
    result_executed: Option<Handle>,
}

impl RequestResult {
    pub(crate) fn new(
        response: Response<()>,
        body: Bytes,
        action_executed: Option<Handle>,
        result_executed: Option<Handle>,
    ) -> Self {
        let response_text = String::from_utf8_lossy(&body).into_owned();
        Self {
            response,
            body,
            response_text,
            action_executed,
            result_executed,
        }
    }

    /// Returns the text written to the response body.
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// Returns the raw bytes of the response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the head of the response returned from the pipeline.
    pub fn response(&self) -> &Response<()> {
        &self.response
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Gets a reference to the header field with the specified name.
    ///
    /// If the header field does not exist, this method will return an `Err` instead of `None`.
    pub fn header<H>(&self, name: H) -> crate::Result<&HeaderValue>
    where
        H: AsHeaderName + fmt::Display,
    {
        let err = failure::format_err!("missing header field: `{}'", name);
        self.response
            .headers()
            .get(name)
            .ok_or_else(|| crate::Error::from(err))
    }

    /// Returns the context recorded after the action was executed, if any.
    pub fn action_executed(&self) -> Option<&Handle> {
        self.action_executed.as_ref()
    }

    /// Returns the context recorded after the result was executed, if any.
    pub fn result_executed(&self) -> Option<&Handle> {
        self.result_executed.as_ref()
    }
}
