use {
    crate::{
        capture::{Capture, Captured, Handle},
        cookies::CookieJar,
        descriptor::{build_headers, Credentials, RequestDescriptor},
        pipeline::{Invocation, Pipeline},
        request::SimulatedRequest,
        result::RequestResult,
        runtime::{CurrentThread, DefaultRuntime, Runtime},
        target::IntoTarget,
    },
    bytes::Bytes,
    cookie::Cookie,
    http::{
        header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE},
        Response,
    },
};

type InvocationOf<P> = Invocation<<P as Pipeline>::Future, <P as Pipeline>::ResponseBody>;

/// A builder for creating a `BrowsingSession`.
#[derive(Debug)]
pub struct Builder<P> {
    pipeline: P,
    default_headers: HeaderMap,
}

impl<P> Builder<P>
where
    P: Pipeline,
{
    /// Appends a header field sent with every request of the session.
    ///
    /// The fields supplied with each request take precedence over these fields.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.append(name, value);
        self
    }

    /// Creates a `BrowsingSession` driven by the default runtime.
    pub fn build(self) -> crate::Result<BrowsingSession<P, DefaultRuntime>>
    where
        DefaultRuntime: Runtime<InvocationOf<P>>,
    {
        Ok(self.build_with(DefaultRuntime::new()?))
    }

    /// Creates a `BrowsingSession` driven by the single threaded runtime,
    /// without some restrictions around thread safety.
    pub fn build_current_thread(self) -> crate::Result<BrowsingSession<P, CurrentThread>>
    where
        CurrentThread: Runtime<InvocationOf<P>>,
    {
        Ok(self.build_with(CurrentThread::new()?))
    }

    /// Creates a `BrowsingSession` driven by the specified runtime.
    pub fn build_with<Rt>(self, runtime: Rt) -> BrowsingSession<P, Rt>
    where
        Rt: Runtime<InvocationOf<P>>,
    {
        BrowsingSession {
            pipeline: self.pipeline,
            runtime,
            default_headers: self.default_headers,
            cookies: CookieJar::new(),
            credentials: None,
            content_type: None,
            session: None,
        }
    }
}

/// A type that simulates a browser session against the request pipeline.
///
/// The session keeps the Cookie entries received from the responses and
/// sends them back with the subsequent requests.
#[derive(Debug)]
pub struct BrowsingSession<P, Rt> {
    pipeline: P,
    runtime: Rt,
    default_headers: HeaderMap,
    cookies: CookieJar,
    credentials: Option<Credentials>,
    content_type: Option<HeaderValue>,
    session: Option<Handle>,
}

impl<P> BrowsingSession<P, ()>
where
    P: Pipeline,
{
    /// Creates a `Builder` using the specified pipeline.
    pub fn builder(pipeline: P) -> Builder<P> {
        Builder {
            pipeline,
            default_headers: HeaderMap::new(),
        }
    }

    /// Creates a `BrowsingSession` using the specified pipeline.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(pipeline: P) -> crate::Result<BrowsingSession<P, DefaultRuntime>>
    where
        DefaultRuntime: Runtime<InvocationOf<P>>,
    {
        Self::builder(pipeline).build()
    }

    /// Creates a `BrowsingSession` using the specified pipeline,
    /// without some restrictions around thread safety.
    pub fn new_current_thread(pipeline: P) -> crate::Result<BrowsingSession<P, CurrentThread>>
    where
        CurrentThread: Runtime<InvocationOf<P>>,
    {
        Self::builder(pipeline).build_current_thread()
    }
}

impl<P, Rt> BrowsingSession<P, Rt>
where
    P: Pipeline,
    Rt: Runtime<InvocationOf<P>>,
{
    /// Returns the Cookie entries stored in this session.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Returns the session state handed back by the last response, if any.
    pub fn session(&self) -> Option<&Handle> {
        self.session.as_ref()
    }

    /// Returns `true` if the credentials for Basic authentication have been set.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Returns a pair of mutable reference to the inner values.
    pub fn get_mut(&mut self) -> (&mut P, &mut Rt) {
        (&mut self.pipeline, &mut self.runtime)
    }

    /// Sets the credentials sent with every subsequent request.
    pub fn basic_authentication(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) {
        let credentials = Credentials::new(username, password);
        log::debug!("use Basic authentication as `{}'", credentials.username());
        self.credentials = Some(credentials);
    }

    /// Sends a `GET` request to the specified URL.
    pub fn get(&mut self, url: impl IntoTarget) -> crate::Result<RequestResult> {
        self.send(RequestDescriptor::get(url)?)
    }

    /// Sends a `POST` request with the url-encoded form fields.
    pub fn post<I, K, V>(&mut self, url: impl IntoTarget, fields: I) -> crate::Result<RequestResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.send(RequestDescriptor::post(url)?.form(fields))
    }

    /// Sends a `POST` request with the raw payload.
    ///
    /// The specified content type is also used by all of the subsequent requests.
    /// A blank content type clears it, and the form default applies again.
    pub fn post_raw(
        &mut self,
        url: impl IntoTarget,
        body: impl Into<Bytes>,
        content_type: &str,
    ) -> crate::Result<RequestResult> {
        let descriptor = RequestDescriptor::post(url)?.raw(body);
        self.content_type = if content_type.trim().is_empty() {
            None
        } else {
            Some(HeaderValue::from_str(content_type).map_err(|_| {
                crate::Error::invalid_argument(format!("invalid content type: `{}'", content_type))
            })?)
        };
        self.send(descriptor)
    }

    /// Sends a request described by `descriptor`.
    pub fn send(&mut self, descriptor: RequestDescriptor) -> crate::Result<RequestResult> {
        let (method, target, supplied, payload) = descriptor.into_parts();

        let mut headers = self.default_headers.clone();
        headers.extend(supplied);
        build_headers(
            &mut headers,
            self.credentials.as_ref(),
            self.content_type.as_ref(),
        )?;

        log::debug!("{} /{} (query: {:?})", method, target.path(), target.query());

        let capture = Capture::new();
        let request = SimulatedRequest::new(
            method,
            target,
            headers,
            self.cookies.to_header_value(),
            payload,
            capture.clone(),
        );

        let (response, body) = self
            .runtime
            .block_on(Invocation::new(self.pipeline.execute(request)))?;

        self.cookies.merge(received_cookies(&response));

        let Captured {
            session,
            action_executed,
            result_executed,
        } = capture.take();
        self.session = session;

        Ok(RequestResult::new(
            response,
            body,
            action_executed,
            result_executed,
        ))
    }

    /// Waits for completing the background task spawned by the pipeline.
    pub fn shutdown(self) -> crate::Result<()> {
        self.runtime.shutdown()
    }
}

fn received_cookies(response: &Response<()>) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|set_cookie| {
            let set_cookie = set_cookie.to_str().ok()?;
            match Cookie::parse(set_cookie.to_owned()) {
                Ok(cookie) => Some(cookie),
                Err(err) => {
                    log::trace!("ignore invalid Set-Cookie `{}': {}", set_cookie, err);
                    None
                }
            }
        })
        .collect()
}
