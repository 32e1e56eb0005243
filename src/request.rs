//! The synthetic transport request handed to the pipeline.

use {
    crate::{capture::Capture, descriptor::Payload, target::Target},
    bytes::Bytes,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Method, Request,
    },
    std::borrow::Cow,
};

/// The value of `Content-Type` assumed for `POST` requests without an explicit one.
pub const DEFAULT_FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

macro_rules! known_headers {
    ($( $(#[$m:meta])* $variant:ident => $name:expr, )*) => {
        /// The header fields the pipeline identifies without their names.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum KnownHeader {
            $( $(#[$m])* $variant, )*
        }

        impl KnownHeader {
            /// All of the known header fields.
            pub const ALL: &'static [KnownHeader] = &[ $( KnownHeader::$variant, )* ];

            /// Returns the canonical name of this header field.
            pub fn name(self) -> HeaderName {
                match self {
                    $( KnownHeader::$variant => $name, )*
                }
            }
        }
    };
}

known_headers! {
    CacheControl => header::CACHE_CONTROL,
    Connection => header::CONNECTION,
    Date => header::DATE,
    KeepAlive => HeaderName::from_static("keep-alive"),
    Pragma => header::PRAGMA,
    Trailer => header::TRAILER,
    TransferEncoding => header::TRANSFER_ENCODING,
    Upgrade => header::UPGRADE,
    Via => header::VIA,
    Warning => header::WARNING,
    Allow => header::ALLOW,
    ContentLength => header::CONTENT_LENGTH,
    ContentType => header::CONTENT_TYPE,
    ContentEncoding => header::CONTENT_ENCODING,
    ContentLanguage => header::CONTENT_LANGUAGE,
    ContentLocation => header::CONTENT_LOCATION,
    ContentMd5 => HeaderName::from_static("content-md5"),
    ContentRange => header::CONTENT_RANGE,
    Expires => header::EXPIRES,
    LastModified => header::LAST_MODIFIED,
    Accept => header::ACCEPT,
    AcceptCharset => header::ACCEPT_CHARSET,
    AcceptEncoding => header::ACCEPT_ENCODING,
    AcceptLanguage => header::ACCEPT_LANGUAGE,
    Authorization => header::AUTHORIZATION,
    Cookie => header::COOKIE,
    Expect => header::EXPECT,
    From => header::FROM,
    Host => header::HOST,
    IfMatch => header::IF_MATCH,
    IfModifiedSince => header::IF_MODIFIED_SINCE,
    IfNoneMatch => header::IF_NONE_MATCH,
    IfRange => header::IF_RANGE,
    IfUnmodifiedSince => header::IF_UNMODIFIED_SINCE,
    MaxForwards => header::MAX_FORWARDS,
    ProxyAuthorization => header::PROXY_AUTHORIZATION,
    Referer => header::REFERER,
    Range => header::RANGE,
    Te => header::TE,
    UserAgent => header::USER_AGENT,
}

impl KnownHeader {
    /// Finds the known header field with the specified name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .cloned()
            .find(|known| known.name().as_str().eq_ignore_ascii_case(name))
    }
}

/// The set of queries the pipeline makes of a transport request.
pub trait TransportRequest {
    /// Returns the name of HTTP method, in lower case.
    fn verb_name(&self) -> String;

    /// Returns the requested path, without a leading slash.
    fn path(&self) -> &str;

    /// Returns the query string, without the leading `?`.
    fn query_string(&self) -> &str;

    /// Returns the value of a header field known by the pipeline.
    fn known_header(&self, id: KnownHeader) -> Option<Cow<'_, str>>;

    /// Returns the value of a header field looked up by its name.
    fn unknown_header(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Returns all of the header fields which are not known by the pipeline.
    fn unknown_headers(&self) -> Vec<(String, String)>;

    /// Returns the whole entity body of the request.
    fn preloaded_body(&self) -> Bytes;
}

/// A transport request simulated without the low level I/O.
#[derive(Debug)]
pub struct SimulatedRequest {
    method: Method,
    target: Target,
    headers: HeaderMap,
    cookie: Option<String>,
    payload: Payload,
    capture: Capture,
}

impl SimulatedRequest {
    pub(crate) fn new(
        method: Method,
        target: Target,
        headers: HeaderMap,
        cookie: Option<String>,
        payload: Payload,
        capture: Capture,
    ) -> Self {
        Self {
            method,
            target,
            headers,
            cookie,
            payload,
            capture,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the header fields supplied with this request.
    ///
    /// The synthesized fields such as `Cookie` are not included.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the recorder used by the observers within the pipeline.
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Rebuilds an `http::Request` from the answers of this request.
    ///
    /// The synthesized `Cookie` and `Content-Type` fields are added to the header map.
    pub fn to_http_request(&self) -> crate::Result<Request<Bytes>> {
        let mut uri = format!("/{}", self.target.path());
        if !self.target.query().is_empty() {
            uri.push('?');
            uri.push_str(self.target.query());
        }

        let mut headers = self.headers.clone();
        if let Some(content_type) = self.known_header(KnownHeader::ContentType) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(&content_type)?);
        }
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(cookie)?);
        }

        let mut request = Request::new(self.preloaded_body());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = uri.parse()?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        let mut values = self.headers.get_all(name).iter();
        let first = values.next()?;
        let mut joined = String::from_utf8_lossy(first.as_bytes());
        for value in values {
            let joined = joined.to_mut();
            joined.push(',');
            joined.push_str(&String::from_utf8_lossy(value.as_bytes()));
        }
        Some(joined)
    }
}

impl TransportRequest for SimulatedRequest {
    fn verb_name(&self) -> String {
        self.method.as_str().to_ascii_lowercase()
    }

    fn path(&self) -> &str {
        self.target.path()
    }

    fn query_string(&self) -> &str {
        self.target.query()
    }

    fn known_header(&self, id: KnownHeader) -> Option<Cow<'_, str>> {
        match id {
            KnownHeader::ContentType if self.method == Method::POST => Some(
                self.lookup(header::CONTENT_TYPE.as_str())
                    .unwrap_or(Cow::Borrowed(DEFAULT_FORM_CONTENT_TYPE)),
            ),
            KnownHeader::Cookie => self.cookie.as_ref().map(|s| Cow::Borrowed(s.as_str())),
            id => self.lookup(id.name().as_str()),
        }
    }

    fn unknown_header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.lookup(name)
    }

    fn unknown_headers(&self) -> Vec<(String, String)> {
        self.headers
            .keys()
            .filter(|name| KnownHeader::from_name(name.as_str()).is_none())
            .filter_map(|name| {
                self.lookup(name.as_str())
                    .map(|value| (name.as_str().to_owned(), value.into_owned()))
            })
            .collect()
    }

    fn preloaded_body(&self) -> Bytes {
        self.payload.to_bytes()
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::descriptor::{FormFields, RequestDescriptor},
    };

    fn simulate(descriptor: RequestDescriptor, cookie: Option<&str>) -> SimulatedRequest {
        let (method, target, headers, payload) = descriptor.into_parts();
        SimulatedRequest::new(
            method,
            target,
            headers,
            cookie.map(ToOwned::to_owned),
            payload,
            Capture::new(),
        )
    }

    #[test]
    fn verb_name_is_lower_case() -> crate::Result<()> {
        let request = simulate(RequestDescriptor::get("/")?, None);
        assert_eq!(request.verb_name(), "get");
        let request = simulate(RequestDescriptor::post("/")?, None);
        assert_eq!(request.verb_name(), "post");
        Ok(())
    }

    #[test]
    fn post_defaults_to_form_content_type() -> crate::Result<()> {
        let request = simulate(RequestDescriptor::post("login")?, None);
        assert_eq!(
            request.known_header(KnownHeader::ContentType).as_ref().map(|s| &**s),
            Some(DEFAULT_FORM_CONTENT_TYPE)
        );

        let request = simulate(RequestDescriptor::get("login")?, None);
        assert!(request.known_header(KnownHeader::ContentType).is_none());
        Ok(())
    }

    #[test]
    fn explicit_content_type_wins() -> crate::Result<()> {
        let request = simulate(
            RequestDescriptor::post("api")?.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            None,
        );
        assert_eq!(
            request.known_header(KnownHeader::ContentType).as_ref().map(|s| &**s),
            Some("application/json")
        );
        Ok(())
    }

    #[test]
    fn cookie_header_is_synthesized() -> crate::Result<()> {
        let request = simulate(RequestDescriptor::get("/")?, Some("sid=abc;"));
        assert_eq!(
            request.known_header(KnownHeader::Cookie).as_ref().map(|s| &**s),
            Some("sid=abc;")
        );

        let request = simulate(RequestDescriptor::get("/")?, None);
        assert!(request.known_header(KnownHeader::Cookie).is_none());
        Ok(())
    }

    #[test]
    fn known_header_lookup() -> crate::Result<()> {
        let request = simulate(
            RequestDescriptor::get("/")?
                .header(header::ACCEPT, HeaderValue::from_static("text/html"))
                .header(header::ACCEPT, HeaderValue::from_static("text/plain")),
            None,
        );
        assert_eq!(
            request.known_header(KnownHeader::Accept).as_ref().map(|s| &**s),
            Some("text/html,text/plain")
        );
        assert!(request.known_header(KnownHeader::UserAgent).is_none());
        Ok(())
    }

    #[test]
    fn unknown_headers_exclude_known_names() -> crate::Result<()> {
        let request = simulate(
            RequestDescriptor::get("/")?
                .header(header::ACCEPT, HeaderValue::from_static("*/*"))
                .header(
                    HeaderName::from_static("x-requested-with"),
                    HeaderValue::from_static("XMLHttpRequest"),
                )
                .header(header::HOST, HeaderValue::from_static("localhost"))
                .header(
                    HeaderName::from_static("x-trace-id"),
                    HeaderValue::from_static("Abc-123"),
                ),
            None,
        );

        assert_eq!(
            request.unknown_headers(),
            vec![
                ("x-requested-with".to_owned(), "XMLHttpRequest".to_owned()),
                ("x-trace-id".to_owned(), "Abc-123".to_owned()),
            ]
        );
        assert_eq!(
            request.unknown_header("X-Trace-Id").as_ref().map(|s| &**s),
            Some("Abc-123")
        );
        assert!(request.unknown_header("x-missing").is_none());
        Ok(())
    }

    #[test]
    fn known_header_names() {
        assert_eq!(KnownHeader::ALL.len(), 40);
        assert_eq!(KnownHeader::from_name("Content-Type"), Some(KnownHeader::ContentType));
        assert_eq!(KnownHeader::from_name("keep-alive"), Some(KnownHeader::KeepAlive));
        assert_eq!(KnownHeader::from_name("x-custom"), None);
        for &known in KnownHeader::ALL {
            assert_eq!(KnownHeader::from_name(known.name().as_str()), Some(known));
        }
    }

    #[test]
    fn preloaded_form_body() -> crate::Result<()> {
        let mut fields = FormFields::new();
        fields.insert("user".into(), "a".into());
        fields.insert("pass".into(), "b c".into());
        let request = simulate(RequestDescriptor::post("login")?.form(fields), None);
        assert_eq!(request.preloaded_body(), "user=a&pass=b+c&");
        Ok(())
    }

    #[test]
    fn preloaded_raw_body() -> crate::Result<()> {
        let request = simulate(RequestDescriptor::post("api")?.raw("{\"id\":1}"), None);
        assert_eq!(request.preloaded_body(), "{\"id\":1}");

        let request = simulate(RequestDescriptor::get("/")?, None);
        assert!(request.preloaded_body().is_empty());
        Ok(())
    }

    #[test]
    fn rebuild_http_request() -> crate::Result<()> {
        let request = simulate(
            RequestDescriptor::post("~/account/login?returnUrl=%2F")?
                .form(vec![("user", "a")])
                .header(
                    HeaderName::from_static("x-trace-id"),
                    HeaderValue::from_static("1"),
                ),
            Some("sid=abc;"),
        );

        let request = request.to_http_request()?;
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/account/login");
        assert_eq!(request.uri().query(), Some("returnUrl=%2F"));
        assert_eq!(request.headers()[header::CONTENT_TYPE], DEFAULT_FORM_CONTENT_TYPE);
        assert_eq!(request.headers()[header::COOKIE], "sid=abc;");
        assert_eq!(request.headers()["x-trace-id"], "1");
        assert_eq!(request.body(), "user=a&");
        Ok(())
    }
}
