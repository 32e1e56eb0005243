use {
    crate::target::{IntoTarget, Target},
    base64::Engine,
    bytes::Bytes,
    http::{
        header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    indexmap::{map::Entry, IndexMap},
};

/// The ordered pairs of form fields sent by `post`.
pub type FormFields = IndexMap<String, String>;

/// A description of a request to be sent through a browsing session.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    target: Target,
    headers: HeaderMap,
    form: Option<FormFields>,
    raw: Option<Bytes>,
}

impl RequestDescriptor {
    fn new(method: Method, url: impl IntoTarget) -> crate::Result<Self> {
        Ok(Self {
            method,
            target: url.into_target()?,
            headers: HeaderMap::new(),
            form: None,
            raw: None,
        })
    }

    /// Creates a `GET` request to the specified URL.
    pub fn get(url: impl IntoTarget) -> crate::Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request to the specified URL, without any body.
    pub fn post(url: impl IntoTarget) -> crate::Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Appends a header field sent with this request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the form fields sent as an url-encoded body.
    ///
    /// The values of a repeated field name are joined with `,` at the
    /// position of its first occurrence.
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = FormFields::new();
        for (name, value) in fields {
            match form.entry(name.into()) {
                Entry::Occupied(mut entry) => {
                    let joined = entry.get_mut();
                    joined.push(',');
                    joined.push_str(&value.into());
                }
                Entry::Vacant(entry) => {
                    entry.insert(value.into());
                }
            }
        }
        self.form = Some(form);
        self
    }

    /// Sets the raw payload sent as the request body.
    ///
    /// When both of the raw payload and form fields are set, the raw payload is used.
    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.raw = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn into_parts(self) -> (Method, Target, HeaderMap, Payload) {
        let payload = Payload::new(self.form, self.raw);
        (self.method, self.target, self.headers, payload)
    }
}

/// The entity body carried by a simulated request.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Empty,
    Form(FormFields),
    Raw(Bytes),
}

impl Payload {
    fn new(form: Option<FormFields>, raw: Option<Bytes>) -> Self {
        match (form, raw) {
            (_, Some(raw)) if !is_blank(&raw) => Payload::Raw(raw),
            (Some(form), _) => Payload::Form(form),
            _ => Payload::Empty,
        }
    }

    pub(crate) fn to_bytes(&self) -> Bytes {
        match self {
            Payload::Empty => Bytes::new(),
            Payload::Raw(raw) => raw.clone(),
            Payload::Form(fields) => encode_form(fields).into(),
        }
    }
}

fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

/// Encodes the form fields as `name=value&` pairs, in order.
pub fn encode_form(fields: &FormFields) -> String {
    let mut encoded = String::new();
    for (name, value) in fields {
        encoded.extend(url::form_urlencoded::byte_serialize(name.as_bytes()));
        encoded.push('=');
        encoded.extend(url::form_urlencoded::byte_serialize(value.as_bytes()));
        encoded.push('&');
    }
    encoded
}

/// The pair of user name and password used by Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the value of `Authorization` header, `Basic <base64(username:password)>`.
    pub fn to_header_value(&self) -> crate::Result<HeaderValue> {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        HeaderValue::from_str(&format!("Basic {}", token))
            .map_err(|e| crate::Error::invalid_argument(e.to_string()))
    }
}

/// Overwrites the header fields derived from the session state.
///
/// Both `Authorization` and `Content-Type` replace any value with
/// the same name supplied by the caller.
pub fn build_headers(
    headers: &mut HeaderMap,
    credentials: Option<&Credentials>,
    content_type: Option<&HeaderValue>,
) -> crate::Result<()> {
    if let Some(credentials) = credentials {
        headers.insert(AUTHORIZATION, credentials.to_header_value()?);
    }
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, content_type.clone());
    }
    Ok(())
}
