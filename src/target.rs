/// The normalized target of a simulated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    path: String,
    query: String,
}

impl Target {
    /// Normalizes the URL passed by the caller.
    ///
    /// A leading `~/` or `/` is stripped from the path, and the string
    /// after the first `?` is split off as the query string.
    pub fn normalize(raw: Option<&str>) -> crate::Result<Self> {
        let raw = raw.ok_or_else(|| crate::Error::invalid_argument("url must be provided"))?;

        let url = if raw.starts_with("~/") {
            &raw[2..]
        } else if raw.starts_with('/') {
            &raw[1..]
        } else {
            raw
        };

        let (path, query) = match url.find('?') {
            Some(pos) => (&url[..pos], &url[pos + 1..]),
            None => (url, ""),
        };

        Ok(Self {
            path: path.to_owned(),
            query: query.to_owned(),
        })
    }

    /// Returns the path, without a leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query string, or an empty string if the URL had none.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// A trait representing the URL passed to a browsing session.
pub trait IntoTarget: IntoTargetImpl {}

pub trait IntoTargetImpl {
    fn into_target(self) -> crate::Result<Target>;
}

impl IntoTarget for Target {}

impl IntoTargetImpl for Target {
    fn into_target(self) -> crate::Result<Target> {
        Ok(self)
    }
}

impl<'a> IntoTarget for &'a str {}

impl<'a> IntoTargetImpl for &'a str {
    fn into_target(self) -> crate::Result<Target> {
        Target::normalize(Some(self))
    }
}

impl IntoTarget for String {}

impl IntoTargetImpl for String {
    fn into_target(self) -> crate::Result<Target> {
        self.as_str().into_target()
    }
}

impl<'a> IntoTarget for &'a String {}

impl<'a> IntoTargetImpl for &'a String {
    fn into_target(self) -> crate::Result<Target> {
        self.as_str().into_target()
    }
}

impl<T> IntoTarget for Option<T> where T: IntoTarget {}

impl<T> IntoTargetImpl for Option<T>
where
    T: IntoTarget,
{
    fn into_target(self) -> crate::Result<Target> {
        match self {
            Some(url) => url.into_target(),
            None => Target::normalize(None),
        }
    }
}

impl<T, E> IntoTarget for Result<T, E>
where
    T: IntoTarget,
    E: Into<crate::Error>,
{
}

impl<T, E> IntoTargetImpl for Result<T, E>
where
    T: IntoTarget,
    E: Into<crate::Error>,
{
    fn into_target(self) -> crate::Result<Target> {
        self.map_err(Into::into)?.into_target()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strip_leading_slash() -> crate::Result<()> {
        let target = "/home/index".into_target()?;
        assert_eq!(target.path(), "home/index");
        assert_eq!(target.query(), "");
        Ok(())
    }

    #[test]
    fn strip_leading_tilde_slash() -> crate::Result<()> {
        let target = "~/home/index".into_target()?;
        assert_eq!(target.path(), "home/index");
        Ok(())
    }

    #[test]
    fn strip_only_one_marker() -> crate::Result<()> {
        assert_eq!("//twice".into_target()?.path(), "/twice");
        assert_eq!("~/~/twice".into_target()?.path(), "~/twice");
        assert_eq!("~home".into_target()?.path(), "~home");
        Ok(())
    }

    #[test]
    fn split_query_string() -> crate::Result<()> {
        let target = "foo?bar=1".into_target()?;
        assert_eq!(target.path(), "foo");
        assert_eq!(target.query(), "bar=1");

        let target = "/foo?bar=1?baz=2".into_target()?;
        assert_eq!(target.path(), "foo");
        assert_eq!(target.query(), "bar=1?baz=2");

        let target = "?x=y".into_target()?;
        assert_eq!(target.path(), "");
        assert_eq!(target.query(), "x=y");
        Ok(())
    }

    #[test]
    fn missing_url() {
        let err = None::<&str>.into_target().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn empty_url_is_root() -> crate::Result<()> {
        let target = String::new().into_target()?;
        assert_eq!(target.path(), "");
        assert_eq!(target.query(), "");
        Ok(())
    }
}
