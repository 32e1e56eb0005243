use std::fmt;

pub(crate) type BoxedStdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned from browsing sessions.
#[derive(Debug)]
pub struct Error {
    compat: Compat,
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self {
            compat: Compat::InvalidArgument(msg.into()),
        }
    }

    pub(crate) fn from_pipeline(err: impl Into<BoxedStdError>) -> Self {
        Self {
            compat: Compat::Pipeline(err.into()),
        }
    }

    /// Returns `true` if this error was caused by an unusable argument
    /// passed by the caller, such as a missing URL.
    pub fn is_invalid_argument(&self) -> bool {
        match self.compat {
            Compat::InvalidArgument(..) => true,
            _ => false,
        }
    }

    /// Returns a reference to the error raised by the pipeline, if any.
    pub fn pipeline_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match &self.compat {
            Compat::Pipeline(err) => Some(&**err),
            _ => None,
        }
    }

    /// Takes the error raised by the pipeline out of this value.
    ///
    /// The returned value is the error object produced by the pipeline itself,
    /// so it can be downcast to its concrete type.
    pub fn into_pipeline_error(self) -> std::result::Result<BoxedStdError, Self> {
        match self.compat {
            Compat::Pipeline(err) => Ok(err),
            compat => Err(Self { compat }),
        }
    }

    pub fn compat(self) -> Compat {
        self.compat
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.compat.fmt(f)
    }
}

#[derive(Debug, failure::Fail)]
pub enum Compat {
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),

    #[fail(display = "{}", _0)]
    Pipeline(BoxedStdError),

    #[fail(display = "custom error: {}", _0)]
    Custom(failure::Error),
}

impl<E> From<E> for Error
where
    E: Into<failure::Error>,
{
    fn from(err: E) -> Self {
        Self {
            compat: Compat::Custom(err.into()),
        }
    }
}

pub type Result<T = ()> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use {super::*, std::io};

    #[test]
    fn pipeline_error_is_kept_as_is() {
        let err = Error::from_pipeline(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(!err.is_invalid_argument());
        assert_eq!(err.to_string(), "boom");

        let inner = err.into_pipeline_error().unwrap();
        let io_err = inner.downcast::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn invalid_argument() {
        let err = Error::invalid_argument("url");
        assert!(err.is_invalid_argument());
        assert!(err.pipeline_error().is_none());
        assert!(err.into_pipeline_error().is_err());
    }
}
