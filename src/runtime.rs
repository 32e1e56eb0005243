use {
    crate::error::BoxedStdError,
    futures::Future,
    std::panic::{resume_unwind, AssertUnwindSafe},
};

/// A trait that abstracts the runtime for driving a pipeline invocation.
pub trait Runtime<F>
where
    F: Future,
    F::Error: Into<BoxedStdError>,
{
    /// Run a `Future` to completion on this runtime.
    ///
    /// The error returned from the future is passed through as a pipeline error.
    fn block_on(&mut self, future: F) -> crate::Result<F::Item>;

    /// Waits for the background tasks spawned onto this runtime.
    fn shutdown(self) -> crate::Result<()>
    where
        Self: Sized;
}

/// An implementor of `Runtime<F>` using the default Tokio runtime.
#[derive(Debug)]
pub struct DefaultRuntime {
    runtime: tokio::runtime::Runtime,
}

impl DefaultRuntime {
    pub(crate) fn new() -> crate::Result<Self> {
        let mut builder = tokio::runtime::Builder::new();
        builder.core_threads(1);
        builder.blocking_threads(1);
        builder.name_prefix("kagami");

        Ok(Self {
            runtime: builder.build()?,
        })
    }

    fn block_on<F>(&mut self, mut future: F) -> crate::Result<F::Item>
    where
        F: Future + Send + 'static,
        F::Item: Send + 'static,
        F::Error: Into<BoxedStdError>,
    {
        let future = futures::future::poll_fn(move || {
            future.poll().map_err(crate::Error::from_pipeline)
        });
        match self
            .runtime
            .block_on(AssertUnwindSafe(future).catch_unwind())
        {
            Ok(result) => result,
            Err(err) => resume_unwind(err),
        }
    }

    fn shutdown(self) -> crate::Result<()> {
        self.runtime
            .shutdown_on_idle()
            .wait()
            .map_err(|()| failure::format_err!("failed to shut down the runtime"))?;
        Ok(())
    }
}

impl<F> Runtime<F> for DefaultRuntime
where
    F: Future + Send + 'static,
    F::Item: Send + 'static,
    F::Error: Into<BoxedStdError>,
{
    fn block_on(&mut self, future: F) -> crate::Result<F::Item> {
        self.block_on(future)
    }

    fn shutdown(self) -> crate::Result<()> {
        self.shutdown()
    }
}

/// An implementor of `Runtime<F>` using single threaded Tokio runtime.
///
/// Unlike `DefaultRuntime`, the pipeline and its response body
/// are not required to be `Send`.
#[derive(Debug)]
pub struct CurrentThread {
    runtime: tokio::runtime::current_thread::Runtime,
}

impl CurrentThread {
    pub(crate) fn new() -> crate::Result<Self> {
        Ok(Self {
            runtime: tokio::runtime::current_thread::Runtime::new()?,
        })
    }

    fn block_on<F>(&mut self, mut future: F) -> crate::Result<F::Item>
    where
        F: Future,
        F::Error: Into<BoxedStdError>,
    {
        self.runtime.block_on(futures::future::poll_fn(move || {
            future.poll().map_err(crate::Error::from_pipeline)
        }))
    }

    fn shutdown(mut self) -> crate::Result<()> {
        self.runtime.run()?;
        Ok(())
    }
}

impl<F> Runtime<F> for CurrentThread
where
    F: Future,
    F::Error: Into<BoxedStdError>,
{
    fn block_on(&mut self, future: F) -> crate::Result<F::Item> {
        self.block_on(future)
    }

    fn shutdown(self) -> crate::Result<()> {
        self.shutdown()
    }
}
