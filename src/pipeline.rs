//! The boundary between browsing sessions and the request pipeline.

use {
    crate::{error::BoxedStdError, request::SimulatedRequest},
    bytes::Bytes,
    futures::{Async, Future, IntoFuture, Poll},
    http::{response::Parts, Response},
    std::io,
    tower_service::Service,
};

/// A trait representing the body of responses returned from the pipeline.
pub trait ResponseBody {
    /// The error type which will be returned when receiving the body.
    type Error: Into<BoxedStdError>;

    /// Polls the next chunk of the body.
    ///
    /// `None` means that the whole body has been received.
    fn poll_data(&mut self) -> Poll<Option<Bytes>, Self::Error>;
}

impl ResponseBody for () {
    type Error = io::Error;

    fn poll_data(&mut self) -> Poll<Option<Bytes>, Self::Error> {
        Ok(Async::Ready(None))
    }
}

macro_rules! impl_response_body_for_sized_data {
    ($($t:ty,)*) => {$(
        impl ResponseBody for $t {
            type Error = io::Error;

            fn poll_data(&mut self) -> Poll<Option<Bytes>, Self::Error> {
                if self.is_empty() {
                    return Ok(Async::Ready(None));
                }
                let data = std::mem::replace(self, Default::default());
                Ok(Async::Ready(Some(Bytes::from(data))))
            }
        }
    )*};
}

impl_response_body_for_sized_data! {
    &'static [u8],
    &'static str,
    String,
    Vec<u8>,
    Bytes,
}

/// A trait that abstracts the request pipeline driven by browsing sessions.
///
/// This trait is automatically implemented for any `Service` which receives
/// a `SimulatedRequest` and returns an HTTP response.
pub trait Pipeline {
    /// The type of response body.
    type ResponseBody: ResponseBody;
    /// The error type raised by the pipeline.
    type Error: Into<BoxedStdError>;
    /// The `Future` driving a single invocation.
    type Future: Future<Item = Response<Self::ResponseBody>, Error = Self::Error>;

    /// Hands a request to the pipeline.
    fn execute(&mut self, request: SimulatedRequest) -> Self::Future;
}

impl<S, Bd> Pipeline for S
where
    S: Service<SimulatedRequest, Response = Response<Bd>>,
    S::Error: Into<BoxedStdError>,
    Bd: ResponseBody,
{
    type ResponseBody = Bd;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn execute(&mut self, request: SimulatedRequest) -> Self::Future {
        Service::call(self, request)
    }
}

/// Creates a pipeline from the specified closure.
pub fn pipeline_fn<F, R, Bd>(
    f: F,
) -> impl Service<
    SimulatedRequest, //
    Response = Response<Bd>,
    Error = R::Error,
    Future = R::Future,
>
where
    F: FnMut(SimulatedRequest) -> R,
    R: IntoFuture<Item = Response<Bd>>,
{
    #[allow(missing_debug_implementations)]
    struct PipelineFn<F>(F);

    impl<F, R, Bd> Service<SimulatedRequest> for PipelineFn<F>
    where
        F: FnMut(SimulatedRequest) -> R,
        R: IntoFuture<Item = Response<Bd>>,
    {
        type Response = Response<Bd>;
        type Error = R::Error;
        type Future = R::Future;

        #[inline]
        fn poll_ready(&mut self) -> Poll<(), Self::Error> {
            Ok(Async::Ready(()))
        }

        #[inline]
        fn call(&mut self, request: SimulatedRequest) -> Self::Future {
            (self.0)(request).into_future()
        }
    }

    PipelineFn(f)
}

/// The `Future` which drives a pipeline and receives the whole response body.
#[allow(missing_debug_implementations)]
pub struct Invocation<F, Bd> {
    state: State<F, Bd>,
}

enum State<F, Bd> {
    Executing(F),
    Receiving { head: Parts, body: Bd, data: Vec<u8> },
    Done,
}

impl<F, Bd> Invocation<F, Bd> {
    pub(crate) fn new(future: F) -> Self {
        Self {
            state: State::Executing(future),
        }
    }
}

impl<F, Bd> Future for Invocation<F, Bd>
where
    F: Future<Item = Response<Bd>>,
    F::Error: Into<BoxedStdError>,
    Bd: ResponseBody,
{
    type Item = (Response<()>, Bytes);
    type Error = BoxedStdError;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        loop {
            let next = match &mut self.state {
                State::Executing(future) => {
                    let response = futures::try_ready!(future
                        .poll()
                        .map_err(Into::<BoxedStdError>::into));
                    let (head, body) = response.into_parts();
                    State::Receiving {
                        head,
                        body,
                        data: Vec::new(),
                    }
                }
                State::Receiving { body, data, .. } => {
                    let chunk = futures::try_ready!(body
                        .poll_data()
                        .map_err(Into::<BoxedStdError>::into));
                    match chunk {
                        Some(chunk) => {
                            data.extend_from_slice(&chunk);
                            continue;
                        }
                        None => State::Done,
                    }
                }
                State::Done => panic!("the invocation has already been completed"),
            };

            if let State::Receiving { head, data, .. } = std::mem::replace(&mut self.state, next) {
                let head = Response::from_parts(head, ());
                return Ok(Async::Ready((head, Bytes::from(data))));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use {super::*, futures::future};

    #[test]
    fn sized_body_is_polled_once() {
        let mut body = String::from("hello");
        match body.poll_data() {
            Ok(Async::Ready(Some(chunk))) => assert_eq!(chunk, "hello"),
            _ => panic!("unexpected poll result"),
        }
        match body.poll_data() {
            Ok(Async::Ready(None)) => (),
            _ => panic!("unexpected poll result"),
        }
    }

    #[test]
    fn invocation_collects_the_body() {
        let response = Response::builder()
            .status(201)
            .header("x-id", "1")
            .body(b"created"[..].to_vec())
            .unwrap();
        let invocation = Invocation::<_, Vec<u8>>::new(future::ok::<_, io::Error>(response));

        let (head, body) = invocation.wait().unwrap();
        assert_eq!(head.status(), 201);
        assert_eq!(head.headers()["x-id"], "1");
        assert_eq!(body, "created");
    }

    #[test]
    fn invocation_passes_the_error_through() {
        let invocation = Invocation::<_, String>::new(future::err::<Response<String>, _>(
            io::Error::new(io::ErrorKind::Other, "pipeline failed"),
        ));
        let err = invocation.wait().unwrap_err();
        assert_eq!(err.to_string(), "pipeline failed");
        assert!(err.downcast_ref::<io::Error>().is_some());
    }
}
