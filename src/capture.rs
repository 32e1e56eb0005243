use std::{
    any::Any,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

/// An opaque value handed back by the pipeline.
pub struct Handle {
    inner: Box<dyn Any + Send + Sync>,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").finish()
    }
}

impl Handle {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: Box::new(value),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { inner }),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Captured {
    pub(crate) session: Option<Handle>,
    pub(crate) action_executed: Option<Handle>,
    pub(crate) result_executed: Option<Handle>,
}

/// The recorder of the values observed by the pipeline during a single invocation.
///
/// A fresh `Capture` is created by the browsing session for every request
/// and passed to the pipeline along with the `SimulatedRequest`.
/// The values left at the end of the invocation are collected into
/// the `RequestResult`; anything not recorded remains empty.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<Captured>>,
}

impl Capture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        // the slot holds plain values, so a poisoned lock is still usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the session state associated with the request.
    pub fn record_session<T>(&self, session: T)
    where
        T: Any + Send + Sync,
    {
        self.lock().session = Some(Handle::new(session));
    }

    /// Records the context observed after the action has been executed.
    pub fn record_action_executed<T>(&self, cx: T)
    where
        T: Any + Send + Sync,
    {
        self.lock().action_executed = Some(Handle::new(cx));
    }

    /// Records the context observed after the result has been executed.
    pub fn record_result_executed<T>(&self, cx: T)
    where
        T: Any + Send + Sync,
    {
        self.lock().result_executed = Some(Handle::new(cx));
    }

    pub(crate) fn take(&self) -> Captured {
        std::mem::replace(&mut *self.lock(), Captured::default())
    }
}
