//! The Cookie storage owned by a browsing session.

use {
    cookie::Cookie,
    indexmap::IndexMap,
    time::Timespec,
};

/// A collection of Cookie entries accumulated from the responses of a session.
///
/// The entries are kept in the order they were last written, which is
/// the order used when rendering the `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: IndexMap<String, Cookie<'static>>,
}

impl CookieJar {
    /// Creates an empty `CookieJar`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the Cookie entry with the specified name.
    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.entries.get(name)
    }

    /// Returns the value of Cookie entry with the specified name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|cookie| cookie.value())
    }

    /// Returns an iterator over the stored entries, in header order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges the received Cookie entries into this jar.
    ///
    /// An entry with the same name is replaced and moved to the end.
    /// Entries which have already expired are dropped instead of inserted.
    pub fn merge<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        self.merge_at(incoming, time::get_time());
    }

    pub(crate) fn merge_at<I>(&mut self, incoming: I, now: Timespec)
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        self.entries.retain(|name, cookie| {
            let alive = !is_expired(cookie, now);
            if !alive {
                log::trace!("evict expired cookie `{}'", name);
            }
            alive
        });

        for mut cookie in incoming {
            self.entries.shift_remove(cookie.name());

            resolve_max_age(&mut cookie, now);
            if is_expired(&cookie, now) {
                log::trace!("drop expired cookie `{}'", cookie.name());
                continue;
            }

            log::trace!("store cookie `{}'", cookie.name());
            self.entries.insert(cookie.name().to_owned(), cookie);
        }
    }

    /// Renders the value of `Cookie` header from the stored entries.
    ///
    /// The values are written verbatim, without any percent-encoding.
    pub fn to_header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let mut value = String::new();
        for cookie in self.entries.values() {
            value.push_str(cookie.name());
            value.push('=');
            value.push_str(cookie.value());
            value.push(';');
        }
        Some(value)
    }
}

impl<'a> IntoIterator for &'a CookieJar {
    type Item = &'a Cookie<'static>;
    type IntoIter = indexmap::map::Values<'a, String, Cookie<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

// Max-Age takes precedence over Expires, so it is converted into
// an absolute expiry at the time the cookie is received.
fn resolve_max_age(cookie: &mut Cookie<'static>, now: Timespec) {
    if let Some(max_age) = cookie.max_age() {
        cookie.set_expires(time::at_utc(now + max_age));
    }
}

fn is_expired(cookie: &Cookie<'_>, now: Timespec) -> bool {
    if let Some(max_age) = cookie.max_age() {
        if max_age <= time::Duration::zero() {
            return true;
        }
    }
    cookie
        .expires()
        .map_or(false, |expires| expires.to_timespec() < now)
}
