//! Core [`Event`] struct and metadata handling.

use std::{
    any::Any,
    borrow::Cow,
    sync::Arc,
};
#[cfg(feature = "timestamps")]
use std::time::SystemTime;

use derive_more::{AsRef, Deref, DerefMut};

/// Alias for a [`catch_unwind()`] error.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
pub type Info = Arc<dyn Any + Send + Sync + 'static>;

/// Converts the raw payload of a [`catch_unwind()`] into an [`Info`].
///
/// Panic payloads are `Box<dyn Any + Send>`, which cannot travel between
/// worker threads as-is. String payloads (the overwhelmingly common case of
/// `panic!` and failed `assert!` macros) are extracted, anything else is
/// replaced with a placeholder message.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
#[must_use]
pub fn coerce_into_info(payload: Box<dyn Any + Send + 'static>) -> Info {
    match payload.downcast::<String>() {
        Ok(s) => Arc::new(*s),
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => Arc::new(String::from(*s)),
            Err(_) => Arc::new(String::from("opaque panic payload")),
        },
    }
}

/// Extracts a human-readable message out of an [`Info`], if it carries one.
#[must_use]
pub fn info_message(info: &Info) -> Cow<'static, str> {
    info.downcast_ref::<String>()
        .map(|s| Cow::Owned(s.clone()))
        .or_else(|| info.downcast_ref::<&'static str>().map(|s| Cow::Borrowed(*s)))
        .unwrap_or(Cow::Borrowed("opaque panic payload"))
}

/// Arbitrary event, optionally paired with additional metadata.
///
/// Any metadata is added by enabling the correspondent library feature:
/// - `timestamps`: adds time of when this [`Event`] has happened.
#[derive(AsRef, Clone, Copy, Debug, Deref, DerefMut)]
#[non_exhaustive]
pub struct Event<T: ?Sized> {
    /// [`SystemTime`] when this [`Event`] has happened.
    #[cfg(feature = "timestamps")]
    pub at: SystemTime,

    /// Actual value of this [`Event`].
    #[as_ref]
    #[deref]
    #[deref_mut]
    pub value: T,
}

impl<T> Event<T> {
    /// Creates a new [`Event`] out of the given `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "timestamps")]
            at: SystemTime::now(),
            value,
        }
    }

    /// Unwraps the inner [`Event::value`] loosing all the attached metadata.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Splits this [`Event`] to the inner [`Event::value`] and its detached
    /// metadata.
    #[must_use]
    pub fn split(self) -> (T, Metadata) {
        self.replace(())
    }

    /// Replaces the inner [`Event::value`] with the given one, dropping the old
    /// one in place.
    #[must_use]
    pub fn insert<V>(self, value: V) -> Event<V> {
        self.replace(value).1
    }

    /// Maps the inner [`Event::value`] with the given function.
    #[must_use]
    pub fn map<V>(self, f: impl FnOnce(T) -> V) -> Event<V> {
        let (val, meta) = self.split();
        meta.insert(f(val))
    }

    /// Replaces the inner [`Event::value`] with the given one, returning the
    /// old one along.
    #[must_use]
    pub fn replace<V>(self, value: V) -> (T, Event<V>) {
        let event = Event {
            #[cfg(feature = "timestamps")]
            at: self.at,
            value,
        };
        (self.value, event)
    }
}

/// Shortcut for a detached metadata of an arbitrary [`Event`].
pub type Metadata = Event<()>;

impl Metadata {
    /// Wraps the given `value` with this [`Event`] metadata.
    #[must_use]
    pub fn wrap<V>(self, value: V) -> Event<V> {
        self.replace(value).1
    }
}
