// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::iter;
use std::panic::Location;
use std::sync::Arc;

use ohno::{Enrichable, EnrichmentEntry, ErrorExt, OhnoCore};

use crate::Break;

/// A boxed, type-erased error used as the cause of an [`Error`].
pub type Source = Box<dyn StdError + Send + Sync + 'static>;

/// The uniform error produced by fault classification.
///
/// Every fault intercepted by a [`RecoveryPoint`](crate::RecoveryPoint) ends up as an `Error`,
/// whatever was originally raised. Source wrapping, backtrace capture and context messages are
/// handled by an [`OhnoCore`]; the core and the error kind live behind an [`Arc`], so clones
/// are cheap and refer to the same instance. [`Error::ptr_eq`] tells whether two handles share
/// it.
///
/// A backtrace is captured on construction, subject to `RUST_BACKTRACE`.
///
/// # Examples
///
/// ```rust
/// use rescue::{Error, ErrorKind};
///
/// let io = std::io::Error::from(std::io::ErrorKind::NotFound);
/// let error = Error::caused_by(io);
///
/// assert_eq!(error.kind(), ErrorKind::Native);
/// assert!(error.find_source::<std::io::Error>().is_some());
/// ```
#[derive(Clone)]
pub struct Error {
    inner: Arc<Inner>,
    caller: Option<Cow<'static, str>>,
}

#[derive(Clone)]
struct Inner {
    kind: ErrorKind,
    // Shown above the source when an error has both a message and a cause.
    headline: Option<Cow<'static, str>>,
    location: &'static Location<'static>,
    core: OhnoCore,
}

/// What kind of fault an [`Error`] was classified from.
///
/// This enum is marked `#[non_exhaustive]`; match it with a wildcard arm.
#[derive(Debug, PartialEq, Clone, Eq, Copy, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Created directly from a message, with no underlying cause.
    Message,

    /// Wraps a native [`std::error::Error`] that was raised or returned.
    Native,

    /// The raised value was neither an [`Error`] nor a native error.
    ///
    /// The source is an [`UnknownType`](crate::UnknownType) describing the value.
    UnknownType,

    /// An operation did not complete within its time budget.
    Timeout,
}

impl Error {
    /// Creates an error from a plain message.
    #[track_caller]
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::from_parts(ErrorKind::Message, message, None)
    }

    /// Wraps a native error as the cause of a new [`ErrorKind::Native`] error.
    #[track_caller]
    #[must_use]
    pub fn caused_by<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_parts(ErrorKind::Native, "", Some(Box::new(error)))
    }

    /// Creates an error from its individual parts.
    ///
    /// An empty `message` makes the error display its source directly.
    #[track_caller]
    #[must_use]
    pub fn from_parts(kind: ErrorKind, message: impl Into<Cow<'static, str>>, source: Option<Source>) -> Self {
        let message = message.into();
        let (core, headline) = match source {
            Some(source) if message.is_empty() => (OhnoCore::from(source), None),
            Some(source) => (OhnoCore::from(source), Some(message)),
            None => (OhnoCore::from(message), None),
        };

        Self {
            inner: Arc::new(Inner {
                kind,
                headline,
                location: Location::caller(),
                core,
            }),
            caller: None,
        }
    }

    /// Adds a context message to a copy of this error.
    ///
    /// The kind, source and caller are kept. Context messages stack: the most recent one is
    /// what [`message`](Self::message) reports, and all of them are displayed below the
    /// original message together with the place they were added.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rescue::Error;
    ///
    /// let error = Error::new("disk full").context("saving draft");
    ///
    /// assert_eq!(error.message(), "saving draft");
    /// assert!(error.to_string().starts_with("disk full\n> saving draft (at "));
    /// ```
    #[track_caller]
    #[must_use]
    pub fn context(self, message: impl Into<Cow<'static, str>>) -> Self {
        let location = Location::caller();
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.core.add_enrichment(EnrichmentEntry::new(message, location.file(), location.line()));

        Self {
            inner: Arc::new(inner),
            caller: self.caller,
        }
    }

    /// Attributes this error to the named function.
    #[must_use]
    pub fn with_caller(mut self, caller: impl Into<Cow<'static, str>>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// The kind of fault this error was classified from.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    /// The most recent message: the latest context, else the error's own message.
    ///
    /// Empty when the error only forwards its source.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(latest) = self.inner.core.enrichment_messages().next() {
            return latest.to_owned();
        }

        match &self.inner.headline {
            Some(headline) => headline.to_string(),
            None if self.inner.core.source().is_some() => String::new(),
            None => self.inner.core.format_message("", None),
        }
    }

    /// The context messages, most recent first.
    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.inner.core.enrichment_messages()
    }

    /// The function this error was attributed to by a recovery point, if any.
    #[must_use]
    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Where the error was created.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.inner.location
    }

    /// The backtrace captured when the error was created.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        self.inner.core.backtrace()
    }

    /// Whether both handles refer to the same error instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Finds the first error of type `T` in the source chain.
    #[must_use]
    pub fn find_source<T: StdError + 'static>(&self) -> Option<&T> {
        <Self as ErrorExt>::find_source(self)
    }

    /// The last error in the source chain, or `self` when there is no source.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        iter::successors(Some(self as &(dyn StdError + 'static)), |&error| error.source())
            .last()
            .unwrap_or(self)
    }

    /// Whether the root cause is the [`Break`] stop sentinel.
    #[must_use]
    pub fn is_break(&self) -> bool {
        self.root_cause().is::<Break>()
    }

    fn headline(&self) -> String {
        self.inner.core.format_message("", self.inner.headline.as_deref().map(Cow::Borrowed))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.core.source()
    }
}

impl ErrorExt for Error {
    fn message(&self) -> String {
        Self::message(self)
    }

    fn backtrace(&self) -> &Backtrace {
        Self::backtrace(self)
    }
}

impl fmt::Display for Error {
    /// The alternate form (`{:#}`) appends the creation site, the attributed caller and the
    /// backtrace when one was captured.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline())?;

        let contexts: Vec<_> = self.inner.core.enrichments().collect();
        for context in contexts.iter().rev() {
            write!(f, "\n> {context}")?;
        }

        if f.alternate() {
            write!(f, "\n  at {}", self.inner.location)?;

            if let Some(caller) = &self.caller {
                write!(f, "\n  caller: {caller}")?;
            }

            if self.inner.core.has_backtrace() {
                write!(f, "\n\nBacktrace:\n{}", self.inner.core.backtrace())?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.inner.kind)
            .field("headline", &self.inner.headline)
            .field("core", &self.inner.core)
            .field("caller", &self.caller)
            .field("location", &self.inner.location)
            .finish()
    }
}
