//! Error types and result definitions for migration operations.
//!
//! Provides a classified error type with captured diagnostic metadata. [`PorterError`]
//! carries an [`ErrorKind`], a static description, optional dynamic detail, an optional
//! source error, and the callsite location.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for migration operations using [`PorterError`] as the error type.
pub type PorterResult<T> = Result<T, PorterError>;

/// Specific categories of errors that can occur during migration operations.
///
/// Error kinds are the stable classification used to decide how a failure is handled;
/// everything else on the error is diagnostic payload.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid configuration was supplied to a component.
    ConfigError,
    /// An operation was attempted in a state that does not permit it.
    InvalidState,
    /// A migration task's `start` returned an error.
    TaskFailure,
    /// A task failed while reading from the source side.
    SourceError,
    /// A task failed while writing to the destination side.
    DestinationError,
    /// The job coordinator task panicked or was cancelled.
    CoordinatorPanic,
    /// Uncategorized failure.
    Unknown,
}

/// Main error type for migration operations.
#[derive(Debug, Clone)]
pub struct PorterError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

impl PorterError {
    /// Creates a [`PorterError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        PorterError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// The stored source is preserved across clones and exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }
}

impl PartialEq for PorterError {
    fn eq(&self, other: &PorterError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for PorterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for PorterError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`PorterError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for PorterError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> PorterError {
        PorterError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`PorterError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for PorterError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> PorterError {
        PorterError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}
