//! Three-way outcome of read-style operations.

use crate::error::{StorageError, StorageResult};

/// Outcome of a read-style operation: the value, a missing object, or a failure.
///
/// Drivers never raise from `get`, `meta`, `exists` or `missing`. They build
/// on this type and collapse it into the matching sentinel, while callers
/// that need to tell "absent" from "broken" can use it directly.
#[derive(Debug)]
#[must_use = "a lookup may hold an error that should be inspected"]
pub enum Lookup<T> {
    /// The object exists.
    Found(T),
    /// The object does not exist.
    Absent,
    /// The backend failed for a reason other than a missing object.
    Failed(StorageError),
}

impl<T> Lookup<T> {
    /// Converts a result, treating a not-found error as [`Lookup::Absent`].
    pub fn from_result(result: StorageResult<T>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(err) if err.is_not_found() => Self::Absent,
            Err(err) => Self::Failed(err),
        }
    }

    /// Returns whether the object was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns whether the object is missing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns whether the lookup failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&StorageError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Maps the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::Absent => Lookup::Absent,
            Self::Failed(err) => Lookup::Failed(err),
        }
    }

    /// Discards the failure, collapsing both absent and failed into `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent | Self::Failed(_) => None,
        }
    }

    /// Keeps the failure as an error and the absence as `None`.
    pub fn into_result(self) -> StorageResult<Option<T>> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::Absent => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }

    /// Returns the found value or `T::default()`.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<StorageResult<T>> for Lookup<T> {
    fn from(result: StorageResult<T>) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_becomes_absent() {
        let lookup: Lookup<u8> = Lookup::from_result(Err(StorageError::not_found("a.txt")));
        assert!(lookup.is_absent());
        assert!(matches!(lookup.into_result(), Ok(None)));
    }

    #[test]
    fn other_errors_are_kept() {
        let lookup: Lookup<u8> =
            Lookup::from_result(Err(StorageError::PermissionDenied("a.txt".into())));
        assert!(lookup.is_failed());
        assert!(lookup.error().is_some());
        assert!(lookup.into_result().is_err());
    }

    #[test]
    fn collapses_into_sentinels() {
        assert_eq!(Lookup::Found(3).map(|v| v * 2).into_option(), Some(6));
        assert_eq!(Lookup::<u8>::Absent.into_option(), None);
        assert_eq!(
            Lookup::<Vec<u8>>::Failed(StorageError::invalid_path("")).unwrap_or_default(),
            Vec::<u8>::new()
        );
    }
}
