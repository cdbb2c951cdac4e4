//! Boundary between the reconcilers and the hosting driver.

use async_trait::async_trait;

use crate::error::Result;

/// Result of refreshing persisted state against the vendor.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    /// The object still exists; persist the refreshed state.
    Present(T),
    /// The object vanished remotely; drop it from state without an error.
    Gone,
}

impl<T> ReadOutcome<T> {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(state) => Some(state),
            Self::Gone => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadOutcome<U> {
        match self {
            Self::Present(state) => ReadOutcome::Present(f(state)),
            Self::Gone => ReadOutcome::Gone,
        }
    }
}

/// A kind of remote object the driver can manage.
///
/// The driver invokes at most one operation at a time per object. Different
/// objects may be reconciled concurrently; implementations only share the
/// read-only gateway handle.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Declared configuration.
    type Spec: Send + Sync;
    /// Persisted state.
    type State: Send + Sync;

    /// Stable resource type name used in logs.
    const TYPE_NAME: &'static str;

    async fn create(&self, spec: &Self::Spec) -> Result<Self::State>;

    async fn read(&self, prior: &Self::State) -> Result<ReadOutcome<Self::State>>;

    async fn update(&self, spec: &Self::Spec, prior: &Self::State) -> Result<Self::State>;

    async fn delete(&self, prior: &Self::State) -> Result<()>;

    /// Adopts an existing remote object by its persisted id.
    async fn import(&self, id: &str) -> Result<ReadOutcome<Self::State>>;
}
