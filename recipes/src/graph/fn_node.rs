//! Closure-backed node.

use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{Next, Node};

/// Wraps an async closure `Fn(S) -> Future<Output = Result<(S, Next), AgentError>>`
/// as a [`Node`].
///
/// ```rust,ignore
/// let printer = FnNode::new("printer", |s: CounterState| async move {
///     Ok((CounterState { count: s.count + 1 }, Next::Continue))
/// });
/// ```
pub struct FnNode<S, F> {
    id: String,
    f: F,
    _state: PhantomData<fn() -> S>,
}

impl<S, F> FnNode<S, F> {
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self {
            id: id.into(),
            f,
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F, Fut> Node<S> for FnNode<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(S, Next), AgentError>> + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: S) -> Result<(S, Next), AgentError> {
        (self.f)(state).await
    }
}
