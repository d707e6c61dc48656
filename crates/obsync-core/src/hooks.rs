// ── Extensibility hooks ──
//
// User code that runs inside the bridge's command flow.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::TransitionOptions;

/// Runs before every `TransitionToProgram`.
///
/// Receives its own copy of the proposed options; returning `Some`
/// replaces them verbatim, returning `None` keeps the original.
#[async_trait]
pub trait PreTransitionHook: Send + Sync {
    async fn pre_transition(&self, options: TransitionOptions) -> Option<TransitionOptions>;
}

/// Adapter turning a synchronous closure into a [`PreTransitionHook`].
struct FnHook<F>(F);

#[async_trait]
impl<F> PreTransitionHook for FnHook<F>
where
    F: Fn(TransitionOptions) -> Option<TransitionOptions> + Send + Sync,
{
    async fn pre_transition(&self, options: TransitionOptions) -> Option<TransitionOptions> {
        (self.0)(options)
    }
}

/// Wrap a synchronous closure as a pre-transition hook.
pub fn hook_fn<F>(f: F) -> Arc<dyn PreTransitionHook>
where
    F: Fn(TransitionOptions) -> Option<TransitionOptions> + Send + Sync + 'static,
{
    Arc::new(FnHook(f))
}

/// Hooks registered on a bridge.
#[derive(Clone, Default)]
pub struct Hooks {
    pub pre_transition: Option<Arc<dyn PreTransitionHook>>,
}

impl Hooks {
    pub fn with_pre_transition(mut self, hook: Arc<dyn PreTransitionHook>) -> Self {
        self.pre_transition = Some(hook);
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_transition", &self.pre_transition.is_some())
            .finish()
    }
}
