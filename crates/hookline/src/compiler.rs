//! Chain pre-compilation.
//!
//! The dispatcher's inner loop re-walks priority buckets and re-checks the
//! propagation flag on every dispatch. For channels dispatched at high
//! frequency with a static listener list, [`ChainCompiler`] folds the
//! resolved callbacks into one composed closure up front: each element
//! checks the propagation flag (short-circuiting the remainder if set),
//! invokes its callback, then hands the context to the composed rest.
//!
//! A compiled chain is semantically equivalent to the dispatch loop, but
//! it is a snapshot: listeners registered after compilation are not
//! picked up.

use crate::context::HookContext;
use crate::registry::HookCallback;

type ChainFn = Box<dyn Fn(&mut HookContext) + Send + Sync>;

/// Compiles callback lists into single composed callables.
#[derive(Debug, Default)]
pub struct ChainCompiler;

impl ChainCompiler {
    /// Creates a compiler.
    pub fn new() -> Self {
        Self
    }

    /// Folds `callbacks` (already in execution order) into one closure.
    ///
    /// An empty list compiles to a no-op.
    pub fn compile(&self, callbacks: Vec<HookCallback>) -> CompiledChain {
        // Build from the tail so each closure captures its remainder.
        let mut chain: Option<ChainFn> = None;
        for callback in callbacks.into_iter().rev() {
            let next = chain.take();
            chain = Some(Box::new(move |context: &mut HookContext| {
                if context.is_propagation_stopped() {
                    return;
                }
                callback(context);
                if let Some(next) = &next {
                    next(context);
                }
            }));
        }

        CompiledChain {
            chain: chain.unwrap_or_else(|| Box::new(|_context| {})),
        }
    }
}

/// A pre-flattened hook chain.
pub struct CompiledChain {
    chain: ChainFn,
}

impl CompiledChain {
    /// Runs the chain against a context, honoring propagation stops.
    pub fn run(&self, context: &mut HookContext) {
        (self.chain)(context);
    }
}

impl std::fmt::Debug for CompiledChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledChain").finish_non_exhaustive()
    }
}
