//! Circular activation detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::options::ActivationOptions;

// Thread-local activation stack; activation never crosses threads.
thread_local! {
    static ACTIVATION_STACK: RefCell<Vec<TypeKey>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one frame of the thread-local activation stack.
///
/// Entering fails instead of pushing when the concrete type is already being
/// constructed on this thread, or when the stack is at its depth limit.
pub(crate) struct ActivationGuard {
    key: TypeKey,
}

impl ActivationGuard {
    pub(crate) fn enter(key: &TypeKey, options: &ActivationOptions) -> DiResult<Self> {
        ACTIVATION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if options.detect_cycles && stack.iter().any(|k| k == key) {
                let mut path = stack.clone();
                path.push(key.clone());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= options.max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(key.clone());
            Ok(())
        })?;

        Ok(Self { key: key.clone() })
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        ACTIVATION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped.as_ref(), Some(&self.key));
        });
    }
}
