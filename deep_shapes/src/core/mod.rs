//! Core module has common/shared math, transformation and control flow types.
pub mod math;
pub mod trans;

/// Basic control flow enum returned by visitors during hierarchy traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control<B = ()> {
    /// Indicates to the traversal to continue visiting (descend into the cell).
    Continue,
    /// Indicates to the traversal to stop visiting the current subtree.
    Break(B),
}

impl<B> Default for Control<B> {
    #[inline]
    fn default() -> Self {
        Control::Continue
    }
}

/// Trait for control flow inside visiting methods.
pub trait ControlFlow {
    /// Returns `true` if control flow should break/stop iteration.
    fn should_break(&self) -> bool;
}

impl<B> ControlFlow for Control<B> {
    #[inline]
    fn should_break(&self) -> bool {
        matches!(*self, Control::Break(_))
    }
}
