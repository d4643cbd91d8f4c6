use crate::context::Context;
use crate::error::ConvertError;
use crate::source::Source;

/// One schema position in the dispatch chain.
///
/// `receive` consumes the current node and returns the receiver for its
/// children, or `None` when the subtree is of no further interest.
/// Receivers are cheap copyable values; a position may return itself to keep
/// searching (the root-until-anchor pattern). Receivers close over target
/// node handles and must not be shared across concurrent conversions.
pub trait Receiver<S: Source>: Copy {
    /// Accumulator type the walk mutates; the document tree for conversions.
    type Acc;

    fn receive(
        &self,
        ctx: &mut Context<'_, S, Self::Acc>,
    ) -> Result<Option<Self>, ConvertError>;
}
