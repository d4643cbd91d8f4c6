use crate::config::Config;
use crate::context::Context;
use crate::error::ConvertError;
use crate::receive::Receiver;
use crate::source::{Source, SourceKind};

/// Walks `root` depth-first in document order, dispatching every node to the
/// receiver chain and building into `acc`. `document` is the source identity
/// used in diagnostics. The root invocation uses the empty key.
pub fn walk<'w, S, R>(
    root: &'w S,
    document: &str,
    receiver: R,
    acc: &'w mut R::Acc,
    config: Config<'w>,
) -> Result<(), ConvertError>
where
    S: Source,
    R: Receiver<S>,
{
    let mut ctx = Context::new(root, document, config, acc);
    visit(receiver, String::new(), root, &mut ctx)
}

fn visit<'w, S, R>(
    receiver: R,
    key: String,
    value: &'w S,
    ctx: &mut Context<'w, S, R::Acc>,
) -> Result<(), ConvertError>
where
    S: Source,
    R: Receiver<S>,
{
    ctx.set(key, value);
    let next = receiver.receive(ctx)?;
    ctx.push();
    let outcome = match next {
        Some(next) => descend(next, value, ctx),
        // pruned: the path bookkeeping still brackets the subtree
        None => Ok(()),
    };
    ctx.pop();
    outcome
}

fn descend<'w, S, R>(
    receiver: R,
    value: &'w S,
    ctx: &mut Context<'w, S, R::Acc>,
) -> Result<(), ConvertError>
where
    S: Source,
    R: Receiver<S>,
{
    match value.kind() {
        SourceKind::Object => {
            for (key, child) in value.entries() {
                visit(receiver, key.to_string(), child, ctx)?;
            }
        }
        SourceKind::Array => {
            for (index, item) in value.items().enumerate() {
                visit(receiver, index.to_string(), item, ctx)?;
            }
        }
        SourceKind::Scalar => {}
    }
    Ok(())
}
