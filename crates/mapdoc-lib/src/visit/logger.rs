use tracing::debug;

use super::{InterceptContext, MappingInterceptor, TraversalControl};
use crate::dump::node_label;
use crate::tree::NodeRef;

const DEPTH: &str = "tree_logger.depth";
const VISITED: &str = "tree_logger.visited";

/// Interceptor that emits one `debug` event per node, indented by depth.
///
/// Depth and the running node count are kept in the traversal context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeLogger;

impl TreeLogger {
    /// Number of nodes started so far in `ctx`.
    pub fn visited(ctx: &InterceptContext) -> usize {
        ctx.get::<usize>(VISITED).copied().unwrap_or(0)
    }
}

impl MappingInterceptor for TreeLogger {
    fn start_node(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        *ctx.entry_or_default::<usize>(VISITED) += 1;
        let depth = ctx.entry_or_default::<usize>(DEPTH);
        debug!(
            "{:indent$}{} {}",
            "",
            node.kind(),
            node_label(node),
            indent = *depth * 2
        );
        *depth += 1;
        TraversalControl::Continue
    }

    fn end_node(&mut self, _node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        let depth = ctx.entry_or_default::<usize>(DEPTH);
        *depth = depth.saturating_sub(1);
        TraversalControl::Continue
    }
}
