//! Flattening the links between exceptions.

use alloc::{string::ToString, vec::Vec};

use hashbrown::HashSet;

use crate::{
    exception::Exception,
    report::{ChainLink, Relation},
};

/// Follows `cause`, or `context` when there is no cause, from `exception`
/// until the chain ends or revisits an exception.
///
/// The result is ordered root cause first; each link records how it relates
/// to the link before it.
pub(crate) fn walk(exception: &dyn Exception) -> Vec<ChainLink> {
    // Wide pointers: a cause stored at offset 0 of its parent shares the
    // parent's address but not its vtable.
    let mut visited: HashSet<*const (dyn Exception + '_), rustc_hash::FxBuildHasher> =
        HashSet::default();
    let mut links = Vec::new();

    // The relation of `current` to the exception that links to it.
    let mut current = Some((exception, None::<Relation>));
    while let Some((error, relation_to_outer)) = current {
        let identity: *const (dyn Exception + '_) = error;
        if !visited.insert(identity) {
            tracing::debug!(
                error_type = error.error_type().name(),
                "exception chain revisits an exception, stopping"
            );
            break;
        }

        links.push((
            ChainLink {
                type_name: error.error_type().name().to_string(),
                message: error.to_string(),
                relation: None,
            },
            relation_to_outer,
        ));

        current = error
            .cause()
            .map(|cause| (cause, Some(Relation::RaisedFrom)))
            .or_else(|| {
                error
                    .context()
                    .map(|context| (context, Some(Relation::DuringHandling)))
            });
    }

    // Walking outward-in gives, for each inner link, how the outer one was
    // produced from it. Reversed, that relation belongs to the next link.
    let mut ordered = Vec::with_capacity(links.len());
    let mut relation_of_next = None;
    for (mut link, relation_to_outer) in links.into_iter().rev() {
        link.relation = relation_of_next;
        relation_of_next = relation_to_outer;
        ordered.push(link);
    }
    ordered
}
