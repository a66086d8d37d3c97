//! Comment-thread reconstruction.
//!
//! The service hands back a flat list of comments where replies point
//! at their parent via `reply_to_id`. For display we flatten every
//! reply chain one level under its top-level ancestor: each thread is
//! a root comment plus a single chronological list of all transitive
//! replies, with each reply annotated with the name of the author it
//! was actually answering.
//!
//! The builder is a pure function of its input and never fails;
//! replies whose parent chain cannot be resolved (missing parent or a
//! cycle in the data) are dropped from the output.

use std::collections::{HashMap, HashSet};

use shako_types::Comment;

/// A reply inside a thread, annotated for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    /// Author name of the immediate parent, or `None` when the reply
    /// answers the thread root directly.
    pub replying_to_name: Option<String>,
}

/// A top-level comment together with all of its transitive replies,
/// flattened into one chronological list.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub root: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentThread {
    /// Total number of comments in this thread, root included.
    pub fn total_comments(&self) -> usize {
        1 + self.replies.len()
    }
}

/// Walk `reply_to_id` links upwards until hitting a top-level comment.
///
/// Returns the id of the top-level ancestor, or `None` when the chain
/// leaves the collection or loops back on itself. The walk is
/// iterative; reply-chain length never grows the stack.
fn resolve_root(comments: &HashMap<i64, &Comment>, start: &Comment) -> Option<i64> {
    let mut visited = HashSet::new();
    let mut current = start;
    loop {
        if !visited.insert(current.id) {
            // Cycle in the input data; treat the whole chain as
            // unattachable rather than looping forever.
            log::warn!("comment {} is part of a reply cycle, dropping", start.id);
            return None;
        }
        match current.reply_to_id {
            None => return Some(current.id),
            Some(parent_id) => match comments.get(&parent_id) {
                Some(parent) => current = parent,
                None => return None,
            },
        }
    }
}

/// Build display threads from one post's flat comment collection.
///
/// Guarantees, independent of input order:
/// - threads are ordered by ascending root `created` (ties by id);
/// - each thread's replies are ordered by ascending `created`
///   (ties by id), regardless of nesting depth in the raw data;
/// - a comment whose parent chain cannot be resolved appears nowhere.
pub fn build_threads(comments: &[Comment]) -> Vec<CommentThread> {
    let by_id: HashMap<i64, &Comment> = comments.iter().map(|c| (c.id, c)).collect();

    let mut reply_groups: HashMap<i64, Vec<CommentNode>> = HashMap::new();
    for comment in comments {
        let Some(parent_id) = comment.reply_to_id else {
            continue;
        };
        let Some(root_id) = resolve_root(&by_id, comment) else {
            continue;
        };
        // resolve_root succeeded, so the immediate parent is present.
        let parent = by_id[&parent_id];
        let replying_to_name = if parent.reply_to_id.is_none() {
            None
        } else {
            Some(parent.author.name.clone())
        };
        reply_groups.entry(root_id).or_default().push(CommentNode {
            comment: comment.clone(),
            replying_to_name,
        });
    }

    let mut roots: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.reply_to_id.is_none())
        .collect();
    roots.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));

    roots
        .into_iter()
        .map(|root| {
            let mut replies = reply_groups.remove(&root.id).unwrap_or_default();
            replies.sort_by(|a, b| {
                a.comment
                    .created
                    .cmp(&b.comment.created)
                    .then(a.comment.id.cmp(&b.comment.id))
            });
            CommentThread {
                root: root.clone(),
                replies,
            }
        })
        .collect()
}
