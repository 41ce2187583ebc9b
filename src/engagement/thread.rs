//! Assembly of flat comment lists into reply threads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::comment::{Author, Comment};

/// A comment with its nested replies, as returned by the comments endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadedComment {
    pub id: String,
    pub video_id: String,
    pub comment: String,
    pub rating: f64,
    pub parent_id: Option<String>,
    pub user: Author,
    pub timestamp: DateTime<Utc>,
    pub replies: Vec<Self>,
}

impl ThreadedComment {
    fn leaf(comment: Comment) -> Self {
        Self {
            id: comment.id,
            video_id: comment.video_id,
            comment: comment.body,
            rating: comment.rating,
            parent_id: comment.parent_id,
            user: comment.user,
            timestamp: comment.created_at,
            replies: Vec::new(),
        }
    }

    /// Number of comments in this subtree, including this one.
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        1 + self.replies.iter().map(Self::count_nodes).sum::<usize>()
    }
}

/// Builds a reply forest from the comments of one movie.
///
/// Comments are processed oldest first (ties by insertion order). A comment
/// is attached to its parent only if the parent has already been processed;
/// otherwise it becomes a top-level entry. Every input comment appears
/// exactly once in the output.
#[must_use]
pub fn assemble(mut comments: Vec<Comment>) -> Vec<ThreadedComment> {
    comments.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.seq.cmp(&b.seq))
    });

    // parent[i] is the index of i's parent, if attached
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(comments.len());
    let mut parent: Vec<Option<usize>> = Vec::with_capacity(comments.len());
    for (index, comment) in comments.iter().enumerate() {
        let attached = comment
            .parent_id
            .as_deref()
            .and_then(|pid| seen.get(pid).copied());
        parent.push(attached);
        seen.entry(comment.id.as_str()).or_insert(index);
    }

    // Parents always precede children, so building back to front completes
    // every child before its parent is reached.
    let mut pending: Vec<ThreadedComment> =
        comments.into_iter().map(ThreadedComment::leaf).collect();
    let mut children: Vec<Vec<ThreadedComment>> = vec![Vec::new(); pending.len()];
    let mut roots = Vec::new();

    while let Some(mut node) = pending.pop() {
        let index = pending.len();
        let mut replies = std::mem::take(&mut children[index]);
        replies.reverse();
        node.replies = replies;

        match parent[index] {
            Some(p) => children[p].push(node),
            None => roots.push(node),
        }
    }

    roots.reverse();
    roots
}

/// Total number of comments in a forest.
#[must_use]
pub fn count_all(forest: &[ThreadedComment]) -> usize {
    forest.iter().map(ThreadedComment::count_nodes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comment(seq: i32, id: &str, parent: Option<&str>, minute: u32) -> Comment {
        Comment {
            seq,
            id: id.to_string(),
            video_id: "603".to_string(),
            body: format!("comment {id}"),
            rating: 4.0,
            parent_id: parent.map(str::to_string),
            user: Author {
                id: 1,
                name: "neo".to_string(),
            },
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    fn ids(forest: &[ThreadedComment]) -> Vec<&str> {
        forest.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_flat_comments_stay_in_time_order() {
        let forest = assemble(vec![
            comment(2, "b", None, 5),
            comment(1, "a", None, 1),
            comment(3, "c", None, 9),
        ]);
        assert_eq!(ids(&forest), vec!["a", "b", "c"]);
        assert!(forest.iter().all(|c| c.replies.is_empty()));
    }

    #[test]
    fn test_replies_nest_at_any_depth() {
        let forest = assemble(vec![
            comment(1, "root", None, 1),
            comment(2, "r1", Some("root"), 2),
            comment(3, "r2", Some("root"), 3),
            comment(4, "r1a", Some("r1"), 4),
            comment(5, "other", None, 5),
        ]);

        assert_eq!(ids(&forest), vec!["root", "other"]);
        assert_eq!(ids(&forest[0].replies), vec!["r1", "r2"]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec!["r1a"]);
        assert_eq!(count_all(&forest), 5);
    }

    #[test]
    fn test_orphans_become_top_level() {
        let forest = assemble(vec![
            comment(1, "a", Some("missing"), 1),
            comment(2, "b", None, 2),
        ]);
        assert_eq!(ids(&forest), vec!["a", "b"]);
        assert_eq!(count_all(&forest), 2);
    }

    #[test]
    fn test_reply_older_than_parent_is_not_attached() {
        let forest = assemble(vec![
            comment(2, "child", Some("parent"), 1),
            comment(1, "parent", None, 2),
        ]);
        assert_eq!(ids(&forest), vec!["child", "parent"]);
        assert!(forest[1].replies.is_empty());
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_insertion() {
        let forest = assemble(vec![
            comment(2, "reply", Some("first"), 1),
            comment(1, "first", None, 1),
        ]);
        assert_eq!(ids(&forest), vec!["first"]);
        assert_eq!(ids(&forest[0].replies), vec!["reply"]);
    }

    #[test]
    fn test_self_parent_and_duplicate_ids_are_not_dropped() {
        let forest = assemble(vec![
            comment(1, "loop", Some("loop"), 1),
            comment(2, "dup", None, 2),
            comment(3, "dup", None, 3),
            comment(4, "child", Some("dup"), 4),
        ]);

        assert_eq!(count_all(&forest), 4);
        assert_eq!(ids(&forest), vec!["loop", "dup", "dup"]);
        assert_eq!(ids(&forest[1].replies), vec!["child"]);
    }

    #[test]
    fn test_serialized_shape() {
        let forest = assemble(vec![comment(1, "a", None, 1)]);
        let json = serde_json::to_value(&forest[0]).unwrap();
        assert_eq!(json["comment"], "comment a");
        assert_eq!(json["videoId"], "603");
        assert_eq!(json["user"]["name"], "neo");
        assert!(json["parentId"].is_null());
        assert!(json["replies"].as_array().unwrap().is_empty());
        assert!(json["timestamp"].is_string());
    }
}
