//! Parent/child hierarchy over a flat issue list.

use std::collections::HashMap;

use crate::api::types::Issue;

/// An issue with the issues that name it as their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueNode {
    pub issue: Issue,
    pub children: Vec<IssueNode>,
}

impl IssueNode {
    fn leaf(issue: Issue) -> Self {
        Self {
            issue,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(IssueNode::subtree_size).sum::<usize>()
    }
}

/// Build a forest from issues in display order.
///
/// An issue becomes a child of the issue whose key matches its parent key
/// when that key is present anywhere in `issues`; otherwise it is a root.
/// Roots and siblings keep their input order. When a key occurs more than
/// once, the first occurrence is the one children attach to.
///
/// Parent chains that loop back on themselves are cut at the first member
/// in input order, which becomes a root, so every input issue appears
/// exactly once in the result.
pub fn build_forest(issues: Vec<Issue>) -> Vec<IssueNode> {
    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(issues.len());
    for (index, issue) in issues.iter().enumerate() {
        lookup.entry(issue.key.as_str()).or_insert(index);
    }

    let mut parent_of: Vec<Option<usize>> = issues
        .iter()
        .map(|issue| issue.parent_key().and_then(|key| lookup.get(key).copied()))
        .collect();
    drop(lookup);

    break_cycles(&mut parent_of);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); issues.len()];
    let mut roots = Vec::new();
    for (index, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(index),
            None => roots.push(index),
        }
    }

    let mut slots: Vec<Option<Issue>> = issues.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|index| assemble(index, &mut slots, &children))
        .collect()
}

/// Detach the first-encountered member of every parent cycle.
fn break_cycles(parent_of: &mut [Option<usize>]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parent_of.len()];
    for start in 0..parent_of.len() {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            match state[index] {
                DONE => break,
                ON_PATH => {
                    // `index` closes a loop; cut it at the earliest member.
                    let loop_start = path.iter().position(|&i| i == index).unwrap_or(0);
                    if let Some(&first) = path[loop_start..].iter().min() {
                        parent_of[first] = None;
                    }
                    break;
                }
                _ => {
                    state[index] = ON_PATH;
                    path.push(index);
                    current = parent_of[index];
                }
            }
        }
        for index in path {
            state[index] = DONE;
        }
    }
}

fn assemble(index: usize, slots: &mut [Option<Issue>], children: &[Vec<usize>]) -> Option<IssueNode> {
    let issue = slots[index].take()?;
    let mut node = IssueNode::leaf(issue);
    node.children = children[index]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(node)
}

/// Total number of nodes at every depth.
pub fn node_count(forest: &[IssueNode]) -> usize {
    forest.iter().map(IssueNode::subtree_size).sum()
}

/// Depth-first pre-order walk yielding `(depth, issue)` rows.
pub fn flatten(forest: &[IssueNode]) -> Vec<(usize, &Issue)> {
    fn walk<'a>(nodes: &'a [IssueNode], depth: usize, out: &mut Vec<(usize, &'a Issue)>) {
        for node in nodes {
            out.push((depth, &node.issue));
            walk(&node.children, depth + 1, out);
        }
    }

    let mut rows = Vec::with_capacity(node_count(forest));
    walk(forest, 0, &mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{IssueFields, IssueType, ParentRef, Status};

    fn issue(key: &str, parent: Option<&str>) -> Issue {
        Issue {
            id: key.to_lowercase(),
            key: key.to_string(),
            self_url: None,
            fields: IssueFields {
                summary: format!("Summary of {}", key),
                status: Status {
                    id: "1".to_string(),
                    name: "To Do".to_string(),
                    status_category: None,
                },
                issuetype: IssueType {
                    id: "1".to_string(),
                    name: "Task".to_string(),
                    subtask: false,
                    icon_url: None,
                },
                assignee: None,
                parent: parent.map(|p| ParentRef {
                    id: String::new(),
                    key: p.to_string(),
                }),
            },
        }
    }

    fn keys(nodes: &[IssueNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.issue.key.as_str()).collect()
    }

    fn all_keys(forest: &[IssueNode]) -> Vec<&str> {
        let mut keys: Vec<&str> = flatten(forest).into_iter().map(|(_, i)| i.key.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_example_missing_parent_becomes_root() {
        let forest = build_forest(vec![
            issue("A", None),
            issue("B", Some("A")),
            issue("C", Some("Z")),
        ]);

        assert_eq!(keys(&forest), vec!["A", "C"]);
        assert_eq!(keys(&forest[0].children), vec!["B"]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_no_parents_gives_flat_roots_in_order() {
        let input: Vec<Issue> = ["K-3", "K-1", "K-2", "K-9"]
            .iter()
            .map(|k| issue(k, None))
            .collect();
        let forest = build_forest(input);

        assert_eq!(keys(&forest), vec!["K-3", "K-1", "K-2", "K-9"]);
        assert!(forest.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_forest(Vec::new()).is_empty());
    }

    #[test]
    fn test_child_listed_before_parent_is_still_linked() {
        let forest = build_forest(vec![
            issue("B", Some("A")),
            issue("C", Some("A")),
            issue("A", None),
        ]);

        assert_eq!(keys(&forest), vec!["A"]);
        assert_eq!(keys(&forest[0].children), vec!["B", "C"]);
    }

    #[test]
    fn test_multi_level_hierarchy_counts_every_node() {
        let input = vec![
            issue("EPIC-1", None),
            issue("STORY-1", Some("EPIC-1")),
            issue("SUB-1", Some("STORY-1")),
            issue("STORY-2", Some("EPIC-1")),
            issue("SUB-2", Some("STORY-1")),
            issue("EPIC-2", None),
        ];
        let forest = build_forest(input);

        assert_eq!(node_count(&forest), 6);
        assert_eq!(keys(&forest), vec!["EPIC-1", "EPIC-2"]);
        assert_eq!(keys(&forest[0].children), vec!["STORY-1", "STORY-2"]);
        assert_eq!(keys(&forest[0].children[0].children), vec!["SUB-1", "SUB-2"]);
        assert_eq!(
            all_keys(&forest),
            vec!["EPIC-1", "EPIC-2", "STORY-1", "STORY-2", "SUB-1", "SUB-2"]
        );
    }

    #[test]
    fn test_flatten_reports_depth_in_preorder() {
        let forest = build_forest(vec![
            issue("A", None),
            issue("B", Some("A")),
            issue("C", Some("B")),
            issue("D", None),
        ]);
        let rows: Vec<(usize, &str)> = flatten(&forest)
            .into_iter()
            .map(|(depth, i)| (depth, i.key.as_str()))
            .collect();
        assert_eq!(rows, vec![(0, "A"), (1, "B"), (2, "C"), (0, "D")]);
    }

    #[test]
    fn test_two_issue_cycle_keeps_both_nodes() {
        let forest = build_forest(vec![
            issue("X", Some("Y")),
            issue("Y", Some("X")),
            issue("Z", None),
        ]);

        assert_eq!(node_count(&forest), 3);
        assert_eq!(keys(&forest), vec!["X", "Z"]);
        assert_eq!(keys(&forest[0].children), vec!["Y"]);
    }

    #[test]
    fn test_self_parent_is_root() {
        let forest = build_forest(vec![issue("A", Some("A")), issue("B", Some("A"))]);
        assert_eq!(keys(&forest), vec!["A"]);
        assert_eq!(keys(&forest[0].children), vec!["B"]);
    }

    #[test]
    fn test_chain_into_cycle_hangs_off_cut_point() {
        // T -> Q -> R -> Q; the loop Q/R is cut at Q (earliest in input).
        let forest = build_forest(vec![
            issue("Q", Some("R")),
            issue("R", Some("Q")),
            issue("T", Some("Q")),
        ]);
        assert_eq!(node_count(&forest), 3);
        assert_eq!(keys(&forest), vec!["Q"]);
        assert_eq!(keys(&forest[0].children), vec!["R", "T"]);
    }

    #[test]
    fn test_duplicate_keys_attach_to_first_and_keep_count() {
        let forest = build_forest(vec![
            issue("A", None),
            issue("A", None),
            issue("B", Some("A")),
        ]);
        assert_eq!(node_count(&forest), 3);
        assert_eq!(keys(&forest), vec!["A", "A"]);
        assert_eq!(keys(&forest[0].children), vec!["B"]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_every_parent_present_preserves_count_without_duplicates() {
        // Deterministic pseudo-random parent assignment over earlier issues.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for size in 1..40usize {
            let mut input = vec![issue("N-0", None)];
            for i in 1..size {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                let parent = (seed as usize) % i;
                input.push(issue(&format!("N-{}", i), Some(&format!("N-{}", parent))));
            }
            // Reverse so children often precede their parents.
            input.reverse();

            let forest = build_forest(input);
            assert_eq!(node_count(&forest), size);
            let mut seen = all_keys(&forest);
            seen.dedup();
            assert_eq!(seen.len(), size);
            assert_eq!(keys(&forest), vec!["N-0"]);
        }
    }
}
