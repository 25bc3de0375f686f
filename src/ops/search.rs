use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::task::Task;

/// A task whose description matched a search pattern
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub task: Task,
    /// Byte ranges of every match within the description
    pub spans: Vec<Range<usize>>,
}

/// Compile a user-supplied pattern. Matching is case-insensitive.
pub fn build_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search task descriptions, preserving the order of `tasks`.
pub fn search_tasks(tasks: &[Task], re: &Regex) -> Vec<SearchHit> {
    tasks
        .iter()
        .filter_map(|task| {
            let spans = find_matches(re, task.description());
            (!spans.is_empty()).then(|| SearchHit {
                task: task.clone(),
                spans,
            })
        })
        .collect()
}
