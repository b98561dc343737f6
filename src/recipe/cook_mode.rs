use std::collections::BTreeSet;

use serde::Serialize;

const BLOCK_TAGS: &[&str] = &[
    "p", "li", "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote",
];

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

fn decode_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| {
            acc.replace(entity, plain)
        })
}

fn flush(buffer: &mut String, steps: &mut Vec<String>) {
    let step = decode_entities(buffer)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if !step.is_empty() {
        steps.push(step);
    }
    buffer.clear();
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// True when the text holds something shaped like a tag: `<` followed by a
/// letter, or by `/` and a letter.
fn has_markup(text: &str) -> bool {
    text.match_indices('<').any(|(start, _)| {
        let mut rest = text[start + 1..].chars();
        match rest.next() {
            Some('/') => rest.next().is_some_and(|c| c.is_ascii_alphabetic()),
            Some(c) => c.is_ascii_alphabetic(),
            None => false,
        }
    })
}

/// Splits the rich-text steps of a recipe into plain step strings.
///
/// Every block element starts a new step and inline markup is dropped.
/// Text without any markup is split by lines.
pub fn extract_steps(rich_text: &str) -> Vec<String> {
    let mut steps = vec![];

    if !has_markup(rich_text) {
        let mut buffer = String::new();
        for line in rich_text.lines() {
            buffer.push_str(line);
            flush(&mut buffer, &mut steps);
        }
        return steps;
    }

    let mut buffer = String::new();
    let mut rest = rich_text;
    while let Some(start) = rest.find('<') {
        buffer.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };

        let tag = &rest[start + 1..start + end];
        if BLOCK_TAGS.contains(&tag_name(tag).as_str()) {
            flush(&mut buffer, &mut steps);
        }
        rest = &rest[start + end + 1..];
    }
    buffer.push_str(rest);
    flush(&mut buffer, &mut steps);

    steps
}

/// Position of a cook working through a recipe one step at a time.
#[derive(Debug, Clone, Serialize)]
pub struct CookMode {
    steps: Vec<String>,
    index: usize,
    completed: BTreeSet<usize>,
}

impl CookMode {
    pub fn new(steps: Vec<String>) -> Self {
        Self {
            steps,
            index: 0,
            completed: BTreeSet::new(),
        }
    }

    pub fn from_rich_text(rich_text: &str) -> Self {
        Self::new(extract_steps(rich_text))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.steps.get(self.index).map(String::as_str)
    }

    /// Moves forward; returns `false` when already at the last step.
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.steps.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.steps.len() {
            return false;
        }
        self.index = index;
        true
    }

    /// Flips the completed mark of the current step and returns the new mark.
    pub fn toggle_completed(&mut self) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        if !self.completed.remove(&self.index) {
            self.completed.insert(self.index);
            return true;
        }
        false
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.completed.len() as f64 / self.steps.len() as f64
    }

    pub fn is_finished(&self) -> bool {
        !self.steps.is_empty() && self.completed.len() == self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_list_items() {
        let html = "<ol><li><p>Boil the <strong>water</strong>.</p></li><li>Add pasta &amp; salt</li></ol>";
        assert_eq!(
            extract_steps(html),
            vec!["Boil the water.", "Add pasta & salt"]
        );
    }

    #[test]
    fn paragraphs_and_breaks() {
        let html = "<p>Preheat oven</p><p></p><p>Mix<br>Bake 20&nbsp;min</p>";
        assert_eq!(
            extract_steps(html),
            vec!["Preheat oven", "Mix", "Bake 20 min"]
        );
    }

    #[test]
    fn plain_text_lines() {
        assert_eq!(
            extract_steps("Chop onions\n\n  Fry them  \n"),
            vec!["Chop onions", "Fry them"]
        );
    }

    #[test]
    fn comparisons_are_not_markup() {
        assert_eq!(
            extract_steps("Heat to < 200C\nServe"),
            vec!["Heat to < 200C", "Serve"]
        );
        assert_eq!(extract_steps("1 <2 cups\n<3"), vec!["1 <2 cups", "<3"]);
        assert_eq!(extract_steps("Stir</p>Rest"), vec!["Stir", "Rest"]);
    }

    #[test]
    fn navigation_is_bounds_checked() {
        let mut mode = CookMode::new(vec!["a".into(), "b".into(), "c".into()]);
        assert!(!mode.previous());
        assert_eq!(mode.current(), Some("a"));
        assert!(mode.next());
        assert!(mode.next());
        assert!(!mode.next());
        assert_eq!(mode.current(), Some("c"));
        assert!(!mode.go_to(3));
        assert!(mode.go_to(0));
        assert_eq!(mode.index(), 0);
    }

    #[test]
    fn completion_tracking() {
        let mut mode = CookMode::new(vec!["a".into(), "b".into()]);
        assert!(mode.toggle_completed());
        assert!(mode.is_completed(0));
        assert!(!mode.toggle_completed());
        assert!(!mode.is_completed(0));

        mode.toggle_completed();
        mode.next();
        mode.toggle_completed();
        assert!(mode.is_finished());
        assert_eq!(mode.progress(), 1.0);
    }

    #[test]
    fn empty_recipe() {
        let mut mode = CookMode::from_rich_text("");
        assert!(mode.is_empty());
        assert_eq!(mode.current(), None);
        assert!(!mode.next());
        assert!(!mode.toggle_completed());
        assert!(!mode.is_finished());
    }
}
