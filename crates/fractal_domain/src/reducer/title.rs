use crate::{PROJECT_TITLE_MAX_CHARS, UNTITLED_PROJECT_TITLE};

/// First line of the prompt, cut to `PROJECT_TITLE_MAX_CHARS` characters.
pub fn derive_project_title(prompt: &str) -> String {
    let first_line = prompt.split('\n').next().unwrap_or_default();

    let title: String = first_line.chars().take(PROJECT_TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        return UNTITLED_PROJECT_TITLE.to_owned();
    }
    title
}
