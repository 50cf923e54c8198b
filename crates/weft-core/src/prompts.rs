//! Thin markdown block-concatenation helper for assembling prompts.

use crate::messages::Message;

#[derive(Clone, Debug, Default)]
struct Block {
    content: String,
    title: Option<String>,
    level: usize,
}

/// Builds prompts out of composable markdown blocks.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    blocks: Vec<Block>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(mut self, content: impl Into<String>) -> Self {
        self.blocks.push(Block {
            content: content.into(),
            title: None,
            level: 1,
        });
        self
    }

    pub fn add_titled_block(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.blocks.push(Block {
            content: content.into(),
            title: Some(title.into()),
            level: 1,
        });
        self
    }

    pub fn add_heading(mut self, title: impl Into<String>, level: usize) -> Self {
        self.blocks.push(Block {
            content: String::new(),
            title: Some(title.into()),
            level: level.clamp(1, 6),
        });
        self
    }

    pub fn add_h1(self, title: impl Into<String>) -> Self {
        self.add_heading(title, 1)
    }

    pub fn add_h2(self, title: impl Into<String>) -> Self {
        self.add_heading(title, 2)
    }

    pub fn add_h3(self, title: impl Into<String>) -> Self {
        self.add_heading(title, 3)
    }

    pub fn add_paragraph(self, content: impl Into<String>) -> Self {
        self.add_block(content)
    }

    pub fn add_code_block(self, code: impl AsRef<str>, language: &str) -> Self {
        self.add_block(format!("```{}\n{}\n```", language, code.as_ref()))
    }

    pub fn add_list<I, S>(self, items: I, ordered: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rendered: Vec<String> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if ordered {
                    format!("{}. {}", i + 1, item.as_ref())
                } else {
                    format!("- {}", item.as_ref())
                }
            })
            .collect();
        self.add_block(rendered.join("\n"))
    }

    pub fn add_unordered_list<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_list(items, false)
    }

    pub fn add_ordered_list<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_list(items, true)
    }

    pub fn add_blockquote(self, content: impl AsRef<str>) -> Self {
        let quoted: Vec<String> = content
            .as_ref()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("> {}", line))
            .collect();
        self.add_block(quoted.join("\n"))
    }

    pub fn add_separator(self) -> Self {
        self.add_block("---")
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn clear(mut self) -> Self {
        self.blocks.clear();
        self
    }

    /// Renders all blocks to markdown, separated by blank lines.
    pub fn build(&self) -> String {
        let mut rendered = Vec::new();

        for block in &self.blocks {
            let mut parts = Vec::new();

            if let Some(title) = &block.title {
                parts.push(format!("{} {}", "#".repeat(block.level), title));
                if !block.content.is_empty() {
                    parts.push(String::new());
                }
            }

            if !block.content.is_empty() {
                parts.push(block.content.clone());
            }

            if !parts.is_empty() {
                rendered.push(parts.join("\n"));
            }
        }

        rendered.join("\n\n")
    }

    pub fn build_user_message(&self) -> Message {
        Message::user(self.build())
    }
}

impl std::fmt::Display for PromptBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titled_block_renders_heading() {
        let prompt = PromptBuilder::new()
            .add_titled_block("Context", "some text")
            .build();
        assert_eq!(prompt, "# Context\n\nsome text");
    }

    #[test]
    fn test_blocks_joined_by_blank_lines() {
        let prompt = PromptBuilder::new()
            .add_block("one")
            .add_heading("Two", 2)
            .add_block("three")
            .build();
        assert_eq!(prompt, "one\n\n## Two\n\nthree");
    }

    #[test]
    fn test_lists_and_code() {
        let prompt = PromptBuilder::new()
            .add_list(["a", "b"], true)
            .add_code_block("let x = 1;", "rust")
            .build();
        assert_eq!(prompt, "1. a\n2. b\n\n```rust\nlet x = 1;\n```");
    }
}
