use crate::nest::tree::Node;
use anyhow::{Context, Result};
use std::io::Write;

/// Writes result trees as JSON
pub struct TreeWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> TreeWriter<W> {
    pub fn new(writer: W) -> Self {
        TreeWriter {
            writer,
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write the whole tree as a single JSON document
    pub fn write_tree(&mut self, tree: &Node) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(tree)
        } else {
            serde_json::to_string(tree)
        }
        .context("Failed to serialize tree")?;

        writeln!(self.writer, "{}", json).context("Failed to write tree")
    }

    /// Write one root entity per line (JSON Lines)
    ///
    /// Identity keys of a keyed root are not written; entities normally carry
    /// their identity column as a field.
    pub fn write_entities(&mut self, tree: &Node) -> Result<usize> {
        let entities = match tree {
            Node::Keyed(_) | Node::List(_) => tree.children(),
            other => vec![other],
        };

        for entity in &entities {
            let json = serde_json::to_string(entity).context("Failed to serialize entity")?;
            writeln!(self.writer, "{}", json).context("Failed to write entity")?;
        }

        Ok(entities.len())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nest::tree::IdentityKey;
    use serde_json::json;

    fn tree() -> Node {
        let user = |id: i64, name: &str| {
            Node::Record(
                [
                    ("userId".to_string(), Node::Value(json!(id))),
                    ("userName".to_string(), Node::Value(json!(name))),
                ]
                .into_iter()
                .collect(),
            )
        };

        Node::Keyed(
            [
                (IdentityKey::Int(3), user(3, "MoròSwitie")),
                (IdentityKey::Int(66), user(66, "Angie")),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_write_tree() {
        let mut buffer = Vec::new();
        let mut writer = TreeWriter::new(&mut buffer);

        writer.write_tree(&tree()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["66"]["userName"], "Angie");
    }

    #[test]
    fn test_write_entities() {
        let mut buffer = Vec::new();
        let mut writer = TreeWriter::new(&mut buffer);

        let count = writer.write_entities(&tree()).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("MoròSwitie"));
        assert!(lines[1].contains("Angie"));
    }
}
