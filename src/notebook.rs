//! Notebook assembly from `code block:` / `comment block:` model output.
//!
//! The model's reply is a flat text stream; every `code block:` or
//! `comment block:` marker opens a segment that runs until the next marker.
//! Each segment becomes one cell. Two fixed cells that load the dataset and
//! split it into `X`/`y` are always placed first.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::deserializers::de_multiline_source;
use crate::error::Result;

static BLOCK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(code block|comment block):\s*\n?").expect("block marker regex is valid")
});

/// One segment of model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBlock {
    Code(String),
    Comment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Code,
    Markdown,
    Raw,
}

/// nbformat v4 cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        #[serde(default)]
        execution_count: Option<u32>,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        outputs: Vec<Value>,
        #[serde(deserialize_with = "de_multiline_source")]
        source: String,
    },
    Markdown {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(deserialize_with = "de_multiline_source")]
        source: String,
    },
    Raw {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(deserialize_with = "de_multiline_source")]
        source: String,
    },
}

fn new_cell_id() -> Option<String> {
    // nbformat 4.5 ids: 1-64 chars of [a-zA-Z0-9-_]
    Some(uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
}

impl Cell {
    pub fn code(source: impl Into<String>) -> Self {
        Cell::Code {
            execution_count: None,
            id: new_cell_id(),
            metadata: Map::new(),
            outputs: Vec::new(),
            source: source.into(),
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Cell::Markdown {
            id: new_cell_id(),
            metadata: Map::new(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Code { .. } => CellKind::Code,
            Cell::Markdown { .. } => CellKind::Markdown,
            Cell::Raw { .. } => CellKind::Raw,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source
            }
        }
    }
}

impl From<ResponseBlock> for Cell {
    fn from(block: ResponseBlock) -> Self {
        match block {
            ResponseBlock::Code(content) => Cell::code(content),
            ResponseBlock::Comment(content) => Cell::markdown(content),
        }
    }
}

/// nbformat v4 notebook document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl Default for Notebook {
    fn default() -> Self {
        let metadata = json!({
            "kernelspec": {
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            },
            "language_info": {
                "name": "python"
            }
        });
        Self {
            cells: Vec::new(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }
}

impl Notebook {
    /// (kind, source) pairs in order; ids and metadata are ignored
    pub fn cell_summary(&self) -> Vec<(CellKind, &str)> {
        self.cells.iter().map(|c| (c.kind(), c.source())).collect()
    }
}

/// Split model output into code/comment blocks in input order.
///
/// Text before the first marker is discarded. A marker with nothing after it
/// still yields a block with empty content.
pub fn parse_blocks(input: &str) -> Vec<ResponseBlock> {
    let matches: Vec<_> = BLOCK_MARKER.captures_iter(input).collect();
    let mut blocks = Vec::with_capacity(matches.len());

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(input.len(), |m| m.start());
        let content = input[whole.end()..end].trim().to_string();
        blocks.push(match kind.as_str() {
            "code block" => ResponseBlock::Code(content),
            _ => ResponseBlock::Comment(content),
        });
    }

    blocks
}

/// Quote `s` as a single-quoted Python string literal
pub fn python_str_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render `items` as a Python list of string literals: `['a', 'b']`
pub fn python_list_literal(items: &[String]) -> String {
    let inner: Vec<String> = items.iter().map(|s| python_str_literal(s)).collect();
    format!("[{}]", inner.join(", "))
}

/// The cell that imports pandas and loads the dataset into `df`
pub fn load_dataset_cell(dataset_path: &str) -> Cell {
    Cell::code(format!(
        "import pandas as pd\n\n\
         df = pd.read_csv({}) # Replace with the real data file path if needed\n\
         df.head()",
        python_str_literal(dataset_path)
    ))
}

/// The cell that splits `df` into feature and label arrays
pub fn split_features_labels_cell(label_keys: &[String], feature_keys: &[String]) -> Cell {
    Cell::code(format!(
        "# Convert DataFrame to numpy arrays and split into features and labels\n\
         X = df[{}].values\n\
         y = df[{}].values\n\n\
         print(\"Features shape:\", X.shape)\n\
         print(\"Labels shape:\", y.shape)",
        python_list_literal(feature_keys),
        python_list_literal(label_keys)
    ))
}

/// Build the notebook: the two standard cells followed by one cell per block
pub fn assemble_notebook(
    response: &str,
    dataset_path: &str,
    label_keys: &[String],
    feature_keys: &[String],
) -> Notebook {
    let mut cells = vec![
        load_dataset_cell(dataset_path),
        split_features_labels_cell(label_keys, feature_keys),
    ];
    cells.extend(parse_blocks(response).into_iter().map(Cell::from));

    Notebook {
        cells,
        ..Notebook::default()
    }
}

/// Serialize like `nbformat.write`: one-space indent, trailing newline
pub fn to_notebook_json(notebook: &Notebook) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    notebook.serialize(&mut ser)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| crate::error::DataPrepError::Serialization {
        message: e.to_string(),
    })
}

pub fn write_notebook(path: &Path, notebook: &Notebook) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_notebook_json(notebook)?)?;
    Ok(())
}

pub fn read_notebook(path: &Path) -> Result<Notebook> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
