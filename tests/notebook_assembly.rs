//! Notebook assembly and nbformat round trips

use data_prep_agent::notebook::{
    CellKind, assemble_notebook, read_notebook, to_notebook_json, write_notebook,
};
use serde_json::Value;

fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn marked_response_yields_four_cells() {
    let nb = assemble_notebook(
        "code block:\nprint(1)\ncomment block:\nHello",
        "data_files/train.csv",
        &keys(&["color"]),
        &keys(&["band1", "band2"]),
    );
    let summary = nb.cell_summary();
    assert_eq!(summary.len(), 4);
    assert_eq!(summary[0].0, CellKind::Code);
    assert!(summary[0].1.contains("pd.read_csv('data_files/train.csv')"));
    assert_eq!(summary[1].0, CellKind::Code);
    assert!(summary[1].1.contains("X = df[['band1', 'band2']].values"));
    assert!(summary[1].1.contains("y = df[['color']].values"));
    assert_eq!(summary[2], (CellKind::Code, "print(1)"));
    assert_eq!(summary[3], (CellKind::Markdown, "Hello"));
}

#[test]
fn unmarked_response_keeps_only_standard_cells() {
    let nb = assemble_notebook(
        "Here is some prose with no markers at all.",
        "train.csv",
        &keys(&["y"]),
        &keys(&["x"]),
    );
    assert_eq!(nb.cells.len(), 2);
}

#[test]
fn quotes_in_column_names_are_escaped() {
    let nb = assemble_notebook("", "it's/train.csv", &keys(&["lab'el"]), &keys(&["a\\b"]));
    let summary = nb.cell_summary();
    assert!(summary[0].1.contains(r"pd.read_csv('it\'s/train.csv')"));
    assert!(summary[1].1.contains(r"df[['a\\b']]"));
    assert!(summary[1].1.contains(r"df[['lab\'el']]"));
}

#[test]
fn serialized_document_is_nbformat_4_5() {
    let nb = assemble_notebook("code block: x = 1", "train.csv", &keys(&["y"]), &keys(&["x"]));
    let text = to_notebook_json(&nb).unwrap();
    assert!(text.starts_with("{\n \""));
    assert!(text.ends_with("}\n"));

    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["nbformat"], 4);
    assert_eq!(doc["nbformat_minor"], 5);
    assert_eq!(doc["metadata"]["kernelspec"]["language"], "python");
    let cells = doc["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 3);
    for cell in cells {
        assert!(cell["id"].is_string());
        assert!(cell["metadata"].is_object());
    }
    assert_eq!(cells[2]["cell_type"], "code");
    assert!(cells[2]["outputs"].as_array().unwrap().is_empty());
}

#[test]
fn write_then_read_preserves_cell_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out/generated_notebook.ipynb");
    let nb = assemble_notebook(
        "intro\ncomment block: # Title\ncode block:\nimport numpy as np\ncode block:\n",
        "train.csv",
        &keys(&["label"]),
        &keys(&["f1"]),
    );
    write_notebook(&path, &nb).unwrap();

    let back = read_notebook(&path).unwrap();
    assert_eq!(back.cell_summary(), nb.cell_summary());
    assert_eq!(back.cells.len(), 5);
    assert_eq!(back.cell_summary()[4], (CellKind::Code, ""));
}

#[test]
fn reads_list_form_sources_written_by_jupyter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jupyter.ipynb");
    std::fs::write(
        &path,
        r##"{
 "cells": [
  {"cell_type": "markdown", "id": "abc", "metadata": {}, "source": ["# Title\n", "body"]},
  {"cell_type": "code", "execution_count": 3, "id": "def", "metadata": {}, "outputs": [], "source": "x = 1"}
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5
}"##,
    )
    .unwrap();

    let nb = read_notebook(&path).unwrap();
    assert_eq!(
        nb.cell_summary(),
        vec![(CellKind::Markdown, "# Title\nbody"), (CellKind::Code, "x = 1")]
    );
}
