// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent definition files.
//!
//! Definitions are markdown files named after the agent, read from two
//! places: the user's local overrides under
//! `<config>/multiclaude/repos/<repo>/agents/` and the repository's
//! checked-in `.multiclaude/agents/`. When both define the same agent the
//! local base is preserved and the repo body is appended under a labeled
//! separator — the repo never silently replaces the base.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Separator inserted between the local base and appended repo content.
const MERGE_SEPARATOR: &str = "\n\n---\n\n## Repository additions\n\n";

/// Where a definition's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionOrigin {
    /// Only the local override directory defines this agent.
    Local,
    /// Only the repository defines this agent.
    Repo,
    /// Both define it; the content is the merged body.
    Merged,
}

/// A named agent definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDefinition {
    /// Markdown filename stem.
    pub name: String,
    /// Full markdown body.
    pub content: String,
    pub origin: DefinitionOrigin,
    /// File the content was read from; the local file when merged.
    pub source_path: PathBuf,
}

/// Local override directory for a repository's agent definitions.
pub fn local_definitions_dir(repo: &str) -> Option<PathBuf> {
    Some(
        dirs::config_dir()?
            .join("multiclaude")
            .join("repos")
            .join(repo)
            .join("agents"),
    )
}

/// Checked-in definition directory inside a repository checkout.
pub fn repo_definitions_dir(repo_path: &Path) -> PathBuf {
    repo_path.join(".multiclaude").join("agents")
}

/// Read and merge agent definitions from the two directories.
///
/// Returns definitions sorted by name. Either directory may be missing.
pub fn load_definitions(
    local_dir: &Path,
    repo_dir: &Path,
) -> io::Result<Vec<AgentDefinition>> {
    let local = read_definition_dir(local_dir)?;
    let repo = read_definition_dir(repo_dir)?;

    let mut merged: BTreeMap<String, AgentDefinition> = BTreeMap::new();

    for (name, (path, content)) in local {
        merged.insert(
            name.clone(),
            AgentDefinition {
                name,
                content,
                origin: DefinitionOrigin::Local,
                source_path: path,
            },
        );
    }

    for (name, (path, content)) in repo {
        match merged.get_mut(&name) {
            Some(existing) => {
                existing.content = merge_content(&existing.content, &content);
                existing.origin = DefinitionOrigin::Merged;
            }
            None => {
                merged.insert(
                    name.clone(),
                    AgentDefinition {
                        name,
                        content,
                        origin: DefinitionOrigin::Repo,
                        source_path: path,
                    },
                );
            }
        }
    }

    Ok(merged.into_values().collect())
}

/// Append repo content to the local base under the separator.
///
/// Merging is idempotent: a repo body that is already the result of a
/// previous merge with the same base comes back unchanged, so
/// `merge(a, merge(a, b)) == merge(a, b)`.
fn merge_content(base: &str, repo: &str) -> String {
    if let Some(rest) = repo.strip_prefix(base) {
        if rest.starts_with(MERGE_SEPARATOR) {
            return repo.to_string();
        }
    }
    format!("{base}{MERGE_SEPARATOR}{repo}")
}

/// Map of definition name → (path, content) for one directory.
fn read_definition_dir(dir: &Path) -> io::Result<BTreeMap<String, (PathBuf, String)>> {
    let mut definitions = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(definitions),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let content = std::fs::read_to_string(&path)?;
        definitions.insert(name.to_string(), (path.clone(), content));
    }

    Ok(definitions)
}

#[cfg(test)]
#[path = "definitions_tests.rs"]
mod tests;
