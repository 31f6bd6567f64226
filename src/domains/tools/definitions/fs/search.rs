//! Recursive file search tool definition.
//!
//! Traversal uses an explicit work stack. Every entry is validated on its
//! own: a directory inside the allow-list may still hold a symlink that
//! points out of it.

use glob::{MatchOptions, Pattern};
use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

/// Parameters for the search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsSearchParams {
    /// Directory to search from.
    pub path: String,

    /// Glob pattern. Without a '/', it is matched against entry names
    /// (e.g. "*.rs"); with one, against the path relative to `path`
    /// (e.g. "src/**/*.rs").
    pub pattern: String,

    /// Glob patterns for entries to skip. Excluded directories are not entered.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum depth below `path`; 1 searches only its direct entries.
    /// Must be at least 1 and is capped by the server limit.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SearchResult {
    root: String,
    matches: Vec<String>,
    /// True when the result limit stopped the search early.
    truncated: bool,
    /// Entries skipped because they resolve outside the allowed directories.
    rejected: usize,
}

/// A glob matched either against the entry name or the relative path.
struct Matcher {
    pattern: Pattern,
    whole_path: bool,
}

impl Matcher {
    fn new(raw: &str) -> Result<Self, ToolError> {
        let pattern = Pattern::new(raw).map_err(|e| {
            ToolError::invalid_arguments(format!("Invalid glob pattern '{}': {}", raw, e))
        })?;
        Ok(Self {
            pattern,
            whole_path: raw.contains('/'),
        })
    }

    fn matches(&self, relative: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        if self.whole_path {
            let relative = relative.to_string_lossy().replace('\\', "/");
            self.pattern.matches_with(&relative, options)
        } else {
            relative
                .file_name()
                .is_some_and(|name| self.pattern.matches_with(&name.to_string_lossy(), options))
        }
    }
}

/// Search tool - finds entries below a directory by glob pattern.
pub struct FsSearchTool;

impl FsSearchTool {
    pub const NAME: &'static str = "fs_search";

    pub const DESCRIPTION: &'static str = "Recursively search for files and directories matching a glob pattern. Supports exclude patterns; symlinked directories are not followed.";

    #[instrument(skip_all, fields(path = %params.path, pattern = %params.pattern))]
    pub fn execute(params: &FsSearchParams, ctx: &ToolContext) -> CallToolResult {
        match Self::search(params, ctx) {
            Ok(result) => {
                info!(matches = result.matches.len(), "Search finished");
                let mut summary = if result.matches.is_empty() {
                    "No matches found".to_string()
                } else {
                    result.matches.join("\n")
                };
                if result.truncated {
                    summary.push_str("\n\n(result limit reached, search stopped early)");
                }
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn search(params: &FsSearchParams, ctx: &ToolContext) -> Result<SearchResult, ToolError> {
        let limits = &ctx.config.limits;
        let root = ctx.validate(&params.path)?;
        if !root.is_dir() {
            return Err(ToolError::invalid_arguments(format!(
                "Path is not a directory: {}",
                params.path
            )));
        }

        let matcher = Matcher::new(&params.pattern)?;
        let excludes = params
            .exclude_patterns
            .iter()
            .map(|raw| Matcher::new(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if params.max_depth == Some(0) {
            return Err(ToolError::invalid_arguments(
                "max_depth must be at least 1 (1 searches only the directory's own entries)",
            ));
        }
        let max_depth = params
            .max_depth
            .map_or(limits.max_search_depth, |depth| depth.min(limits.max_search_depth));

        let mut result = SearchResult {
            root: root.to_string_lossy().to_string(),
            matches: Vec::new(),
            truncated: false,
            rejected: 0,
        };
        let mut stack: Vec<(PathBuf, usize)> = vec![(root.clone(), 0)];

        'walk: while let Some((dir, depth)) = stack.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), "Skipping unreadable directory: {}", e);
                    continue;
                }
            };

            let mut children: Vec<_> = entries.filter_map(Result::ok).collect();
            children.sort_by_key(|entry| entry.file_name());

            for entry in children {
                let path = entry.path();
                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                if excludes.iter().any(|exclude| exclude.matches(relative)) {
                    continue;
                }

                if let Err(e) = ctx.validate(&path.to_string_lossy()) {
                    debug!(path = %path.display(), "Skipping entry: {}", e);
                    result.rejected += 1;
                    continue;
                }

                if matcher.matches(relative) {
                    if result.matches.len() >= limits.max_search_results {
                        result.truncated = true;
                        break 'walk;
                    }
                    result.matches.push(path.to_string_lossy().to_string());
                }

                let is_real_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
                if is_real_dir && depth + 1 < max_depth {
                    stack.push((path, depth + 1));
                }
            }
        }

        result.matches.sort();
        Ok(result)
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsSearchParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<SearchResult>()),
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(ctx: Arc<ToolContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        blocking_route(Self::to_tool(), ctx, Self::execute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::security::AllowedDirectories;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};

    fn params(root: &Path, pattern: &str) -> FsSearchParams {
        FsSearchParams {
            path: root.to_string_lossy().to_string(),
            pattern: pattern.to_string(),
            exclude_patterns: Vec::new(),
            max_depth: None,
        }
    }

    fn names(result: &CallToolResult, root: &Path) -> Vec<String> {
        result.structured_content.as_ref().unwrap()["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| {
                Path::new(m.as_str().unwrap())
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn tree(root: &Path) {
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("src/lib.rs"), "").unwrap();
        fs::write(root.join("src/nested/mod.rs"), "").unwrap();
        fs::write(root.join("target/debug/build.rs"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();
    }

    #[test]
    fn test_name_pattern_matches_at_any_depth() {
        let (_temp, root, ctx) = sandbox();
        tree(&root);

        let result = FsSearchTool::execute(&params(&root, "*.rs"), &ctx);
        assert!(!is_error(&result));
        assert_eq!(
            names(&result, &root),
            vec!["src/lib.rs", "src/nested/mod.rs", "target/debug/build.rs"]
        );
    }

    #[test]
    fn test_exclude_prunes_directories() {
        let (_temp, root, ctx) = sandbox();
        tree(&root);

        let mut search = params(&root, "*.rs");
        search.exclude_patterns = vec!["target".to_string()];
        let result = FsSearchTool::execute(&search, &ctx);
        assert_eq!(names(&result, &root), vec!["src/lib.rs", "src/nested/mod.rs"]);
    }

    #[test]
    fn test_relative_path_pattern_and_depth() {
        let (_temp, root, ctx) = sandbox();
        tree(&root);

        let result = FsSearchTool::execute(&params(&root, "src/*.rs"), &ctx);
        assert_eq!(names(&result, &root), vec!["src/lib.rs"]);

        let mut shallow = params(&root, "*.rs");
        shallow.max_depth = Some(2);
        let result = FsSearchTool::execute(&shallow, &ctx);
        assert_eq!(names(&result, &root), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_depth_one_and_zero() {
        let (_temp, root, ctx) = sandbox();
        tree(&root);

        let mut direct = params(&root, "*.md");
        direct.max_depth = Some(1);
        let result = FsSearchTool::execute(&direct, &ctx);
        assert_eq!(names(&result, &root), vec!["README.md"]);

        direct.max_depth = Some(0);
        let result = FsSearchTool::execute(&direct, &ctx);
        assert!(is_error(&result));
        assert!(text(&result).contains("max_depth must be at least 1"));
    }

    #[test]
    fn test_result_limit() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = dunce::canonicalize(temp_dir.path()).unwrap();
        for i in 0..5 {
            fs::write(root.join(format!("f{}.txt", i)), "").unwrap();
        }
        let mut config = Config::default();
        config.limits.max_search_results = 3;
        let ctx = ToolContext::new(
            Arc::new(config),
            AllowedDirectories::new([root.to_string_lossy()]),
        );

        let result = FsSearchTool::execute(&params(&root, "*.txt"), &ctx);
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["matches"].as_array().unwrap().len(), 3);
        assert_eq!(structured["truncated"], true);
    }

    #[test]
    fn test_invalid_pattern() {
        let (_temp, root, ctx) = sandbox();
        let result = FsSearchTool::execute(&params(&root, "[unclosed"), &ctx);
        assert!(is_error(&result));
        assert!(text(&result).contains("Invalid glob pattern"));
    }

    #[cfg(unix)]
    #[test]
    fn test_escaping_symlink_is_not_reported() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        fs::write(outside.path().join("secret.rs"), "").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.rs"), root.join("link.rs"))
            .unwrap();
        fs::write(root.join("own.rs"), "").unwrap();

        let result = FsSearchTool::execute(&params(&root, "*.rs"), &ctx);
        assert_eq!(names(&result, &root), vec!["own.rs"]);
        assert_eq!(result.structured_content.unwrap()["rejected"], 1);
    }
}
