// ABOUTME: Path normalization helpers for sandbox filesystem access
// ABOUTME: Converts caller-supplied paths into workspace-relative form

/// Root directory exposed to tools inside every sandbox.
pub const WORKSPACE_ROOT: &str = "/workspace";

/// Normalize a caller-supplied path to be relative to the workspace root.
///
/// Strips the workspace prefix, a leading `./` and any leading slashes, so
/// `foo/bar`, `/workspace/foo/bar` and `./foo/bar` all normalize to
/// `foo/bar`.
pub fn clean_path(path: &str, workspace_root: &str) -> String {
    let mut cleaned = path.trim();

    if let Some(rest) = cleaned.strip_prefix(workspace_root) {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_prefix("./") {
        cleaned = rest;
    }

    cleaned.trim_start_matches('/').to_string()
}
