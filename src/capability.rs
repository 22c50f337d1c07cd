//! Host tool detection. Queried fresh on every call, nothing is cached.

/// True when `name` resolves to an executable on the search path.
pub fn has_tool(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Whether separate video and audio streams can be merged on this host.
pub fn has_merge_tool(merge_tool: &str) -> bool {
    let found = has_tool(merge_tool);
    log::debug!("merge tool {merge_tool}: {}", if found { "found" } else { "missing" });
    found
}

/// Whether the download engine itself is installed.
pub fn has_engine(engine_program: &str) -> bool {
    has_tool(engine_program)
}
