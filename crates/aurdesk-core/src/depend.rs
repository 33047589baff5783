/// Cuts a dependency string down to its bare package name by dropping the
/// trailing version-comparison clause: `"foo>=1.2"`, `"foo<1.2"` and
/// `"foo=1.2"` all yield `"foo"`. Constraints are never compared
/// numerically anywhere in the subsystem; only the name matters.
pub fn bare_dependency_name(dependency: &str) -> &str {
    let end = dependency
        .find(['<', '>', '='])
        .unwrap_or(dependency.len());
    dependency[..end].trim()
}
