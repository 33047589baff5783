/// A package entry from the local or a sync database, read from its
/// `desc` file. Entries are `%SECTION%` headers followed by one value per
/// line, separated by blank lines:
///
/// ```text
/// %NAME%
/// ripgrep
///
/// %VERSION%
/// 14.1.0-1
///
/// %DEPENDS%
/// pcre2
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub depends: Vec<String>,
    pub provides: Vec<String>,
}

pub(crate) fn parse_desc(raw: &str) -> Result<LocalPackage, String> {
    let mut name = None;
    let mut version = None;
    let mut description = None;
    let mut depends = Vec::new();
    let mut provides = Vec::new();

    let mut section: Option<String> = None;
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() {
            section = None;
            continue;
        }

        if let Some(header) = section_header(line) {
            section = Some(header.to_string());
            continue;
        }

        let Some(current) = section.as_deref() else {
            return Err(format!("value outside of any section: {line}"));
        };

        match current {
            "NAME" => name = Some(line.to_string()),
            "VERSION" => version = Some(line.to_string()),
            "DESC" => description = Some(line.to_string()),
            "DEPENDS" => depends.push(line.to_string()),
            "PROVIDES" => provides.push(line.to_string()),
            _ => {}
        }
    }

    Ok(LocalPackage {
        name: name.ok_or("missing %NAME% section")?,
        version: version.ok_or("missing %VERSION% section")?,
        description,
        depends,
        provides,
    })
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('%')?.strip_suffix('%')?;
    if inner.is_empty() || !inner.chars().all(|ch| ch.is_ascii_uppercase()) {
        return None;
    }
    Some(inner)
}
