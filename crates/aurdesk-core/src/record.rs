/// One package as reported by the registry or the local database.
///
/// Records are immutable once constructed. A response that lacks the
/// required fields produces an invalid record (all defaults, `is_valid()`
/// false) instead of a partially trusted one; consumers skip those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub description: String,
    pub maintainer: Option<String>,
    pub url: Option<String>,
    pub votes: u64,
    pub popularity: f64,
    pub out_of_date: bool,
    pub keywords: Vec<String>,
    pub depends: Vec<String>,
    pub make_depends: Vec<String>,
    valid: bool,
}

impl PackageRecord {
    /// A valid record carrying the two required fields; the rest start at
    /// their defaults and are filled in by the caller.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            valid: true,
            ..Self::default()
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
