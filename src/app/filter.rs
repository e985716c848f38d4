use regex::Regex;

/// Suffix-based ignores plus optional regex selection for files.
#[derive(Debug, Clone, Copy)]
pub struct PathFilter<'a> {
    ignores: &'a [String],
    filters: &'a [Regex],
}

impl<'a> PathFilter<'a> {
    pub fn new(ignores: &'a [String], filters: &'a [Regex]) -> Self {
        Self { ignores, filters }
    }

    /// Exact suffix match, applied to files and directories alike.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignores.iter().any(|ignore| path.ends_with(ignore.as_str()))
    }

    pub fn include_file(&self, path: &str) -> bool {
        if self.is_ignored(path) {
            return false;
        }
        self.filters.is_empty() || self.filters.iter().any(|re| re.is_match(path))
    }

    /// Directories only ever see the ignore list.
    pub fn include_dir(&self, path: &str) -> bool {
        !self.is_ignored(path)
    }
}
