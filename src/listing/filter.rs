use std::collections::BTreeSet;

/// Which file extensions a listing keeps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtensionFilter {
    #[default]
    All,
    /// Lower-cased extensions, without the dot.
    Only(BTreeSet<String>),
}

impl ExtensionFilter {
    /// Parses a comma-separated list such as `"txt, LOG ,md"`. Whitespace is stripped and case
    /// folded; an empty list or `*` means every extension.
    pub fn parse(list: &str) -> ExtensionFilter {
        let set: BTreeSet<String> = list
            .split(',')
            .map(|ext| ext.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase())
            .collect();

        if set.is_empty() || set.contains("*") {
            ExtensionFilter::All
        } else {
            ExtensionFilter::Only(set)
        }
    }

    pub fn matches(&self, extension: &str) -> bool {
        match self {
            ExtensionFilter::All => true,
            ExtensionFilter::Only(set) => set.contains(&extension.to_lowercase()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ExtensionFilter::All)
    }
}

impl From<&str> for ExtensionFilter {
    fn from(list: &str) -> Self {
        ExtensionFilter::parse(list)
    }
}

impl From<Option<&str>> for ExtensionFilter {
    fn from(list: Option<&str>) -> Self {
        list.map(ExtensionFilter::parse).unwrap_or_default()
    }
}

/// Settings shared by the directory listers.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub extensions: ExtensionFilter,
    pub recursive: bool,
    /// Draw a progress spinner on stderr while walking.
    pub verbose: bool,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extensions<F: Into<ExtensionFilter>>(mut self, filter: F) -> Self {
        self.extensions = filter.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
