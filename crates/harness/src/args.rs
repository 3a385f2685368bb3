//! Flat lookup over the process argument vector.
//!
//! No validation happens here: a flag whose value is missing simply reads
//! as absent, and interpretation of values belongs to
//! [`config`](crate::config).

/// Read-only store of argument tokens, built once at startup.
#[derive(Debug, Clone)]
pub struct ArgStore {
    tokens: Vec<String>,
}

impl ArgStore {
    /// Build from an explicit token list.
    pub fn from_vec(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Build from the process argument vector, skipping the program name.
    pub fn from_env() -> Self {
        Self::from_vec(std::env::args().skip(1).collect())
    }

    /// Build from a single space-delimited override string, the form used
    /// when the harness is driven from an interactive context.
    pub fn from_line(line: &str) -> Self {
        Self::from_vec(line.split_whitespace().map(str::to_string).collect())
    }

    /// Whether a bare token equal to `name` is present.
    pub fn has_flag(&self, name: &str) -> bool {
        self.tokens.iter().any(|token| token == name)
    }

    /// The token immediately following the first occurrence of `name`.
    ///
    /// `None` when `name` is not present or is the last token.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        let position = self.tokens.iter().position(|token| token == name)?;
        self.tokens.get(position + 1).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_presence() {
        let args = ArgStore::from_line("-server -client 8");
        assert!(args.has_flag("-server"));
        assert!(args.has_flag("-client"));
        assert!(!args.has_flag("-monster"));
    }

    #[test]
    fn value_follows_first_occurrence() {
        let args = ArgStore::from_line("-client 8 -client 99");
        assert_eq!(args.value_of("-client"), Some("8"));
    }

    #[test]
    fn trailing_flag_reads_as_absent() {
        let args = ArgStore::from_line("-server -port");
        assert_eq!(args.value_of("-port"), None);
        assert_eq!(args.value_of("-address"), None);
    }

    #[test]
    fn empty_vector_is_fine() {
        let args = ArgStore::from_vec(Vec::new());
        assert!(!args.has_flag("-server"));
        assert_eq!(args.value_of("-client"), None);
    }
}
