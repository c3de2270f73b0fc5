//! Search predicates and query options

use std::fmt;

/// A search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field at `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, r#"[at({}, "{}")]"#, path, value)
            }
        }
    }
}

/// A document search
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    fetch: Vec<String>,
    page_size: usize,
}

impl Query {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            fetch: Vec::new(),
            page_size: 20,
        }
    }

    /// Add another predicate; all must match
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict the returned fields (`type.field`)
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The `q` parameter
    pub fn q(&self) -> String {
        let predicates: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", predicates)
    }

    /// The `fetch` parameter, if any field restriction applies
    pub fn fetch_param(&self) -> Option<String> {
        if self.fetch.is_empty() {
            None
        } else {
            Some(self.fetch.join(","))
        }
    }

    /// The `pageSize` parameter, clamped to what the API accepts
    pub fn page_size_param(&self) -> usize {
        self.page_size.clamp(1, 100)
    }
}
