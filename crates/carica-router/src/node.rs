//! Radix tree node implementation.
//!
//! Each node represents one path segment. Matching prefers static children,
//! then the placeholder child, then the wildcard child, and backtracks when a
//! preferred branch dead-ends deeper in the tree.

use crate::error::RouteError;
use crate::method_table::MethodTable;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named placeholder (e.g., "{id}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Methods registered for the path ending at this node
    pub methods: Option<MethodTable>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Placeholder child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new placeholder node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a path pattern, merging methods with an existing endpoint.
    pub fn insert(&mut self, path: &str, methods: MethodTable) -> Result<(), RouteError> {
        let segments = Self::parse_path(path);
        if let Some(position) = segments
            .iter()
            .position(|(_, kind)| matches!(kind, SegmentKind::Wildcard(_)))
        {
            if position + 1 != segments.len() {
                return Err(RouteError::WildcardNotLast {
                    path: path.to_string(),
                });
            }
        }
        self.insert_segments(&segments, methods, path)
    }

    /// Parses a path into segments.
    fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    (s.to_string(), SegmentKind::Param(name.to_string()))
                } else if let Some(name) = s.strip_prefix('*') {
                    (s.to_string(), SegmentKind::Wildcard(name.to_string()))
                } else {
                    (s.to_string(), SegmentKind::Static)
                }
            })
            .collect()
    }

    fn insert_segments(
        &mut self,
        segments: &[(String, SegmentKind)],
        methods: MethodTable,
        path: &str,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return match &mut self.methods {
                Some(existing) => existing.merge(methods, path),
                None => {
                    self.methods = Some(methods);
                    Ok(())
                }
            };
        };

        let child = match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new_static(segment.clone()));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name.clone())));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ConflictingPlaceholder {
                            path: path.to_string(),
                            existing: existing.clone(),
                            requested: name.clone(),
                        });
                    }
                }
                &mut **child
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name.clone())));
                if let SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ConflictingPlaceholder {
                            path: path.to_string(),
                            existing: existing.clone(),
                            requested: name.clone(),
                        });
                    }
                }
                &mut **child
            }
        };
        child.insert_segments(remaining, methods, path)
    }

    /// Matches a path against the tree.
    ///
    /// Returns the method table and the captured placeholders.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodTable, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a MethodTable> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(methods) = child.match_segments(remaining, params) {
                return Some(methods);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let captured = params.len();
                params.push(name.clone(), *segment);
                if let Some(methods) = child.match_segments(remaining, params) {
                    return Some(methods);
                }
                params.truncate(captured);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                params.push(name.clone(), segments.join("/"));
                return child.methods.as_ref();
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
