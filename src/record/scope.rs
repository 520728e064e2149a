//! Attributes and groups applied to a sink ahead of time by `with_attrs` / `with_group`.

use super::Attr;

/// Stack of frames: the root frame is unnamed, every `with_group` opens a named one,
/// and `with_attrs` appends to whichever frame is innermost.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    name: Option<String>,
    attrs: Vec<Attr>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                name: None,
                attrs: Vec::new(),
            }],
        }
    }

    /// Returns a new scope; `self` is left untouched so sibling loggers never share attributes.
    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        let mut scope = self.clone();
        if let Some(frame) = scope.frames.last_mut() {
            frame.attrs.extend(attrs.iter().cloned());
        }
        scope
    }

    /// An empty name is ignored.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        let mut scope = self.clone();
        if !name.is_empty() {
            scope.frames.push(Frame {
                name: Some(name.to_string()),
                attrs: Vec::new(),
            });
        }
        scope
    }

    /// Names of the open groups, outermost first.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().filter_map(|f| f.name.as_deref())
    }

    /// Folds the frames around `record_attrs` into the attribute tree a formatter renders.
    #[must_use]
    pub fn resolve(&self, record_attrs: &[Attr]) -> Vec<Attr> {
        let Some((innermost, outer)) = self.frames.split_last() else {
            return record_attrs.to_vec();
        };

        let mut inner: Vec<Attr> = innermost
            .attrs
            .iter()
            .chain(record_attrs)
            .cloned()
            .collect();
        let mut name = innermost.name.clone();

        for frame in outer.iter().rev() {
            let mut attrs = frame.attrs.clone();
            if let Some(group_name) = name.take() {
                let group = Attr::group(group_name, inner);
                if !group.is_empty() {
                    attrs.push(group);
                }
            }
            inner = attrs;
            name = frame.name.clone();
        }

        inner
    }
}
