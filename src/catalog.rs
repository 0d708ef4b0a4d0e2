//! The fixed set of elements a raster map dataset is made of.

use std::fmt;

use serde::Serialize;

/// How an element is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Exactly one file per dataset.
    Simple,
    /// A directory per dataset holding any number of auxiliary files.
    Container,
}

/// One element of a dataset, e.g. `cell` or `cell_misc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Directory name of the element inside a workspace.
    pub name: &'static str,
    /// Storage kind.
    pub kind: ElementKind,
    /// Whether a dataset is incomplete without this element.
    pub required: bool,
}

impl Element {
    const fn simple(name: &'static str, required: bool) -> Self {
        Self { name, kind: ElementKind::Simple, required }
    }

    const fn container(name: &'static str) -> Self {
        Self { name, kind: ElementKind::Container, required: false }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The element holding the dataset's primary data; its presence defines the dataset.
pub const CELL: Element = Element::simple("cell", true);

/// The container element.
pub const CELL_MISC: Element = Element::container("cell_misc");

const ELEMENTS: [Element; 7] = [
    CELL,
    Element::simple("cellhd", false),
    Element::simple("cats", false),
    Element::simple("colr", false),
    Element::simple("hist", false),
    CELL_MISC,
    Element::simple("fcell", false),
];

/// Elements in processing order.
#[must_use]
pub fn elements() -> &'static [Element] {
    &ELEMENTS
}

/// Returns `true` for the container element.
#[must_use]
pub fn is_container(element: Element) -> bool {
    element.kind == ElementKind::Container
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_container() {
        let containers: Vec<_> = elements().iter().filter(|e| is_container(**e)).collect();
        assert_eq!(containers, vec![&CELL_MISC]);
    }

    #[test]
    fn cell_comes_first_and_is_required() {
        assert_eq!(elements()[0], CELL);
        assert!(CELL.required);
        assert!(elements().iter().skip(1).all(|e| !e.required));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = elements().iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), elements().len());
    }
}
