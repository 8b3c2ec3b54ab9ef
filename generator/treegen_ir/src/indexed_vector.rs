//! An ordered child sequence additionally indexed by declared name.
//!
//! Elements that are named declarations are registered in a name index on
//! insertion; lookups by name are exact. A name collision is a recoverable
//! condition: the first-inserted mapping is kept, the container is flagged
//! permanently invalid, and the collision is handed back to the caller as
//! a [`DuplicateDeclaration`] value so every collision in a run can be
//! reported. Once invalid, `validate` is a no-op — a single diagnosable
//! condition never escalates into an internal crash of the consuming
//! process.

use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;

use treegen_diagnostic::{Diagnostic, ErrorCode};

use crate::{bug, same_node, InvariantViolation, IrNode, RecordLoader, RecordWriter, Visitor};

/// A duplicate declaration name detected on insertion.
///
/// Recoverable: recorded against both conflicting elements; the container
/// keeps the element in the sequence and the pre-existing index entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DuplicateDeclaration {
    /// The colliding name.
    pub name: String,
    /// Type of the element that owns the name.
    pub existing: &'static str,
    /// Type of the element whose registration was rejected.
    pub inserted: &'static str,
}

impl DuplicateDeclaration {
    /// Render as an `E2001` diagnostic naming both conflicting elements.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2001)
            .with_message(format!(
                "{}: duplicates declaration `{}`",
                self.inserted, self.name
            ))
            .with_note(format!("previous declaration here: {}", self.existing))
    }
}

/// Ordered sequence of child references plus a name index over elements
/// that are named declarations.
///
/// Not designed for concurrent access: exactly one owner mutates it at a
/// time, consistent with single-threaded tree-transformation passes.
#[derive(Debug)]
pub struct IndexedVector<T: IrNode + ?Sized> {
    elements: Vec<Rc<T>>,
    declarations: BTreeMap<String, Rc<T>>,
    /// Set on the first collision; validity checking is skipped from then
    /// on because an error was already reported.
    invalid: bool,
}

impl<T: IrNode + ?Sized> Default for IndexedVector<T> {
    fn default() -> Self {
        IndexedVector {
            elements: Vec::new(),
            declarations: BTreeMap::new(),
            invalid: false,
        }
    }
}

impl<T: IrNode + ?Sized> Clone for IndexedVector<T> {
    fn clone(&self) -> Self {
        IndexedVector {
            elements: self.elements.clone(),
            declarations: self.declarations.clone(),
            invalid: self.invalid,
        }
    }
}

impl<T: IrNode + ?Sized> IndexedVector<T> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_in_map(&mut self, node: &Rc<T>) -> Result<(), DuplicateDeclaration> {
        let Some(decl) = node.as_declaration() else {
            return Ok(());
        };
        let name = decl.declared_name().to_string();
        if let Some(existing) = self.declarations.get(&name) {
            self.invalid = true;
            return Err(DuplicateDeclaration {
                name,
                existing: existing.type_name(),
                inserted: node.type_name(),
            });
        }
        self.declarations.insert(name, Rc::clone(node));
        Ok(())
    }

    /// Remove the index entry for `node`, but only if the index still maps
    /// its name to this exact element. After a collision the name belongs
    /// to the first-inserted element, which stays mapped.
    fn remove_from_map(&mut self, node: &Rc<T>) {
        let Some(decl) = node.as_declaration() else {
            return;
        };
        let name = decl.declared_name();
        if let Some(existing) = self.declarations.get(name) {
            if Rc::ptr_eq(existing, node) {
                self.declarations.remove(name);
            }
        }
    }

    /// Append an element. On a name collision the element is still part of
    /// the sequence; the error reports the rejected index registration.
    pub fn push_back(&mut self, node: Rc<T>) -> Result<(), DuplicateDeclaration> {
        self.elements.push(Rc::clone(&node));
        self.insert_in_map(&node)
    }

    /// Insert an element at `at`, shifting later elements.
    pub fn insert(&mut self, at: usize, node: Rc<T>) -> Result<(), DuplicateDeclaration> {
        self.elements.insert(at, Rc::clone(&node));
        self.insert_in_map(&node)
    }

    /// Append every element of `nodes`, collecting all collisions.
    pub fn append<I>(&mut self, nodes: I) -> Vec<DuplicateDeclaration>
    where
        I: IntoIterator<Item = Rc<T>>,
    {
        let mut collisions = Vec::new();
        for node in nodes {
            if let Err(dup) = self.push_back(node) {
                collisions.push(dup);
            }
        }
        collisions
    }

    /// Prepend every element of `nodes` (preserving their order),
    /// collecting all collisions.
    pub fn prepend<I>(&mut self, nodes: I) -> Vec<DuplicateDeclaration>
    where
        I: IntoIterator<Item = Rc<T>>,
    {
        let mut collisions = Vec::new();
        for (offset, node) in nodes.into_iter().enumerate() {
            if let Err(dup) = self.insert(offset, node) {
                collisions.push(dup);
            }
        }
        collisions
    }

    /// Remove the element at `index`, dropping its index entry.
    pub fn erase(&mut self, index: usize) -> Option<Rc<T>> {
        if index >= self.elements.len() {
            return None;
        }
        let node = self.elements.remove(index);
        self.remove_from_map(&node);
        Some(node)
    }

    /// Remove a contiguous range of elements and their index entries.
    pub fn erase_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.elements.len());
        let start = range.start.min(end);
        for node in self.elements.drain(start..end) {
            let Some(decl) = node.as_declaration() else {
                continue;
            };
            let name = decl.declared_name();
            if let Some(existing) = self.declarations.get(name) {
                if Rc::ptr_eq(existing, &node) {
                    self.declarations.remove(name);
                }
            }
        }
    }

    /// Atomically replace the element at `index`: the old entry's index
    /// mapping is removed, the new one's inserted. The replacement happens
    /// even when the new element's name collides. Out of range is a no-op
    /// returning `None`, like `erase`.
    pub fn replace(
        &mut self,
        index: usize,
        node: Rc<T>,
    ) -> Option<Result<(), DuplicateDeclaration>> {
        let old = Rc::clone(self.elements.get(index)?);
        self.remove_from_map(&old);
        self.elements[index] = Rc::clone(&node);
        Some(self.insert_in_map(&node))
    }

    /// Remove the last element.
    pub fn pop_back(&mut self) -> Option<Rc<T>> {
        let node = self.elements.pop()?;
        self.remove_from_map(&node);
        Some(node)
    }

    /// Remove the first element declared under `name`. Returns whether an
    /// element was removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        let position = self.elements.iter().position(|node| {
            node.as_declaration()
                .is_some_and(|decl| decl.declared_name() == name)
        });
        match position {
            Some(index) => {
                self.erase(index);
                true
            }
            None => false,
        }
    }

    /// Drop all elements and index entries. The invalid flag is permanent.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.declarations.clear();
    }

    /// Exact lookup by declared name.
    pub fn get_declaration(&self, name: &str) -> Option<&Rc<T>> {
        self.declarations.get(name)
    }

    /// Lazy sequence over the index's values. Order follows the index
    /// structure (sorted by name), not insertion order — a deliberate,
    /// testable property.
    pub fn declarations(&self) -> impl Iterator<Item = &Rc<T>> {
        self.declarations.values()
    }

    /// Number of distinct indexed names.
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn get(&self, index: usize) -> Option<&Rc<T>> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rc<T>> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether no collision has been detected since construction.
    pub fn is_valid(&self) -> bool {
        !self.invalid
    }

    /// Cross-check that every named element is indexed under its own name
    /// and maps back to the same element.
    ///
    /// A no-op once the container is invalid: the collision was already
    /// reported, and re-checking would only turn a diagnosed condition
    /// into a crash.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.invalid {
            return Ok(());
        }
        for node in &self.elements {
            let Some(decl) = node.as_declaration() else {
                continue;
            };
            let name = decl.declared_name();
            match self.declarations.get(name) {
                Some(indexed) if Rc::ptr_eq(indexed, node) => {}
                _ => {
                    return Err(bug!(
                        "{}: element `{}` missing from declaration index",
                        node.type_name(),
                        name
                    ))
                }
            }
        }
        Ok(())
    }

    /// Shallow equality: same length, pairwise element identity.
    pub fn equals(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| Rc::ptr_eq(a, b))
    }

    /// Deep equivalence: same length, pairwise structural equivalence.
    pub fn equiv(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| same_node(a.as_node(), b.as_node()) || a.equiv(b.as_node()))
    }

    /// Hand each element to the visitor under the container's label.
    pub fn visit_children(&self, visitor: &mut dyn Visitor, label: &str) {
        for node in &self.elements {
            visitor.visit(node.as_node(), label);
        }
    }

    /// Serialize the sequence as an array of element records.
    pub fn to_record(&self) -> serde_json::Value {
        let members = self
            .elements
            .iter()
            .map(|node| {
                let mut writer = RecordWriter::new();
                node.to_record(&mut writer);
                writer.finish()
            })
            .collect();
        serde_json::Value::Array(members)
    }

    /// Rebuild a sequence from an array of member records. Element
    /// construction is the caller's: `load` owns the element-type dispatch
    /// and may reject a member by returning `None`. Collisions are
    /// collected the way `append` collects them; anything that is not an
    /// array loads as an empty container.
    pub fn from_record<F>(record: &serde_json::Value, mut load: F) -> (Self, Vec<DuplicateDeclaration>)
    where
        F: FnMut(&RecordLoader) -> Option<Rc<T>>,
    {
        let mut vector = Self::new();
        let mut collisions = Vec::new();
        let Some(members) = record.as_array() else {
            return (vector, collisions);
        };
        for member in members {
            if let Some(node) = load(&RecordLoader::new(member.clone())) {
                if let Err(dup) = vector.push_back(node) {
                    collisions.push(dup);
                }
            }
        }
        (vector, collisions)
    }
}

impl<'a, T: IrNode + ?Sized> IntoIterator for &'a IndexedVector<T> {
    type Item = &'a Rc<T>;
    type IntoIter = std::slice::Iter<'a, Rc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
