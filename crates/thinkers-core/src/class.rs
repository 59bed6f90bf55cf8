//! Runtime class registry for thinker types.
//!
//! The scheduler never needs an inheritance chain of its own, but game
//! logic asks "find every thinker that is a `Foo` or derives from it".
//! [`ClassRegistry`] answers that with a flat table of named classes,
//! each pointing at its parent, plus an optional loader used to rebuild
//! instances from an archive.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::archive::Deserializer;
use crate::error::{ArchiveError, ClassError};
use crate::id::ClassId;
use crate::traits::{Thinker, ThinkerClass};

/// Rebuilds a thinker from its serialized payload.
pub type Loader = fn(&mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError>;

/// A registered class.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    name: String,
    parent: Option<ClassId>,
    depth: u16,
    loader: Option<Loader>,
}

impl ClassInfo {
    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent class, or `None` for the root.
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Distance from the root class (the root has depth 0).
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// The archive loader, if one was registered.
    pub fn loader(&self) -> Option<Loader> {
        self.loader
    }
}

/// Name → class table with single inheritance.
///
/// Registration is append-only; `ClassId(n)` is the n-th registered
/// class and ids are stable for the registry's lifetime. The root class
/// `"Thinker"` is always present as [`ClassId::ROOT`].
#[derive(Clone, Debug)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassInfo>,
}

impl ClassRegistry {
    /// Name of the implicit root class.
    pub const ROOT_NAME: &'static str = "Thinker";

    /// Create a registry containing only the root class.
    pub fn new() -> Self {
        let mut classes = IndexMap::new();
        classes.insert(
            Self::ROOT_NAME.to_string(),
            ClassInfo {
                name: Self::ROOT_NAME.to_string(),
                parent: None,
                depth: 0,
                loader: None,
            },
        );
        Self { classes }
    }

    /// Register a class under `parent`, with no loader.
    pub fn register(&mut self, name: &str, parent: ClassId) -> Result<ClassId, ClassError> {
        self.insert(name, parent, None)
    }

    /// Register a class under `parent` that can be rebuilt from an archive.
    pub fn register_with_loader(
        &mut self,
        name: &str,
        parent: ClassId,
        loader: Loader,
    ) -> Result<ClassId, ClassError> {
        self.insert(name, parent, Some(loader))
    }

    /// Register `T` under `parent`, using `T::NAME`.
    pub fn register_type<T: ThinkerClass>(
        &mut self,
        parent: ClassId,
        loader: Option<Loader>,
    ) -> Result<ClassId, ClassError> {
        self.insert(T::NAME, parent, loader)
    }

    fn insert(
        &mut self,
        name: &str,
        parent: ClassId,
        loader: Option<Loader>,
    ) -> Result<ClassId, ClassError> {
        if self.classes.contains_key(name) {
            return Err(ClassError::DuplicateName {
                name: name.to_string(),
            });
        }
        let parent_depth = self
            .info(parent)
            .map(ClassInfo::depth)
            .ok_or(ClassError::UnknownParent { parent })?;
        let id = ClassId(self.classes.len() as u32);
        self.classes.insert(
            name.to_string(),
            ClassInfo {
                name: name.to_string(),
                parent: Some(parent),
                depth: parent_depth + 1,
                loader,
            },
        );
        Ok(id)
    }

    /// Look up a class by name.
    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.classes
            .get_index_of(name)
            .map(|idx| ClassId(idx as u32))
    }

    /// Look up the class registered for `T`.
    pub fn id_of<T: ThinkerClass>(&self) -> Option<ClassId> {
        self.find(T::NAME)
    }

    /// Class metadata.
    pub fn info(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get_index(id.0 as usize).map(|(_, info)| info)
    }

    /// Class name.
    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.info(id).map(ClassInfo::name)
    }

    /// Archive loader for a class.
    pub fn loader(&self, id: ClassId) -> Option<Loader> {
        self.info(id).and_then(ClassInfo::loader)
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn is_a(&self, class: ClassId, ancestor: ClassId) -> bool {
        let (Some(info), Some(target)) = (self.info(class), self.info(ancestor)) else {
            return false;
        };
        if info.depth < target.depth {
            return false;
        }
        let mut cur = class;
        for _ in 0..(info.depth - target.depth) {
            match self.info(cur).and_then(ClassInfo::parent) {
                Some(p) => cur = p,
                None => return false,
            }
        }
        cur == ancestor
    }

    /// The chain from `class` up to the root, `class` first.
    pub fn ancestors(&self, class: ClassId) -> SmallVec<[ClassId; 8]> {
        let mut chain = SmallVec::new();
        let mut cur = Some(class);
        while let Some(id) = cur {
            let Some(info) = self.info(id) else { break };
            chain.push(id);
            cur = info.parent;
        }
        chain
    }

    /// Number of registered classes, root included.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the root class is always registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over `(id, info)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassInfo)> {
        self.classes
            .values()
            .enumerate()
            .map(|(i, info)| (ClassId(i as u32), info))
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
