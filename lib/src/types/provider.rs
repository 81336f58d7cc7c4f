use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::checker::Checker;
use crate::types::{CompilerFn, GrammarType, Type, ValidatorFn};

/// Trait implemented by types that resolve type names.
pub trait TypeProvider: Send + Sync {
    /// Returns the type with the given name, if known.
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>>;

    /// Returns a human-readable message describing an error related to
    /// the given type, if the provider has one.
    fn error_message(&self, _type_name: &str) -> Option<String> {
        None
    }
}

impl<T: TypeProvider + ?Sized> TypeProvider for Arc<T> {
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>> {
        (**self).type_by_name(name)
    }

    fn error_message(&self, type_name: &str) -> Option<String> {
        (**self).error_message(type_name)
    }
}

/// A type provider backed by a hash map.
#[derive(Default, Clone)]
pub struct TypeTable {
    types: FxHashMap<String, Arc<dyn Type>>,
    messages: FxHashMap<String, String>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type to the table, replacing any existing type with the
    /// same name.
    pub fn insert(&mut self, ty: Arc<dyn Type>) -> &mut Self {
        self.types.insert(ty.name().to_string(), ty);
        self
    }

    /// Sets the error message for a type.
    pub fn set_error_message<S: Into<String>>(
        &mut self,
        type_name: &str,
        message: S,
    ) -> &mut Self {
        self.messages.insert(type_name.to_string(), message.into());
        self
    }

    /// Returns true if the table contains a type with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for TypeTable {
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>> {
        self.types.get(name).cloned()
    }

    fn error_message(&self, type_name: &str) -> Option<String> {
        self.messages.get(type_name).cloned()
    }
}

/// An ordered stack of type providers.
///
/// Lookups start at the provider that was added last and go down the
/// stack until the type is found, so providers added later shadow the
/// ones added earlier. A library built with [`TypeLibrary::from_ordered`]
/// is the same stack seen from the top: the first provider in the list is
/// the first one looked up.
#[derive(Default, Clone)]
pub struct TypeLibrary {
    stack: Vec<Arc<dyn TypeProvider>>,
}

impl TypeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library from providers listed in lookup order. The first
    /// provider that knows a type wins.
    pub fn from_ordered<I>(providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn TypeProvider>>,
    {
        let mut stack: Vec<_> = providers.into_iter().collect();
        stack.reverse();
        Self { stack }
    }

    /// Pushes a provider on top of the stack.
    pub fn push(&mut self, provider: Arc<dyn TypeProvider>) -> &mut Self {
        self.stack.push(provider);
        self
    }

    /// Pops the provider at the top of the stack.
    pub fn pop(&mut self) -> Option<Arc<dyn TypeProvider>> {
        self.stack.pop()
    }

    /// Returns the number of providers in the stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl TypeProvider for TypeLibrary {
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>> {
        self.stack.iter().rev().find_map(|p| p.type_by_name(name))
    }

    fn error_message(&self, type_name: &str) -> Option<String> {
        self.stack.iter().rev().find_map(|p| p.error_message(type_name))
    }
}

/// A provider that wraps another one, adding types assembled from
/// checker, validator and compiler hooks.
///
/// Types registered here take precedence over the ones in the wrapped
/// provider.
#[derive(Default, Clone)]
pub struct ExtensibleProvider {
    base: Option<Arc<dyn TypeProvider>>,
    extra: TypeTable,
}

impl ExtensibleProvider {
    /// Creates a provider that extends `base`.
    pub fn new(base: Arc<dyn TypeProvider>) -> Self {
        Self { base: Some(base), extra: TypeTable::new() }
    }

    /// Creates a provider that doesn't extend any other.
    pub fn standalone() -> Self {
        Self::default()
    }

    /// Registers a type with the given name and hooks.
    ///
    /// A type registered without checker fails with
    /// [`crate::Error::MissingChecker`] when matched.
    pub fn register(
        &mut self,
        name: &str,
        checker: Option<Checker>,
        validator: Option<Arc<ValidatorFn>>,
        compiler: Option<Arc<CompilerFn>>,
    ) -> &mut Self {
        let ty = GrammarType::from_parts(
            name.to_string(),
            checker,
            validator,
            compiler,
        );
        self.extra.insert(Arc::new(ty));
        self
    }

    /// Registers an existing type.
    pub fn register_type(&mut self, ty: Arc<dyn Type>) -> &mut Self {
        self.extra.insert(ty);
        self
    }
}

impl TypeProvider for ExtensibleProvider {
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>> {
        self.extra
            .type_by_name(name)
            .or_else(|| self.base.as_ref().and_then(|b| b.type_by_name(name)))
    }

    fn error_message(&self, type_name: &str) -> Option<String> {
        self.extra.error_message(type_name).or_else(|| {
            self.base.as_ref().and_then(|b| b.error_message(type_name))
        })
    }
}

/// The providers visible at some point of a match: the one passed by the
/// caller, followed by the default providers of the sequences being
/// matched, from the innermost to the outermost.
pub(crate) struct ProviderChain<'a> {
    explicit: Option<&'a dyn TypeProvider>,
    defaults: SmallVec<[&'a dyn TypeProvider; 4]>,
}

impl<'a> ProviderChain<'a> {
    pub(crate) fn new(explicit: Option<&'a dyn TypeProvider>) -> Self {
        Self { explicit, defaults: SmallVec::new() }
    }

    pub(crate) fn push_default(&mut self, provider: &'a dyn TypeProvider) {
        self.defaults.push(provider);
    }
}

impl TypeProvider for ProviderChain<'_> {
    fn type_by_name(&self, name: &str) -> Option<Arc<dyn Type>> {
        self.explicit
            .into_iter()
            .chain(self.defaults.iter().copied())
            .find_map(|p| p.type_by_name(name))
    }

    fn error_message(&self, type_name: &str) -> Option<String> {
        self.explicit
            .into_iter()
            .chain(self.defaults.iter().copied())
            .find_map(|p| p.error_message(type_name))
    }
}
