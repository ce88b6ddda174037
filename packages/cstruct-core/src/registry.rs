//! Named struct registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::compiler::{compile_guard, StructCompiler, StructDecl, StructRef, StructSchema};
use crate::config::StructOptions;
use crate::error::{CStructError, Result};
use crate::types::StructLookup;

#[derive(Debug, Clone)]
struct RegisteredStruct {
    handle: StructRef,
    options: StructOptions,
}

#[derive(Debug, Default)]
struct Entries {
    /// Declaration order
    structs: Vec<RegisteredStruct>,
    by_name: HashMap<String, usize>,
}

/// Registry of declared structs, looked up by name.
///
/// Named field references (`DeclaredType::Named`) resolve against the
/// registry, and compiling a struct compiles its registered dependencies
/// first.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: RwLock<Entries>,
    compiler: StructCompiler,
}

impl SchemaRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(compiler: StructCompiler) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            compiler,
        }
    }

    pub fn compiler(&self) -> &StructCompiler {
        &self.compiler
    }

    /// Declares a struct to be compiled later with `options`.
    ///
    /// # Arguments
    /// * `decl` - Ordered struct declaration
    /// * `options` - Options used when the struct is compiled
    ///
    /// # Returns
    /// The new struct handle, or `Err(CStructError)` if the name is taken or
    /// the layout policy is invalid.
    pub fn declare(&self, decl: StructDecl, options: StructOptions) -> Result<StructRef> {
        let handle = decl.declare();
        self.register(handle.clone(), options)?;
        Ok(handle)
    }

    /// Registers an existing handle under its name.
    ///
    /// # Arguments
    /// * `handle` - Struct to register
    /// * `options` - Options used when the struct is compiled
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(CStructError::AlreadyDeclared)` if the name
    /// is taken, `Err(CStructError::InvalidLayoutPolicy)` if the layout is
    /// rejected.
    pub fn register(&self, handle: StructRef, options: StructOptions) -> Result<()> {
        options.layout.validate()?;

        let mut entries = self.entries.write();
        if entries.by_name.contains_key(handle.name()) {
            return Err(CStructError::AlreadyDeclared(handle.name().to_string()));
        }

        let index = entries.structs.len();
        entries.by_name.insert(handle.name().to_string(), index);
        debug!("Registered struct {}", handle.name());
        entries.structs.push(RegisteredStruct { handle, options });
        Ok(())
    }

    /// Retrieves a struct handle by name.
    ///
    /// # Arguments
    /// * `name` - Struct name
    ///
    /// # Returns
    /// `Some(StructRef)` if registered, `None` otherwise.
    pub fn get(&self, name: &str) -> Option<StructRef> {
        let entries = self.entries.read();
        let index = *entries.by_name.get(name)?;
        Some(entries.structs[index].handle.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().by_name.contains_key(name)
    }

    /// Registered names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .structs
            .iter()
            .map(|s| s.handle.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn options_of(&self, name: &str) -> Option<StructOptions> {
        let entries = self.entries.read();
        let index = *entries.by_name.get(name)?;
        Some(entries.structs[index].options)
    }

    /// Options of `handle`, if this exact struct is registered.
    pub(crate) fn options_for(&self, handle: &StructRef) -> Option<StructOptions> {
        let entries = self.entries.read();
        let index = *entries.by_name.get(handle.name())?;
        let registered = &entries.structs[index];
        (registered.handle == *handle).then_some(registered.options)
    }

    /// Compiles `name` and its registered dependencies.
    ///
    /// # Arguments
    /// * `name` - Struct name
    ///
    /// # Returns
    /// The installed schema. Compiling an already compiled struct returns the
    /// existing schema. Fails with `StructNotFound` for unknown names and with
    /// the first resolution error otherwise.
    pub fn compile(&self, name: &str) -> Result<Arc<StructSchema>> {
        let handle = self
            .get(name)
            .ok_or_else(|| CStructError::StructNotFound(name.to_string()))?;
        let options = self
            .options_of(name)
            .ok_or_else(|| CStructError::StructNotFound(name.to_string()))?;

        let _guard = compile_guard();
        self.compiler
            .compile_in(&handle, &options, Some(self), &mut Vec::new())
    }

    /// Compiles every registered struct in declaration order, stopping at the
    /// first failure.
    pub fn compile_all(&self) -> Result<Vec<Arc<StructSchema>>> {
        self.names().iter().map(|name| self.compile(name)).collect()
    }

    /// Installed schema of `name`.
    ///
    /// # Arguments
    /// * `name` - Struct name
    ///
    /// # Returns
    /// The schema, `Err(CStructError::StructNotFound)` if the name is unknown or
    /// `Err(CStructError::NotCompiled)` if it has not been compiled yet.
    pub fn schema(&self, name: &str) -> Result<Arc<StructSchema>> {
        let handle = self
            .get(name)
            .ok_or_else(|| CStructError::StructNotFound(name.to_string()))?;
        handle
            .schema()
            .ok_or_else(|| CStructError::NotCompiled(name.to_string()))
    }
}

impl StructLookup for SchemaRegistry {
    fn lookup(&self, name: &str) -> Option<StructRef> {
        self.get(name)
    }
}
