//! Struct compiler.
//!
//! A struct is declared as an ordered member list ([`StructDecl`]) and becomes
//! usable once a [`StructSchema`] is installed on its handle. Compilation
//! resolves every field in declaration order, validates support, materializes
//! shaped field types and installs the result atomically: a failed compile
//! leaves no schema behind.

mod instance;
mod schema;

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::{const_mutex, Mutex, MutexGuard, RwLock};
use tracing::{debug, trace, warn};

pub use instance::StructValue;
pub use schema::{FieldDescriptor, FieldSummary, SchemaSummary, StructSchema};

use crate::config::StructOptions;
use crate::error::{CStructError, Result};
use crate::registry::SchemaRegistry;
use crate::types::support::check_supported;
use crate::types::{BaseKind, DeclaredType, Resolver, ShapedTypeCache, Value};

/// Serializes schema installation and redeclaration process-wide. Not
/// reentrant: code holding it calls `compile_in`, never `compile`.
static COMPILE_LOCK: Mutex<()> = const_mutex(());

pub(crate) fn compile_guard() -> MutexGuard<'static, ()> {
    COMPILE_LOCK.lock()
}

/// One entry of a struct declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// Annotated field
    Field(DeclaredType),
    /// Class-level value without a type annotation
    Attribute(Value),
    /// Nested type definition; not a field
    NestedType(DeclaredType),
}

/// Ordered struct declaration builder.
///
/// # Example
/// ```
/// use cstruct_core::compiler::StructDecl;
/// use cstruct_core::config::StructOptions;
/// use cstruct_core::types::{DeclaredType, PrimitiveKind};
///
/// let point = StructDecl::new("Point")
///     .field("x", PrimitiveKind::I32)
///     .field("y", PrimitiveKind::I32)
///     .compile(&StructOptions::default())
///     .unwrap();
///
/// let path = StructDecl::new("Path")
///     .field("points", DeclaredType::from(&point).shaped(&[3]))
///     .compile(&StructOptions::default())
///     .unwrap();
/// assert_eq!(path.schema().unwrap().fields().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    name: String,
    members: Vec<Member>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Appends a typed field.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<DeclaredType>) -> Self {
        self.push(name.into(), MemberKind::Field(ty.into()));
        self
    }

    /// Appends an attribute that carries a value but no type.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), MemberKind::Attribute(value.into()));
        self
    }

    /// Appends a nested type member.
    pub fn nested_type(mut self, name: impl Into<String>, ty: impl Into<DeclaredType>) -> Self {
        self.push(name.into(), MemberKind::NestedType(ty.into()));
        self
    }

    pub fn push(&mut self, name: String, kind: MemberKind) {
        self.members.push(Member { name, kind });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Creates an uncompiled struct handle.
    pub fn declare(self) -> StructRef {
        StructRef(Arc::new(StructType {
            name: self.name,
            members: RwLock::new(self.members),
            schema: ArcSwapOption::empty(),
        }))
    }

    /// Declares and compiles in one step.
    pub fn compile(self, options: &StructOptions) -> Result<StructRef> {
        let structure = self.declare();
        structure.compile(options)?;
        Ok(structure)
    }
}

/// Declares and compiles `decl` with `options`.
pub fn cstruct(decl: StructDecl, options: &StructOptions) -> Result<StructRef> {
    decl.compile(options)
}

/// A declared struct and its installed schema, if any.
pub struct StructType {
    name: String,
    members: RwLock<Vec<Member>>,
    schema: ArcSwapOption<StructSchema>,
}

impl StructType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the current member list.
    pub fn members(&self) -> Vec<Member> {
        self.members.read().clone()
    }

    /// The installed schema. Lock-free.
    pub fn schema(&self) -> Option<Arc<StructSchema>> {
        self.schema.load_full()
    }

    pub fn is_compiled(&self) -> bool {
        self.schema.load().is_some()
    }

    /// Replaces the member list and uninstalls the schema.
    ///
    /// Structs that contain this one keep their own schemas, but stop passing
    /// the support check until this struct is compiled again.
    pub fn redeclare(&self, decl: StructDecl) {
        let _guard = compile_guard();
        if decl.name != self.name {
            warn!(
                "Redeclaring struct {} with a declaration named {}",
                self.name, decl.name
            );
        }
        *self.members.write() = decl.members;
        self.schema.store(None);
        debug!("Redeclared struct {}", self.name);
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("name", &self.name)
            .field("members", &*self.members.read())
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

/// Shared handle to a declared struct.
///
/// Equality and hashing are by identity: two separately declared structs are
/// different even if their members match.
#[derive(Clone)]
pub struct StructRef(Arc<StructType>);

impl StructRef {
    /// Compiles through the process-wide shaped-type cache.
    pub fn compile(&self, options: &StructOptions) -> Result<Arc<StructSchema>> {
        StructCompiler::new().compile(self, options)
    }

    /// Runs the generated constructor.
    pub fn instantiate(&self, args: Vec<Value>) -> Result<StructValue> {
        self.installed()?.instantiate(args)
    }

    pub fn default_instance(&self) -> Result<StructValue> {
        self.installed()?.default_instance()
    }

    fn installed(&self) -> Result<Arc<StructSchema>> {
        self.schema()
            .ok_or_else(|| CStructError::NotCompiled(self.name.clone()))
    }

    pub(crate) fn ptr_eq(&self, other: &StructRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for StructRef {
    type Target = StructType;

    fn deref(&self) -> &StructType {
        &self.0
    }
}

impl PartialEq for StructRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for StructRef {}

impl Hash for StructRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for StructRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructRef({})", self.name)
    }
}

impl fmt::Display for StructRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Compiles struct declarations into installed schemas.
#[derive(Debug, Clone)]
pub struct StructCompiler {
    cache: Arc<ShapedTypeCache>,
}

impl Default for StructCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl StructCompiler {
    /// Compiler backed by the process-wide shaped-type cache.
    pub fn new() -> Self {
        Self {
            cache: ShapedTypeCache::global(),
        }
    }

    pub fn with_cache(cache: Arc<ShapedTypeCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ShapedTypeCache> {
        &self.cache
    }

    /// Compiles `structure` and installs its schema.
    ///
    /// Compiling an already compiled struct returns the installed schema
    /// unchanged. Field base structs must already be compiled.
    pub fn compile(
        &self,
        structure: &StructRef,
        options: &StructOptions,
    ) -> Result<Arc<StructSchema>> {
        if let Some(schema) = structure.schema() {
            return Ok(self.reuse(structure, schema, options));
        }
        let _guard = compile_guard();
        self.compile_in(structure, options, None, &mut Vec::new())
    }

    /// Compiles `structure` with `path` holding the structs whose compilation
    /// is in progress. Named references go through `registry`, and
    /// uncompiled dependencies registered there are compiled first.
    ///
    /// Callers hold [`compile_guard`].
    pub(crate) fn compile_in(
        &self,
        structure: &StructRef,
        options: &StructOptions,
        registry: Option<&SchemaRegistry>,
        path: &mut Vec<StructRef>,
    ) -> Result<Arc<StructSchema>> {
        if path.contains(structure) {
            return Err(cycle(path, structure));
        }
        if let Some(schema) = structure.schema() {
            return Ok(self.reuse(structure, schema, options));
        }
        options.layout.validate()?;

        path.push(structure.clone());
        let built = self.build(structure, options, registry, path);
        path.pop();

        let schema = Arc::new(built?);
        structure.schema.store(Some(schema.clone()));
        debug!(
            "Compiled struct {} with {} fields",
            schema.name(),
            schema.fields().len()
        );
        Ok(schema)
    }

    fn reuse(
        &self,
        structure: &StructRef,
        schema: Arc<StructSchema>,
        options: &StructOptions,
    ) -> Arc<StructSchema> {
        if schema.options() != options {
            warn!(
                "Struct {} is already compiled with different options; keeping the installed schema",
                structure.name()
            );
        }
        debug!("Struct {} already compiled", structure.name());
        schema
    }

    fn build(
        &self,
        structure: &StructRef,
        options: &StructOptions,
        registry: Option<&SchemaRegistry>,
        path: &mut Vec<StructRef>,
    ) -> Result<StructSchema> {
        let members = structure.members();

        let mut seen = HashSet::new();
        for member in &members {
            match &member.kind {
                MemberKind::Attribute(_) => {
                    return Err(CStructError::MissingAnnotation {
                        structure: structure.name().to_string(),
                        field: member.name.clone(),
                    })
                }
                MemberKind::Field(_) => {
                    if !seen.insert(member.name.as_str()) {
                        return Err(CStructError::DuplicateField {
                            structure: structure.name().to_string(),
                            field: member.name.clone(),
                        });
                    }
                }
                MemberKind::NestedType(_) => {}
            }
        }

        let resolver = match registry {
            Some(registry) => Resolver::with_lookup(registry),
            None => Resolver::new(),
        };

        let mut fields = Vec::with_capacity(seen.len());
        for member in &members {
            let declared = match &member.kind {
                MemberKind::Field(declared) => declared,
                _ => continue,
            };

            let spec = resolver.resolve(declared)?;

            if let (BaseKind::Struct(dependency), Some(registry)) = (&spec.base, registry) {
                if !dependency.is_compiled() || path.contains(dependency) {
                    if let Some(dependency_options) = registry.options_for(dependency) {
                        self.compile_in(dependency, &dependency_options, Some(registry), path)?;
                    }
                }
            }

            if !check_supported(&spec.base, path)? {
                return Err(CStructError::UnsupportedField {
                    structure: structure.name().to_string(),
                    field: member.name.clone(),
                    base: spec.base.to_string(),
                });
            }

            let field_type = self.cache.materialize(&spec.base, &spec.shape);
            trace!(
                "Resolved {}.{} as {} ({})",
                structure.name(),
                member.name,
                spec,
                field_type
            );
            fields.push(FieldDescriptor {
                name: member.name.clone(),
                spec,
                field_type,
            });
        }

        Ok(StructSchema::new(
            structure.name().to_string(),
            fields,
            *options,
        ))
    }
}

fn cycle(path: &[StructRef], structure: &StructRef) -> CStructError {
    let start = path.iter().position(|s| s == structure).unwrap_or(0);
    let mut names: Vec<String> = path[start..].iter().map(|s| s.name().to_string()).collect();
    names.push(structure.name().to_string());
    CStructError::CyclicSchema { path: names }
}
