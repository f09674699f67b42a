//! Semantic type model and method-invocation resolution for Vega's
//! Java-like frontend.
//!
//! The crate is deliberately self-contained: it models types, class
//! shapes, and the overload-resolution rules (JLS 15.12.2) over an arena
//! [`TypeStore`], and stays agnostic of how declarations were discovered.
//! Symbol tables, generic inference, and diagnostics formatting live in
//! other layers; this crate consumes already-substituted parameter types
//! and produces structured resolution results.
//!
//! All queries are best-effort and total: missing class metadata degrades
//! to a conservative answer instead of panicking.

mod convert;
mod format;
mod members;
mod overload;
mod subtyping;
mod varargs;

pub use convert::{is_assignable, loose_conversion, strict_conversion, ConversionKind};
pub use format::{format_signature, format_type};
pub use members::{
    collect_constructors, collect_methods, AccessScope, CallKind, Candidate, MemberTable,
};
pub use overload::{
    resolve_constructor_call, resolve_method_call, resolve_method_call_with, AmbiguousCall,
    InaccessibleVarargsCall, InvocationPhase, MethodCall, MethodResolution, ResolutionProfile,
    ResolvedMethod, TypeWarning, UncheckedReason, UnresolvedCall,
};
pub use subtyping::{erasure, is_subtype, widening_primitive};
pub use varargs::{check_varargs_declarations, is_reifiable, DeclarationDiagnostic};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Arena index of a class or interface definition in a [`TypeStore`].
///
/// The supertype graph may be cyclic through generics (`Enum<E extends
/// Enum<E>>`), so types reference each other through indices rather than
/// owning pointers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Arena index of a type parameter definition in a [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeVarId(pub u32);

/// The eight primitive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }

    /// Source-level keyword for this primitive.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// A (possibly parameterized) use of a class or interface.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    /// Type arguments; empty for raw uses and non-generic classes.
    pub args: Vec<Type>,
}

/// A semantic type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    /// An unresolved spelling (e.g. `"java.lang.String"`); canonicalized
    /// against the environment wherever it matters.
    Named(String),
    /// The type of the `null` literal. Matches any reference type.
    Null,
    Void,
    Unknown,
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn byte() -> Self {
        Type::Primitive(PrimitiveType::Byte)
    }

    pub fn short() -> Self {
        Type::Primitive(PrimitiveType::Short)
    }

    pub fn char_() -> Self {
        Type::Primitive(PrimitiveType::Char)
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> Self {
        Type::Primitive(PrimitiveType::Long)
    }

    pub fn float() -> Self {
        Type::Primitive(PrimitiveType::Float)
    }

    pub fn double() -> Self {
        Type::Primitive(PrimitiveType::Double)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// `Unknown` and `Error` stand in for missing or broken metadata and
    /// are treated as compatible with everything.
    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    /// Whether a `null` value could inhabit this type.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array(_) | Type::TypeVar(_) | Type::Named(_)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Declared accessibility of a class or member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    /// Default (package-private) accessibility.
    Package,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Binary name, e.g. `com.example.Foo`.
    pub name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub constructors: Vec<MethodDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    /// Package component of the binary name; `""` for the unnamed package.
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }
}

/// Package component of a binary name.
pub fn package_of(binary_name: &str) -> &str {
    binary_name
        .rsplit_once('.')
        .map_or("", |(package, _)| package)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub visibility: Visibility,
    pub type_params: Vec<TypeVarId>,
    /// Formal parameter types. For a variable-arity method the last entry
    /// is the array type `C[]`; `C` is the vararg component type.
    pub params: Vec<Type>,
    pub return_type: Type,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_varargs: bool,
    /// Whether the declaration carries `@SafeVarargs`.
    pub is_safe_varargs: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
    pub lower_bound: Option<Type>,
}

/// Diagnostic severity, shared by declaration checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Read-only view of the type environment.
///
/// The resolution engine only ever reads through this trait, so resolving
/// independent call sites from multiple threads over one shared
/// environment is safe by construction.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// Ids of the core `java.lang` types every resolution query needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub char_sequence: ClassId,
    pub number: ClassId,
    pub comparable: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub boolean_box: ClassId,
    pub byte_box: ClassId,
    pub short_box: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long_box: ClassId,
    pub float_box: ClassId,
    pub double_box: ClassId,
}

impl WellKnownTypes {
    /// The box class of a primitive (JLS 5.1.7).
    pub fn box_of(&self, prim: PrimitiveType) -> ClassId {
        match prim {
            PrimitiveType::Boolean => self.boolean_box,
            PrimitiveType::Byte => self.byte_box,
            PrimitiveType::Short => self.short_box,
            PrimitiveType::Char => self.character,
            PrimitiveType::Int => self.integer,
            PrimitiveType::Long => self.long_box,
            PrimitiveType::Float => self.float_box,
            PrimitiveType::Double => self.double_box,
        }
    }

    /// The primitive a box class unboxes to, if `id` is a box (JLS 5.1.8).
    pub fn unboxed(&self, id: ClassId) -> Option<PrimitiveType> {
        if id == self.boolean_box {
            Some(PrimitiveType::Boolean)
        } else if id == self.byte_box {
            Some(PrimitiveType::Byte)
        } else if id == self.short_box {
            Some(PrimitiveType::Short)
        } else if id == self.character {
            Some(PrimitiveType::Char)
        } else if id == self.integer {
            Some(PrimitiveType::Int)
        } else if id == self.long_box {
            Some(PrimitiveType::Long)
        } else if id == self.float_box {
            Some(PrimitiveType::Float)
        } else if id == self.double_box {
            Some(PrimitiveType::Double)
        } else {
            None
        }
    }
}

/// Arena-backed implementation of [`TypeEnv`].
///
/// Definitions are interned by binary name; `intern_class_id` +
/// `define_class` allow self- and mutually-referential definitions to be
/// constructed in two steps.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store pre-populated with the minimal `java.lang` core needed for
    /// resolution: `Object`, `String`, `CharSequence`, `Number`,
    /// `Comparable`, `Cloneable`, `java.io.Serializable`, and the eight
    /// box classes.
    pub fn with_minimal_jdk() -> Self {
        Self::default()
    }

    /// Reserve an id for `name` without defining it yet. Idempotent.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Define (or redefine) the class behind a previously interned id.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.by_name.insert(def.name.clone(), id);
        if let Some(slot) = self.classes.get_mut(id.0 as usize) {
            *slot = Some(def);
        }
    }

    /// Intern and define in one step.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    /// Overwrite any existing definition with the same name, keeping its
    /// id stable.
    pub fn upsert_class(&mut self, def: ClassDef) -> ClassId {
        self.add_class(def)
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Look up a class by its exact binary name.
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Allocate a fresh type parameter with the given upper bounds.
    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
            lower_bound: None,
        });
        id
    }

    /// Redefine a previously allocated type parameter (used for
    /// self-referential bounds like `E extends Enum<E>`).
    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        if let Some(slot) = self.type_params.get_mut(id.0 as usize) {
            *slot = def;
        }
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)?.as_ref()
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.by_name.get(name) {
            return Some(*id);
        }
        // Simple names resolve against the implicit `java.lang` import.
        if !name.contains('.') {
            return self.by_name.get(&format!("java.lang.{name}")).copied();
        }
        None
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}

fn jdk_method(name: &str, params: Vec<Type>, return_type: Type) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        visibility: Visibility::Public,
        type_params: vec![],
        params,
        return_type,
        is_static: false,
        is_final: false,
        is_abstract: false,
        is_varargs: false,
        is_safe_varargs: false,
    }
}

fn jdk_class(name: &str, kind: ClassKind, super_class: Option<Type>) -> ClassDef {
    ClassDef {
        name: name.to_string(),
        kind,
        visibility: Visibility::Public,
        type_params: vec![],
        super_class,
        interfaces: vec![],
        constructors: vec![],
        methods: vec![],
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        let placeholder = ClassId(0);
        let mut store = TypeStore {
            classes: Vec::new(),
            by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes {
                object: placeholder,
                string: placeholder,
                char_sequence: placeholder,
                number: placeholder,
                comparable: placeholder,
                cloneable: placeholder,
                serializable: placeholder,
                boolean_box: placeholder,
                byte_box: placeholder,
                short_box: placeholder,
                character: placeholder,
                integer: placeholder,
                long_box: placeholder,
                float_box: placeholder,
                double_box: placeholder,
            },
        };

        let object = store.intern_class_id("java.lang.Object");
        let string = store.intern_class_id("java.lang.String");
        let char_sequence = store.intern_class_id("java.lang.CharSequence");
        let number = store.intern_class_id("java.lang.Number");
        let comparable = store.intern_class_id("java.lang.Comparable");
        let cloneable = store.intern_class_id("java.lang.Cloneable");
        let serializable = store.intern_class_id("java.io.Serializable");
        let boolean_box = store.intern_class_id("java.lang.Boolean");
        let byte_box = store.intern_class_id("java.lang.Byte");
        let short_box = store.intern_class_id("java.lang.Short");
        let character = store.intern_class_id("java.lang.Character");
        let integer = store.intern_class_id("java.lang.Integer");
        let long_box = store.intern_class_id("java.lang.Long");
        let float_box = store.intern_class_id("java.lang.Float");
        let double_box = store.intern_class_id("java.lang.Double");

        store.well_known = WellKnownTypes {
            object,
            string,
            char_sequence,
            number,
            comparable,
            cloneable,
            serializable,
            boolean_box,
            byte_box,
            short_box,
            character,
            integer,
            long_box,
            float_box,
            double_box,
        };

        let object_ty = Type::class(object, vec![]);

        let mut object_def = jdk_class("java.lang.Object", ClassKind::Class, None);
        object_def.methods = vec![
            jdk_method("equals", vec![object_ty.clone()], Type::boolean()),
            jdk_method("hashCode", vec![], Type::int()),
            jdk_method("toString", vec![], Type::class(string, vec![])),
        ];
        store.define_class(object, object_def);

        let comparable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let mut comparable_def =
            jdk_class("java.lang.Comparable", ClassKind::Interface, None);
        comparable_def.type_params = vec![comparable_t];
        comparable_def.methods = vec![MethodDef {
            is_abstract: true,
            ..jdk_method("compareTo", vec![Type::TypeVar(comparable_t)], Type::int())
        }];
        store.define_class(comparable, comparable_def);

        let mut char_sequence_def =
            jdk_class("java.lang.CharSequence", ClassKind::Interface, None);
        char_sequence_def.methods = vec![
            MethodDef {
                is_abstract: true,
                ..jdk_method("length", vec![], Type::int())
            },
            MethodDef {
                is_abstract: true,
                ..jdk_method("charAt", vec![Type::int()], Type::char_())
            },
        ];
        store.define_class(char_sequence, char_sequence_def);

        store.define_class(
            cloneable,
            jdk_class("java.lang.Cloneable", ClassKind::Interface, None),
        );
        store.define_class(
            serializable,
            jdk_class("java.io.Serializable", ClassKind::Interface, None),
        );

        let mut string_def =
            jdk_class("java.lang.String", ClassKind::Class, Some(object_ty.clone()));
        string_def.interfaces = vec![
            Type::class(char_sequence, vec![]),
            Type::class(comparable, vec![Type::class(string, vec![])]),
            Type::class(serializable, vec![]),
        ];
        string_def.methods = vec![
            jdk_method("length", vec![], Type::int()),
            jdk_method("isEmpty", vec![], Type::boolean()),
            jdk_method("charAt", vec![Type::int()], Type::char_()),
        ];
        store.define_class(string, string_def);

        let mut number_def =
            jdk_class("java.lang.Number", ClassKind::Class, Some(object_ty.clone()));
        number_def.interfaces = vec![Type::class(serializable, vec![])];
        number_def.methods = vec![
            MethodDef {
                is_abstract: true,
                ..jdk_method("intValue", vec![], Type::int())
            },
            MethodDef {
                is_abstract: true,
                ..jdk_method("longValue", vec![], Type::long())
            },
            MethodDef {
                is_abstract: true,
                ..jdk_method("floatValue", vec![], Type::float())
            },
            MethodDef {
                is_abstract: true,
                ..jdk_method("doubleValue", vec![], Type::double())
            },
        ];
        store.define_class(number, number_def);

        let numeric_boxes = [
            (byte_box, "java.lang.Byte", "byteValue", Type::byte()),
            (short_box, "java.lang.Short", "shortValue", Type::short()),
            (integer, "java.lang.Integer", "intValue", Type::int()),
            (long_box, "java.lang.Long", "longValue", Type::long()),
            (float_box, "java.lang.Float", "floatValue", Type::float()),
            (double_box, "java.lang.Double", "doubleValue", Type::double()),
        ];
        for (id, name, value_method, prim) in numeric_boxes {
            let mut def = jdk_class(name, ClassKind::Class, Some(Type::class(number, vec![])));
            def.interfaces = vec![Type::class(comparable, vec![Type::class(id, vec![])])];
            def.methods = vec![
                jdk_method(value_method, vec![], prim.clone()),
                MethodDef {
                    is_static: true,
                    ..jdk_method("valueOf", vec![prim], Type::class(id, vec![]))
                },
            ];
            store.define_class(id, def);
        }

        let mut boolean_def =
            jdk_class("java.lang.Boolean", ClassKind::Class, Some(object_ty.clone()));
        boolean_def.interfaces = vec![
            Type::class(comparable, vec![Type::class(boolean_box, vec![])]),
            Type::class(serializable, vec![]),
        ];
        boolean_def.methods = vec![
            jdk_method("booleanValue", vec![], Type::boolean()),
            MethodDef {
                is_static: true,
                ..jdk_method("valueOf", vec![Type::boolean()], Type::class(boolean_box, vec![]))
            },
        ];
        store.define_class(boolean_box, boolean_def);

        let mut character_def =
            jdk_class("java.lang.Character", ClassKind::Class, Some(object_ty));
        character_def.interfaces = vec![
            Type::class(comparable, vec![Type::class(character, vec![])]),
            Type::class(serializable, vec![]),
        ];
        character_def.methods = vec![
            jdk_method("charValue", vec![], Type::char_()),
            MethodDef {
                is_static: true,
                ..jdk_method("valueOf", vec![Type::char_()], Type::class(character, vec![]))
            },
        ];
        store.define_class(character, character_def);

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent_and_stable_across_define() {
        let mut store = TypeStore::default();
        let first = store.intern_class_id("com.example.Foo");
        let second = store.intern_class_id("com.example.Foo");
        assert_eq!(first, second);

        store.define_class(
            first,
            ClassDef {
                name: "com.example.Foo".to_string(),
                kind: ClassKind::Class,
                visibility: Visibility::Public,
                type_params: vec![],
                super_class: None,
                interfaces: vec![],
                constructors: vec![],
                methods: vec![],
            },
        );
        assert_eq!(store.class_id("com.example.Foo"), Some(first));
    }

    #[test]
    fn boxes_round_trip_through_well_known() {
        let store = TypeStore::default();
        let wk = store.well_known();
        for prim in [
            PrimitiveType::Boolean,
            PrimitiveType::Byte,
            PrimitiveType::Short,
            PrimitiveType::Char,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Float,
            PrimitiveType::Double,
        ] {
            assert_eq!(wk.unboxed(wk.box_of(prim)), Some(prim));
        }
        assert_eq!(wk.unboxed(wk.object), None);
    }

    #[test]
    fn simple_names_resolve_against_java_lang() {
        let store = TypeStore::default();
        assert_eq!(store.lookup_class("Object"), Some(store.well_known().object));
        assert_eq!(store.lookup_class("String"), Some(store.well_known().string));
        assert_eq!(
            store.lookup_class("java.io.Serializable"),
            Some(store.well_known().serializable)
        );
        assert_eq!(store.lookup_class("NoSuchClass"), None);
    }

    #[test]
    fn package_of_splits_binary_names() {
        assert_eq!(package_of("com.example.Foo"), "com.example");
        assert_eq!(package_of("Foo"), "");
    }
}
