//! Scanner-provided type metadata.
//!
//! `TypeInfo` describes a declared type the way the scanner resolved it
//! (kind, fields, methods, underlying type for aliases). It is shared
//! (`Rc`), never deep-cloned, by every `Object` that carries it — the
//! engine treats it as borrowed metadata owned by the scanner/package
//! cache, per spec.md §9 ("`TypeInfo` and `FieldType` are shared
//! metadata and should be borrowed, not owned, by objects").

use std::rc::Rc;

use crate::name::Name;

/// What kind of declaration a `TypeInfo` describes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TypeKind {
    Struct,
    Interface,
    Alias,
    Func,
}

/// A single field of a struct type.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: Name,
    pub field_type: Rc<FieldType>,
    /// True for an embedded field (`struct { Base }`), which participates
    /// in method-set promotion and field lookup per spec.md §4.3.
    pub embedded: bool,
}

/// A single method in a type's method set.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: Name,
    /// True if the method is declared with a pointer receiver.
    pub pointer_receiver: bool,
    pub params: Vec<Rc<FieldType>>,
    pub results: Vec<Rc<FieldType>>,
}

/// Scanner-resolved description of a declared type.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: Name,
    /// Import path of the package that declares this type.
    pub import_path: Rc<str>,
    pub kind: TypeKind,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    /// For `TypeKind::Alias`, the type this one is defined in terms of.
    pub underlying: Option<Rc<FieldType>>,
}

impl TypeInfo {
    /// Fully-qualified name (`<import_path>.<Name>`), without parentheses
    /// or receiver decoration — see `vantage_ir::fq` for the intrinsic-key
    /// formats that wrap this.
    pub fn qualified_name(&self, interner: &crate::name::NameInterner) -> String {
        format!("{}.{}", self.import_path, interner.resolve(self.name))
    }

    /// Look up a method by name, walking embedded fields breadth-first
    /// after direct methods, matching spec.md §4.3 "direct fields shadow
    /// embedded" / "first match wins" selector resolution.
    pub fn find_method(&self, name: Name) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn find_field(&self, name: Name) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name && !f.embedded)
    }

    pub fn embedded_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.embedded)
    }
}

/// The syntactic type as written at a use site (parameter type, variable
/// declaration, struct field), including pointer/slice/map wrappers.
#[derive(Clone, Debug)]
pub struct FieldType {
    pub pointer: bool,
    pub slice: bool,
    pub map: bool,
    /// Element type for slices/maps/pointers.
    pub elem: Option<Rc<FieldType>>,
    /// Key type for maps.
    pub key: Option<Rc<FieldType>>,
    /// Resolved named type, if this use site refers to one (lazy: the
    /// scanner may not have resolved it yet for out-of-scope packages).
    pub resolved: Option<Rc<TypeInfo>>,
    /// Plain name as written, used when `resolved` hasn't been filled in.
    pub name: Name,
    /// Whether the scanner actually parsed/resolved the package that
    /// declares this type, per the current scan policy. MUST propagate
    /// from an element type to its pointer wrapper (spec.md §6): a
    /// `*T` is resolved-by-config iff `T` is.
    is_resolved_by_config: bool,
}

impl FieldType {
    pub fn named(name: Name, resolved: Option<Rc<TypeInfo>>, is_resolved_by_config: bool) -> Self {
        FieldType {
            pointer: false,
            slice: false,
            map: false,
            elem: None,
            key: None,
            resolved,
            name,
            is_resolved_by_config,
        }
    }

    /// Wrap `elem` in a pointer `FieldType`, propagating `isResolvedByConfig`.
    pub fn pointer_to(elem: Rc<FieldType>) -> Self {
        let is_resolved_by_config = elem.is_resolved_by_config();
        FieldType {
            pointer: true,
            slice: false,
            map: false,
            elem: Some(elem),
            key: None,
            resolved: None,
            name: Name::EMPTY,
            is_resolved_by_config,
        }
    }

    pub fn slice_of(elem: Rc<FieldType>) -> Self {
        let is_resolved_by_config = elem.is_resolved_by_config();
        FieldType {
            pointer: false,
            slice: true,
            map: false,
            elem: Some(elem),
            key: None,
            resolved: None,
            name: Name::EMPTY,
            is_resolved_by_config,
        }
    }

    pub fn map_of(key: Rc<FieldType>, elem: Rc<FieldType>) -> Self {
        let is_resolved_by_config = elem.is_resolved_by_config();
        FieldType {
            pointer: false,
            slice: false,
            map: true,
            elem: Some(elem),
            key: Some(key),
            resolved: None,
            name: Name::EMPTY,
            is_resolved_by_config,
        }
    }

    #[inline]
    pub fn is_resolved_by_config(&self) -> bool {
        self.is_resolved_by_config
    }
}
