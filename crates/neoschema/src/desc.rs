//! # Declaration Descriptions
//!
//! Plain, owned records of the declarations the resolvers work over: types, their
//! members and constructors, interfaces and their methods. They carry no behavior
//! beyond small construction helpers, so any discovery mechanism can produce them.

use serde::Deserialize;
use serde::Serialize;

/// Name used for the return type of methods that return nothing.
pub const VOID: &str = "void";

/// A type as written at a use site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A named type, possibly constructed with type arguments (`Task<int>`).
    Named { name: String, args: Vec<TypeRef> },
    /// A generic type parameter (`T`), substituted at the use site.
    Param(String),
    /// An unbound argument position, as in the shape `Task<_>`.
    Hole,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into(), args: Vec::new() }
    }

    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Named { name: name.into(), args: args.into_iter().collect() }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// The unbound shape of a generic type with `arity` parameters (`Task<_>`).
    pub fn unbound_shape(name: impl Into<String>, arity: usize) -> Self {
        Self::Named { name: name.into(), args: vec![Self::Hole; arity] }
    }

    pub fn void() -> Self {
        Self::named(VOID)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Named { name, args } if name == VOID && args.is_empty())
    }

    /// Returns the type's name, or `None` for holes.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Param(name) => Some(name),
            Self::Hole => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// True if any argument position is unbound.
    pub fn is_unbound(&self) -> bool {
        self.args().iter().any(|a| matches!(a, Self::Hole))
    }

    /// Returns the unbound shape of a constructed generic type.
    ///
    /// `Task<int>` becomes `Task<_>`. Non-generic types and shapes that are
    /// already unbound have no unbound form.
    pub fn unbound(&self) -> Option<TypeRef> {
        match self {
            Self::Named { name, args } if !args.is_empty() && !self.is_unbound() => {
                Some(Self::unbound_shape(name.clone(), args.len()))
            }
            _ => None,
        }
    }

    /// Re-binds this type's arguments positionally.
    ///
    /// Returns `None` unless `args` has exactly this type's arity.
    pub fn construct(&self, args: &[TypeRef]) -> Option<TypeRef> {
        match self {
            Self::Named { name, args: own } if own.len() == args.len() => {
                Some(Self::Named { name: name.clone(), args: args.to_vec() })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            Self::Named { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Self::Param(name) => write!(f, "{}", name),
            Self::Hole => write!(f, "_"),
        }
    }
}

/// A value carried by an annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Int(i64),
    Str(String),
    Bool(bool),
    Type(TypeRef),
}

/// An attribute attached to a declaration, e.g. `Id(3)` or `NonSerialized`.
///
/// Which names mean what is decided by `SchemaConfig`, not by the annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub value: Option<AnnotationValue>,
}

impl Annotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    pub fn with_value(name: impl Into<String>, value: AnnotationValue) -> Self {
        Self { name: name.into(), value: Some(value) }
    }

    /// `Id(id)` under the default identity annotation name.
    pub fn id(id: i64) -> Self {
        Self::with_value("Id", AnnotationValue::Int(id))
    }

    pub fn alias(alias: impl Into<String>) -> Self {
        Self::with_value("Alias", AnnotationValue::Str(alias.into()))
    }

    pub fn non_serialized() -> Self {
        Self::marker("NonSerialized")
    }

    /// Finds the first annotation in `list` named `name`.
    pub fn find<'a>(list: &'a [Annotation], name: &str) -> Option<&'a Annotation> {
        list.iter().find(|a| a.name == name)
    }
}

/// Whether a member is a field or a property, plus its backing relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberDeclKind {
    /// A field. `backs_property` names the property it stores, if any.
    Field { backs_property: Option<String> },
    /// A property. `backing_field` names the field that stores it, if any.
    Property { backing_field: Option<String> },
}

/// One declared field or property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    pub ty: TypeRef,
    pub kind: MemberDeclKind,
    pub is_static: bool,
    pub is_abstract: bool,
    pub annotations: Vec<Annotation>,
}

impl MemberDecl {
    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, MemberDeclKind::Field { backs_property: None })
    }

    pub fn property(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, MemberDeclKind::Property { backing_field: None })
    }

    /// The compiler-style backing field for `property`.
    pub fn backing_field(name: impl Into<String>, property: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, MemberDeclKind::Field { backs_property: Some(property.into()) })
    }

    /// A property stored in the field `field`.
    pub fn backed_property(name: impl Into<String>, field: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, MemberDeclKind::Property { backing_field: Some(field.into()) })
    }

    fn new(name: impl Into<String>, ty: TypeRef, kind: MemberDeclKind) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            is_static: false,
            is_abstract: false,
            annotations: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, MemberDeclKind::Field { .. })
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberDeclKind::Property { .. })
    }
}

/// A constructor or method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: TypeRef,
    pub annotations: Vec<Annotation>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty, annotations: Vec::new() }
    }
}

/// What a type is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRole {
    /// An ordinary data-carrying type.
    Data,
    /// A type meant purely as an argument container or method-dispatch target.
    DispatchContainer,
}

/// A type whose serializable members are to be resolved.
///
/// Only members declared on this type are listed; inherited members belong to
/// the base type's own description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescription {
    pub name: String,
    pub type_parameters: Vec<String>,
    pub role: TypeRole,
    /// Parameters of the primary construction path, for record-like types.
    pub primary_constructor: Option<Vec<ParameterDecl>>,
    pub members: Vec<MemberDecl>,
    pub annotations: Vec<Annotation>,
}

impl TypeDescription {
    pub fn data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_parameters: Vec::new(),
            role: TypeRole::Data,
            primary_constructor: None,
            members: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn dispatch_container(name: impl Into<String>) -> Self {
        Self { role: TypeRole::DispatchContainer, ..Self::data(name) }
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_primary_constructor(mut self, params: Vec<ParameterDecl>) -> Self {
        self.primary_constructor = Some(params);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// One method declared on (or inherited into) an interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// The type that declares the method. `None` means the interface itself.
    pub containing_type: Option<TypeRef>,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: TypeRef,
    pub annotations: Vec<Annotation>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            containing_type: None,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type,
            annotations: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.parameters.push(ParameterDecl::new(name, ty));
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn declared_on(mut self, ty: TypeRef) -> Self {
        self.containing_type = Some(ty);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// An interface whose methods are remotely invocable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescription {
    pub name: String,
    pub type_parameters: Vec<String>,
    pub methods: Vec<MethodDecl>,
    /// Non-method members. A well-formed interface has no data properties here.
    pub members: Vec<MemberDecl>,
    pub annotations: Vec<Annotation>,
}

impl InterfaceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_parameters: Vec::new(),
            methods: Vec::new(),
            members: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// The interface as a type, generic over its own parameters.
    pub fn as_type(&self) -> TypeRef {
        TypeRef::generic(self.name.clone(), self.type_parameters.iter().map(TypeRef::param))
    }
}
