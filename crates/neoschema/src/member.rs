//! # Member Schema Resolution
//!
//! Turns a `TypeDescription` into the ordered catalog of members that go on the
//! wire, each with a stable `u16` id.
//!
//! ## Rules
//!
//! - Static, abstract and non-serialized members never take part.
//! - **Explicit mode**: if any remaining member carries an identity annotation, only
//!   annotated members (and primary constructor matches) are kept, with their declared ids.
//! - **Auto mode**: otherwise, and only if `SchemaConfig::generate_field_ids` is set,
//!   unclaimed members get sequential ids from 1 in name order, skipping ids that
//!   are already claimed.
//! - A property without an explicit id that names a primary constructor parameter
//!   takes that parameter's ordinal.
//! - A field and a property on the same id collapse into the field.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::config::SchemaConfig;
use crate::desc::AnnotationValue;
use crate::desc::MemberDecl;
use crate::desc::MemberDeclKind;
use crate::desc::ParameterDecl;
use crate::desc::TypeDescription;
use crate::desc::TypeRef;
use crate::desc::TypeRole;
use crate::error::Error;
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Field,
    Property,
}

/// One serializable member and its wire identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub id: u16,
    pub name: String,
    pub declared_type: TypeRef,
    pub kind: MemberKind,
    /// Supplied through construction rather than set afterwards.
    pub is_primary_constructor_parameter: bool,
    /// For a field that stores a property, the property's name.
    pub backs_property: Option<String>,
}

impl MemberDescriptor {
    /// A plain field descriptor, as used for method arguments.
    pub fn field(id: u16, name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            id,
            name: name.into(),
            declared_type,
            kind: MemberKind::Field,
            is_primary_constructor_parameter: false,
            backs_property: None,
        }
    }

    fn from_decl(decl: &MemberDecl, id: u16, is_primary_constructor_parameter: bool) -> Self {
        let (kind, backs_property) = match &decl.kind {
            MemberDeclKind::Field { backs_property } => (MemberKind::Field, backs_property.clone()),
            MemberDeclKind::Property { .. } => (MemberKind::Property, None),
        };
        Self {
            id,
            name: decl.name.clone(),
            declared_type: decl.ty.clone(),
            kind,
            is_primary_constructor_parameter,
            backs_property,
        }
    }
}

/// Rejects dispatch containers that declare data properties.
///
/// Such types exist only to carry arguments or be dispatched to; a property on
/// one means two data conventions were mixed and is a declaration error.
pub fn validate_dispatch_container(type_name: &str, members: &[MemberDecl]) -> Result<()> {
    match members.iter().find(|m| m.is_property()) {
        Some(property) => Err(Error::DuplicateMemberAnnotation {
            type_name: type_name.to_string(),
            member: property.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Resolves the serializable members of `ty`, ordered by id.
pub fn resolve(ty: &TypeDescription, config: &SchemaConfig) -> Result<Vec<MemberDescriptor>> {
    if ty.role == TypeRole::DispatchContainer {
        validate_dispatch_container(&ty.name, &ty.members)?;
    }

    let mut members: Vec<&MemberDecl> = ty
        .members
        .iter()
        .filter(|m| !m.is_static && !m.is_abstract)
        .filter(|m| !config.is_non_serialized(&m.annotations))
        .collect();
    members.sort_by(|a, b| a.name.cmp(&b.name));

    let explicit = members.iter().any(|m| config.id_annotation(&m.annotations).is_some());
    let auto = config.generate_field_ids && !explicit;

    let ctor: &[ParameterDecl] = match &ty.primary_constructor {
        Some(params) if config.include_primary_constructor_parameters => params,
        _ => &[],
    };

    let mut catalog = Catalog::new(&ty.name);
    let mut pending = Vec::new();
    for member in &members {
        match claim(ty, member, &members, ctor, config)? {
            Claim::Fixed { id, from_constructor } => catalog.insert(member, id, from_constructor)?,
            Claim::Pending if auto => pending.push(*member),
            Claim::Pending | Claim::Skip => {}
        }
    }

    // Every fixed id is known before any is synthesized.
    let mut next = 0u16;
    for member in pending {
        next = catalog.next_free(next)?;
        catalog.insert(member, next, false)?;
    }

    Ok(catalog.into_members())
}

enum Claim {
    Fixed { id: u16, from_constructor: bool },
    Pending,
    Skip,
}

fn claim(
    ty: &TypeDescription,
    member: &MemberDecl,
    members: &[&MemberDecl],
    ctor: &[ParameterDecl],
    config: &SchemaConfig,
) -> Result<Claim> {
    if let Some(id) = explicit_id(ty, member, config)? {
        return Ok(Claim::Fixed { id, from_constructor: false });
    }

    match &member.kind {
        MemberDeclKind::Property { backing_field } => {
            let stored_in_field = backing_field
                .as_ref()
                .is_some_and(|field| members.iter().any(|m| m.is_field() && m.name == *field));
            if stored_in_field {
                return Ok(Claim::Skip);
            }
            Ok(constructor_claim(&member.name, ctor).unwrap_or(Claim::Pending))
        }
        MemberDeclKind::Field { backs_property: Some(name) } => {
            let Some(property) = ty.members.iter().find(|m| m.is_property() && m.name == *name) else {
                return Ok(Claim::Pending);
            };
            if config.is_non_serialized(&property.annotations) {
                return Ok(Claim::Skip);
            }
            if let Some(id) = explicit_id(ty, property, config)? {
                return Ok(Claim::Fixed { id, from_constructor: false });
            }
            Ok(constructor_claim(&property.name, ctor).unwrap_or(Claim::Pending))
        }
        MemberDeclKind::Field { backs_property: None } => Ok(Claim::Pending),
    }
}

fn constructor_claim(name: &str, ctor: &[ParameterDecl]) -> Option<Claim> {
    let ordinal = ctor.iter().position(|p| p.name == name)?;
    let id = u16::try_from(ordinal).ok()?;
    Some(Claim::Fixed { id, from_constructor: true })
}

fn explicit_id(ty: &TypeDescription, member: &MemberDecl, config: &SchemaConfig) -> Result<Option<u16>> {
    let Some(annotation) = config.id_annotation(&member.annotations) else {
        return Ok(None);
    };
    let invalid = |value: String| Error::InvalidIdAnnotation {
        type_name: ty.name.clone(),
        member: member.name.clone(),
        value,
    };
    match &annotation.value {
        Some(AnnotationValue::Int(v)) => u16::try_from(*v).map(Some).map_err(|_| invalid(v.to_string())),
        other => Err(invalid(format!("{:?}", other))),
    }
}

/// Id-keyed accumulator enforcing uniqueness and field-over-property precedence.
struct Catalog<'a> {
    type_name: &'a str,
    members: BTreeMap<u16, MemberDescriptor>,
}

impl<'a> Catalog<'a> {
    fn new(type_name: &'a str) -> Self {
        Self { type_name, members: BTreeMap::new() }
    }

    fn insert(&mut self, decl: &MemberDecl, id: u16, from_constructor: bool) -> Result<()> {
        let candidate = MemberDescriptor::from_decl(decl, id, from_constructor);
        match self.members.get(&id) {
            None => {
                self.members.insert(id, candidate);
            }
            Some(existing) if existing.kind == candidate.kind => {
                return Err(Error::DuplicateMemberId {
                    type_name: self.type_name.to_string(),
                    id,
                    first: existing.name.clone(),
                    second: candidate.name,
                });
            }
            // The field is assumed to back the property.
            Some(existing) if existing.kind == MemberKind::Property => {
                self.members.insert(id, candidate);
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// The smallest unclaimed id greater than `after`.
    fn next_free(&self, after: u16) -> Result<u16> {
        let mut id = after;
        loop {
            id = id.checked_add(1).ok_or_else(|| Error::IdSpaceExhausted {
                type_name: self.type_name.to_string(),
            })?;
            if !self.members.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    fn into_members(self) -> Vec<MemberDescriptor> {
        self.members.into_values().collect()
    }
}
