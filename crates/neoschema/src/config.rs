//! Resolver configuration.

use std::time::Duration;

use crate::desc::Annotation;
use crate::desc::AnnotationValue;
use crate::desc::TypeRef;

/// Options threaded through every resolver call.
///
/// Nothing is read from the environment; two resolutions with equal configs
/// and equal descriptions always agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Synthesize ids for unannotated members when no member of the type is annotated.
    pub generate_field_ids: bool,
    /// Annotation names that carry an explicit member id.
    pub id_annotations: Vec<String>,
    pub non_serialized_annotation: String,
    pub alias_annotation: String,
    /// Annotation carrying a method's default response timeout, in milliseconds.
    pub response_timeout_annotation: String,
    /// Match properties to primary constructor parameters by name.
    pub include_primary_constructor_parameters: bool,
    /// The parameter type that marks a method as cancellable.
    pub cancellation_type: TypeRef,
    /// The type of the wire slot that carries a cancellable call's token id.
    pub token_id_type: TypeRef,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            generate_field_ids: false,
            id_annotations: vec!["Id".to_string()],
            non_serialized_annotation: "NonSerialized".to_string(),
            alias_annotation: "Alias".to_string(),
            response_timeout_annotation: "ResponseTimeout".to_string(),
            include_primary_constructor_parameters: true,
            cancellation_type: TypeRef::named("CancellationToken"),
            token_id_type: TypeRef::named("TokenId"),
        }
    }
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generated_field_ids(mut self, enabled: bool) -> Self {
        self.generate_field_ids = enabled;
        self
    }

    /// Recognizes `name` as an additional identity annotation.
    pub fn with_id_annotation(mut self, name: impl Into<String>) -> Self {
        self.id_annotations.push(name.into());
        self
    }

    pub fn with_cancellation_type(mut self, ty: TypeRef) -> Self {
        self.cancellation_type = ty;
        self
    }

    pub fn with_token_id_type(mut self, ty: TypeRef) -> Self {
        self.token_id_type = ty;
        self
    }

    pub fn with_primary_constructor_parameters(mut self, enabled: bool) -> Self {
        self.include_primary_constructor_parameters = enabled;
        self
    }

    /// The first recognized identity annotation in `annotations`.
    pub fn id_annotation<'a>(&self, annotations: &'a [Annotation]) -> Option<&'a Annotation> {
        annotations.iter().find(|a| self.id_annotations.iter().any(|n| *n == a.name))
    }

    pub fn is_non_serialized(&self, annotations: &[Annotation]) -> bool {
        Annotation::find(annotations, &self.non_serialized_annotation).is_some()
    }

    /// The declared alias, if the alias annotation carries a string.
    pub fn alias_of<'a>(&self, annotations: &'a [Annotation]) -> Option<&'a str> {
        match Annotation::find(annotations, &self.alias_annotation)?.value.as_ref()? {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The declared response timeout. Negative or non-integer values yield `Err` with the raw value.
    pub fn response_timeout_of(&self, annotations: &[Annotation]) -> Option<Result<Duration, String>> {
        let annotation = Annotation::find(annotations, &self.response_timeout_annotation)?;
        Some(match &annotation.value {
            Some(AnnotationValue::Int(ms)) if *ms >= 0 => Ok(Duration::from_millis(*ms as u64)),
            other => Err(format!("{:?}", other)),
        })
    }
}
