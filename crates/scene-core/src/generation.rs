//! Generator boundary: conversation history, output validation, revision diff.
//!
//! The generator itself is external. With history present it is expected to
//! revise the latest object with a minimal part-level diff; that property
//! cannot be re-derived from the output, so here we only validate the shape
//! and report what changed.

use std::future::Future;

use serde_json::Value;
use shared::{BuildingObject, ChatRole, ChatTurn, Part, PartDiff, PartKind, ValidationError};
use thiserror::Error;

use crate::i18n::{t, Lang};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Any fault inside the generator; the cause is only logged
    #[error("generation failed: {0}")]
    Failed(String),
    #[error("generated object rejected: {0}")]
    Invalid(#[from] ValidationError),
}

impl GenerationError {
    /// Short apologetic message for the chat
    pub fn user_message(&self, lang: Lang) -> &'static str {
        match self {
            GenerationError::Failed(_) => t(lang, "gen.failed"),
            GenerationError::Invalid(_) => t(lang, "gen.invalid"),
        }
    }
}

/// External natural-language → object generator
pub trait ObjectGenerator {
    /// Returns the raw object JSON; it is validated before anyone sees it.
    fn generate(
        &self,
        user_input: &str,
        history_json: &str,
    ) -> impl Future<Output = Result<Value, GenerationError>> + Send;
}

/// History as handed to the generator
pub fn history_json(history: &[ChatTurn]) -> String {
    serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string())
}

/// Latest object produced by the assistant, i.e. what a new request revises
pub fn revision_base(history: &[ChatTurn]) -> Option<&BuildingObject> {
    history
        .iter()
        .rev()
        .filter(|turn| turn.role == ChatRole::Assistant)
        .find_map(|turn| turn.object.as_ref())
}

enum VecProblem {
    NotArray,
    Length(usize),
    NotNumber,
}

fn vec3(value: &Value) -> Result<[f64; 3], VecProblem> {
    let items = value.as_array().ok_or(VecProblem::NotArray)?;
    if items.len() != 3 {
        return Err(VecProblem::Length(items.len()));
    }
    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64().ok_or(VecProblem::NotNumber)?;
    }
    Ok(out)
}

fn part_vec3(
    part: &Value,
    index: usize,
    field: &'static str,
) -> Result<Option<[f64; 3]>, ValidationError> {
    let Some(value) = part.get(field) else {
        return Ok(None);
    };
    vec3(value).map(Some).map_err(|problem| match problem {
        VecProblem::NotArray => {
            ValidationError::Malformed(format!("part {index}: `{field}` must be an array"))
        }
        VecProblem::Length(len) => ValidationError::VectorLength { index, field, len },
        VecProblem::NotNumber => ValidationError::NonFinite { index, field },
    })
}

fn object_vec3(object: &Value, field: &'static str) -> Result<Option<[f64; 3]>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => vec3(value)
            .map(Some)
            .map_err(|_| ValidationError::NonFiniteObject { field }),
    }
}

fn parse_part(value: &Value, index: usize) -> Result<Part, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::Malformed(format!("part {index} is not an object")));
    }

    let missing = |field| ValidationError::MissingField { index, field };
    let kind_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(missing("type"))?;
    let kind = PartKind::parse(kind_name).ok_or_else(|| ValidationError::UnknownPartType {
        index,
        kind: kind_name.to_string(),
    })?;

    let position = part_vec3(value, index, "position")?.ok_or(missing("position"))?;
    let size = part_vec3(value, index, "size")?.ok_or(missing("size"))?;
    let rotation = part_vec3(value, index, "rotation")?.unwrap_or([0.0; 3]);

    let mut part = Part::new(kind, position, size);
    part.rotation = rotation;
    if let Some(color) = value.get("color").and_then(Value::as_str) {
        part.color = color.to_string();
    }
    Ok(part)
}

/// Accept a generator response only if it satisfies every model invariant.
/// Nothing is partially accepted.
pub fn validate_object(value: &Value) -> Result<BuildingObject, ValidationError> {
    let parts = value.get("parts").and_then(Value::as_array).ok_or_else(|| {
        ValidationError::Malformed("expected an object with a `parts` array".into())
    })?;
    if parts.is_empty() {
        return Err(ValidationError::EmptyParts);
    }

    let parts = parts
        .iter()
        .enumerate()
        .map(|(index, part)| parse_part(part, index))
        .collect::<Result<Vec<_>, _>>()?;

    let object = BuildingObject {
        parts,
        position: object_vec3(value, "position")?,
        rotation: object_vec3(value, "rotation")?,
    };
    object.validate()?;
    Ok(object)
}

/// Part-level diff: equal parts carry over, everything else is removed/added.
pub fn diff_parts(previous: &[Part], next: &[Part]) -> PartDiff {
    let mut unmatched: Vec<Option<&Part>> = previous.iter().map(Some).collect();
    let mut diff = PartDiff::default();

    for part in next {
        let hit = unmatched.iter_mut().find(|slot| slot.is_some_and(|p| p == part));
        match hit {
            Some(slot) => {
                *slot = None;
                diff.kept += 1;
            }
            None => diff.added.push(part.clone()),
        }
    }
    diff.removed = unmatched.into_iter().flatten().cloned().collect();
    diff
}

/// An accepted generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub object: BuildingObject,
    /// Present when the request revised an earlier object
    pub diff: Option<PartDiff>,
}

impl GenerationOutcome {
    pub fn summary(&self, lang: Lang) -> &'static str {
        match &self.diff {
            None => t(lang, "gen.created"),
            Some(diff) if diff.is_unchanged() => t(lang, "gen.unchanged"),
            Some(_) => t(lang, "gen.revised"),
        }
    }
}

/// Runs the generator once and validates its answer. No retries.
pub struct GenerationService<G> {
    generator: G,
}

impl<G: ObjectGenerator> GenerationService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub async fn request(
        &self,
        user_input: &str,
        history: &[ChatTurn],
    ) -> Result<GenerationOutcome, GenerationError> {
        let raw = self
            .generator
            .generate(user_input, &history_json(history))
            .await
            .inspect_err(|e| tracing::warn!("Generator failed: {e}"))?;

        let object = validate_object(&raw).map_err(|e| {
            tracing::warn!("Rejected generator output: {e}");
            GenerationError::Invalid(e)
        })?;

        let diff =
            revision_base(history).map(|previous| diff_parts(&previous.parts, &object.parts));
        if let Some(diff) = &diff {
            tracing::info!(
                "Revision kept {} parts, removed {}, added {}",
                diff.kept,
                diff.removed.len(),
                diff.added.len()
            );
        }
        Ok(GenerationOutcome { object, diff })
    }
}
