//! Field declarations shared by several endpoints, and typed reads of
//! validated requests for the compilers.

use regex::Regex;
use unirig_graph::{CompilationDefect, Literal, PlannedInput};
use unirig_schema::{FieldSpec, ValidatedRequest};

pub(crate) const SKELETON_TEMPLATES: [&str; 3] = ["mixamo", "vroid", "articulationxl"];
pub(crate) const MODEL_PRECISIONS: [&str; 2] = ["fp16", "fp32"];

/// Output names end up as file names on the engine host
const OUTPUT_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_\-]{0,127}$";

pub(crate) fn output_name(prefix: &'static str) -> Result<FieldSpec, regex::Error> {
    Ok(FieldSpec::string("output_name")
        .with_output_name_default(prefix)
        .matching(Regex::new(OUTPUT_NAME_PATTERN)?)
        .describe("Base name of the produced file"))
}

pub(crate) fn skeleton_template() -> FieldSpec {
    FieldSpec::string("skeleton_template")
        .with_default("mixamo")
        .one_of(SKELETON_TEMPLATES)
        .describe("Skeleton layout to rig against")
}

pub(crate) fn model_precision() -> FieldSpec {
    FieldSpec::string("model_precision")
        .with_default("fp16")
        .one_of(MODEL_PRECISIONS)
        .describe("Numeric precision the rigging model runs at")
}

fn missing(name: &str) -> CompilationDefect {
    CompilationDefect::MissingField {
        field: name.to_string(),
    }
}

/// Field value as a node literal
pub(crate) fn literal(request: &ValidatedRequest, name: &str) -> Result<PlannedInput, CompilationDefect> {
    request
        .get(name)
        .and_then(Literal::from_json)
        .map(PlannedInput::Literal)
        .ok_or_else(|| missing(name))
}

pub(crate) fn text<'a>(request: &'a ValidatedRequest, name: &str) -> Result<&'a str, CompilationDefect> {
    request.str(name).ok_or_else(|| missing(name))
}

pub(crate) fn flag(request: &ValidatedRequest, name: &str) -> Result<bool, CompilationDefect> {
    request.bool(name).ok_or_else(|| missing(name))
}
