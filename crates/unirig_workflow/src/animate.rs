//! `POST /workflow/animate-avatar`: retarget a clip onto a rigged FBX.
//!
//! ```text
//! 1 LoadRiggedMesh ──model_fbx_path──> 2 ApplyAnimation  (terminal: output 0)
//! ```

use crate::compiled::CompiledWorkflow;
use crate::extract;
use crate::fields;
use crate::registry::{EndpointDescriptor, Method};
use unirig_graph::{CompilationDefect, GraphPlan, Operation, PlannedInput};
use unirig_schema::{FieldSpec, RequestSchema, ValidatedRequest};

/// Route path
pub const PATH: &str = "/workflow/animate-avatar";

/// Request schema
///
/// # Errors
///
/// Returns error if a field pattern fails to compile
pub fn schema() -> Result<RequestSchema, regex::Error> {
    Ok(RequestSchema::new("animate-avatar")
        .field(
            FieldSpec::string("rigged_fbx_url")
                .required()
                .non_empty()
                .describe("Path or URL of a rigged FBX"),
        )
        .field(
            FieldSpec::string("animation_url")
                .non_empty()
                .describe("Path or URL of an animation FBX"),
        )
        .field(
            FieldSpec::string("animation_file")
                .non_empty()
                .describe("Name of a clip in the engine's animation library"),
        )
        .field(fields::output_name("animated")?)
        .exactly_one_of(&["animation_url", "animation_file"]))
}

/// Compile a validated animate request
///
/// # Errors
///
/// Returns error only on an internal defect
pub fn compile(request: &ValidatedRequest) -> Result<CompiledWorkflow, CompilationDefect> {
    let mut plan = GraphPlan::new();

    let rigged = plan.add(
        Operation::LoadRiggedMesh,
        [("source", fields::literal(request, "rigged_fbx_url")?)],
    );

    // Validation guarantees exactly one of the two is set
    let clip: (&str, PlannedInput) = if request.is_set("animation_url") {
        ("animation_url", fields::literal(request, "animation_url")?)
    } else {
        ("animation_file", fields::literal(request, "animation_file")?)
    };

    let animated = plan.add(
        Operation::ApplyAnimation,
        [
            ("model_fbx_path", rigged.output(0).into()),
            clip,
            ("output_name", fields::literal(request, "output_name")?),
        ],
    );

    CompiledWorkflow::finish(PATH, plan, animated.output(0))
}

/// Registry entry
///
/// # Errors
///
/// Returns error if the schema fails to build
pub fn descriptor() -> Result<EndpointDescriptor, regex::Error> {
    Ok(EndpointDescriptor {
        method: Method::Post,
        path: PATH,
        summary: "Apply an animation clip to a rigged avatar",
        schema: schema()?,
        compiler: compile,
        extractor: extract::result_path,
    })
}
