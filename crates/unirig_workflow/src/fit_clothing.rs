//! `POST /workflow/fit-clothing`: fit a garment to a rigged avatar.
//!
//! Four nodes are always built: the avatar mesh, the rigging model, the
//! avatar skeleton extracted from them, and the clothing mesh. The garment
//! then needs a source pose on the reference mannequin:
//!
//! - AI-generated garments are unpositioned, so a placement node puts them
//!   on the mannequin and supplies both the placed garment and its skeleton.
//! - Library garments are authored on the mannequin already; the raw
//!   clothing mesh and the mannequin skeleton are used directly.
//!
//! Cloth fit and weight transfer follow, and a combine node is appended
//! when `combine_with_avatar` is set. Ids come from the plan, so the
//! combine node always lands one past the branch that fed it.

use crate::compiled::CompiledWorkflow;
use crate::extract;
use crate::fields;
use crate::registry::{EndpointDescriptor, Method};
use unirig_graph::{CompilationDefect, GraphPlan, Link, Operation, PlannedInput, Slot};
use unirig_schema::{FieldSpec, RequestSchema, ValidatedRequest};

/// Route path
pub const PATH: &str = "/workflow/fit-clothing";

const CATEGORIES: [&str; 5] = ["top", "bottom", "dress", "outerwear", "footwear"];
const MANNEQUINS: [&str; 3] = ["neutral", "male", "female"];

/// Request schema
///
/// # Errors
///
/// Returns error if a field pattern fails to compile
pub fn schema() -> Result<RequestSchema, regex::Error> {
    Ok(RequestSchema::new("fit-clothing")
        .field(
            FieldSpec::string("avatar_mesh_url")
                .required()
                .non_empty()
                .describe("Path or URL of the avatar mesh"),
        )
        .field(
            FieldSpec::string("clothing_mesh_url")
                .required()
                .non_empty()
                .describe("Path or URL of the garment mesh"),
        )
        .field(
            FieldSpec::string("clothing_category")
                .with_default("top")
                .one_of(CATEGORIES)
                .describe("Garment category, drives placement and fitting"),
        )
        .field(
            FieldSpec::boolean("ai_generated")
                .with_default(true)
                .describe("Garment is generated and unpositioned rather than library content"),
        )
        .field(
            FieldSpec::boolean("combine_with_avatar")
                .with_default(false)
                .describe("Merge the fitted garment into the avatar file"),
        )
        .field(fields::skeleton_template())
        .field(
            FieldSpec::string("mannequin")
                .with_default("neutral")
                .one_of(MANNEQUINS)
                .describe("Reference body library garments are authored on"),
        )
        .field(fields::model_precision())
        .field(fields::output_name("fitted")?))
}

/// Nodes built for every fit-clothing request
struct Inputs {
    avatar_mesh: Slot,
    avatar_skeleton: Link,
    rigged_avatar: Link,
    clothing: Slot,
}

/// Garment and skeleton in the mannequin's pose
struct SourceGarment {
    garment: Link,
    skeleton: Link,
}

fn load_inputs(plan: &mut GraphPlan, request: &ValidatedRequest) -> Result<Inputs, CompilationDefect> {
    let avatar_mesh = plan.add(
        Operation::LoadMesh,
        [("source", fields::literal(request, "avatar_mesh_url")?)],
    );
    let model = plan.add(
        Operation::LoadRigModel,
        [("precision", fields::literal(request, "model_precision")?)],
    );
    let skeleton = plan.add(
        Operation::ExtractSkeleton,
        [
            ("trimesh", avatar_mesh.output(0).into()),
            ("model", model.output(0).into()),
            ("skeleton_template", fields::literal(request, "skeleton_template")?),
        ],
    );
    let clothing = plan.add(
        Operation::LoadMesh,
        [("source", fields::literal(request, "clothing_mesh_url")?)],
    );

    Ok(Inputs {
        avatar_mesh,
        avatar_skeleton: skeleton.output(0),
        rigged_avatar: skeleton.output(1),
        clothing,
    })
}

fn mannequin(plan: &mut GraphPlan, request: &ValidatedRequest) -> Result<Slot, CompilationDefect> {
    Ok(plan.add(
        Operation::LoadMannequin,
        [("body_type", fields::literal(request, "mannequin")?)],
    ))
}

fn placed_garment(
    plan: &mut GraphPlan,
    request: &ValidatedRequest,
    clothing: Slot,
) -> Result<SourceGarment, CompilationDefect> {
    let body = mannequin(plan, request)?;
    let placed = plan.add(
        Operation::PlaceGarment,
        [
            ("garment", clothing.output(0).into()),
            ("mannequin", body.output(0).into()),
            ("category", fields::literal(request, "clothing_category")?),
        ],
    );
    Ok(SourceGarment {
        garment: placed.output(0),
        skeleton: placed.output(1),
    })
}

fn library_garment(
    plan: &mut GraphPlan,
    request: &ValidatedRequest,
    clothing: Slot,
) -> Result<SourceGarment, CompilationDefect> {
    let body = mannequin(plan, request)?;
    Ok(SourceGarment {
        garment: clothing.output(0),
        skeleton: body.output(1),
    })
}

/// Compile a validated fit-clothing request
///
/// # Errors
///
/// Returns error only on an internal defect
pub fn compile(request: &ValidatedRequest) -> Result<CompiledWorkflow, CompilationDefect> {
    let mut plan = GraphPlan::new();
    let inputs = load_inputs(&mut plan, request)?;

    let source = if fields::flag(request, "ai_generated")? {
        placed_garment(&mut plan, request, inputs.clothing)?
    } else {
        library_garment(&mut plan, request, inputs.clothing)?
    };

    let category = fields::literal(request, "clothing_category")?;
    let fitted = plan.add(
        Operation::ClothFit,
        [
            ("source_garment", source.garment.into()),
            ("source_skeleton", source.skeleton.into()),
            ("target_mesh", inputs.avatar_mesh.output(0).into()),
            ("target_skeleton", inputs.avatar_skeleton.into()),
            ("category", category),
        ],
    );

    let output_name = fields::text(request, "output_name")?;
    let combine = fields::flag(request, "combine_with_avatar")?;

    // The caller's name goes on whichever file is returned
    let garment_name = if combine {
        format!("{}_garment", output_name)
    } else {
        output_name.to_string()
    };
    let weighted = plan.add(
        Operation::WeightTransfer,
        [
            ("fitted_garment", fitted.output(0).into()),
            ("rigged_avatar", inputs.rigged_avatar.into()),
            ("output_name", PlannedInput::from(garment_name)),
        ],
    );

    let terminal = if combine {
        let combined = plan.add(
            Operation::CombineWithAvatar,
            [
                ("avatar", inputs.avatar_mesh.output(0).into()),
                ("garment", weighted.output(0).into()),
                ("output_name", PlannedInput::from(output_name)),
            ],
        );
        combined.output(0)
    } else {
        weighted.output(0)
    };

    CompiledWorkflow::finish(PATH, plan, terminal)
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
        summary: "Fit a garment to a rigged avatar and transfer its skin weights",
        schema: schema()?,
        compiler: compile,
        extractor: extract::result_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unirig_core::{NodeId, Timestamp};
    use unirig_graph::{InputValue, Literal, Node, NodeGraph, Reference};
    use unirig_schema::SchemaValidator;

    fn compiled(ai_generated: bool, combine: bool) -> CompiledWorkflow {
        let body = json!({
            "avatar_mesh_url": "avatar.glb",
            "clothing_mesh_url": "jacket.glb",
            "clothing_category": "outerwear",
            "ai_generated": ai_generated,
            "combine_with_avatar": combine,
            "output_name": "look"
        });
        let request = SchemaValidator::new()
            .validate(&schema().unwrap(), &body, Timestamp::now())
            .unwrap();
        compile(&request).unwrap()
    }

    fn node(graph: &NodeGraph, index: u32) -> &Node {
        graph.get(&NodeId::from_index(index)).unwrap()
    }

    fn reference(index: u32, output: u32) -> Option<InputValue> {
        Some(InputValue::Reference(Reference::new(NodeId::from_index(index), output)))
    }

    fn operations(graph: &NodeGraph) -> Vec<Operation> {
        graph.iter().map(|(_, n)| n.operation).collect()
    }

    #[test]
    fn test_unconditional_prefix() {
        for (ai, combine) in [(true, false), (true, true), (false, false), (false, true)] {
            let graph = compiled(ai, combine).graph;
            assert_eq!(
                operations(&graph)[..4],
                [
                    Operation::LoadMesh,
                    Operation::LoadRigModel,
                    Operation::ExtractSkeleton,
                    Operation::LoadMesh
                ]
            );
            let skeleton = node(&graph, 3);
            assert_eq!(skeleton.input("trimesh").cloned(), reference(1, 0));
            assert_eq!(skeleton.input("model").cloned(), reference(2, 0));
        }
    }

    #[test]
    fn test_ai_generated_without_combine() {
        let compiled = compiled(true, false);
        let graph = &compiled.graph;
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.nodes_with(Operation::CombineWithAvatar).count(), 0);

        let place = node(graph, 6);
        assert_eq!(place.operation, Operation::PlaceGarment);
        assert_eq!(place.input("garment").cloned(), reference(4, 0));
        assert_eq!(place.input("mannequin").cloned(), reference(5, 0));
        assert_eq!(
            place.input("category"),
            Some(&InputValue::Literal(Literal::from("outerwear")))
        );

        let fit = node(graph, 7);
        assert_eq!(fit.operation, Operation::ClothFit);
        assert_eq!(fit.input("source_garment").cloned(), reference(6, 0));
        assert_eq!(fit.input("source_skeleton").cloned(), reference(6, 1));
        assert_eq!(fit.input("target_mesh").cloned(), reference(1, 0));
        assert_eq!(fit.input("target_skeleton").cloned(), reference(3, 0));

        let weights = node(graph, 8);
        assert_eq!(weights.operation, Operation::WeightTransfer);
        assert_eq!(weights.input("fitted_garment").cloned(), reference(7, 0));
        assert_eq!(weights.input("rigged_avatar").cloned(), reference(3, 1));
        assert_eq!(
            weights.input("output_name"),
            Some(&InputValue::Literal(Literal::from("look")))
        );

        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(8), 0));
    }

    #[test]
    fn test_library_without_combine() {
        let compiled = compiled(false, false);
        let graph = &compiled.graph;
        assert_eq!(graph.len(), 7);
        assert_eq!(graph.nodes_with(Operation::PlaceGarment).count(), 0);

        let fit = node(graph, 6);
        assert_eq!(fit.operation, Operation::ClothFit);
        assert_eq!(fit.input("source_garment").cloned(), reference(4, 0));
        assert_eq!(fit.input("source_skeleton").cloned(), reference(5, 1));
        assert_eq!(fit.input("target_mesh").cloned(), reference(1, 0));
        assert_eq!(fit.input("target_skeleton").cloned(), reference(3, 0));
        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(7), 0));
    }

    #[test]
    fn test_library_with_combine() {
        let compiled = compiled(false, true);
        let graph = &compiled.graph;
        assert_eq!(graph.len(), 8);

        let (combine_id, combine) = graph.nodes_with(Operation::CombineWithAvatar).next().unwrap();
        assert_eq!(combine_id, &NodeId::from_index(8));
        assert_eq!(combine.input("avatar").cloned(), reference(1, 0));
        assert_eq!(combine.input("garment").cloned(), reference(7, 0));
        assert_eq!(combine.input("output_name"), Some(&InputValue::Literal(Literal::from("look"))));
        assert_eq!(
            node(graph, 7).input("output_name"),
            Some(&InputValue::Literal(Literal::from("look_garment")))
        );
        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(8), 0));
    }

    #[test]
    fn test_ai_generated_with_combine() {
        let compiled = compiled(true, true);
        assert_eq!(compiled.graph.len(), 9);
        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(9), 0));
        let combine = node(&compiled.graph, 9);
        assert_eq!(combine.input("avatar").cloned(), reference(1, 0));
        assert_eq!(combine.input("garment").cloned(), reference(8, 0));
    }

    #[test]
    fn test_combine_id_follows_branch_without_gap() {
        for ai in [true, false] {
            let without = compiled(ai, false).graph;
            let with = compiled(ai, true).graph;
            let branch_max = without.max_index().unwrap();
            let (combine_id, _) = with.nodes_with(Operation::CombineWithAvatar).next().unwrap();
            assert_eq!(combine_id.index(), Some(branch_max + 1));
            assert_eq!(with.len(), without.len() + 1);
        }
    }
}
