//! `POST /workflow/rig-avatar`: auto-rig a static mesh.
//!
//! ```text
//! 1 LoadMesh ──trimesh──┐
//!                       ├─> 3 AutoRig  (terminal: output 0, rigged FBX path)
//! 2 LoadRigModel ─model─┘
//! ```

use crate::compiled::CompiledWorkflow;
use crate::extract;
use crate::fields;
use crate::registry::{EndpointDescriptor, Method};
use unirig_graph::{CompilationDefect, GraphPlan, Operation};
use unirig_schema::{FieldSpec, RequestSchema, ValidatedRequest};

/// Route path
pub const PATH: &str = "/workflow/rig-avatar";

/// Request schema
///
/// # Errors
///
/// Returns error if a field pattern fails to compile
pub fn schema() -> Result<RequestSchema, regex::Error> {
    Ok(RequestSchema::new("rig-avatar")
        .field(
            FieldSpec::string("mesh_url")
                .required()
                .non_empty()
                .describe("Path or URL of the mesh to rig (GLB, OBJ, FBX)"),
        )
        .field(fields::skeleton_template())
        .field(fields::output_name("rigged")?)
        .field(
            FieldSpec::integer("target_face_count")
                .with_default(50_000)
                .in_range(1_000, 500_000)
                .describe("Face budget the mesh is simplified to before rigging"),
        )
        .field(
            FieldSpec::integer("seed")
                .with_default(42)
                .in_range(0, i64::from(i32::MAX))
                .describe("Seed for skeleton sampling"),
        )
        .field(fields::model_precision())
        .field(
            FieldSpec::boolean("preserve_texture")
                .with_default(true)
                .describe("Carry the source textures into the FBX"),
        )
        .field(
            FieldSpec::boolean("simplify_mesh")
                .with_default(true)
                .describe("Decimate to target_face_count before rigging"),
        ))
}

/// Compile a validated rig request
///
/// # Errors
///
/// Returns error only on an internal defect
pub fn compile(request: &ValidatedRequest) -> Result<CompiledWorkflow, CompilationDefect> {
    let mut plan = GraphPlan::new();

    let mesh = plan.add(
        Operation::LoadMesh,
        [("source", fields::literal(request, "mesh_url")?)],
    );
    let model = plan.add(
        Operation::LoadRigModel,
        [("precision", fields::literal(request, "model_precision")?)],
    );
    let rig = plan.add(
        Operation::AutoRig,
        [
            ("trimesh", mesh.output(0).into()),
            ("model", model.output(0).into()),
            ("skeleton_template", fields::literal(request, "skeleton_template")?),
            ("output_name", fields::literal(request, "output_name")?),
            ("target_face_count", fields::literal(request, "target_face_count")?),
            ("seed", fields::literal(request, "seed")?),
            ("preserve_texture", fields::literal(request, "preserve_texture")?),
            ("simplify_mesh", fields::literal(request, "simplify_mesh")?),
        ],
    );

    CompiledWorkflow::finish(PATH, plan, rig.output(0))
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
        summary: "Automatically rig a 3D mesh with a skeleton and skin weights",
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
    use unirig_graph::{InputValue, Literal, Reference};
    use unirig_schema::SchemaValidator;

    fn validated(body: serde_json::Value) -> ValidatedRequest {
        let now = Timestamp::parse_rfc3339("2024-05-01T12:30:05Z").unwrap();
        SchemaValidator::new()
            .validate(&schema().unwrap(), &body, now)
            .unwrap()
    }

    #[test]
    fn test_minimal_request_compiles_to_three_nodes() {
        let compiled =
            compile(&validated(json!({"mesh_url": "a.glb", "skeleton_template": "mixamo"}))).unwrap();
        let graph = &compiled.graph;
        assert_eq!(graph.len(), 3);

        let rig = graph.get(&NodeId::from_index(3)).unwrap();
        assert_eq!(rig.operation, Operation::AutoRig);
        assert_eq!(
            rig.input("trimesh"),
            Some(&InputValue::Reference(Reference::new(NodeId::from_index(1), 0)))
        );
        assert_eq!(
            rig.input("model"),
            Some(&InputValue::Reference(Reference::new(NodeId::from_index(2), 0)))
        );
        assert_eq!(
            rig.input("skeleton_template"),
            Some(&InputValue::Literal(Literal::from("mixamo")))
        );
        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(3), 0));
    }

    #[test]
    fn test_literals_come_from_request() {
        let compiled = compile(&validated(json!({
            "mesh_url": "https://cdn.example.com/knight.glb",
            "skeleton_template": "vroid",
            "output_name": "knight",
            "target_face_count": 20000,
            "simplify_mesh": false
        })))
        .unwrap();
        let graph = &compiled.graph;

        let load = graph.get(&NodeId::from_index(1)).unwrap();
        assert_eq!(load.operation, Operation::LoadMesh);
        assert_eq!(
            load.input("source"),
            Some(&InputValue::Literal(Literal::from("https://cdn.example.com/knight.glb")))
        );

        let rig = graph.get(&NodeId::from_index(3)).unwrap();
        assert_eq!(rig.input("output_name"), Some(&InputValue::Literal(Literal::from("knight"))));
        assert_eq!(
            rig.input("target_face_count"),
            Some(&InputValue::Literal(Literal::Integer(20000)))
        );
        assert_eq!(rig.input("simplify_mesh"), Some(&InputValue::Literal(Literal::Bool(false))));
        assert_eq!(rig.input("seed"), Some(&InputValue::Literal(Literal::Integer(42))));
    }

    #[test]
    fn test_default_output_name_uses_request_time() {
        let compiled = compile(&validated(json!({"mesh_url": "a.glb"}))).unwrap();
        let rig = compiled.graph.get(&NodeId::from_index(3)).unwrap();
        assert_eq!(
            rig.input("output_name"),
            Some(&InputValue::Literal(Literal::from("rigged_20240501_123005")))
        );
    }

    #[test]
    fn test_descriptor() {
        let d = descriptor().unwrap();
        assert_eq!(d.path, "/workflow/rig-avatar");
        assert_eq!(d.method, Method::Post);
        assert!(d.schema.get("mesh_url").unwrap().required);
    }
}
