//! Operation catalogue.
//!
//! The engine executes nodes by class name. This crate never runs them; it
//! only needs each operation's input contract and output arity, kept here
//! as a lookup table keyed by a closed enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value a parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Scalar literal from the request
    Literal,
    /// Reference to another node's output
    Reference,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => write!(f, "literal"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Declared input parameter of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: &'static str,
    /// Accepted value kind
    pub kind: ParamKind,
    /// Whether the parameter must be present
    pub required: bool,
}

impl ParamSpec {
    const fn literal(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Literal,
            required: true,
        }
    }

    const fn optional_literal(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Literal,
            required: false,
        }
    }

    const fn reference(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Reference,
            required: true,
        }
    }
}

/// Input/output contract of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    /// Engine class name
    pub wire_name: &'static str,
    /// Display title written into node metadata
    pub title: &'static str,
    /// Declared parameters
    pub params: &'static [ParamSpec],
    /// Names of positional outputs
    pub outputs: &'static [&'static str],
    /// Optional parameters of which exactly one must be set
    pub exactly_one_of: &'static [&'static str],
}

impl OperationSpec {
    /// Look up a declared parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Number of positional outputs
    #[must_use]
    pub fn output_count(&self) -> u32 {
        self.outputs.len() as u32
    }
}

/// Operation tag of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Load a static mesh from a path or URL
    #[serde(rename = "UniRigLoadMesh")]
    LoadMesh,
    /// Load the skeleton and skinning checkpoints
    #[serde(rename = "UniRigLoadModel")]
    LoadRigModel,
    /// Predict a skeleton, skin the mesh, export an FBX
    #[serde(rename = "UniRigAutoRig")]
    AutoRig,
    /// Load an already rigged FBX
    #[serde(rename = "UniRigLoadRiggedMesh")]
    LoadRiggedMesh,
    /// Retarget an animation clip onto a rigged FBX
    #[serde(rename = "UniRigApplyAnimation")]
    ApplyAnimation,
    /// Rig an avatar and expose its skeleton
    #[serde(rename = "UniRigExtractSkeleton")]
    ExtractSkeleton,
    /// Load the reference mannequin library garments are authored on
    #[serde(rename = "ClothFitLoadMannequin")]
    LoadMannequin,
    /// Position an unplaced garment on the mannequin
    #[serde(rename = "ClothFitPlaceGarment")]
    PlaceGarment,
    /// Deform a garment from the source body onto the target body
    #[serde(rename = "ClothFitTransfer")]
    ClothFit,
    /// Copy skinning weights from the rigged avatar to the garment
    #[serde(rename = "ClothFitWeightTransfer")]
    WeightTransfer,
    /// Merge the skinned garment into the avatar file
    #[serde(rename = "ClothFitCombine")]
    CombineWithAvatar,
}

static LOAD_MESH: OperationSpec = OperationSpec {
    wire_name: "UniRigLoadMesh",
    title: "Load Mesh",
    params: &[ParamSpec::literal("source")],
    outputs: &["trimesh"],
    exactly_one_of: &[],
};

static LOAD_RIG_MODEL: OperationSpec = OperationSpec {
    wire_name: "UniRigLoadModel",
    title: "Load UniRig Model",
    params: &[ParamSpec::literal("precision")],
    outputs: &["model"],
    exactly_one_of: &[],
};

static AUTO_RIG: OperationSpec = OperationSpec {
    wire_name: "UniRigAutoRig",
    title: "Auto Rig",
    params: &[
        ParamSpec::reference("trimesh"),
        ParamSpec::reference("model"),
        ParamSpec::literal("skeleton_template"),
        ParamSpec::literal("output_name"),
        ParamSpec::literal("target_face_count"),
        ParamSpec::literal("seed"),
        ParamSpec::literal("preserve_texture"),
        ParamSpec::literal("simplify_mesh"),
    ],
    outputs: &["rigged_fbx_path", "skeleton"],
    exactly_one_of: &[],
};

static LOAD_RIGGED_MESH: OperationSpec = OperationSpec {
    wire_name: "UniRigLoadRiggedMesh",
    title: "Load Rigged Mesh",
    params: &[ParamSpec::literal("source")],
    outputs: &["fbx_path"],
    exactly_one_of: &[],
};

static APPLY_ANIMATION: OperationSpec = OperationSpec {
    wire_name: "UniRigApplyAnimation",
    title: "Apply Animation",
    params: &[
        ParamSpec::reference("model_fbx_path"),
        ParamSpec::optional_literal("animation_file"),
        ParamSpec::optional_literal("animation_url"),
        ParamSpec::literal("output_name"),
    ],
    outputs: &["animated_fbx_path"],
    exactly_one_of: &["animation_file", "animation_url"],
};

static EXTRACT_SKELETON: OperationSpec = OperationSpec {
    wire_name: "UniRigExtractSkeleton",
    title: "Extract Avatar Skeleton",
    params: &[
        ParamSpec::reference("trimesh"),
        ParamSpec::reference("model"),
        ParamSpec::literal("skeleton_template"),
    ],
    outputs: &["skeleton", "rigged_fbx_path"],
    exactly_one_of: &[],
};

static LOAD_MANNEQUIN: OperationSpec = OperationSpec {
    wire_name: "ClothFitLoadMannequin",
    title: "Load Reference Mannequin",
    params: &[ParamSpec::literal("body_type")],
    outputs: &["mesh", "skeleton"],
    exactly_one_of: &[],
};

static PLACE_GARMENT: OperationSpec = OperationSpec {
    wire_name: "ClothFitPlaceGarment",
    title: "Place Garment On Body",
    params: &[
        ParamSpec::reference("garment"),
        ParamSpec::reference("mannequin"),
        ParamSpec::literal("category"),
    ],
    outputs: &["placed_garment", "source_skeleton"],
    exactly_one_of: &[],
};

static CLOTH_FIT: OperationSpec = OperationSpec {
    wire_name: "ClothFitTransfer",
    title: "Fit Cloth",
    params: &[
        ParamSpec::reference("source_garment"),
        ParamSpec::reference("source_skeleton"),
        ParamSpec::reference("target_mesh"),
        ParamSpec::reference("target_skeleton"),
        ParamSpec::literal("category"),
    ],
    outputs: &["fitted_garment"],
    exactly_one_of: &[],
};

static WEIGHT_TRANSFER: OperationSpec = OperationSpec {
    wire_name: "ClothFitWeightTransfer",
    title: "Transfer Skin Weights",
    params: &[
        ParamSpec::reference("fitted_garment"),
        ParamSpec::reference("rigged_avatar"),
        ParamSpec::literal("output_name"),
    ],
    outputs: &["rigged_garment_path"],
    exactly_one_of: &[],
};

static COMBINE_WITH_AVATAR: OperationSpec = OperationSpec {
    wire_name: "ClothFitCombine",
    title: "Combine With Avatar",
    params: &[
        ParamSpec::reference("avatar"),
        ParamSpec::reference("garment"),
        ParamSpec::literal("output_name"),
    ],
    outputs: &["combined_fbx_path"],
    exactly_one_of: &[],
};

impl Operation {
    /// Every operation, in catalogue order
    pub const ALL: [Operation; 11] = [
        Self::LoadMesh,
        Self::LoadRigModel,
        Self::AutoRig,
        Self::LoadRiggedMesh,
        Self::ApplyAnimation,
        Self::ExtractSkeleton,
        Self::LoadMannequin,
        Self::PlaceGarment,
        Self::ClothFit,
        Self::WeightTransfer,
        Self::CombineWithAvatar,
    ];

    /// Declared contract of this operation
    #[must_use]
    pub fn spec(self) -> &'static OperationSpec {
        match self {
            Self::LoadMesh => &LOAD_MESH,
            Self::LoadRigModel => &LOAD_RIG_MODEL,
            Self::AutoRig => &AUTO_RIG,
            Self::LoadRiggedMesh => &LOAD_RIGGED_MESH,
            Self::ApplyAnimation => &APPLY_ANIMATION,
            Self::ExtractSkeleton => &EXTRACT_SKELETON,
            Self::LoadMannequin => &LOAD_MANNEQUIN,
            Self::PlaceGarment => &PLACE_GARMENT,
            Self::ClothFit => &CLOTH_FIT,
            Self::WeightTransfer => &WEIGHT_TRANSFER,
            Self::CombineWithAvatar => &COMBINE_WITH_AVATAR,
        }
    }

    /// Engine class name
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        self.spec().wire_name
    }

    /// Number of positional outputs
    #[must_use]
    pub fn output_count(self) -> u32 {
        self.spec().output_count()
    }

    /// Resolve an engine class name
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.wire_name() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
