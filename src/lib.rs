#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod assembly;
pub mod beam;
pub mod config;
pub mod errors;
pub mod fabrication;
pub mod geometry;
pub mod incidence;
pub mod joints;
pub mod topology;
pub mod volume;

pub use assembly::{Assembly, AssemblyData, BeamData, JointData, ResolutionReport};
pub use beam::{Beam, BeamEnd, BeamFeature, BeamKey, Feature, MillVolume};
pub use config::Settings;
pub use errors::{
    AssemblyError, ClassificationError, GeometryError, JoiningError, JoiningFailure,
    ParameterError, VolumeError,
};
pub use fabrication::{export, ExportReport, FabricationParameters, Process};
pub use geometry::{point, vector, Frame, Line, Plane, Point, Vector};
pub use joints::{Joint, JointKey, JointKind, JointOptions, JointState};
pub use topology::{classify, Classification, Topology};
pub use volume::{NegativeVolume, VolumeShape};
