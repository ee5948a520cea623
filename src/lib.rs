#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod capture;
pub mod composite;
pub mod errors;
pub mod frame;
pub mod keyer;
pub mod lens;
pub mod materials;
pub mod mesh;
pub mod registry;
pub mod subsystem;
pub mod world;

pub use capture::{CapturePass, CapturePassKind, CaptureShowFlags, CaptureView, PlanarReflection, ReflectionKey};
pub use composite::{Composite, CompositeKey, CompositeOverrides, CompositeStore, MediaBlend, OutputAlpha, OutputRgbEncoding, RenderSoftMaskType, ResolvedComposite};
pub use errors::{ChromaError, Result};
pub use frame::{CameraPose, FrameCommands, RenderOp, TickContext, ViewInfo, ViewMode, Viewport};
pub use keyer::{CompositeKeyer, KeyerBinding, KeyerData, KeyerKey, KeyerProperties};
pub use lens::{LensCalibration, LensState};
pub use materials::{ColorSpace, CompositeAssets, MaterialDesc, MaterialHandle, MaterialInstance, ParameterCollection, RenderTarget, RenderTargetKey, Texture, TextureHandle};
pub use mesh::{BaseMaterials, CompositeMesh, MeshKey};
pub use registry::UpdateRegistry;
pub use subsystem::{CompositePostProcess, CompositorSubsystem};
pub use world::{CompositeWorldData, DebugCamera, WorldType};
