//! Hierarchical composite configuration model.

pub mod color_grade;
pub mod store;
pub mod types;

pub use color_grade::{ColorGrade, ColorGradePerRange};
pub use store::{Composite, CompositeKey, CompositeOverrides, CompositeStore, ResolvedComposite};
pub use types::{MediaBlend, OutputAlpha, OutputRgbEncoding, RenderSoftMaskType};
