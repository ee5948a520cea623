//! The per-world frame orchestrator.
//!
//! [`CompositorSubsystem`] owns every store of one compositing world and
//! drives the per-frame sequence: resolve the active composite chain, fan
//! out configuration changes, run the keyer, schedule the capture passes,
//! push every derived global parameter and update the lens state. The
//! result of a tick is an ordered [`FrameCommands`] list the host executes.

use glam::{Affine3A, UVec2, Vec4};
use slotmap::SlotMap;

use crate::capture::{
    CapturePass, CapturePassKind, CaptureView, FALLBACK_MEDIA_SIZE, PlanarReflection,
    ReflectionKey, compute_target_size, media_size, resolve_camera,
};
use crate::composite::{
    ColorGradePerRange, Composite, CompositeKey, CompositeStore, MediaBlend, OutputAlpha,
    OutputRgbEncoding, ResolvedComposite,
};
use crate::frame::{FrameCommands, RenderOp, TickContext, ViewInfo, ViewMode, Viewport};
use crate::keyer::{self, CompositeKeyer, KeyerBinding, KeyerData, KeyerKey, MEDIA_INPUT_PARAM};
use crate::lens::LensState;
use crate::materials::{
    ColorSpace, CompositeAssets, MaterialDesc, MaterialInstance, MidKey, ParameterCollection,
    RenderTarget, RenderTargetKey, Texture, TextureHandle,
};
use crate::mesh::{
    BaseMaterials, CompositeMesh, MeshKey, REFLECTION_INTENSITY_PARAM, REFLECTION_OCCLUSION_PARAM,
    SHADOWS_INTENSITY_PARAM, SOFT_MASK_CUSTOM_VALUE_PARAM, SOFT_MASK_VERTEX_COLOR_PARAM,
};
use crate::registry::UpdateRegistry;
use crate::world::CompositeWorldData;

/// Names of the global parameters the orchestrator writes each frame.
pub mod params {
    pub const IS_KEYER_ENABLED: &str = "IsKeyerEnabled";

    pub const SHADOWS_BLACK_LEVEL: &str = "ShadowsBlackLevel";
    pub const SHADOWS_WHITE_LEVEL: &str = "ShadowsWhiteLevel";
    pub const SHADOWS_GAMMA: &str = "ShadowsGamma";
    pub const SHADOWS_TINT: &str = "ShadowsTint";

    pub const MEDIA_BLEND_NONE: &str = "MediaBlendNone";
    pub const MEDIA_BLEND_PRE_TONE_CURVE: &str = "MediaBlendPreToneCurve";

    pub const OUTPUT_ALPHA_BLACK: &str = "OutputAlphaBlack";
    pub const OUTPUT_ALPHA_WHITE: &str = "OutputAlphaWhite";
    pub const OUTPUT_ALPHA_INVERT: &str = "OutputAlphaInvertOpacity";
    pub const OUTPUT_ALPHA_OVERRIDE: &str = "OutputAlphaOverride";
    pub const OUTPUT_RGB_ENCODING_SRGB: &str = "OutputRgbEncodingSrgb";

    pub const BRIGHTNESS_MASK_GAMMA: &str = "BrightnessMaskGamma";
    pub const APPLY_INVERSE_TONE_CURVE: &str = "ApplyInverseToneCurve";

    pub const PLANAR_REFLECTION_COLOR: &str = "PlanarReflectionColor";
    pub const PLANAR_REFLECTION_DISTORTION: &str = "PlanarReflectionDistortion";
    pub const PLANAR_REFLECTION_DISTORTION_OFFSET: &str = "PlanarReflectionDistortionOffset";
    pub const PLANAR_REFLECTION_SCREEN_PERCENTAGE: &str = "PlanarReflectionScreenPercentage";
    pub const SOFT_MASK_SCREEN_PERCENTAGE: &str = "SoftMaskScreenPercentage";

    pub const SCENE_SATURATION: &str = "SceneSaturation";
    pub const SCENE_CONTRAST: &str = "SceneContrast";
    pub const SCENE_GAMMA: &str = "SceneGamma";
    pub const SCENE_GAIN: &str = "SceneGain";
    pub const SCENE_OFFSET: &str = "SceneOffset";
    pub const MEDIA_SATURATION: &str = "MediaSaturation";
    pub const MEDIA_CONTRAST: &str = "MediaContrast";
    pub const MEDIA_GAMMA: &str = "MediaGamma";
    pub const MEDIA_GAIN: &str = "MediaGain";
    pub const MEDIA_OFFSET: &str = "MediaOffset";
    pub const COMBINED_SATURATION: &str = "CombinedSaturation";
    pub const COMBINED_CONTRAST: &str = "CombinedContrast";
    pub const COMBINED_GAMMA: &str = "CombinedGamma";
    pub const COMBINED_GAIN: &str = "CombinedGain";
    pub const COMBINED_OFFSET: &str = "CombinedOffset";

    pub const DEBUG_VISUALIZE_MESHES: &str = "DebugVisualizeCompositeMeshes";
    pub const DEBUG_VISUALIZE_SHADOWS: &str = "DebugVisualizeShadows";
    pub const DEBUG_VISUALIZE_ALPHA_IN_RGB: &str = "DebugVisualizeAlphaInRgb";
    pub const DEBUG_MEDIA_OVERLAY: &str = "DebugMediaOverlay";

    pub const CAMERA_FIELD_OF_VIEW: &str = "CameraFieldOfView";
    pub const OVERSCAN_FACTOR: &str = "OverscanFactor";

    /// Texture parameter of the undistortion material.
    pub const DISPLACEMENT_MAP: &str = "DisplacementMap";
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

/// Post-process injection state derived per view.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompositePostProcess {
    pub enabled: bool,
    pub camera_motion_blur: bool,
    pub visualize_meshes: bool,
    pub visualize_shadows: bool,
    pub visualize_alpha_in_rgb: bool,
}

/// Owner and orchestrator of one compositing world.
pub struct CompositorSubsystem {
    pub assets: CompositeAssets,
    pub composites: CompositeStore,
    pub keyers: SlotMap<KeyerKey, KeyerData>,
    pub meshes: SlotMap<MeshKey, CompositeMesh>,
    pub registry: UpdateRegistry,
    pub reflections: SlotMap<ReflectionKey, PlanarReflection>,
    pub parameters: ParameterCollection,
    pub viewport: Viewport,
    pub frame: FrameCommands,

    instances: SlotMap<MidKey, MaterialInstance>,
    world: Option<CompositeWorldData>,
    base_materials: BaseMaterials,
    soft_mask_pass: CapturePass,
    keyer_binding: KeyerBinding,
    keyer_target: RenderTargetKey,
    undistortion_target: RenderTargetKey,
    keyer_fallback: MidKey,
    fallback_media_index: Option<usize>,
    undistortion_instance: MidKey,
    undistortion_overscan_index: Option<usize>,
    undistortion_map_index: Option<usize>,
    default_undistortion_texture: TextureHandle,
    lens: LensState,
    post_process: CompositePostProcess,
    media_format_warned: bool,
}

impl CompositorSubsystem {
    #[must_use]
    pub fn new() -> Self {
        let mut assets = CompositeAssets::new();

        let keyer_target =
            assets.add_render_target(RenderTarget::new("RT_Keyer", FALLBACK_MEDIA_SIZE));
        let undistortion_target = assets
            .add_render_target(RenderTarget::new("RT_LensUndistortion", FALLBACK_MEDIA_SIZE));
        let soft_mask_target = assets.add_render_target(RenderTarget::new(
            "RT_SoftMask",
            compute_target_size(FALLBACK_MEDIA_SIZE, 25.0),
        ));

        let default_undistortion_texture = assets.add_texture(Texture::new(
            "T_IdentityDisplacement",
            UVec2::splat(2),
            ColorSpace::Linear,
        ));

        let mesh_params = [
            SHADOWS_INTENSITY_PARAM,
            REFLECTION_INTENSITY_PARAM,
            REFLECTION_OCCLUSION_PARAM,
        ];
        let base_materials = BaseMaterials {
            opaque: assets.add_material(MaterialDesc::new("M_CompositeOpaque").with_scalars(&mesh_params)),
            stencil: assets.add_material(MaterialDesc::new("M_CompositeStencil").with_scalars(&mesh_params)),
            translucent: assets
                .add_material(MaterialDesc::new("M_CompositeTranslucent").with_scalars(&mesh_params)),
            soft_mask_opaque: assets.add_material(
                MaterialDesc::new("M_SoftMaskOpaque")
                    .with_scalars(&[SOFT_MASK_CUSTOM_VALUE_PARAM, SOFT_MASK_VERTEX_COLOR_PARAM]),
            ),
            soft_mask_translucent: assets.add_material(MaterialDesc::new("M_SoftMaskTranslucent")),
        };

        let fallback_material = assets
            .add_material(MaterialDesc::new("M_KeyerDisabled").with_textures(&[MEDIA_INPUT_PARAM]));
        let undistortion_material = assets.add_material(
            MaterialDesc::new("M_LensUndistortion")
                .with_scalars(&[params::OVERSCAN_FACTOR])
                .with_textures(&[params::DISPLACEMENT_MAP]),
        );

        let mut instances = SlotMap::with_key();

        let mut fallback_instance = MaterialInstance::new(fallback_material);
        let mut fallback_media_index = None;
        if let Some(desc) = assets.materials.get(fallback_material) {
            fallback_media_index = fallback_instance.init_texture(desc, MEDIA_INPUT_PARAM, None);
        }
        let keyer_fallback = instances.insert(fallback_instance);

        let mut undistortion_inst = MaterialInstance::new(undistortion_material);
        let mut undistortion_overscan_index = None;
        let mut undistortion_map_index = None;
        if let Some(desc) = assets.materials.get(undistortion_material) {
            undistortion_overscan_index =
                undistortion_inst.init_scalar(desc, params::OVERSCAN_FACTOR, 1.0);
            undistortion_map_index = undistortion_inst.init_texture(
                desc,
                params::DISPLACEMENT_MAP,
                Some(default_undistortion_texture),
            );
        }
        let undistortion_instance = instances.insert(undistortion_inst);

        Self {
            assets,
            composites: CompositeStore::new(),
            keyers: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            registry: UpdateRegistry::new(),
            reflections: SlotMap::with_key(),
            parameters: ParameterCollection::new(),
            viewport: Viewport::default(),
            frame: FrameCommands::new(),
            instances,
            world: None,
            base_materials,
            soft_mask_pass: CapturePass::new(CapturePassKind::SoftMask, soft_mask_target),
            keyer_binding: KeyerBinding::new(),
            keyer_target,
            undistortion_target,
            keyer_fallback,
            fallback_media_index,
            undistortion_instance,
            undistortion_overscan_index,
            undistortion_map_index,
            default_undistortion_texture,
            lens: LensState::identity(default_undistortion_texture),
            post_process: CompositePostProcess::default(),
            media_format_warned: false,
        }
    }

    // ========================================================================
    // World data
    // ========================================================================

    /// Creates the per-world compositing state on first call.
    ///
    /// Meshes registered before this point receive the newly active
    /// configuration exactly once, here.
    pub fn find_or_add_world_data(&mut self) -> &mut CompositeWorldData {
        if self.world.is_none() {
            let composite = self.composites.add(Composite::new("WorldComposite"));
            let resolved = self.composites.resolve_all(composite);
            self.world = Some(CompositeWorldData::new(composite));
            self.registry.broadcast(&mut self.meshes, &resolved);
        }
        match &mut self.world {
            Some(world) => world,
            None => unreachable!(),
        }
    }

    #[must_use]
    pub fn world_data(&self) -> Option<&CompositeWorldData> {
        self.world.as_ref()
    }

    pub fn world_data_mut(&mut self) -> Option<&mut CompositeWorldData> {
        self.world.as_mut()
    }

    // ========================================================================
    // Meshes
    // ========================================================================

    #[must_use]
    pub fn base_materials(&self) -> &BaseMaterials {
        &self.base_materials
    }

    /// Creates a mesh built on the default base materials. The mesh is not
    /// registered until [`CompositorSubsystem::register_mesh`] is called.
    pub fn add_mesh(&mut self, name: &str) -> MeshKey {
        let mesh = CompositeMesh::new(name, &self.base_materials, &self.assets);
        self.meshes.insert(mesh)
    }

    pub fn register_mesh(&mut self, key: MeshKey) -> bool {
        let active = self
            .world
            .as_ref()
            .map(|w| self.composites.resolve_all(w.world_composite()));
        self.registry.register(key, &mut self.meshes, active.as_ref())
    }

    pub fn unregister_mesh(&mut self, key: MeshKey) {
        self.registry.unregister(key);
    }

    // ========================================================================
    // Keyers
    // ========================================================================

    pub fn add_keyer(&mut self, keyer: CompositeKeyer) -> KeyerKey {
        self.keyers.insert(KeyerData::Inline(keyer))
    }

    /// Adds a keyer asset that forwards to another keyer.
    pub fn add_keyer_reference(&mut self, enabled: bool, asset: Option<KeyerKey>) -> KeyerKey {
        self.keyers.insert(KeyerData::FromAsset { enabled, asset })
    }

    /// Whether the composite chain rooted at `composite` has a keyer that is
    /// enabled end to end.
    #[must_use]
    pub fn is_keyer_enabled(&self, composite: CompositeKey) -> bool {
        self.composites
            .resolve_media_input_keyer(composite)
            .is_some_and(|k| keyer::is_keyer_enabled(&self.keyers, k))
    }

    // ========================================================================
    // Planar reflections
    // ========================================================================

    /// Creates a planar reflection with its own capture target.
    ///
    /// When no reflection is designated for the world yet, the new one
    /// designates itself and force-enables the planar reflection override on
    /// the world composite.
    pub fn add_planar_reflection(&mut self, transform: Affine3A) -> ReflectionKey {
        let target = self.assets.add_render_target(RenderTarget::new(
            "RT_PlanarReflection",
            compute_target_size(FALLBACK_MEDIA_SIZE, 50.0),
        ));
        let key = self.reflections.insert(PlanarReflection::new(transform, target));

        self.find_or_add_world_data();
        let undesignated = self.world.as_ref().is_some_and(|w| w.planar_reflection().is_none());
        if undesignated {
            self.set_planar_reflection(Some(key));
            let world_composite = self.world.as_ref().map(CompositeWorldData::world_composite);
            if let Some(wc) = world_composite {
                if let Some(composite) = self.composites.composite_mut(wc) {
                    composite.set_enable_planar_reflection(true);
                }
            }
        }
        key
    }

    /// Switches the designated planar reflection. The previous designee stops
    /// capturing and its target is cleared; the new one starts capturing.
    pub fn set_planar_reflection(&mut self, new: Option<ReflectionKey>) {
        let Some(world) = &mut self.world else { return };
        let old = world.planar_reflection;
        if old == new {
            return;
        }
        world.planar_reflection = new;

        if let Some(old_key) = old {
            if let Some(reflection) = self.reflections.get_mut(old_key) {
                reflection.pass.capture_every_frame = false;
                self.frame.push(RenderOp::ClearTarget {
                    target: reflection.pass.target,
                    color: Vec4::ZERO,
                });
            }
        }
        if let Some(new_key) = new {
            if let Some(reflection) = self.reflections.get_mut(new_key) {
                reflection.pass.capture_every_frame = true;
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn soft_mask_pass(&self) -> &CapturePass {
        &self.soft_mask_pass
    }

    #[must_use]
    pub fn keyer_target(&self) -> RenderTargetKey {
        self.keyer_target
    }

    #[must_use]
    pub fn undistortion_target(&self) -> RenderTargetKey {
        self.undistortion_target
    }

    #[must_use]
    pub fn lens(&self) -> &LensState {
        &self.lens
    }

    #[must_use]
    pub fn post_process(&self) -> &CompositePostProcess {
        &self.post_process
    }

    /// Instance data behind a [`RenderOp::DrawMaterial`] command.
    #[must_use]
    pub fn instance(&self, key: MidKey) -> Option<&MaterialInstance> {
        self.instances.get(key)
    }

    // ========================================================================
    // Frame tick
    // ========================================================================

    /// Runs one frame of orchestration.
    ///
    /// Guaranteed ordering within the emitted commands: keyer draws precede
    /// the global parameter push, capture target resizes precede their
    /// capture, and the parameter push precedes any later view setup.
    pub fn tick(&mut self, ctx: &TickContext) {
        self.frame.clear();
        if ctx.headless {
            return;
        }

        let Some(world) = &self.world else {
            // No compositing yet; the lens still tracks the host camera.
            let fov = ctx
                .player_camera
                .map_or(crate::capture::DEFAULT_FIELD_OF_VIEW, |c| c.fov);
            self.lens
                .update(ctx.lens.as_ref(), fov, self.default_undistortion_texture);
            self.push_lens_state();
            return;
        };
        let world_composite = world.world_composite();
        let compositing_enabled = world.is_compositing_enabled;
        let match_viewport = world.match_viewport_resolution_with_media_input;
        let planar_key = world.planar_reflection();
        let debug_meshes = world.debug_visualize_composite_meshes();
        let debug_shadows = world.debug_visualize_shadows();
        let debug_alpha = world.debug_visualize_alpha_in_rgb();
        let debug_overlay = world.debug_media_overlay;
        let camera = resolve_camera(ctx, world);

        // 1. Resolve the active chain; fan out any change that touched it.
        let dirty = self.composites.take_dirty();
        let affects_active = dirty
            .iter()
            .any(|k| self.composites.is_ancestor(*k, world_composite));
        let resolved = self.composites.resolve_all(world_composite);
        if affects_active {
            self.registry.broadcast(&mut self.meshes, &resolved);
        }

        // 2. Media format fix-up: the keyer expects linear input.
        if let Some(handle) = resolved.media_input_texture {
            if let Some(texture) = self.assets.textures.get_mut(handle) {
                if texture.color_space != ColorSpace::Linear {
                    texture.color_space = ColorSpace::Linear;
                    if !self.media_format_warned {
                        log::warn!(
                            "media input '{}' was not tagged linear, fixed up",
                            texture.name
                        );
                        self.media_format_warned = true;
                    }
                }
            }
        }
        let media = media_size(
            resolved
                .media_input_texture
                .and_then(|h| self.assets.textures.get(h)),
        );

        // 3. Viewport coupling.
        if ctx.world_type.is_play() && compositing_enabled && match_viewport {
            self.viewport.fixed_size = Some(media);
        } else {
            self.viewport.fixed_size = None;
        }

        // 4. Full-resolution targets follow the media size.
        self.resize_target(self.keyer_target, media);
        self.resize_target(self.undistortion_target, media);

        // 5. Keyer, or the fallback passthrough when none is enabled.
        let keyer_enabled = resolved
            .media_input_keyer
            .is_some_and(|k| keyer::is_keyer_enabled(&self.keyers, k));
        if keyer_enabled {
            if let Some(keyer) = resolved
                .media_input_keyer
                .and_then(|k| keyer::resolve_keyer(&self.keyers, k))
            {
                self.keyer_binding.update(
                    keyer,
                    resolved.media_input_texture,
                    self.keyer_target,
                    &self.assets,
                    &mut self.instances,
                    &mut self.frame,
                );
            }
        } else {
            if let Some(instance) = self.instances.get_mut(self.keyer_fallback) {
                if let Some(index) = self.fallback_media_index {
                    instance.set_texture_by_index(index, resolved.media_input_texture);
                }
            }
            self.frame.push(RenderOp::DrawMaterial {
                target: self.keyer_target,
                material: self.keyer_fallback,
            });
        }
        self.parameters
            .set_scalar(params::IS_KEYER_ENABLED, flag(keyer_enabled));

        // 6. Capture passes.
        let soft_mask_size = compute_target_size(media, resolved.soft_mask_screen_percentage);
        self.resize_target(self.soft_mask_pass.target, soft_mask_size);
        let soft_mask_active =
            resolved.enable_soft_mask && !self.registry.soft_mask_show_only().is_empty();
        if soft_mask_active && self.soft_mask_pass.capture_every_frame {
            self.frame.push(RenderOp::CaptureScene {
                pass: CapturePassKind::SoftMask,
                target: self.soft_mask_pass.target,
                view: CaptureView::from_pose(&camera),
            });
        }

        if let Some(reflection_key) = planar_key {
            let reflection_size =
                compute_target_size(media, resolved.planar_reflection_screen_percentage);
            let snapshot = self
                .reflections
                .get(reflection_key)
                .map(|r| (r.pass.target, r.pass.capture_every_frame, r.mirrored_view(&camera)));
            if let Some((target, every_frame, view)) = snapshot {
                self.resize_target(target, reflection_size);
                if resolved.enable_planar_reflection && every_frame {
                    self.frame.push(RenderOp::CaptureScene {
                        pass: CapturePassKind::PlanarReflection,
                        target,
                        view,
                    });
                }
            }
        }

        // 7 + 8. Derived globals and debug toggles.
        self.push_globals(&resolved, debug_meshes, debug_shadows, debug_alpha);
        self.parameters
            .set_scalar(params::DEBUG_MEDIA_OVERLAY, debug_overlay);

        // 9. Lens state and the undistortion draw.
        self.lens
            .update(ctx.lens.as_ref(), camera.fov, self.default_undistortion_texture);
        self.push_lens_state();
    }

    /// Derives the post-process injection state for the view about to
    /// render. Scene captures, non-lit view modes and views without post
    /// processing never receive the injection.
    pub fn apply_view_setup(&mut self, view: &ViewInfo) {
        let world_enabled = self
            .world
            .as_ref()
            .is_some_and(|w| w.is_compositing_enabled);
        let enabled = world_enabled
            && !view.is_scene_capture
            && view.view_mode == ViewMode::Lit
            && view.post_processing;
        let (motion_blur, meshes, shadows, alpha) =
            self.world.as_ref().map_or((false, false, false, false), |w| {
                (
                    w.enable_camera_motion_blur,
                    w.debug_visualize_composite_meshes(),
                    w.debug_visualize_shadows(),
                    w.debug_visualize_alpha_in_rgb(),
                )
            });
        self.post_process = CompositePostProcess {
            enabled,
            camera_motion_blur: motion_blur,
            visualize_meshes: meshes,
            visualize_shadows: shadows,
            visualize_alpha_in_rgb: alpha,
        };
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn resize_target(&mut self, target: RenderTargetKey, size: UVec2) {
        if let Some(rt) = self.assets.render_targets.get_mut(target) {
            if rt.size != size {
                rt.size = size;
                self.frame.push(RenderOp::ResizeTarget { target, size });
            }
        }
    }

    fn push_globals(
        &mut self,
        r: &ResolvedComposite,
        debug_meshes: bool,
        debug_shadows: bool,
        debug_alpha: bool,
    ) {
        let p = &mut self.parameters;

        p.set_scalar(params::SHADOWS_BLACK_LEVEL, r.shadows_black_level + r.shadows_offset);
        p.set_scalar(params::SHADOWS_WHITE_LEVEL, r.shadows_white_level + r.shadows_offset);
        p.set_scalar(params::SHADOWS_GAMMA, r.shadows_gamma);
        p.set_vector(params::SHADOWS_TINT, r.shadows_tint);

        p.set_scalar(params::MEDIA_BLEND_NONE, flag(r.media_blend == MediaBlend::None));
        p.set_scalar(
            params::MEDIA_BLEND_PRE_TONE_CURVE,
            flag(r.media_blend == MediaBlend::PreToneCurve),
        );

        let alpha_black = r.output_alpha == OutputAlpha::Black;
        let alpha_white = r.output_alpha == OutputAlpha::White;
        p.set_scalar(params::OUTPUT_ALPHA_BLACK, flag(alpha_black));
        p.set_scalar(params::OUTPUT_ALPHA_WHITE, flag(alpha_white));
        p.set_scalar(
            params::OUTPUT_ALPHA_INVERT,
            flag(r.output_alpha == OutputAlpha::InvertedOpacity),
        );
        // A forced opaque output would hide the debug visualizations.
        p.set_scalar(
            params::OUTPUT_ALPHA_OVERRIDE,
            flag((alpha_black || alpha_white) && !debug_meshes && !debug_shadows),
        );
        p.set_scalar(
            params::OUTPUT_RGB_ENCODING_SRGB,
            flag(r.output_rgb_encoding == OutputRgbEncoding::Srgb),
        );

        p.set_scalar(params::BRIGHTNESS_MASK_GAMMA, r.brightness_mask_gamma);
        p.set_scalar(
            params::APPLY_INVERSE_TONE_CURVE,
            flag(r.apply_inverse_tone_curve),
        );

        p.set_vector(params::PLANAR_REFLECTION_COLOR, r.planar_reflection_color);
        p.set_scalar(params::PLANAR_REFLECTION_DISTORTION, r.planar_reflection_distortion);
        p.set_scalar(
            params::PLANAR_REFLECTION_DISTORTION_OFFSET,
            r.planar_reflection_distortion_offset,
        );
        p.set_scalar(
            params::PLANAR_REFLECTION_SCREEN_PERCENTAGE,
            r.planar_reflection_screen_percentage,
        );
        p.set_scalar(params::SOFT_MASK_SCREEN_PERCENTAGE, r.soft_mask_screen_percentage);

        fn push_grade(p: &mut ParameterCollection, names: [&'static str; 5], g: &ColorGradePerRange) {
            p.set_vector(names[0], g.saturation);
            p.set_vector(names[1], g.contrast);
            p.set_vector(names[2], g.gamma);
            p.set_vector(names[3], g.gain);
            p.set_vector(names[4], g.offset);
        }
        push_grade(
            p,
            [
                params::SCENE_SATURATION,
                params::SCENE_CONTRAST,
                params::SCENE_GAMMA,
                params::SCENE_GAIN,
                params::SCENE_OFFSET,
            ],
            &r.color_grade_scene,
        );
        push_grade(
            p,
            [
                params::MEDIA_SATURATION,
                params::MEDIA_CONTRAST,
                params::MEDIA_GAMMA,
                params::MEDIA_GAIN,
                params::MEDIA_OFFSET,
            ],
            &r.color_grade_media,
        );
        push_grade(
            p,
            [
                params::COMBINED_SATURATION,
                params::COMBINED_CONTRAST,
                params::COMBINED_GAMMA,
                params::COMBINED_GAIN,
                params::COMBINED_OFFSET,
            ],
            &r.color_grade_combined,
        );

        p.set_scalar(params::DEBUG_VISUALIZE_MESHES, flag(debug_meshes));
        p.set_scalar(params::DEBUG_VISUALIZE_SHADOWS, flag(debug_shadows));
        p.set_scalar(params::DEBUG_VISUALIZE_ALPHA_IN_RGB, flag(debug_alpha));
    }

    fn push_lens_state(&mut self) {
        self.parameters
            .set_scalar(params::CAMERA_FIELD_OF_VIEW, self.lens.fov_without_overscan);
        self.parameters
            .set_scalar(params::OVERSCAN_FACTOR, self.lens.overscan_factor);

        if let Some(instance) = self.instances.get_mut(self.undistortion_instance) {
            if let Some(index) = self.undistortion_overscan_index {
                instance.set_scalar_by_index(index, self.lens.overscan_factor);
            }
            if let Some(index) = self.undistortion_map_index {
                instance.set_texture_by_index(index, Some(self.lens.undistortion_texture));
            }
        }
        self.frame.push(RenderOp::DrawMaterial {
            target: self.undistortion_target,
            material: self.undistortion_instance,
        });
    }
}

impl Default for CompositorSubsystem {
    fn default() -> Self {
        Self::new()
    }
}
