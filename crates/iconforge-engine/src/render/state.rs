use glam::Mat4;

use crate::object::LightingProfile;

/// Identifies which off-screen target draws are currently redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBinding {
    pub label: &'static str,
    pub edge: u32,
}

/// Ambient render-pipeline state shared with the host renderer: the current
/// projection, where draws are redirected, and the active lighting rig.
///
/// The exporter never mutates this directly; every change goes through an
/// [`AmbientScope`] so each field is restored on every exit path.
#[derive(Debug, Clone)]
pub struct AmbientState {
    pub projection: Mat4,
    pub bound_target: Option<TargetBinding>,
    pub lighting: LightingProfile,
}

impl Default for AmbientState {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            bound_target: None,
            lighting: LightingProfile::Flat,
        }
    }
}

/// Scoped save/restore over [`AmbientState`].
///
/// Captures the full ambient state on construction and writes it back on
/// drop, including the unwind path of a failed render. Binding is not
/// reentrant: constructing a scope while another target is bound is a caller
/// bug.
pub struct AmbientScope<'a> {
    state: &'a mut AmbientState,
    saved: AmbientState,
}

impl<'a> AmbientScope<'a> {
    /// Binds `target` and installs `projection` for the scope's lifetime.
    pub fn bind(state: &'a mut AmbientState, target: TargetBinding, projection: Mat4) -> Self {
        debug_assert!(
            state.bound_target.is_none(),
            "render target binding is not reentrant"
        );
        let saved = state.clone();
        state.bound_target = Some(target);
        state.projection = projection;
        Self { state, saved }
    }

    /// Installs the lighting rig for the current object.
    pub fn set_lighting(&mut self, profile: LightingProfile) {
        self.state.lighting = profile;
    }

    pub fn lighting(&self) -> LightingProfile {
        self.state.lighting
    }

    pub fn projection(&self) -> Mat4 {
        self.state.projection
    }
}

impl Drop for AmbientScope<'_> {
    fn drop(&mut self) {
        *self.state = self.saved.clone();
    }
}
