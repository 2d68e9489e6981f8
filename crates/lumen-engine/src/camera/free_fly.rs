use glam::{Mat3, Mat4, Vec2, Vec3};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    /// Fixed ±2 extent, independent of the viewport.
    Orthographic,
}

/// Position, orientation and projection of the viewer.
///
/// The view matrix and the forward/right/up basis are recomputed lazily on the
/// first read after a position or rotation change. The projection matrix is
/// recomputed eagerly whenever one of its parameters changes.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    rotation: Vec3,
    projection_mode: ProjectionMode,

    field_of_view: f32,
    near_clip_plane: f32,
    far_clip_plane: f32,
    viewport_size: Vec2,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    view_dirty: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, ProjectionMode::Perspective)
    }
}

impl Camera {
    pub const WORLD_UP: Vec3 = Vec3::Z;
    pub const WORLD_RIGHT: Vec3 = Vec3::NEG_Y;
    pub const WORLD_FORWARD: Vec3 = Vec3::X;

    const ORTHO_EXTENT: f32 = 2.0;
    const ORTHO_NEAR: f32 = 0.1;
    const ORTHO_FAR: f32 = 100.0;

    pub fn new(position: Vec3, rotation: Vec3, projection_mode: ProjectionMode) -> Self {
        let mut camera = Self {
            position,
            rotation,
            projection_mode,
            field_of_view: 60.0,
            near_clip_plane: 0.1,
            far_clip_plane: 100.0,
            viewport_size: Vec2::new(800.0, 600.0),
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            forward: Self::WORLD_FORWARD,
            right: Self::WORLD_RIGHT,
            up: Self::WORLD_UP,
            view_dirty: true,
        };
        camera.update_view();
        camera.update_projection();
        camera
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view_dirty = true;
    }

    /// Sets Euler angles in degrees (`x` = roll, `y` = pitch, `z` = yaw).
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.view_dirty = true;
    }

    pub fn set_position_rotation(&mut self, position: Vec3, rotation: Vec3) {
        self.position = position;
        self.rotation = rotation;
        self.view_dirty = true;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    // ── projection ────────────────────────────────────────────────────────

    pub fn set_projection_mode(&mut self, projection_mode: ProjectionMode) {
        self.projection_mode = projection_mode;
        self.update_projection();
    }

    pub fn set_far_clip_plane(&mut self, far: f32) {
        self.far_clip_plane = far;
        self.update_projection();
    }

    pub fn set_near_clip_plane(&mut self, near: f32) {
        self.near_clip_plane = near;
        self.update_projection();
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport_size = Vec2::new(width, height);
        self.update_projection();
    }

    /// Vertical field of view in degrees.
    pub fn set_field_of_view(&mut self, fov: f32) {
        self.field_of_view = fov;
        self.update_projection();
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    pub fn far_clip_plane(&self) -> f32 {
        self.far_clip_plane
    }

    pub fn near_clip_plane(&self) -> f32 {
        self.near_clip_plane
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    // ── derived matrices ──────────────────────────────────────────────────

    pub fn view_matrix(&mut self) -> Mat4 {
        self.refresh_view();
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection_matrix(&mut self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }

    pub fn forward(&mut self) -> Vec3 {
        self.refresh_view();
        self.forward
    }

    pub fn right(&mut self) -> Vec3 {
        self.refresh_view();
        self.right
    }

    pub fn up(&mut self) -> Vec3 {
        self.refresh_view();
        self.up
    }

    // ── movement ──────────────────────────────────────────────────────────

    /// Moves along the view direction.
    pub fn move_forward(&mut self, delta: f32) {
        self.refresh_view();
        self.position += self.forward * delta;
        self.view_dirty = true;
    }

    pub fn move_right(&mut self, delta: f32) {
        self.refresh_view();
        self.position += self.right * delta;
        self.view_dirty = true;
    }

    /// Moves along world up, regardless of orientation.
    pub fn move_up(&mut self, delta: f32) {
        self.position += Self::WORLD_UP * delta;
        self.view_dirty = true;
    }

    /// `movement` is (forward, right, up) in the camera basis; `rotation` is
    /// added to the Euler angles.
    pub fn add_movement_and_rotation(&mut self, movement: Vec3, rotation: Vec3) {
        self.refresh_view();
        self.position += self.forward * movement.x;
        self.position += self.right * movement.y;
        self.position += self.up * movement.z;
        self.rotation += rotation;
        self.view_dirty = true;
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn refresh_view(&mut self) {
        if self.view_dirty {
            self.update_view();
        }
    }

    fn update_view(&mut self) {
        let roll = self.rotation.x.to_radians();
        let pitch = self.rotation.y.to_radians();
        let yaw = self.rotation.z.to_radians();

        let euler = Mat3::from_rotation_z(yaw) * Mat3::from_rotation_y(pitch) * Mat3::from_rotation_x(roll);
        self.forward = (euler * Self::WORLD_FORWARD).normalize();
        self.right = (euler * Self::WORLD_RIGHT).normalize();
        self.up = self.right.cross(self.forward);

        self.view_matrix = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
        self.view_dirty = false;
    }

    fn update_projection(&mut self) {
        self.projection_matrix = match self.projection_mode {
            ProjectionMode::Perspective => {
                let Vec2 { x: width, y: height } = self.viewport_size;
                if width <= 0.0 || height <= 0.0 {
                    log::debug!("keeping projection for empty viewport {width}x{height}");
                    return;
                }
                Mat4::perspective_rh(
                    self.field_of_view.to_radians(),
                    width / height,
                    self.near_clip_plane,
                    self.far_clip_plane,
                )
            }
            ProjectionMode::Orthographic => Mat4::orthographic_rh(
                -Self::ORTHO_EXTENT,
                Self::ORTHO_EXTENT,
                -Self::ORTHO_EXTENT,
                Self::ORTHO_EXTENT,
                Self::ORTHO_NEAR,
                Self::ORTHO_FAR,
            ),
        };
    }
}
