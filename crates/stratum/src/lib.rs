//! # STRATUM Bounce
//!
//! A small scene on top of [`stratum_core`]: tinted rectangles that bounce
//! inside the screen bounds and optionally expire.
//!
//! Frame order (systems run in registration order):
//! 1. `MoveSystem` integrates velocity and reflects off the bounds
//! 2. `ExpirySystem` counts lifetimes down and queues destruction
//! 3. `DrawSystem` records one draw command per visible rectangle
//!
//! The scene owns no window; the recorded [`Frame`] is what a renderer
//! would submit.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use stratum_core::{Component, EcsResult, Entity, System, View, World, WorldConfig};

/// Screen width used by the demo host.
pub const SCREEN_WIDTH: f32 = 1280.0;

/// Screen height used by the demo host.
pub const SCREEN_HEIGHT: f32 = 720.0;

// =============================================================================
// Components
// =============================================================================

/// Axis-aligned rectangle in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

impl Component for Rect {}

/// Velocity in pixels per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// Horizontal speed.
    pub x: f32,
    /// Vertical speed.
    pub y: f32,
}

impl Velocity {
    /// Creates a velocity.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Component for Velocity {}

/// RGBA fill color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Tint {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Tint {
    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Component for Tint {}

/// Seconds an entity has left before it is destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Lifetime {
    /// Remaining seconds.
    pub remaining: f32,
}

impl Component for Lifetime {}

// =============================================================================
// Systems
// =============================================================================

/// Screen area rectangles bounce inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

/// Moves rectangles and reflects them off the bounds.
pub struct MoveSystem {
    bounds: Bounds,
}

impl MoveSystem {
    /// Creates the system for the given bounds.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

/// Reflects `position` into `[0, limit - extent]`, flipping `speed` on contact.
fn bounce(position: &mut f32, speed: &mut f32, extent: f32, limit: f32) {
    let max = (limit - extent).max(0.0);
    if *position <= 0.0 {
        *position = -*position;
        *speed = speed.abs();
    } else if *position >= max {
        *position = max - (*position - max);
        *speed = -speed.abs();
    }
    *position = position.clamp(0.0, max);
}

impl System for MoveSystem {
    fn run(&mut self, view: &mut View) {
        let dt = view.delta_seconds() as f32;
        let Some((rects, velocities)) = view.field_pair_mut::<Rect, Velocity>() else {
            return;
        };
        for (rect, velocity) in rects.iter_mut().zip(velocities.iter_mut()) {
            rect.x += velocity.x * dt;
            rect.y += velocity.y * dt;
            bounce(&mut rect.x, &mut velocity.x, rect.width, self.bounds.width);
            bounce(&mut rect.y, &mut velocity.y, rect.height, self.bounds.height);
        }
    }

    fn name(&self) -> &str {
        "move"
    }
}

/// Counts lifetimes down and destroys entities whose time ran out.
#[derive(Default)]
pub struct ExpirySystem;

impl System for ExpirySystem {
    fn run(&mut self, view: &mut View) {
        let dt = view.delta_seconds() as f32;
        let mut expired = Vec::new();
        if let Some(lifetimes) = view.field_mut::<Lifetime>() {
            for (position, lifetime) in lifetimes.iter_mut().enumerate() {
                lifetime.remaining -= dt;
                if lifetime.remaining <= 0.0 {
                    expired.push(position);
                }
            }
        }
        for position in expired {
            let entity = view.entities()[position];
            view.commands().destroy(entity);
        }
    }

    fn name(&self) -> &str {
        "expiry"
    }
}

/// One rectangle to fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// Entity being drawn.
    pub entity: Entity,
    /// Area to fill.
    pub rect: Rect,
    /// Fill color.
    pub tint: Tint,
}

/// Draw commands recorded during one tick.
#[derive(Debug, Default)]
pub struct Frame {
    /// Commands in draw order.
    pub commands: Vec<DrawCommand>,
}

/// Records a draw command for every tinted rectangle.
pub struct DrawSystem {
    frame: Rc<RefCell<Frame>>,
}

impl DrawSystem {
    /// Creates the system, recording into `frame`.
    #[must_use]
    pub fn new(frame: Rc<RefCell<Frame>>) -> Self {
        Self { frame }
    }
}

impl System for DrawSystem {
    fn run(&mut self, view: &mut View) {
        let mut frame = self.frame.borrow_mut();
        frame.commands.clear();
        let (Some(rects), Some(tints)) = (view.field::<Rect>(), view.field::<Tint>()) else {
            return;
        };
        frame.commands.extend(
            view.entities()
                .iter()
                .zip(rects.iter().zip(tints.iter()))
                .map(|(&entity, (&rect, &tint))| DrawCommand { entity, rect, tint }),
        );
    }

    fn name(&self) -> &str {
        "draw"
    }
}

// =============================================================================
// Scene
// =============================================================================

/// World plus the systems of the bounce demo.
pub struct BounceScene {
    world: World,
    frame: Rc<RefCell<Frame>>,
    bounds: Bounds,
}

impl BounceScene {
    /// Builds the world and registers the move, expiry, and draw systems.
    ///
    /// `config` supplies the initial capacity and any extra byte components.
    ///
    /// # Errors
    ///
    /// Propagates registration errors from the world builder.
    pub fn new(config: &WorldConfig, bounds: Bounds) -> EcsResult<Self> {
        let mut world = stratum_core::WorldBuilder::from_config(config)
            .component::<Rect>()
            .component::<Velocity>()
            .component::<Tint>()
            .component::<Lifetime>()
            .build()?;

        let rect = world.component_id::<Rect>()?;
        let velocity = world.component_id::<Velocity>()?;
        let tint = world.component_id::<Tint>()?;
        let lifetime = world.component_id::<Lifetime>()?;

        let frame = Rc::new(RefCell::new(Frame::default()));
        world.register(MoveSystem::new(bounds), &[rect, velocity])?;
        world.register(ExpirySystem, &[lifetime])?;
        world.register(DrawSystem::new(Rc::clone(&frame)), &[rect, tint])?;

        tracing::info!("Bounce scene ready: {}x{}", bounds.width, bounds.height);
        Ok(Self { world, frame, bounds })
    }

    /// Spawns a moving, tinted rectangle.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects an attach.
    pub fn spawn(&mut self, rect: Rect, velocity: Velocity, tint: Tint) -> EcsResult<Entity> {
        let entity = self.world.create();
        self.world.attach(entity, rect)?;
        self.world.attach(entity, velocity)?;
        self.world.attach(entity, tint)?;
        Ok(entity)
    }

    /// Gives an entity a limited lifetime in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid handles or entities that already expire.
    pub fn expire_after(&mut self, entity: Entity, seconds: f32) -> EcsResult<()> {
        self.world.attach(entity, Lifetime { remaining: seconds })
    }

    /// Advances the scene by one frame. Returns the number of draw commands.
    pub fn step(&mut self, delta_seconds: f64) -> usize {
        self.world.tick(delta_seconds);
        self.frame.borrow().commands.len()
    }

    /// Draw commands of the last frame.
    #[must_use]
    pub fn frame(&self) -> Ref<'_, Frame> {
        self.frame.borrow()
    }

    /// Screen bounds of the scene.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the underlying world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Tears the scene down.
    pub fn shutdown(self) {
        self.world.shutdown();
    }
}
