//! Component and bundle definitions for the bunnymark demo.
//!
//! The bundles deliberately come in several widths: [`Bunny`] is what gets
//! spawned, while the narrow shapes below are what the systems query. They
//! match because column identity is the (field name, field type) pair — any
//! bundle declaring `pos: Position` reads and writes the same column.

use glam::DVec2;
use roam_ecs::bundle;

/// Screen position, normalised to `0..1` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Current position.
    pub v: DVec2,
}

/// Per-tick displacement, in normalised screen units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    /// Current velocity.
    pub v: DVec2,
}

/// Constant downward acceleration applied each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Acceleration added to the vertical velocity per tick.
    pub value: f64,
}

/// Hue angle in radians, used when colour output is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hue {
    /// Hue angle in `0..2π`.
    pub value: f64,
}

/// Glyph and footprint of a bunny on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Character drawn at the bunny's position.
    pub glyph: char,
    /// Width in canvas cells.
    pub width: f64,
    /// Height in canvas cells.
    pub height: f64,
}

bundle! {
    /// Everything a freshly spawned bunny carries.
    #[derive(Debug, Clone)]
    pub struct Bunny {
        pub pos: Position,
        pub vel: Velocity,
        pub hue: Hue,
        pub gravity: Gravity,
        pub sprite: Sprite,
    }
}

bundle! {
    /// The kinematic pair, for velocity integration.
    #[derive(Debug, Clone)]
    pub struct Kinematics {
        pub pos: Position,
        pub vel: Velocity,
    }
}

bundle! {
    /// Velocity plus gravity, for the gravity system.
    #[derive(Debug, Clone)]
    pub struct Falling {
        pub vel: Velocity,
        pub gravity: Gravity,
    }
}

bundle! {
    /// Position, velocity and sprite footprint, for edge bouncing.
    #[derive(Debug, Clone)]
    pub struct Bouncing {
        pub pos: Position,
        pub vel: Velocity,
        pub sprite: Sprite,
    }
}

bundle! {
    /// What the bunny renderer needs.
    #[derive(Debug, Clone)]
    pub struct Drawable {
        pub pos: Position,
        pub hue: Hue,
        pub sprite: Sprite,
    }
}
